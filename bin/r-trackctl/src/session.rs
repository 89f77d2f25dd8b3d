//! ---
//! trk_section: "05-networking-external-interfaces"
//! trk_subsection: "binary"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Control CLI for operators driving the R-TRACK store."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use prometheus::{Encoder, TextEncoder};
use r_track_common::{init_tracing, AppConfig};
use r_track_core::journal::{replay_into, save_state};
use r_track_core::seed::{initial_state, IdPrefixes};
use r_track_core::{build_store, Action, AppStore, IdSource, RandomIds, SequentialIds};
use r_track_logging::{log_system_event, LogContext, SystemEventOutcome};
use tracing::info;

use crate::config::load_config;
use crate::render;

fn id_source(sequential: bool) -> Box<dyn IdSource> {
    if sequential {
        Box::new(SequentialIds::new())
    } else {
        Box::new(RandomIds)
    }
}

#[derive(Debug, Args)]
pub struct SeedCommand {
    /// Single-line JSON instead of pretty-printed output.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    compact: bool,

    /// Number ids sequentially (ws_1, ws_2, ...) instead of randomly.
    #[arg(long = "sequential-ids", action = clap::ArgAction::SetTrue)]
    sequential_ids: bool,
}

impl SeedCommand {
    pub fn execute(self) -> Result<()> {
        let mut ids = id_source(self.sequential_ids);
        let state = initial_state(ids.as_mut(), &IdPrefixes::default());
        let json = if self.compact {
            serde_json::to_string(&state)?
        } else {
            serde_json::to_string_pretty(&state)?
        };
        println!("{json}");
        Ok(())
    }
}

/// One parsed script line.
#[derive(Debug)]
pub struct ScriptStep {
    pub line: usize,
    pub action: Action,
}

/// Parse a JSON-lines action script. Blank lines and `#` comments are skipped.
pub fn parse_script(contents: &str) -> Result<Vec<ScriptStep>> {
    contents
        .lines()
        .enumerate()
        .map(|(index, raw)| (index + 1, raw.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, raw)| {
            let action = serde_json::from_str::<Action>(raw)
                .with_context(|| format!("invalid action on line {line}"))?;
            Ok(ScriptStep { line, action })
        })
        .collect()
}

/// Counts reported after a scripted run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub ignored: usize,
}

pub fn apply_script(store: &mut AppStore, steps: Vec<ScriptStep>) -> RunSummary {
    let mut summary = RunSummary::default();
    for step in steps {
        let kind = step.action.kind();
        let outcome = store.dispatch(step.action);
        if outcome.is_applied() {
            summary.applied += 1;
        } else {
            summary.ignored += 1;
            info!(line = step.line, action = kind, outcome = ?outcome, "script step ignored");
        }
    }
    summary
}

#[derive(Debug, Args)]
pub struct RunCommand {
    /// JSON-lines file with one action per line.
    #[arg(long = "script", value_name = "FILE")]
    script: PathBuf,

    /// Configuration file (defaults to R_TRACK_CONFIG or ./r-track.toml).
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save the resulting state to this path (.json or .cbor).
    #[arg(long = "snapshot-out", value_name = "FILE")]
    snapshot_out: Option<PathBuf>,

    /// Number ids sequentially instead of randomly.
    #[arg(long = "sequential-ids", action = clap::ArgAction::SetTrue)]
    sequential_ids: bool,

    /// Print collected Prometheus metrics after the views.
    #[arg(long = "print-metrics", action = clap::ArgAction::SetTrue)]
    print_metrics: bool,
}

impl RunCommand {
    pub fn execute(self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;
        if self.print_metrics {
            config.metrics.enabled = true;
        }
        init_tracing("r-trackctl", &config.logging)?;

        let contents = fs::read_to_string(&self.script)
            .with_context(|| format!("unable to read script {}", self.script.display()))?;
        let steps = parse_script(&contents)?;

        let mut ids = id_source(self.sequential_ids);
        let mut boot = build_store(&config, ids.as_mut())?;
        info!(source = %boot.source, steps = steps.len(), "running action script");
        let summary = apply_script(&mut boot.store, steps);

        print!("{}", render::all_views(boot.store.state()));
        println!(
            "\napplied {} action(s), ignored {}, revision {}",
            summary.applied,
            summary.ignored,
            boot.store.revision()
        );

        if let Some(path) = &self.snapshot_out {
            save_snapshot_to(&boot.store, path, boot.persistence_metrics.as_deref())?;
            println!("snapshot written to {}", path.display());
        }

        if self.print_metrics {
            if let Some(registry) = &boot.registry {
                let mut buffer = Vec::new();
                TextEncoder::new()
                    .encode(&registry.gather(), &mut buffer)
                    .context("failed to encode metrics")?;
                println!("\n{}", String::from_utf8_lossy(&buffer));
            }
        }
        Ok(())
    }
}

fn save_snapshot_to(
    store: &AppStore,
    path: &Path,
    metrics: Option<&r_track_persistence::PersistenceMetrics>,
) -> Result<()> {
    let context = LogContext::new().with_revision(store.revision());
    match save_state(store, path, metrics) {
        Ok(()) => {
            log_system_event(
                Some(&context),
                "store.snapshot",
                &format!("snapshot saved to {}", path.display()),
                SystemEventOutcome::Success,
            );
            Ok(())
        }
        Err(err) => {
            log_system_event(
                Some(&context),
                "store.snapshot",
                &format!("snapshot to {} failed: {err}", path.display()),
                SystemEventOutcome::Fault,
            );
            Err(err).with_context(|| format!("failed to save snapshot {}", path.display()))
        }
    }
}

#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Journal written by a store with journaling enabled.
    #[arg(long = "journal", value_name = "FILE")]
    journal: PathBuf,

    /// Configuration the journal was recorded with; its initial state is rebuilt first.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number ids sequentially instead of randomly.
    #[arg(long = "sequential-ids", action = clap::ArgAction::SetTrue)]
    sequential_ids: bool,
}

impl ReplayCommand {
    pub fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let store = replay_journal_file(&config, &self.journal, self.sequential_ids)?;
        print!("{}", render::all_views(store.state()));
        println!("\nrevision {}", store.revision());
        Ok(())
    }
}

/// Rebuild the configured initial state, then re-apply the journal entries it
/// does not already contain.
pub fn replay_journal_file(
    config: &AppConfig,
    journal: &Path,
    sequential_ids: bool,
) -> Result<AppStore> {
    let mut config = config.clone();
    // Replaying must not append to the journal being read.
    config.journal.enabled = false;
    let mut ids = id_source(sequential_ids);
    let mut boot = build_store(&config, ids.as_mut())?;
    let applied = replay_into(journal, &mut boot.store, boot.persistence_metrics.as_deref())
        .with_context(|| format!("failed to replay journal {}", journal.display()))?;
    info!(
        applied,
        source = %boot.source,
        revision = boot.store.revision(),
        "journal replayed"
    );
    Ok(boot.store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_track_core::journal::ActionJournal;
    use tempfile::tempdir;

    #[test]
    fn script_skips_comments_and_reports_bad_lines() {
        let steps = parse_script(concat!(
            "# labels\n\n",
            r#"{"type":"set_entity_labels","singular":"Fusto","plural":"Fusti"}"#,
            "\n",
        ))
        .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].line, 3);

        let err = parse_script("{\"type\":\"nope\"}").unwrap_err();
        assert_eq!(err.to_string(), "invalid action on line 1");
    }

    fn seeded() -> AppStore {
        AppStore::new(initial_state(&mut SequentialIds::new(), &IdPrefixes::default()))
    }

    #[test]
    fn apply_script_counts_outcomes() {
        let mut store = seeded();
        let steps = parse_script(
            "{\"type\":\"move_station\",\"id\":\"ws_1\",\"direction\":\"up\"}\n\
             {\"type\":\"move_station\",\"id\":\"ws_1\",\"direction\":\"down\"}\n",
        )
        .unwrap();
        let summary = apply_script(&mut store, steps);
        assert_eq!(summary, RunSummary { applied: 1, ignored: 1 });
    }

    #[test]
    fn replay_rebuilds_journaled_state() {
        let dir = tempdir().unwrap();
        let journal = dir.path().join("journal.log");
        let config = AppConfig::default();

        let mut live = seeded().with_journal(ActionJournal::open(&journal, None).unwrap());
        apply_script(
            &mut live,
            parse_script("{\"type\":\"remove_station\",\"id\":\"ws_2\"}").unwrap(),
        );

        let replayed = replay_journal_file(&config, &journal, true).unwrap();
        assert_eq!(replayed.state(), live.state());
    }

    #[test]
    fn replay_resumes_after_configured_snapshot() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.store.snapshot_path = Some(dir.path().join("state.json"));
        config.journal.enabled = true;
        config.journal.path = Some(dir.path().join("journal.log"));
        let journal = config.journal.path.clone().unwrap();

        let mut live = build_store(&config, &mut SequentialIds::new()).unwrap().store;
        apply_script(
            &mut live,
            parse_script(concat!(
                r#"{"type":"toggle_matrix_cell","entity":"en_4","station":"ws_1"}"#,
                "\n",
                r#"{"type":"add_station","station":{"id":"ws_9","name":"Etichettatura"}}"#,
            ))
            .unwrap(),
        );
        save_state(&live, config.store.snapshot_path.as_deref().unwrap(), None).unwrap();
        apply_script(
            &mut live,
            parse_script(r#"{"type":"move_station","id":"ws_9","direction":"up"}"#).unwrap(),
        );
        assert_eq!(live.revision(), 3);

        let replayed = replay_journal_file(&config, &journal, true).unwrap();
        assert_eq!(replayed.revision(), 3);
        assert_eq!(replayed.state(), live.state());
        assert_eq!(replayed.state().stations.len(), 4);
    }
}
