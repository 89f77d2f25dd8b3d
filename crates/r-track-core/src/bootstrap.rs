//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::Registry;
use r_track_common::{AppConfig, StoreConfig};
use r_track_logging::{log_system_event, LogContext, SystemEventOutcome};
use r_track_persistence::PersistenceMetrics;
use tracing::{info, warn};

use crate::ids::IdSource;
use crate::journal::{load_state, ActionJournal};
use crate::metrics::{SharedRegistry, StoreMetrics};
use crate::seed::{empty_state, initial_state, IdPrefixes};
use crate::state::AppState;
use crate::store::AppStore;

/// Where the initial state came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSource {
    Snapshot(PathBuf),
    Seed,
    Empty,
}

impl fmt::Display for StateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateSource::Snapshot(path) => write!(f, "snapshot {}", path.display()),
            StateSource::Seed => f.write_str("demo seed"),
            StateSource::Empty => f.write_str("empty state"),
        }
    }
}

impl From<&StoreConfig> for IdPrefixes {
    fn from(config: &StoreConfig) -> Self {
        Self {
            station: config.station_id_prefix.clone(),
            entity: config.entity_id_prefix.clone(),
        }
    }
}

/// Initial state and revision: the configured snapshot if readable, else the
/// demo seed, else an empty state.
pub fn hydrate(config: &StoreConfig, ids: &mut dyn IdSource) -> (AppState, u64, StateSource) {
    if let Some(path) = config.snapshot_path.as_ref().filter(|path| path.exists()) {
        match load_state(path) {
            Ok((state, revision)) => {
                return (state, revision, StateSource::Snapshot(path.clone()));
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "stored snapshot unreadable, falling back"
                );
            }
        }
    }
    if config.seed_demo_data {
        (initial_state(ids, &IdPrefixes::from(config)), 0, StateSource::Seed)
    } else {
        (empty_state(), 0, StateSource::Empty)
    }
}

/// A store wired according to [`AppConfig`].
pub struct Bootstrap {
    pub store: AppStore,
    pub source: StateSource,
    pub registry: Option<SharedRegistry>,
    pub persistence_metrics: Option<Arc<PersistenceMetrics>>,
}

impl fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("store", &self.store)
            .field("source", &self.source)
            .field("metrics", &self.registry.is_some())
            .finish()
    }
}

/// Hydrate the state, then attach metrics and the journal as configured.
pub fn build_store(config: &AppConfig, ids: &mut dyn IdSource) -> Result<Bootstrap> {
    config.validate()?;
    let (state, revision, source) = hydrate(&config.store, ids);
    let mut store = AppStore::at_revision(state, revision);

    let (registry, persistence_metrics) = if config.metrics.enabled {
        let registry: SharedRegistry = Arc::new(Registry::new());
        store = store.with_metrics(
            StoreMetrics::new(registry.clone()).context("failed to register store metrics")?,
        );
        let persistence = PersistenceMetrics::new(registry.clone())
            .context("failed to register persistence metrics")?;
        (Some(registry), Some(Arc::new(persistence)))
    } else {
        (None, None)
    };

    if config.journal.enabled {
        if let Some(path) = config.journal.path.as_ref() {
            let journal = ActionJournal::open(path, persistence_metrics.clone())
                .with_context(|| format!("failed to open journal {}", path.display()))?;
            info!(path = %path.display(), "journaling store actions");
            store = store.with_journal(journal);
        }
    }

    let message = format!("store ready from {source}");
    log_system_event(
        Some(&LogContext::new().with_revision(store.revision())),
        "store.bootstrap",
        &message,
        SystemEventOutcome::Success,
    );

    Ok(Bootstrap {
        store,
        source,
        registry,
        persistence_metrics,
    })
}
