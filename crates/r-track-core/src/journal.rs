//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Bridge between the store and the persistence crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use r_track_persistence::event_log::{JournalEntry, JournalWriter};
use r_track_persistence::metrics::PersistenceMetrics;
use r_track_persistence::snapshot::{load_snapshot, save_snapshot, SnapshotRecord};
use r_track_persistence::{replay_journal, PersistenceError, Result as PersistenceResult};
use serde_json::{json, Value};
use tracing::debug;

use crate::action::Action;
use crate::state::AppState;
use crate::store::AppStore;

/// Appends applied actions to an on-disk journal.
#[derive(Debug)]
pub struct ActionJournal {
    writer: JournalWriter,
    metrics: Option<Arc<PersistenceMetrics>>,
}

impl ActionJournal {
    pub fn open(path: &Path, metrics: Option<Arc<PersistenceMetrics>>) -> PersistenceResult<Self> {
        Ok(Self {
            writer: JournalWriter::open(path)?,
            metrics,
        })
    }

    /// Append `action`, applied at store `revision`. Returns the journal sequence.
    pub fn record(&mut self, revision: u64, action: &Action) -> PersistenceResult<u64> {
        let payload = json!({
            "revision": revision,
            "action": serde_json::to_value(action)?,
        });
        let (sequence, bytes) = self.writer.append(JournalEntry::new(action.kind(), payload))?;
        if let Some(metrics) = &self.metrics {
            metrics.record_journal_bytes(bytes);
        }
        Ok(sequence)
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}

/// Decode the action stored in a journal entry.
pub fn decode_action(entry: &JournalEntry) -> PersistenceResult<Action> {
    let action = entry.payload.get("action").cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(action)?)
}

/// Revision the store reached when the entry was recorded, if present.
pub fn entry_revision(entry: &JournalEntry) -> Option<u64> {
    entry.payload.get("revision").and_then(Value::as_u64)
}

/// Re-dispatch journaled actions into `store`, returning how many were applied.
///
/// Entries recorded at or below the store's current revision are already part
/// of its state (for example when it was hydrated from a later snapshot) and
/// are skipped. The store should not have a journal attached, or replayed
/// actions are appended a second time.
pub fn replay_into(
    path: &Path,
    store: &mut AppStore,
    metrics: Option<&PersistenceMetrics>,
) -> PersistenceResult<usize> {
    let started = Instant::now();
    let mut applied = 0;
    let result = replay_journal(path, |entry| {
        if entry_revision(&entry).is_some_and(|revision| revision <= store.revision()) {
            debug!(sequence = entry.sequence, kind = %entry.kind, "journal entry already applied");
            return Ok(());
        }
        debug!(sequence = entry.sequence, kind = %entry.kind, "replaying journal entry");
        let action = decode_action(&entry)?;
        store.dispatch(action);
        applied += 1;
        Ok(())
    });
    if let Some(metrics) = metrics {
        metrics.observe_replay_duration(started.elapsed().as_secs_f64());
    }
    result.map(|_| applied)
}

/// Persist the store's current state; the extension picks JSON or CBOR.
pub fn save_state(
    store: &AppStore,
    path: &Path,
    metrics: Option<&PersistenceMetrics>,
) -> PersistenceResult<()> {
    let format = snapshot_format(path);
    let result = SnapshotRecord::capture(store.revision(), store.state())
        .and_then(|record| save_snapshot(&record, path));
    if let Some(metrics) = metrics {
        match &result {
            Ok(()) => metrics.record_snapshot_saved(format),
            Err(_) => metrics.record_snapshot_failed(format),
        }
    }
    result
}

/// Load a snapshot written by [`save_state`], returning the state and its revision.
pub fn load_state(path: &Path) -> PersistenceResult<(AppState, u64)> {
    let record = load_snapshot(path)?;
    let state = record.decode::<AppState>()?;
    Ok((state, record.revision))
}

/// Rebuild a store from a snapshot, with journaling left detached.
pub fn restore_store(path: &Path) -> PersistenceResult<AppStore> {
    let (state, revision) = load_state(path)?;
    Ok(AppStore::at_revision(state, revision))
}

fn snapshot_format(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("cbor") => "cbor",
        _ => "json",
    }
}

/// Default journal location below a data directory.
pub fn journal_path_in(root: &Path) -> PathBuf {
    root.join("journal.log")
}

/// Error alias re-exported for convenience.
pub type Error = PersistenceError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::model::{Station, StepStatus};
    use crate::seed::{initial_state, IdPrefixes};
    use tempfile::tempdir;

    fn seeded() -> AppStore {
        AppStore::new(initial_state(&mut SequentialIds::new(), &IdPrefixes::default()))
    }

    #[test]
    fn journaled_actions_replay_to_the_same_state() {
        let dir = tempdir().unwrap();
        let path = journal_path_in(dir.path());

        let mut live = seeded().with_journal(ActionJournal::open(&path, None).unwrap());
        let entity = live.state().entities[0].id.clone();
        let station = live.state().stations[2].id.clone();
        live.add_station(Station::new("ws_extra", "Etichettatura"));
        live.set_entity_station(&entity, Some(&station));
        live.toggle_matrix_cell(&entity, &station);
        let first = live.state().stations[0].id.clone();
        live.move_station_up(&first);
        live.remove_station(&station);

        let mut replayed = seeded();
        let read = replay_into(&path, &mut replayed, None).unwrap();
        assert_eq!(read, 4);
        assert_eq!(replayed.state(), live.state());
        assert_eq!(replayed.revision(), live.revision());
    }

    #[test]
    fn replay_skips_entries_already_in_a_snapshot() {
        let dir = tempdir().unwrap();
        let path = journal_path_in(dir.path());
        let snapshot = dir.path().join("state.json");

        let mut live = seeded().with_journal(ActionJournal::open(&path, None).unwrap());
        let entity = live.state().entities[0].id.clone();
        let station = live.state().stations[0].id.clone();
        live.toggle_matrix_cell(&entity, &station);
        live.add_station(Station::new("ws_9", "Etichettatura"));
        save_state(&live, &snapshot, None).unwrap();
        live.remove_station(&"ws_9".into());

        let mut restored = restore_store(&snapshot).unwrap();
        assert_eq!(restored.revision(), 2);
        let applied = replay_into(&path, &mut restored, None).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(restored.state(), live.state());
        assert_eq!(restored.revision(), 3);
        assert_eq!(restored.state().status(&entity, &station), StepStatus::Pass);

        // Nothing left to apply on a second pass.
        assert_eq!(replay_into(&path, &mut restored, None).unwrap(), 0);
    }

    #[test]
    fn snapshot_round_trip_keeps_revision() {
        let dir = tempdir().unwrap();
        let mut store = seeded();
        let station = store.state().stations[0].id.clone();
        store.remove_station(&station);

        for name in ["state.json", "state.cbor"] {
            let path = dir.path().join(name);
            save_state(&store, &path, None).unwrap();
            let restored = restore_store(&path).unwrap();
            assert_eq!(restored.state(), store.state());
            assert_eq!(restored.revision(), 1);
        }
    }

    #[test]
    fn undecodable_entry_is_reported() {
        let entry = JournalEntry::new("matrix.toggle", json!({"action": {"type": "bogus"}}));
        assert!(matches!(decode_action(&entry), Err(PersistenceError::Json(_))));
    }
}
