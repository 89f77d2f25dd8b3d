//! ---
//! trk_section: "03-persistence-logging"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Persistence abstractions and storage bindings."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::fs;
use std::sync::Arc;

use prometheus::Registry;
use r_track_persistence::event_log::{JournalEntry, JournalWriter};
use r_track_persistence::metrics::PersistenceMetrics;
use r_track_persistence::snapshot::{load_snapshot, save_snapshot, verify_snapshot, SnapshotRecord};
use r_track_persistence::{
    replay_journal, LayoutChange, LayoutStore, LocalStorage, PersistenceError, WidgetRect,
    LAYOUT_KEY,
};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn snapshot_roundtrip_succeeds() {
    let dir = tempdir().unwrap();
    let state = json!({
        "config": {"singular_label": "Fusto", "plural_label": "Fusti"},
        "stations": [{"id": "ws_1", "name": "Lavaggio"}],
    });
    let record = SnapshotRecord::capture(7, &state).unwrap();

    for name in ["snapshot.json", "snapshot.cbor"] {
        let path = dir.path().join(name);
        save_snapshot(&record, &path).unwrap();
        assert!(verify_snapshot(&path));

        let restored = load_snapshot(&path).unwrap();
        assert_eq!(restored.revision, 7);
        assert_eq!(restored.state, state);
    }
}

#[test]
fn tampered_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let record = SnapshotRecord::capture(1, &json!({"stations": ["ws_1"]})).unwrap();
    save_snapshot(&record, &path).unwrap();

    let tampered = fs::read_to_string(&path).unwrap().replace("ws_1", "ws_2");
    fs::write(&path, tampered).unwrap();

    assert!(!verify_snapshot(&path));
    assert!(matches!(load_snapshot(&path), Err(PersistenceError::HashMismatch)));
}

#[test]
fn journal_replay_orders_entries_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.log");
    {
        let mut writer = JournalWriter::open(&path).unwrap();
        let (seq, bytes) = writer
            .append(JournalEntry::new("station.add", json!({"id": "ws_1"})))
            .unwrap();
        assert_eq!(seq, 1);
        assert!(bytes > 0);
    }
    let mut writer = JournalWriter::open(&path).unwrap();
    let (seq, _) = writer
        .append(JournalEntry::new("station.remove", json!({"id": "ws_1"})))
        .unwrap();
    assert_eq!(seq, 2);

    let mut replayed = Vec::new();
    let count = replay_journal(&path, |entry| {
        replayed.push((entry.sequence, entry.kind));
        Ok(())
    })
    .unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        replayed,
        vec![(1, "station.add".to_owned()), (2, "station.remove".to_owned())]
    );
}

#[test]
fn layout_record_survives_reopen_and_reset() {
    let dir = tempdir().unwrap();
    let store = LayoutStore::new(LocalStorage::new(dir.path()));
    let moved = WidgetRect {
        x: 2,
        y: 3,
        w: 8,
        h: 10,
        min_w: None,
        min_h: None,
    };
    store
        .update(&[LayoutChange::new("matrix", moved)])
        .unwrap();

    let reopened = LayoutStore::new(LocalStorage::new(dir.path()));
    let matrix = reopened
        .load()
        .into_iter()
        .find(|widget| widget.id == "matrix")
        .unwrap();
    assert_eq!((matrix.layout.x, matrix.layout.w), (2, 8));
    assert!(LocalStorage::new(dir.path()).get(LAYOUT_KEY).unwrap().is_some());

    reopened.reset().unwrap();
    assert!(LocalStorage::new(dir.path()).get(LAYOUT_KEY).unwrap().is_none());
}

#[test]
fn persistence_metrics_capture_activity() {
    let registry = Arc::new(Registry::new());
    let metrics = PersistenceMetrics::new(registry.clone()).unwrap();

    metrics.record_snapshot_saved("json");
    metrics.record_snapshot_failed("cbor");
    metrics.record_journal_bytes(128);
    metrics.observe_replay_duration(0.25);

    let families = registry.gather();
    assert_eq!(metric_total(&families, "r_track_snapshots_saved_total"), 1.0);
    assert_eq!(metric_total(&families, "r_track_snapshots_failed_total"), 1.0);
    assert_eq!(metric_total(&families, "r_track_journal_bytes_total"), 128.0);
    assert!(metric_histogram_count(&families, "r_track_journal_replay_duration_seconds") >= 1.0);
}

fn metric_total(families: &[prometheus::proto::MetricFamily], name: &str) -> f64 {
    families
        .iter()
        .find(|family| family.get_name() == name)
        .and_then(|family| family.get_metric().first())
        .map(|metric| metric.get_counter().get_value())
        .unwrap_or_default()
}

fn metric_histogram_count(families: &[prometheus::proto::MetricFamily], name: &str) -> f64 {
    families
        .iter()
        .find(|family| family.get_name() == name)
        .and_then(|family| family.get_metric().first())
        .map(|metric| metric.get_histogram().get_sample_count() as f64)
        .unwrap_or_default()
}
