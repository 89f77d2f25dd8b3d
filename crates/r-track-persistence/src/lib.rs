//! ---
//! trk_section: "03-persistence-logging"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Persistence abstractions and storage bindings."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Storage for everything that outlives a process: store snapshots, the
//! action journal and the per-user dashboard layout record.

/// Result alias used throughout the persistence crate.
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Error type for the persistence subsystem.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Wrapper for IO errors encountered while reading/writing persistence files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization issues.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper for CBOR serialization issues.
    #[error("cbor serialization error: {0}")]
    Cbor(#[from] serde_cbor::Error),
    /// Reported when a snapshot fails integrity verification.
    #[error("snapshot hash mismatch")]
    HashMismatch,
    /// Reported when a snapshot envelope was written by an unknown format version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),
    /// Storage keys must be plain file-name safe identifiers.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    /// Wrapper for Prometheus metrics registration failures.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub mod event_log;
pub mod layout;
pub mod metrics;
pub mod snapshot;

pub use event_log::replay as replay_journal;
pub use event_log::{JournalEntry, JournalReader, JournalWriter};
pub use layout::{
    apply_layout_changes, default_widgets, merge_saved_layout, LayoutChange, LayoutStore,
    LocalStorage, WidgetLayout, WidgetRect, LAYOUT_KEY,
};
pub use metrics::PersistenceMetrics;
pub use snapshot::{load_snapshot, save_snapshot, verify_snapshot, SnapshotRecord, SNAPSHOT_VERSION};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = PersistenceError::InvalidKey("../escape".into());
        assert_eq!(format!("{err}"), "invalid storage key: \"../escape\"");
        let err = PersistenceError::UnsupportedVersion(9);
        assert_eq!(format!("{err}"), "unsupported snapshot version 9");
    }
}
