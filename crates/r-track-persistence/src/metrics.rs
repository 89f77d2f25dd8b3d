//! ---
//! trk_section: "03-persistence-logging"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Persistence abstractions and storage bindings."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{self, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

use crate::Result;

/// Metrics published by the persistence subsystem.
#[derive(Clone)]
pub struct PersistenceMetrics {
    snapshots_saved: IntCounterVec,
    snapshots_failed: IntCounterVec,
    journal_bytes: IntCounter,
    replay_duration: Histogram,
}

impl PersistenceMetrics {
    /// Register all persistence metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let snapshots_saved = IntCounterVec::new(
            Opts::new(
                "r_track_snapshots_saved_total",
                "Total number of store snapshots successfully persisted",
            ),
            &["format"],
        )?;
        registry.register(Box::new(snapshots_saved.clone()))?;

        let snapshots_failed = IntCounterVec::new(
            Opts::new(
                "r_track_snapshots_failed_total",
                "Total number of store snapshot persist operations that failed",
            ),
            &["format"],
        )?;
        registry.register(Box::new(snapshots_failed.clone()))?;

        let journal_bytes = IntCounter::new(
            "r_track_journal_bytes_total",
            "Total bytes appended to the action journal",
        )?;
        registry.register(Box::new(journal_bytes.clone()))?;

        let replay_duration = Histogram::with_opts(
            HistogramOpts::new(
                "r_track_journal_replay_duration_seconds",
                "Duration spent replaying the action journal",
            )
            .buckets(prometheus::exponential_buckets(0.0005, 2.0, 12)?),
        )?;
        registry.register(Box::new(replay_duration.clone()))?;

        Ok(Self {
            snapshots_saved,
            snapshots_failed,
            journal_bytes,
            replay_duration,
        })
    }

    /// Record a successful snapshot write.
    pub fn record_snapshot_saved(&self, format: &str) {
        self.snapshots_saved.with_label_values(&[format]).inc();
    }

    /// Record a failed snapshot write.
    pub fn record_snapshot_failed(&self, format: &str) {
        self.snapshots_failed.with_label_values(&[format]).inc();
    }

    /// Add to the number of bytes appended to the journal.
    pub fn record_journal_bytes(&self, bytes: usize) {
        self.journal_bytes.inc_by(bytes as u64);
    }

    /// Observe the time spent replaying a journal.
    pub fn observe_replay_duration(&self, seconds: f64) {
        self.replay_duration.observe(seconds);
    }
}

impl std::fmt::Debug for PersistenceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceMetrics").finish_non_exhaustive()
    }
}
