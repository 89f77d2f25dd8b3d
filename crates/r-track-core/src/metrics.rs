//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

use crate::action::ActionOutcome;
use crate::state::CascadeReport;

/// Shared registry handle.
pub type SharedRegistry = Arc<Registry>;

/// Counters describing store activity.
#[derive(Clone)]
pub struct StoreMetrics {
    actions: IntCounterVec,
    cascade_removals: IntCounterVec,
    revision: IntGauge,
}

impl StoreMetrics {
    pub fn new(registry: SharedRegistry) -> prometheus::Result<Self> {
        let actions = IntCounterVec::new(
            Opts::new(
                "r_track_store_actions_total",
                "Store actions dispatched, by kind and outcome",
            ),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(actions.clone()))?;

        let cascade_removals = IntCounterVec::new(
            Opts::new(
                "r_track_store_cascade_removals_total",
                "References cleaned up by cascading removals",
            ),
            &["collection"],
        )?;
        registry.register(Box::new(cascade_removals.clone()))?;

        let revision = IntGauge::new("r_track_store_revision", "Current store revision")?;
        registry.register(Box::new(revision.clone()))?;

        Ok(Self {
            actions,
            cascade_removals,
            revision,
        })
    }

    pub fn record_action(&self, kind: &str, outcome: ActionOutcome) {
        self.actions
            .with_label_values(&[kind, outcome.label()])
            .inc();
    }

    pub fn record_cascade(&self, report: &CascadeReport) {
        for (collection, count) in [
            ("entity_station", report.entities_detached),
            ("entity_attribute", report.attribute_values_stripped),
            ("matrix_cell", report.matrix_cells_removed),
            ("matrix_row", report.matrix_rows_removed),
        ] {
            if count > 0 {
                self.cascade_removals
                    .with_label_values(&[collection])
                    .inc_by(count as u64);
            }
        }
    }

    pub fn set_revision(&self, revision: u64) {
        self.revision.set(i64::try_from(revision).unwrap_or(i64::MAX));
    }
}

impl std::fmt::Debug for StoreMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreMetrics").finish_non_exhaustive()
    }
}
