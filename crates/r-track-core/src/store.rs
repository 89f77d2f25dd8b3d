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

use r_track_logging::{trk_debug, trk_warn, LogContext};

use crate::action::{Action, ActionOutcome, Direction};
use crate::journal::ActionJournal;
use crate::metrics::StoreMetrics;
use crate::model::{AttributeDefinition, Entity, EntityId, Station, StationId, StepStatus};
use crate::state::AppState;

/// Single owner of the application state.
///
/// Writes go through `&mut self`; readers take [`AppStore::snapshot`], an
/// immutable `Arc` that later writes never modify.
#[derive(Debug)]
pub struct AppStore {
    current: Arc<AppState>,
    revision: u64,
    journal: Option<ActionJournal>,
    metrics: Option<StoreMetrics>,
}

impl AppStore {
    pub fn new(initial: AppState) -> Self {
        Self::at_revision(initial, 0)
    }

    /// Resume from a state captured at `revision`.
    pub fn at_revision(initial: AppState, revision: u64) -> Self {
        Self {
            current: Arc::new(initial),
            revision,
            journal: None,
            metrics: None,
        }
    }

    /// Append every applied action to `journal`.
    pub fn with_journal(mut self, journal: ActionJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_metrics(mut self, metrics: StoreMetrics) -> Self {
        metrics.set_revision(self.revision);
        self.metrics = Some(metrics);
        self
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.current)
    }

    /// Borrow the latest state without taking a snapshot handle.
    pub fn state(&self) -> &AppState {
        &self.current
    }

    /// Number of applied actions since the initial state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn journal(&self) -> Option<&ActionJournal> {
        self.journal.as_ref()
    }

    /// Apply one action, producing a new snapshot if it changed anything.
    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        self.warn_on_dangling(&action);

        // Copy-on-write: outstanding snapshots keep the previous state.
        let (outcome, report) = Arc::make_mut(&mut self.current).apply(&action);
        if outcome.is_applied() {
            self.revision += 1;
        }

        let entity = action.entity_id().map(EntityId::as_str);
        let station = action.station_id().map(StationId::as_str);
        let mut ctx = LogContext::new()
            .with_action(action.kind())
            .with_revision(self.revision);
        if let Some(entity) = entity {
            ctx = ctx.with_entity(entity);
        }
        if let Some(station) = station {
            ctx = ctx.with_station(station);
        }
        match outcome {
            ActionOutcome::Applied => trk_debug!(context = ctx, "action applied"),
            ActionOutcome::NoOp(reason) => trk_debug!(context = ctx, "action ignored: {reason}"),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_action(action.kind(), outcome);
            metrics.record_cascade(&report);
            metrics.set_revision(self.revision);
        }

        if outcome.is_applied() {
            if let Some(journal) = self.journal.as_mut() {
                if let Err(err) = journal.record(self.revision, &action) {
                    tracing::warn!(
                        action = action.kind(),
                        path = %journal.path().display(),
                        error = %err,
                        "failed to journal action"
                    );
                }
            }
        }

        outcome
    }

    fn warn_on_dangling(&self, action: &Action) {
        let state = self.state();
        let dangling = match action {
            Action::SetEntityStation {
                station: Some(station),
                ..
            } => state.is_dangling_station(station),
            Action::ToggleMatrixCell { entity, station } => {
                state.entity(entity).is_none() || state.is_dangling_station(station)
            }
            _ => false,
        };
        if dangling {
            let mut ctx = LogContext::new().with_action(action.kind());
            if let Some(entity) = action.entity_id() {
                ctx = ctx.with_entity(entity.as_str());
            }
            if let Some(station) = action.station_id() {
                ctx = ctx.with_station(station.as_str());
            }
            trk_warn!(context = ctx, "action references an unknown entity or station");
        }
    }

    pub fn set_entity_labels(
        &mut self,
        singular: impl Into<String>,
        plural: impl Into<String>,
    ) -> ActionOutcome {
        self.dispatch(Action::SetEntityLabels {
            singular: singular.into(),
            plural: plural.into(),
        })
    }

    pub fn add_attribute(&mut self, definition: AttributeDefinition) -> ActionOutcome {
        self.dispatch(Action::AddAttribute { definition })
    }

    pub fn remove_attribute(&mut self, key: impl Into<String>) -> ActionOutcome {
        self.dispatch(Action::RemoveAttribute { key: key.into() })
    }

    pub fn add_station(&mut self, station: Station) -> ActionOutcome {
        self.dispatch(Action::AddStation { station })
    }

    pub fn remove_station(&mut self, id: &StationId) -> ActionOutcome {
        self.dispatch(Action::RemoveStation { id: id.clone() })
    }

    pub fn move_station(&mut self, id: &StationId, direction: Direction) -> ActionOutcome {
        self.dispatch(Action::MoveStation {
            id: id.clone(),
            direction,
        })
    }

    pub fn move_station_up(&mut self, id: &StationId) -> ActionOutcome {
        self.move_station(id, Direction::Up)
    }

    pub fn move_station_down(&mut self, id: &StationId) -> ActionOutcome {
        self.move_station(id, Direction::Down)
    }

    pub fn add_entity(&mut self, entity: Entity) -> ActionOutcome {
        self.dispatch(Action::AddEntity { entity })
    }

    pub fn delete_entity(&mut self, id: &EntityId) -> ActionOutcome {
        self.dispatch(Action::DeleteEntity { id: id.clone() })
    }

    pub fn set_entity_station(
        &mut self,
        id: &EntityId,
        station: Option<&StationId>,
    ) -> ActionOutcome {
        self.dispatch(Action::SetEntityStation {
            id: id.clone(),
            station: station.cloned(),
        })
    }

    /// Advance a matrix cell and return its new status.
    pub fn toggle_matrix_cell(&mut self, entity: &EntityId, station: &StationId) -> StepStatus {
        self.dispatch(Action::ToggleMatrixCell {
            entity: entity.clone(),
            station: station.clone(),
        });
        self.current.status(entity, station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::seed::{initial_state, IdPrefixes};
    use prometheus::Registry;

    fn store() -> AppStore {
        AppStore::new(initial_state(&mut SequentialIds::new(), &IdPrefixes::default()))
    }

    #[test]
    fn snapshots_are_immutable() {
        let mut store = store();
        let before = store.snapshot();
        let first = before.stations[0].id.clone();

        assert!(store.remove_station(&first).is_applied());

        assert_eq!(before.stations.len(), 3);
        assert_eq!(store.snapshot().stations.len(), 2);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn noop_does_not_bump_revision() {
        let mut store = store();
        let first = store.state().stations[0].id.clone();
        assert!(!store.move_station_up(&first).is_applied());
        assert!(!store.delete_entity(&"missing".into()).is_applied());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn toggle_returns_new_status() {
        let mut store = store();
        let entity = store.state().entities[0].id.clone();
        let station = store.state().stations[1].id.clone();
        assert_eq!(store.toggle_matrix_cell(&entity, &station), StepStatus::Pass);
        assert_eq!(store.toggle_matrix_cell(&entity, &station), StepStatus::Fail);
        assert_eq!(store.toggle_matrix_cell(&entity, &station), StepStatus::Unset);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn metrics_track_outcomes_and_cascades() {
        let registry = Arc::new(Registry::new());
        let mut store = store().with_metrics(StoreMetrics::new(registry.clone()).unwrap());
        let entity = store.state().entities[0].id.clone();
        let station = store.state().stations[0].id.clone();

        store.set_entity_station(&entity, Some(&station));
        store.remove_station(&station);
        store.remove_station(&station);

        let families = registry.gather();
        let actions = families
            .iter()
            .find(|f| f.get_name() == "r_track_store_actions_total")
            .unwrap();
        let total: f64 = actions
            .get_metric()
            .iter()
            .map(|m| m.get_counter().get_value())
            .sum();
        assert_eq!(total, 3.0);

        let cascades = families
            .iter()
            .find(|f| f.get_name() == "r_track_store_cascade_removals_total")
            .unwrap();
        assert_eq!(cascades.get_metric()[0].get_counter().get_value(), 1.0);
    }
}
