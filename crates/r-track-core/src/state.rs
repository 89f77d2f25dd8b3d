//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! The normalized application state and the operations that transform it.
//!
//! Every operation touches all collections it has to keep consistent and
//! reports whether it changed anything. Unknown or duplicate identifiers are
//! never an error: the call is a no-op.

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionOutcome, Direction, NoOpReason};
use crate::model::{
    AttributeDefinition, Configuration, Entity, EntityId, StatusMatrix, Station, StationId,
    StepStatus,
};

/// One consistent snapshot of the four collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub config: Configuration,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub statuses: StatusMatrix,
}

/// Counts of references a cascade cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub entities_detached: usize,
    pub attribute_values_stripped: usize,
    pub matrix_cells_removed: usize,
    pub matrix_rows_removed: usize,
}

impl AppState {
    /// A state with the given configuration and no stations, entities or statuses.
    pub fn with_config(config: Configuration) -> Self {
        Self {
            config,
            stations: Vec::new(),
            entities: Vec::new(),
            statuses: StatusMatrix::new(),
        }
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|station| &station.id == id)
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| &entity.id == id)
    }

    fn station_index(&self, id: &StationId) -> Option<usize> {
        self.stations.iter().position(|station| &station.id == id)
    }

    /// The station an entity is at, resolving dangling references to `None`.
    pub fn station_of(&self, entity: &Entity) -> Option<&Station> {
        entity
            .current_station_id
            .as_ref()
            .and_then(|id| self.station(id))
    }

    /// Status of an entity at a station; absent cells are unset.
    pub fn status(&self, entity: &EntityId, station: &StationId) -> StepStatus {
        self.statuses.status(entity, station)
    }

    /// Dispatch an [`Action`] to the matching operation.
    pub fn apply(&mut self, action: &Action) -> (ActionOutcome, CascadeReport) {
        let mut report = CascadeReport::default();
        let outcome = match action {
            Action::SetEntityLabels { singular, plural } => {
                self.set_entity_labels(singular, plural)
            }
            Action::AddAttribute { definition } => self.add_attribute(definition.clone()),
            Action::RemoveAttribute { key } => {
                let (outcome, cascade) = self.remove_attribute(key);
                report = cascade;
                outcome
            }
            Action::AddStation { station } => self.add_station(station.clone()),
            Action::RemoveStation { id } => {
                let (outcome, cascade) = self.remove_station(id);
                report = cascade;
                outcome
            }
            Action::MoveStation { id, direction } => self.move_station(id, *direction),
            Action::AddEntity { entity } => self.add_entity(entity.clone()),
            Action::DeleteEntity { id } => {
                let (outcome, cascade) = self.delete_entity(id);
                report = cascade;
                outcome
            }
            Action::SetEntityStation { id, station } => {
                self.set_entity_station(id, station.clone())
            }
            Action::ToggleMatrixCell { entity, station } => {
                self.toggle_matrix_cell(entity, station).0
            }
        };
        (outcome, report)
    }

    /// Replace both entity labels. Empty labels are stored as given.
    pub fn set_entity_labels(&mut self, singular: &str, plural: &str) -> ActionOutcome {
        self.config.singular_label = singular.to_owned();
        self.config.plural_label = plural.to_owned();
        ActionOutcome::Applied
    }

    /// Append an attribute definition unless its key is already taken.
    pub fn add_attribute(&mut self, definition: AttributeDefinition) -> ActionOutcome {
        if self.config.has_attribute(&definition.key) {
            return ActionOutcome::NoOp(NoOpReason::DuplicateAttributeKey);
        }
        self.config.attributes.push(definition);
        ActionOutcome::Applied
    }

    /// Remove an attribute definition and strip its key from every entity.
    pub fn remove_attribute(&mut self, key: &str) -> (ActionOutcome, CascadeReport) {
        let before = self.config.attributes.len();
        self.config.attributes.retain(|def| def.key != key);
        let removed = self.config.attributes.len() != before;

        let stripped = self
            .entities
            .iter_mut()
            .filter_map(|entity| entity.attributes.shift_remove(key))
            .count();
        let report = CascadeReport {
            attribute_values_stripped: stripped,
            ..CascadeReport::default()
        };

        if removed || stripped > 0 {
            (ActionOutcome::Applied, report)
        } else {
            (ActionOutcome::NoOp(NoOpReason::UnknownAttribute), report)
        }
    }

    /// Append a station. Ids are not checked for uniqueness.
    pub fn add_station(&mut self, station: Station) -> ActionOutcome {
        self.stations.push(station);
        ActionOutcome::Applied
    }

    /// Remove a station, detach entities at it and drop its matrix column.
    ///
    /// Dangling references to an id with no station are cleaned up too; the
    /// call is a no-op only when nothing mentions `id`.
    pub fn remove_station(&mut self, id: &StationId) -> (ActionOutcome, CascadeReport) {
        let before = self.stations.len();
        self.stations.retain(|station| &station.id != id);
        let removed = self.stations.len() != before;

        let mut entities_detached = 0;
        for entity in &mut self.entities {
            if entity.current_station_id.as_ref() == Some(id) {
                entity.current_station_id = None;
                entities_detached += 1;
            }
        }
        let matrix_cells_removed = self.statuses.remove_column(id);

        let report = CascadeReport {
            entities_detached,
            matrix_cells_removed,
            ..CascadeReport::default()
        };
        if removed || entities_detached > 0 || matrix_cells_removed > 0 {
            (ActionOutcome::Applied, report)
        } else {
            (ActionOutcome::NoOp(NoOpReason::UnknownStation), report)
        }
    }

    /// Swap a station with its neighbour. No wraparound at either end.
    pub fn move_station(&mut self, id: &StationId, direction: Direction) -> ActionOutcome {
        let Some(index) = self.station_index(id) else {
            return ActionOutcome::NoOp(NoOpReason::UnknownStation);
        };
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&next| next < self.stations.len()),
        };
        match target {
            Some(target) => {
                self.stations.swap(index, target);
                ActionOutcome::Applied
            }
            None => ActionOutcome::NoOp(NoOpReason::AtBoundary),
        }
    }

    /// Append an entity and make sure it has a matrix row. Ids are not checked
    /// for uniqueness; an existing row for the same id is kept.
    pub fn add_entity(&mut self, entity: Entity) -> ActionOutcome {
        self.statuses.ensure_row(&entity.id);
        self.entities.push(entity);
        ActionOutcome::Applied
    }

    /// Remove an entity and its matrix row.
    pub fn delete_entity(&mut self, id: &EntityId) -> (ActionOutcome, CascadeReport) {
        let before = self.entities.len();
        self.entities.retain(|entity| &entity.id != id);
        let entity_removed = self.entities.len() != before;
        let row_removed = self.statuses.remove_row(id);

        let report = CascadeReport {
            matrix_rows_removed: usize::from(row_removed),
            ..CascadeReport::default()
        };
        if entity_removed || row_removed {
            (ActionOutcome::Applied, report)
        } else {
            (ActionOutcome::NoOp(NoOpReason::UnknownEntity), report)
        }
    }

    /// Point an entity at a station, or at none. The station id is not
    /// validated; readers resolve dangling ids to "no station".
    pub fn set_entity_station(
        &mut self,
        id: &EntityId,
        station: Option<StationId>,
    ) -> ActionOutcome {
        let mut matched = false;
        for entity in self.entities.iter_mut().filter(|entity| &entity.id == id) {
            entity.current_station_id = station.clone();
            matched = true;
        }
        if matched {
            ActionOutcome::Applied
        } else {
            ActionOutcome::NoOp(NoOpReason::UnknownEntity)
        }
    }

    /// Advance one matrix cell through `unset -> pass -> fail -> unset`,
    /// creating the row if needed. Returns the new status.
    pub fn toggle_matrix_cell(
        &mut self,
        entity: &EntityId,
        station: &StationId,
    ) -> (ActionOutcome, StepStatus) {
        let status = self.statuses.toggle(entity, station);
        (ActionOutcome::Applied, status)
    }

    /// Whether `station` would be a dangling reference.
    pub fn is_dangling_station(&self, station: &StationId) -> bool {
        self.station(station).is_none()
    }
}
