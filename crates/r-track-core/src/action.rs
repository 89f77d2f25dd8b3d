//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::{AttributeDefinition, Entity, EntityId, Station, StationId};

/// Direction for [`Action::MoveStation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// The closed set of store mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetEntityLabels { singular: String, plural: String },
    AddAttribute { definition: AttributeDefinition },
    RemoveAttribute { key: String },
    AddStation { station: Station },
    RemoveStation { id: StationId },
    MoveStation { id: StationId, direction: Direction },
    AddEntity { entity: Entity },
    DeleteEntity { id: EntityId },
    SetEntityStation {
        id: EntityId,
        #[serde(default)]
        station: Option<StationId>,
    },
    ToggleMatrixCell { entity: EntityId, station: StationId },
}

impl Action {
    /// Short dotted name used in logs, metrics and the journal.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetEntityLabels { .. } => "config.set_labels",
            Action::AddAttribute { .. } => "attribute.add",
            Action::RemoveAttribute { .. } => "attribute.remove",
            Action::AddStation { .. } => "station.add",
            Action::RemoveStation { .. } => "station.remove",
            Action::MoveStation { .. } => "station.move",
            Action::AddEntity { .. } => "entity.add",
            Action::DeleteEntity { .. } => "entity.delete",
            Action::SetEntityStation { .. } => "entity.set_station",
            Action::ToggleMatrixCell { .. } => "matrix.toggle",
        }
    }

    /// Entity the action targets, if any.
    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            Action::AddEntity { entity } => Some(&entity.id),
            Action::DeleteEntity { id } | Action::SetEntityStation { id, .. } => Some(id),
            Action::ToggleMatrixCell { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// Station the action targets, if any.
    pub fn station_id(&self) -> Option<&StationId> {
        match self {
            Action::AddStation { station } => Some(&station.id),
            Action::RemoveStation { id } | Action::MoveStation { id, .. } => Some(id),
            Action::SetEntityStation { station, .. } => station.as_ref(),
            Action::ToggleMatrixCell { station, .. } => Some(station),
            _ => None,
        }
    }
}

/// Why an action left the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoOpReason {
    DuplicateAttributeKey,
    UnknownAttribute,
    UnknownStation,
    UnknownEntity,
    AtBoundary,
}

/// Result of applying one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    NoOp(NoOpReason),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionOutcome::Applied => "applied",
            ActionOutcome::NoOp(_) => "noop",
        }
    }
}
