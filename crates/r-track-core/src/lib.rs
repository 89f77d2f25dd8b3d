//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Application state store for R-TRACK: the data model, the operations that
//! keep it consistent, and the read-only views consumers render.

pub mod action;
pub mod bootstrap;
pub mod forms;
pub mod ids;
pub mod journal;
pub mod metrics;
pub mod model;
pub mod seed;
pub mod state;
pub mod store;
pub mod view;

pub use action::{Action, ActionOutcome, Direction, NoOpReason};
pub use bootstrap::{build_store, hydrate, Bootstrap, StateSource};
pub use ids::{uid, uid_with_prefix, IdSource, RandomIds, SequentialIds};
pub use journal::ActionJournal;
pub use metrics::{SharedRegistry, StoreMetrics};
pub use model::{
    AttributeDefinition, AttributeKind, AttributeTag, AttributeValue, Configuration, Entity,
    EntityId, Station, StationId, StatusMatrix, StepStatus,
};
pub use state::{AppState, CascadeReport};
pub use store::AppStore;
