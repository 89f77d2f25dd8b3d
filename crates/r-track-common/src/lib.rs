//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Shared primitives and utilities for the tracking runtime."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Core shared primitives for the R-TRACK workspace.
//! This crate exposes configuration loading and the tracing bootstrap
//! consumed by the store and the control CLI.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, DashboardConfig, JournalConfig, LoadedAppConfig, LoggingConfig, MetricsConfig,
    StoreConfig,
};
pub use logging::{init_tracing, resolve_filter, FilterSource, LogFormat};
