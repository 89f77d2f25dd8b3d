//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Shared primitives and utilities for the tracking runtime."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "R_TRACK_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

static GUARDS: OnceCell<[WorkerGuard; 2]> = OnceCell::new();

/// Console log formats. The rolling file is always JSON.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    StructuredJson,
    #[default]
    Pretty,
    /// One line per event without timestamps, for interactive CLI runs.
    Compact,
}

/// Where the active filter directive came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSource {
    /// `R_TRACK_LOG`.
    Override,
    /// `R_TRACK_LOG` could not be parsed; the default was used instead.
    InvalidOverride(String),
    /// `RUST_LOG`.
    RustLog,
    Default,
}

/// Build the event filter from an explicit directive (normally `R_TRACK_LOG`),
/// then `RUST_LOG`, then `info`.
pub fn resolve_filter(directive: Option<&str>) -> (EnvFilter, FilterSource) {
    match directive {
        Some(directive) => match EnvFilter::try_new(directive) {
            Ok(filter) => (filter, FilterSource::Override),
            Err(err) => (
                EnvFilter::new(DEFAULT_DIRECTIVE),
                FilterSource::InvalidOverride(err.to_string()),
            ),
        },
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, FilterSource::RustLog),
            Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), FilterSource::Default),
        },
    }
}

fn console_layer<S>(format: LogFormat, writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .json()
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(writer)
            .boxed(),
    }
}

/// Install the global subscriber: console events on stderr, so command
/// output on stdout stays parseable, plus a daily rolling JSON file named
/// after `file_prefix` (or the service).
///
/// Calling it again keeps the first subscriber.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)?;
    let prefix = config.file_prefix.as_deref().unwrap_or(service_name);

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(daily(&config.directory, format!("{prefix}.log")));
    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = GUARDS.set([file_guard, stderr_guard]);

    let override_directive = std::env::var(LOG_ENV).ok();
    let (filter, source) = resolve_filter(override_directive.as_deref());

    let file_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .json()
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(config.format, stderr_writer))
        .with(file_layer)
        .try_init()
        .ok();

    if let FilterSource::InvalidOverride(reason) = &source {
        warn!(variable = LOG_ENV, %reason, "ignoring invalid log filter");
    }
    info!(
        service = %service_name,
        log_dir = %config.directory.display(),
        format = ?config.format,
        filter = ?source,
        "tracing initialised"
    );
    Ok(())
}
