//! ---
//! trk_section: "03-persistence-logging"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Structured logging adapters and sinks."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---

/// Shared expansion for the level-specific macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! __trk_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            action = ctx.action.unwrap_or(""),
            entity = ctx.entity.unwrap_or(""),
            station = ctx.station.unwrap_or(""),
            revision = ctx.revision.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with store context.
#[macro_export]
macro_rules! trk_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__trk_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__trk_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with store context.
#[macro_export]
macro_rules! trk_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__trk_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__trk_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with store context.
#[macro_export]
macro_rules! trk_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__trk_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__trk_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}
