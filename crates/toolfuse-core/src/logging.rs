//! Tracing macros for the toolfuse compiler and runtime.
//!
//! Each macro targets its own subsystem so subscribers can filter on
//! `toolfuse::compiler`, `toolfuse::dag`, `toolfuse::scheduler`, or
//! `toolfuse::ops` independently.
//!
//! When the `no-trace` feature is enabled, all macros compile to nothing
//! for zero overhead in production/benchmark builds.

use std::fmt::Display;

/// Logging level for compiler and scheduler diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Critical errors that prevent compilation or execution.
    Error,
    /// Warnings about potential issues.
    Warn,
    /// Informational messages.
    Info,
    /// Debugging information.
    Debug,
    /// Detailed tracing information.
    Trace,
}

/// Log a message at the specified level, tagged with its subsystem.
///
/// A convenience bridge for embedders that already have a message string;
/// the subsystem macros below are preferred for structured fields.
#[inline]
pub fn log<M: Display>(level: Level, subsystem: &str, message: M) {
    match level {
        Level::Error => tracing::event!(
            tracing::Level::ERROR,
            subsystem = subsystem,
            message = format!("{message}")
        ),
        Level::Warn => tracing::event!(
            tracing::Level::WARN,
            subsystem = subsystem,
            message = format!("{message}")
        ),
        Level::Info => tracing::event!(
            tracing::Level::INFO,
            subsystem = subsystem,
            message = format!("{message}")
        ),
        Level::Debug => tracing::event!(
            tracing::Level::DEBUG,
            subsystem = subsystem,
            message = format!("{message}")
        ),
        Level::Trace => tracing::event!(
            tracing::Level::TRACE,
            subsystem = subsystem,
            message = format!("{message}")
        ),
    }
}

// ---- With tracing enabled (default) ----

/// Trace compilation events (grouping, savings estimation, cache activity).
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! fuse_compile {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "toolfuse::compiler", $($arg)*)
    }
}

/// Trace dependency-graph construction and cycle detection.
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! fuse_dag {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "toolfuse::dag", $($arg)*)
    }
}

/// Trace scheduler-level events (stage boundaries, readiness, completion).
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! fuse_sched {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "toolfuse::scheduler", $($arg)*)
    }
}

/// Trace operation dispatch and completion.
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! fuse_op {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "toolfuse::ops", $($arg)*)
    }
}

// ---- With tracing disabled (no-trace feature) ----

/// Trace compilation events - compiles to nothing when no-trace is enabled.
#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! fuse_compile {
    ($level:ident, $($arg:tt)*) => {};
}

/// Trace dependency-graph events - compiles to nothing when no-trace is enabled.
#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! fuse_dag {
    ($level:ident, $($arg:tt)*) => {};
}

/// Trace scheduler-level events - compiles to nothing when no-trace is enabled.
#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! fuse_sched {
    ($level:ident, $($arg:tt)*) => {};
}

/// Trace operation dispatch/completion - compiles to nothing when no-trace is enabled.
#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! fuse_op {
    ($level:ident, $($arg:tt)*) => {};
}
