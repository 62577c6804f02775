//! Diagnostics sinks.
//!
//! The optimizer never reaches for a global logger. Callers hand it a
//! [`DiagnosticSink`]; [`TracingSink`] forwards to `tracing`, [`CaptureSink`]
//! keeps messages in memory.

use std::sync::Mutex;

use crate::optimizer::OptimizeReport;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Verbose tracing of what the optimizer did.
    Debug,
    /// Something the caller may want to look at; never a failure.
    Warn,
}

/// Receiver for optimizer diagnostics.
///
/// Messages arrive in the order they were produced.
pub trait DiagnosticSink {
    /// True if debug-level messages will be kept. Lets callers skip building
    /// expensive serializations.
    fn debug_enabled(&self) -> bool;

    /// Delivers one message.
    fn log(&self, level: Level, msg: &str);

    /// Shorthand for [`Level::Debug`].
    fn debug(&self, msg: &str) {
        self.log(Level::Debug, msg);
    }

    /// Shorthand for [`Level::Warn`].
    fn warn(&self, msg: &str) {
        self.log(Level::Warn, msg);
    }

    /// Receives the final report of a non-empty optimization, after the
    /// summary message. Ignored by default.
    fn report(&self, _report: &OptimizeReport) {}
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn debug_enabled(&self) -> bool {
        tracing::enabled!(target: "vfx_opt::optimizer", tracing::Level::DEBUG)
    }

    fn log(&self, level: Level, msg: &str) {
        match level {
            Level::Debug => tracing::debug!(target: "vfx_opt::optimizer", "{}", msg),
            Level::Warn => tracing::warn!(target: "vfx_opt::optimizer", "{}", msg),
        }
    }

    fn report(&self, report: &OptimizeReport) {
        tracing::debug!(
            target: "vfx_opt::optimizer",
            original_len = report.original_len,
            final_len = report.final_len,
            passes = report.passes,
            noops_removed = report.noops_removed,
            inverse_pairs_removed = report.inverse_pairs_removed,
            ops_combined = report.ops_combined,
            outcome = ?report.outcome,
            "optimization finished"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn debug_enabled(&self) -> bool {
        false
    }

    fn log(&self, _level: Level, _msg: &str) {}
}

/// Records messages in memory.
#[derive(Debug)]
pub struct CaptureSink {
    debug: bool,
    messages: Mutex<Vec<(Level, String)>>,
}

impl CaptureSink {
    /// Creates a sink. With `debug == false` only warnings are kept.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.lock().clone()
    }

    /// Recorded messages at `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Level, String)>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for CaptureSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DiagnosticSink for CaptureSink {
    fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn log(&self, level: Level, msg: &str) {
        if level == Level::Debug && !self.debug {
            return;
        }
        self.lock().push((level, msg.to_string()));
    }
}
