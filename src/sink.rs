//! Injected logging and progress sinks shared by every component.
//!
//! The core never depends on a concrete logging crate. Callers pass a
//! `&dyn Logger` (and, for long-running operations, an optional
//! `&dyn ProgressSink`) so the CLI, a future GUI, or a test can each wire up
//! their own presentation without the core taking a dependency on any of
//! them. Skipped or degraded steps always produce exactly one log line.

/// Receives one human-readable line per skipped/degraded step or notable
/// event. Implementations must not panic.
pub trait Logger {
    fn log(&self, message: &str);
}

/// Receives periodic `(done, total, phase)` updates. Purely advisory:
/// nothing in the core depends on progress callbacks being invoked at any
/// particular cadence, or at all.
pub trait ProgressSink {
    fn progress(&self, done: usize, total: usize, phase: &str);
}

/// A logger that discards everything. Used by components exercised as pure
/// functions (the Scanner) and in tests that don't care about log output.
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _message: &str) {}
}

/// A logger that writes to stderr, prefixed so it's visible alongside normal
/// CLI output on stdout.
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&self, message: &str) {
        eprintln!("{message}");
    }
}

impl<F: Fn(&str)> Logger for F {
    fn log(&self, message: &str) {
        self(message)
    }
}

impl<F: Fn(usize, usize, &str)> ProgressSink for F {
    fn progress(&self, done: usize, total: usize, phase: &str) {
        self(done, total, phase)
    }
}
