//! Explicit logging handle.
//!
//! Providers, sinks and the orchestrator log through a [`Telemetry`] value
//! handed to them at construction instead of the `log` macros, so the core
//! never depends on a process-wide logger. The binary builds an
//! `env_logger::Logger` and wraps it; tests use [`Telemetry::silent`] or a
//! capturing logger from [`crate::hal::mock`].

use std::fmt;
use std::sync::Arc;

use log::{Level, Log, Metadata, Record};

/// Cloneable logging handle with a fixed target.
#[derive(Clone)]
pub struct Telemetry {
    logger: Arc<dyn Log>,
    target: &'static str,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("target", &self.target)
            .finish()
    }
}

impl Telemetry {
    /// Wrap any `log::Log` implementation.
    pub fn new(logger: impl Log + 'static) -> Self {
        Self::from_arc(Arc::new(logger))
    }

    /// Wrap an already shared logger.
    pub fn from_arc(logger: Arc<dyn Log>) -> Self {
        Self {
            logger,
            target: "rs_inky",
        }
    }

    /// A handle that drops every record.
    pub fn silent() -> Self {
        Self::new(Silent)
    }

    /// Same sink, different target (one per provider or backend).
    pub fn scoped(&self, target: &'static str) -> Self {
        Self {
            logger: Arc::clone(&self.logger),
            target,
        }
    }

    /// Current target.
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Emit one record at `level`.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(self.target)
            .build();
        if !self.logger.enabled(&metadata) {
            return;
        }
        self.logger.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(self.target))
                .build(),
        );
    }

    /// Debug-level record.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    /// Info-level record.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    /// Warn-level record.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    /// Error-level record.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Flush the underlying logger.
    pub fn flush(&self) {
        self.logger.flush();
    }
}

struct Silent;

impl Log for Silent {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        false
    }

    fn log(&self, _: &Record<'_>) {}

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::CaptureLog;

    #[test]
    fn records_carry_scoped_target() {
        let capture = CaptureLog::new();
        let telemetry = Telemetry::new(capture.clone()).scoped("rs_inky::train");
        telemetry.warn(format_args!("no services to {}", "LBG"));

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "WARN rs_inky::train: no services to LBG");
    }

    #[test]
    fn silent_drops_everything() {
        let telemetry = Telemetry::silent();
        telemetry.error(format_args!("ignored"));
        assert_eq!(telemetry.target(), "rs_inky");
    }
}
