//! Kernel-side logging: source tag + runtime level filter over a [`Logger`].

use core::fmt;

use platform::{LogSeverity, LogTarget, Logger};

/// Tags every message with one source and drops those less severe than
/// the configured level.
pub struct KernelLog<L> {
    logger: L,
    source: &'static str,
    level: LogSeverity,
}

impl<L: Logger> KernelLog<L> {
    /// Wrap `logger`; messages less severe than `level` are dropped.
    pub fn new(logger: L, source: &'static str, level: LogSeverity) -> Self {
        Self {
            logger,
            source,
            level,
        }
    }

    /// Attach the wrapped logger to `target` and return the target in use.
    ///
    /// A device the logger does not know falls back to the screen.
    pub fn initialize(&mut self, target: LogTarget) -> Result<LogTarget, L::Error> {
        let target = match target {
            LogTarget::Device(name) if !self.logger.has_device(&name) => LogTarget::Screen,
            other => other,
        };
        self.logger.initialize(&target)?;
        Ok(target)
    }

    /// `severity` passes the level filter
    pub fn enabled(&self, severity: LogSeverity) -> bool {
        severity <= self.level
    }

    /// Write one message if it passes the filter.
    pub fn write(&mut self, severity: LogSeverity, message: fmt::Arguments<'_>) {
        if self.enabled(severity) {
            self.logger.write(self.source, severity, message);
        }
    }

    /// Panic severity; the caller stops afterwards
    pub fn panic(&mut self, message: fmt::Arguments<'_>) {
        self.write(LogSeverity::Panic, message);
    }

    /// Error severity
    pub fn error(&mut self, message: fmt::Arguments<'_>) {
        self.write(LogSeverity::Error, message);
    }

    /// Warning severity
    pub fn warning(&mut self, message: fmt::Arguments<'_>) {
        self.write(LogSeverity::Warning, message);
    }

    /// Notice severity
    pub fn notice(&mut self, message: fmt::Arguments<'_>) {
        self.write(LogSeverity::Notice, message);
    }

    /// Debug severity
    pub fn debug(&mut self, message: fmt::Arguments<'_>) {
        self.write(LogSeverity::Debug, message);
    }

    /// Wrapped logger
    pub fn inner(&self) -> &L {
        &self.logger
    }
}

/// Displays bytes as text, escaping anything that is not printable ASCII.
pub struct Escaped<'a>(pub &'a [u8]);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            fmt::Display::fmt(&core::ascii::escape_default(*byte), f)?;
        }
        Ok(())
    }
}
