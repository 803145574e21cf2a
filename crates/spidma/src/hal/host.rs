//! Desktop collaborators for the emulator: tokio timer, tracing logger

use core::convert::Infallible;
use core::fmt;

use platform::{LogSeverity, LogTarget, Logger, Timer};
use tokio::time::Duration;

/// Wall-clock timer on tokio
#[derive(Debug, Default)]
pub struct TokioTimer;

impl TokioTimer {
    /// Timer on the current tokio runtime
    pub fn new() -> Self {
        Self
    }
}

impl Timer for TokioTimer {
    type Error = Infallible;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn delay_ms(&mut self, ms: u32) {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
    }
}

/// Device name the tracing logger accepts for `logdev=`
pub const STDOUT_DEVICE: &str = "stdout";

/// Logger forwarding to `tracing`; install a subscriber before use.
#[derive(Debug, Default)]
pub struct TracingLogger {
    target: Option<LogTarget>,
}

impl TracingLogger {
    /// Logger not yet attached to a target
    pub fn new() -> Self {
        Self::default()
    }

    /// Target passed to `initialize`
    pub fn target(&self) -> Option<&LogTarget> {
        self.target.as_ref()
    }
}

impl Logger for TracingLogger {
    type Error = Infallible;

    fn initialize(&mut self, target: &LogTarget) -> Result<(), Self::Error> {
        tracing::debug!(%target, "logger attached");
        self.target = Some(target.clone());
        Ok(())
    }

    fn has_device(&self, name: &str) -> bool {
        name == STDOUT_DEVICE
    }

    fn write(&mut self, source: &str, severity: LogSeverity, message: fmt::Arguments<'_>) {
        match severity {
            LogSeverity::Panic => tracing::error!(source, panic = true, "{message}"),
            LogSeverity::Error => tracing::error!(source, "{message}"),
            LogSeverity::Warning => tracing::warn!(source, "{message}"),
            LogSeverity::Notice => tracing::info!(source, "{message}"),
            LogSeverity::Debug => tracing::debug!(source, "{message}"),
        }
    }
}
