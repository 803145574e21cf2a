//! Logger abstraction
//!
//! Messages carry a source tag and a severity. Where the text ends up
//! (RTT, a UART, the screen, a host terminal) is the logger's business.

use core::fmt;

/// Maximum length of a log device name (`ttyS1`, `rtt`, ...)
pub const LOG_DEVICE_NAME_LEN: usize = 16;

/// Log severity, most severe first.
///
/// Numeric levels match the `loglevel=` kernel option: 0 = panic .. 4 = debug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogSeverity {
    /// Fatal condition; the system stops after logging it
    Panic = 0,
    /// Error
    Error = 1,
    /// Warning
    Warning = 2,
    /// Normal but noteworthy
    Notice = 3,
    /// Debug output
    Debug = 4,
}

impl LogSeverity {
    /// Severity for a numeric level. Levels above 4 clamp to `Debug`.
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Panic,
            1 => Self::Error,
            2 => Self::Warning,
            3 => Self::Notice,
            _ => Self::Debug,
        }
    }

    /// Numeric level
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }

    /// Short tag used in log lines
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Panic => "!PANIC!",
            Self::Error => "ERROR",
            Self::Warning => "WARN",
            Self::Notice => "",
            Self::Debug => "DEBUG",
        }
    }
}

/// Where the logger writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// The activity display (fallback when no device is named)
    Screen,
    /// A named output device
    Device(heapless::String<LOG_DEVICE_NAME_LEN>),
}

impl LogTarget {
    /// Target for an optional device name. Empty or over-long names fall
    /// back to the screen.
    #[must_use]
    pub fn from_device_name(name: Option<&str>) -> Self {
        match name {
            Some(name) if !name.is_empty() => heapless::String::try_from(name)
                .map(Self::Device)
                .unwrap_or(Self::Screen),
            _ => Self::Screen,
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screen => f.write_str("screen"),
            Self::Device(name) => f.write_str(name),
        }
    }
}

/// Log sink
pub trait Logger {
    /// Error type
    type Error: core::fmt::Debug;

    /// Attach the logger to its output. Called after the screen and serial
    /// console are up, so either can be the target.
    fn initialize(&mut self, target: &LogTarget) -> Result<(), Self::Error>;

    /// `name` is an output device this logger can write to.
    fn has_device(&self, name: &str) -> bool;

    /// Emit one message.
    fn write(&mut self, source: &str, severity: LogSeverity, message: fmt::Arguments<'_>);
}
