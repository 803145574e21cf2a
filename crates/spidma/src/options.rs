//! Kernel options
//!
//! Parsed from a command line of whitespace separated `key=value` pairs:
//!
//! | Key        | Value             | Default          |
//! |------------|-------------------|------------------|
//! | `logdev`   | log device name   | none (screen)    |
//! | `loglevel` | 0 (panic)..4      | 4 (debug)        |
//! | `width`    | screen width      | 0 (auto)         |
//! | `height`   | screen height     | 0 (auto)         |
//!
//! Unknown keys and malformed values are ignored.

use platform::log::LOG_DEVICE_NAME_LEN;
use platform::{LogSeverity, LogTarget};

/// Options the kernel was started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelOptions {
    log_device: Option<heapless::String<LOG_DEVICE_NAME_LEN>>,
    log_level: LogSeverity,
    width: u32,
    height: u32,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            log_device: None,
            log_level: LogSeverity::Debug,
            width: 0,
            height: 0,
        }
    }
}

impl KernelOptions {
    /// Parse a kernel command line.
    pub fn parse(cmdline: &str) -> Self {
        let mut options = Self::default();
        for (key, value) in cmdline
            .split_ascii_whitespace()
            .filter_map(|token| token.split_once('='))
        {
            match key {
                "logdev" => {
                    options.log_device = heapless::String::try_from(value)
                        .ok()
                        .filter(|name| !name.is_empty());
                }
                "loglevel" => {
                    if let Some(level) = value.parse::<u8>().ok().filter(|l| *l <= 4) {
                        options.log_level = LogSeverity::from_level(level);
                    }
                }
                "width" => {
                    if let Ok(width) = value.parse() {
                        options.width = width;
                    }
                }
                "height" => {
                    if let Ok(height) = value.parse() {
                        options.height = height;
                    }
                }
                _ => {}
            }
        }
        options
    }

    /// Configured log device, if any
    pub fn log_device(&self) -> Option<&str> {
        self.log_device.as_deref()
    }

    /// Where the logger writes: the named device, else the screen
    pub fn log_target(&self) -> LogTarget {
        LogTarget::from_device_name(self.log_device())
    }

    /// Least severe message that is still logged
    pub fn log_level(&self) -> LogSeverity {
        self.log_level
    }

    /// Requested screen width (0 = auto)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Requested screen height (0 = auto)
    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cmdline_logs_everything_to_screen() {
        let options = KernelOptions::parse("");
        assert_eq!(options, KernelOptions::default());
        assert_eq!(options.log_target(), LogTarget::Screen);
        assert_eq!(options.log_level(), LogSeverity::Debug);
    }

    #[test]
    fn logdev_selects_named_device() {
        let options = KernelOptions::parse("logdev=ttyS1 loglevel=3");
        assert_eq!(options.log_device(), Some("ttyS1"));
        assert_eq!(
            options.log_target(),
            LogTarget::Device(heapless::String::try_from("ttyS1").unwrap_or_default())
        );
        assert_eq!(options.log_level(), LogSeverity::Notice);
    }

    #[test]
    fn empty_logdev_means_screen() {
        assert_eq!(KernelOptions::parse("logdev=").log_target(), LogTarget::Screen);
    }

    #[test]
    fn out_of_range_level_is_ignored() {
        assert_eq!(
            KernelOptions::parse("loglevel=9").log_level(),
            LogSeverity::Debug
        );
        assert_eq!(
            KernelOptions::parse("loglevel=x").log_level(),
            LogSeverity::Debug
        );
    }

    #[test]
    fn screen_size_and_unknown_keys() {
        let options = KernelOptions::parse("width=640 foo=bar height=480 keymap=DE bogus");
        assert_eq!(options.width(), 640);
        assert_eq!(options.height(), 480);
    }

    #[test]
    fn later_values_override_earlier_ones() {
        let options = KernelOptions::parse("loglevel=1 loglevel=2");
        assert_eq!(options.log_level(), LogSeverity::Warning);
    }
}
