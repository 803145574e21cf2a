//! Compile-time configuration of the harness.

use platform::{ChipSelect, SpiConfig, SpiMode};

/// Serial console baud rate
pub const SERIAL_BAUD: u32 = 3_000_000;

/// SPI clock frequency in Hz
pub const SPI_CLOCK_SPEED: u32 = 16_000_000;

/// Clock polarity (idle low)
pub const SPI_CPOL: bool = false;

/// Clock phase (sample on the leading edge)
pub const SPI_CPHA: bool = false;

/// Bus configuration handed to the SPI master
pub const SPI_CONFIG: SpiConfig = SpiConfig::new(
    SPI_CLOCK_SPEED,
    SpiMode::from_polarity_phase(SPI_CPOL, SPI_CPHA),
);

/// Chip select line used for the test transfer (CE0)
pub const SPI_CHIP_SELECT: ChipSelect = ChipSelect::Ce0;

/// Bytes clocked per transfer
pub const TEST_DATA_LENGTH: usize = 2000;

/// Upper bound for [`TEST_DATA_LENGTH`]
pub const MAX_TEST_DATA_LENGTH: usize = 50_000;

const _: () = assert!(
    TEST_DATA_LENGTH <= MAX_TEST_DATA_LENGTH,
    "TEST_DATA_LENGTH too big"
);

/// Capacity of the serial receive buffer
pub const SERIAL_BUFFER_LEN: usize = 100;

/// Serial input that requests a reboot
pub const REBOOT_MAGIC: &[u8] = b"tAgHQP3Lw2NZcW8Uru7jnf";

/// Received bytes shown in the debug hexdump
pub const HEXDUMP_LIMIT: usize = 128;

/// Delay at the top of every loop iteration
pub const POLL_PERIOD_MS: u32 = 1000;

/// Pause after serial data arrived
pub const RECEIVE_PAUSE_MS: u32 = 4000;

/// Pattern the RX buffer is pre-filled with before each transfer
pub const RX_FILL_BYTE: u8 = 0x55;

/// Source tag of all kernel log messages
pub const LOG_SOURCE: &str = "kernel";

/// Activity LED blinks at construction
pub const STARTUP_BLINKS: u32 = 5;

/// Unix timestamp of the build, written by build.rs; see [`compile_time`]
pub const BUILD_TIMESTAMP: &str = env!("SPIDMA_BUILD_TIMESTAMP");

/// Build time as shown by the "Compile time:" banner
pub fn compile_time() -> CompileTime {
    CompileTime(BUILD_TIMESTAMP.parse().unwrap_or(0))
}

/// Unix seconds displayed as UTC in `__DATE__ __TIME__` form,
/// e.g. `Oct 19 2026 12:34:56`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileTime(pub u64);

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl CompileTime {
    /// (year, month 1..=12, day 1..=31) of the UTC date
    // Days-to-civil on the proleptic Gregorian calendar, counting 400-year
    // eras from 0000-03-01. Every intermediate stays far below u64::MAX.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn date(self) -> (u64, u64, u64) {
        let z = self.0 / 86_400 + 719_468;
        let era = z / 146_097;
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = yoe + era * 400 + u64::from(month <= 2);
        (year, month, day)
    }

    /// (hours, minutes, seconds) of the UTC time of day
    #[allow(clippy::arithmetic_side_effects)]
    pub fn time(self) -> (u64, u64, u64) {
        let secs = self.0 % 86_400;
        (secs / 3600, secs % 3600 / 60, secs % 60)
    }
}

impl core::fmt::Display for CompileTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (year, month, day) = self.date();
        let (hour, minute, second) = self.time();
        let name = usize::try_from(month.saturating_sub(1))
            .ok()
            .and_then(|i| MONTHS.get(i))
            .copied()
            .unwrap_or("???");
        write!(f, "{name} {day:>2} {year} {hour:02}:{minute:02}:{second:02}")
    }
}

/// Kernel command line baked in at build time (`SPIDMA_CMDLINE`)
pub const BUILD_CMDLINE: &str = match option_env!("SPIDMA_CMDLINE") {
    Some(cmdline) => cmdline,
    None => "",
};
