//! Peripheral abstraction layer
//!
//! Trait-based access to the SPI master DMA engine and the serial console.
//! Concrete drivers live behind these traits; the harness only ever calls
//! `initialize`, `write_read`, `read` and `write`.

/// SPI master with a DMA-backed transfer engine.
///
/// The returned future resolves when the DMA engine reports completion
/// (on hardware this is the DMA transfer-complete interrupt waking the
/// task). Dropping the future before it resolves aborts the transfer.
pub trait SpiMaster {
    /// Error type
    type Error: core::fmt::Debug;

    /// Bring the SPI block and its DMA channels up.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Full-duplex transfer: clock out `write` while filling `read`.
    ///
    /// Callers guarantee `read.len() == write.len()`.
    fn write_read(
        &mut self,
        chip_select: ChipSelect,
        read: &mut [u8],
        write: &[u8],
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Active bus configuration
    fn config(&self) -> SpiConfig;
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// SPI mode (CPOL, CPHA)
    pub mode: SpiMode,
    /// Bit order
    pub bit_order: BitOrder,
}

impl SpiConfig {
    /// MSB-first configuration for the given clock and mode.
    #[must_use]
    pub const fn new(frequency: u32, mode: SpiMode) -> Self {
        Self {
            frequency,
            mode,
            bit_order: BitOrder::MsbFirst,
        }
    }
}

/// SPI modes (CPOL, CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Mode from clock polarity and phase bits.
    #[must_use]
    pub const fn from_polarity_phase(cpol: bool, cpha: bool) -> Self {
        match (cpol, cpha) {
            (false, false) => Self::Mode0,
            (false, true) => Self::Mode1,
            (true, false) => Self::Mode2,
            (true, true) => Self::Mode3,
        }
    }

    /// Clock idles high
    #[must_use]
    pub const fn polarity(self) -> bool {
        matches!(self, Self::Mode2 | Self::Mode3)
    }

    /// Data captured on the second clock edge
    #[must_use]
    pub const fn phase(self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode3)
    }
}

/// Bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Hardware chip-select line of the SPI master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelect {
    /// CE0
    Ce0,
    /// CE1
    Ce1,
}

impl ChipSelect {
    /// Line number (0 or 1)
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ce0 => 0,
            Self::Ce1 => 1,
        }
    }
}

/// Chip select number outside `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("chip select {0} does not exist (only 0 and 1)")]
pub struct ChipSelectError(pub u8);

impl TryFrom<u8> for ChipSelect {
    type Error = ChipSelectError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ce0),
            1 => Ok(Self::Ce1),
            other => Err(ChipSelectError(other)),
        }
    }
}

/// Outcome reported by the DMA engine when a transfer finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStatus {
    /// All bytes were clocked in both directions
    Completed,
    /// The engine reported an error (overrun, DMA fault, bad arguments)
    Failed,
}

impl TransferStatus {
    /// `true` for [`TransferStatus::Completed`]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl<E> From<Result<(), E>> for TransferStatus {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(_) => Self::Failed,
        }
    }
}

/// Serial console abstraction
pub trait SerialPort {
    /// Error type
    type Error: core::fmt::Debug;

    /// Configure the UART for `baud_rate` and start receiving.
    fn initialize(&mut self, baud_rate: u32) -> Result<(), Self::Error>;

    /// Copy whatever has been received so far into `buffer`.
    ///
    /// Never waits for data: returns `Ok(0)` when nothing is pending.
    fn read(
        &mut self,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;

    /// Write data
    fn write(&mut self, data: &[u8])
        -> impl core::future::Future<Output = Result<(), Self::Error>>;
}
