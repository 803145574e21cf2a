//! Board description: one concrete driver per collaborator.

use crate::{ActivityDisplay, InterruptController, Logger, SerialPort, SpiMaster, Timer};

/// Binds the collaborator traits to the drivers of one target.
///
/// Hardware builds bind embassy-stm32 adapters, host tests bind
/// [`crate::mocks::MockBoard`].
pub trait Board {
    /// Screen or status LED
    type Screen: ActivityDisplay;
    /// Serial console
    type Serial: SerialPort;
    /// Log sink
    type Logger: Logger;
    /// Interrupt controller
    type Interrupt: InterruptController;
    /// System timer
    type Timer: Timer;
    /// SPI master with DMA engine
    type Spi: SpiMaster;
}

/// Owned set of collaborator drivers for a [`Board`].
pub struct Devices<B: Board> {
    /// Screen or status LED
    pub screen: B::Screen,
    /// Serial console
    pub serial: B::Serial,
    /// Log sink
    pub logger: B::Logger,
    /// Interrupt controller
    pub interrupt: B::Interrupt,
    /// System timer
    pub timer: B::Timer,
    /// SPI master with DMA engine
    pub spi: B::Spi,
}
