//! SPI master over an `embedded-hal-async` bus with two chip-select lines
//!
//! The bus owns SCK/MOSI/MISO and its DMA channels; CE0/CE1 are plain GPIO
//! outputs driven here (active low). `ExclusiveDevice` only manages a
//! single CS line, so selection is done by hand.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;
use platform::{ChipSelect, SpiConfig, SpiMaster};

/// Error from [`BusSpiMaster`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError<S, P> {
    /// The SPI bus (or its DMA channels) failed
    Bus(S),
    /// Driving a chip-select line failed
    ChipSelect(P),
    /// Transfer attempted before `initialize`
    NotInitialized,
}

/// [`SpiMaster`] built from an async [`SpiBus`] and chip-select pins.
pub struct BusSpiMaster<B, CS> {
    bus: B,
    ce0: CS,
    ce1: CS,
    config: SpiConfig,
    initialized: bool,
}

impl<B, CS> BusSpiMaster<B, CS>
where
    B: SpiBus<u8>,
    CS: OutputPin,
{
    /// `bus` must already run at `config`; `ce0`/`ce1` are the select lines.
    pub fn new(bus: B, ce0: CS, ce1: CS, config: SpiConfig) -> Self {
        Self {
            bus,
            ce0,
            ce1,
            config,
            initialized: false,
        }
    }

    /// Give back the bus and pins
    pub fn release(self) -> (B, CS, CS) {
        (self.bus, self.ce0, self.ce1)
    }

    fn line(&mut self, chip_select: ChipSelect) -> &mut CS {
        match chip_select {
            ChipSelect::Ce0 => &mut self.ce0,
            ChipSelect::Ce1 => &mut self.ce1,
        }
    }
}

impl<B, CS> SpiMaster for BusSpiMaster<B, CS>
where
    B: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = BusError<B::Error, CS::Error>;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        for cs in [&mut self.ce0, &mut self.ce1] {
            cs.set_high().map_err(BusError::ChipSelect)?;
        }
        self.initialized = true;
        Ok(())
    }

    async fn write_read(
        &mut self,
        chip_select: ChipSelect,
        read: &mut [u8],
        write: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.initialized {
            return Err(BusError::NotInitialized);
        }
        self.line(chip_select)
            .set_low()
            .map_err(BusError::ChipSelect)?;
        let transfer = self.bus.transfer(read, write).await;
        let flush = self.bus.flush().await;
        // Deselect even when the bus failed.
        let deselect = self.line(chip_select).set_high();

        transfer.map_err(BusError::Bus)?;
        flush.map_err(BusError::Bus)?;
        deselect.map_err(BusError::ChipSelect)
    }

    fn config(&self) -> SpiConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SPI_CONFIG;

    use embedded_hal::spi::ErrorKind;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn idle_pin() -> PinMock {
        PinMock::new(&[PinTransaction::set(PinState::High)])
    }

    #[tokio::test]
    async fn transfer_selects_only_requested_line() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transfer(vec![0x00, 0x01, 0x02], vec![0x00, 0x01, 0x02]),
            SpiTransaction::flush(),
        ]);
        let mut ce0 = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut ce1 = idle_pin();

        let mut master = BusSpiMaster::new(spi.clone(), ce0.clone(), ce1.clone(), SPI_CONFIG);
        master.initialize().unwrap();

        let mut rx = [0x55u8; 3];
        master
            .write_read(ChipSelect::Ce0, &mut rx, &[0x00, 0x01, 0x02])
            .await
            .unwrap();
        assert_eq!(rx, [0x00, 0x01, 0x02]);

        spi.done();
        ce0.done();
        ce1.done();
    }

    #[tokio::test]
    async fn ce1_transfer_leaves_ce0_idle() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transfer(vec![0xA5, 0x5A], vec![0xA5, 0x5A]),
            SpiTransaction::flush(),
        ]);
        let mut ce0 = idle_pin();
        let mut ce1 = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut master = BusSpiMaster::new(spi.clone(), ce0.clone(), ce1.clone(), SPI_CONFIG);
        master.initialize().unwrap();

        let mut rx = [0u8; 2];
        master
            .write_read(ChipSelect::Ce1, &mut rx, &[0xA5, 0x5A])
            .await
            .unwrap();
        assert_eq!(rx, [0xA5, 0x5A]);

        spi.done();
        ce0.done();
        ce1.done();
    }

    #[tokio::test]
    async fn transfer_before_initialize_is_rejected() {
        let mut spi = SpiMock::new(&[]);
        let mut ce0 = PinMock::new(&[]);
        let mut ce1 = PinMock::new(&[]);

        let mut master = BusSpiMaster::new(spi.clone(), ce0.clone(), ce1.clone(), SPI_CONFIG);
        let mut rx = [0u8; 1];
        let err = master
            .write_read(ChipSelect::Ce1, &mut rx, &[0xFF])
            .await
            .expect_err("not initialized");
        assert_eq!(err, BusError::NotInitialized);

        spi.done();
        ce0.done();
        ce1.done();
    }

    /// Bus whose every transfer overruns
    struct OverrunBus;

    impl embedded_hal::spi::ErrorType for OverrunBus {
        type Error = ErrorKind;
    }

    impl SpiBus<u8> for OverrunBus {
        async fn read(&mut self, _words: &mut [u8]) -> Result<(), ErrorKind> {
            Err(ErrorKind::Overrun)
        }

        async fn write(&mut self, _words: &[u8]) -> Result<(), ErrorKind> {
            Err(ErrorKind::Overrun)
        }

        async fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), ErrorKind> {
            Err(ErrorKind::Overrun)
        }

        async fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), ErrorKind> {
            Err(ErrorKind::Overrun)
        }

        async fn flush(&mut self) -> Result<(), ErrorKind> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn bus_error_still_deselects() {
        let mut ce0 = idle_pin();
        let mut ce1 = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut master = BusSpiMaster::new(OverrunBus, ce0.clone(), ce1.clone(), SPI_CONFIG);
        master.initialize().unwrap();

        let mut rx = [0u8; 1];
        let err = master
            .write_read(ChipSelect::Ce1, &mut rx, &[0xA5])
            .await
            .expect_err("overrun");
        assert_eq!(err, BusError::Bus(ErrorKind::Overrun));

        ce0.done();
        ce1.done();
    }
}
