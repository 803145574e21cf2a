//! SPI master with DMA engine and completion routine
//!
//! Wraps a [`SpiMaster`] so a transfer is started with one call and its
//! end is signalled through a [`CompletionRoutine`] instead of the caller
//! awaiting the result. The returned future is the DMA engine: it must be
//! polled (joined with the caller's spin loop) for the bytes to move.

use platform::{ChipSelect, SpiConfig, SpiMaster, TransferStatus};

use crate::completion::{CompletionRoutine, TransferContext};

/// SPI master driven through start + completion routine.
pub struct SpiDmaMaster<'c, S> {
    spi: S,
    completion: Option<(CompletionRoutine, &'c TransferContext)>,
}

impl<'c, S: SpiMaster> SpiDmaMaster<'c, S> {
    /// Wrap `spi`; no completion routine registered yet.
    pub fn new(spi: S) -> Self {
        Self {
            spi,
            completion: None,
        }
    }

    /// Bring the SPI block and its DMA channels up.
    pub fn initialize(&mut self) -> Result<(), S::Error> {
        self.spi.initialize()
    }

    /// Register the routine called when a transfer finishes.
    ///
    /// Replaces any routine registered earlier.
    pub fn set_completion_routine(
        &mut self,
        routine: CompletionRoutine,
        context: &'c TransferContext,
    ) {
        self.completion = Some((routine, context));
    }

    /// Start a full-duplex transfer of `tx` into `rx` on `chip_select`.
    ///
    /// Returns at once with the in-flight transfer. When it finishes the
    /// registered completion routine runs with the outcome, which is also
    /// the future's output. Buffers of different length fail without
    /// touching the bus.
    pub async fn start_write_read(
        &mut self,
        chip_select: ChipSelect,
        tx: &[u8],
        rx: &mut [u8],
    ) -> TransferStatus {
        let status = if tx.len() == rx.len() {
            TransferStatus::from(self.spi.write_read(chip_select, rx, tx).await)
        } else {
            TransferStatus::Failed
        };
        if let Some((routine, context)) = self.completion {
            routine(status, context);
        }
        status
    }

    /// Active bus configuration
    pub fn config(&self) -> SpiConfig {
        self.spi.config()
    }

    /// Wrapped SPI master
    pub fn inner(&self) -> &S {
        &self.spi
    }

    /// Wrapped SPI master, mutably
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.spi
    }
}
