//! Interrupt controller and system timer abstractions

/// Interrupt controller
///
/// DMA completion is signalled through it, so it must be up before the
/// SPI master is initialized.
pub trait InterruptController {
    /// Error type
    type Error: core::fmt::Debug;

    /// Unmask interrupt delivery.
    fn initialize(&mut self) -> Result<(), Self::Error>;
}

/// System timer
pub trait Timer {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start the tick source.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Wait at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) -> impl core::future::Future<Output = ()>;
}
