//! STM32H743 collaborators: embassy time driver, NVIC, defmt over RTT

use core::convert::Infallible;
use core::fmt;

use embassy_time::Timer as EmbassyTimer;
use platform::{InterruptController, LogSeverity, LogTarget, Logger, Timer};

/// System timer on the embassy time driver (TIM2, 32.768 kHz tick).
#[derive(Debug, Default)]
pub struct TickTimer;

impl TickTimer {
    /// Timer on the embassy time driver started by `embassy_stm32::init`
    pub const fn new() -> Self {
        Self
    }
}

impl Timer for TickTimer {
    type Error = Infallible;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        defmt::debug!("timer: tick at {=u64} Hz", embassy_time::TICK_HZ);
        Ok(())
    }

    async fn delay_ms(&mut self, ms: u32) {
        EmbassyTimer::after_millis(u64::from(ms)).await;
    }
}

/// Cortex-M7 NVIC. Embassy binds the SPI/DMA/UART handlers itself, so
/// bringing the controller up means unmasking interrupts globally.
#[derive(Debug, Default)]
pub struct Nvic;

impl InterruptController for Nvic {
    type Error = Infallible;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        // SAFETY: called once from the boot sequence, outside any critical
        // section; all interrupt handlers are bound by embassy at init.
        unsafe { cortex_m::interrupt::enable() };
        Ok(())
    }
}

/// Logger writing to defmt (RTT).
///
/// RTT is the only sink on the board: `logdev=rtt` names it, and the
/// screen target also lands there.
#[derive(Debug, Default)]
pub struct DefmtLogger {
    attached: bool,
}

impl DefmtLogger {
    /// Logger that drops messages until `initialize`
    pub const fn new() -> Self {
        Self { attached: false }
    }
}

impl Logger for DefmtLogger {
    type Error = Infallible;

    fn initialize(&mut self, target: &LogTarget) -> Result<(), Self::Error> {
        self.attached = true;
        match target {
            LogTarget::Screen => defmt::info!("logger: RTT (screen)"),
            LogTarget::Device(name) => defmt::info!("logger: RTT ({=str})", name.as_str()),
        }
        Ok(())
    }

    fn has_device(&self, name: &str) -> bool {
        name == "rtt"
    }

    fn write(&mut self, source: &str, severity: LogSeverity, message: fmt::Arguments<'_>) {
        if !self.attached {
            return;
        }
        let text = defmt::Display2Format(&message);
        match severity {
            LogSeverity::Panic => defmt::error!("{=str}: {} {}", source, severity.tag(), text),
            LogSeverity::Error => defmt::error!("{=str}: {}", source, text),
            LogSeverity::Warning => defmt::warn!("{=str}: {}", source, text),
            LogSeverity::Notice => defmt::info!("{=str}: {}", source, text),
            LogSeverity::Debug => defmt::debug!("{=str}: {}", source, text),
        }
    }
}
