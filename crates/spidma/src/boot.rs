//! Hardware boot sequence for the STM32H743ZI (Nucleo-144).
//!
//! Initialization order (MUST be respected):
//!   1. Configure MPU (mark AXI SRAM, home of the transfer buffers, non-cacheable)
//!   2. Configure RCC and start embassy (enables D-cache and I-cache)
//!   3. Kernel boot: screen, serial, logger, interrupt controller, timer, SPI master
//!
//! # Safety
//! Step 1 must run from privileged mode before any DMA peripheral starts.

/// Ordered list of boot sequence steps for documentation and testing.
///
/// MPU must be configured BEFORE embassy enables the D-cache. Otherwise the
/// CPU reads RX bytes from stale cache lines after DMA wrote them to SRAM.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. MPU: mark AXI SRAM non-cacheable before any DMA use",
    "2. RCC: PLL1P 384 MHz sysclk, PLL1Q 128 MHz SPI kernel clock",
    "3. Embassy init: D-cache + I-cache enabled (DMA region already excluded)",
    "4. Kernel: screen, serial, logger, interrupt, timer, SPI master",
];

/// SPI1 kernel clock (PLL1Q) in Hz.
///
/// 128 MHz / 8 gives the 16 MHz bus clock exactly; the SPI prescaler only
/// divides by powers of two.
pub const SPI_KERNEL_CLOCK_HZ: u32 = 128_000_000;

/// USART3 kernel clock (APB1) in Hz: 32 × 3 Mbaud with 16× oversampling
pub const UART_KERNEL_CLOCK_HZ: u32 = 96_000_000;

/// Returns the `(RBAR, RASR)` register pairs programmed at boot.
///
/// | Index | Region   | Base        | Size   | RBAR        | RASR        |
/// |-------|----------|-------------|--------|-------------|-------------|
/// | 0     | AXI SRAM | 0x2400_0000 | 512 KB | 0x2400_0010 | 0x1308_0025 |
#[must_use]
pub fn mpu_register_pairs() -> [(u32, u32); 1] {
    platform::mpu::boot_register_pairs()
}

/// Smallest power-of-two divider of `kernel_hz` that does not exceed
/// `target_hz`, as the SPI baud-rate prescaler picks it.
pub fn spi_prescaler(kernel_hz: u32, target_hz: u32) -> u32 {
    let mut divider = 2u32;
    while divider < 256 && kernel_hz.checked_div(divider).unwrap_or(0) > target_hz {
        divider = divider.saturating_mul(2);
    }
    divider
}

// ── RCC clock configuration ───────────────────────────────────────────────────

/// Build the `embassy_stm32::Config` with the harness clock tree.
///
/// # Clock Tree (HSI → 384 MHz core)
///
/// HSI (64 MHz) → PLL1 (prediv=4, mul=48) → VCO 768 MHz
///   PLL1_P: DIV2 → 384 MHz (sys)
///   PLL1_Q: DIV6 → 128 MHz (SPI1/2/3 kernel clock, SPI123SEL default)
/// AHB prescaler: DIV2 → 192 MHz
/// APB1/2/3/4:    DIV2 →  96 MHz (USART3 kernel clock)
#[cfg(feature = "hardware")]
pub fn build_embassy_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();

    config.rcc.hsi = Some(HSIPrescaler::DIV1);
    config.rcc.csi = true;

    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL48,
        divp: Some(PllDiv::DIV2), // 384 MHz: system clock
        divq: Some(PllDiv::DIV6), // 128 MHz: SPI kernel clock
        divr: None,
    });

    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV2; // 192 MHz
    config.rcc.apb1_pre = APBPrescaler::DIV2; // 96 MHz
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.apb3_pre = APBPrescaler::DIV2;
    config.rcc.apb4_pre = APBPrescaler::DIV2;
    config.rcc.voltage_scale = VoltageScale::Scale1;

    config
}

// ── Hardware-only init ────────────────────────────────────────────────────────
//
// Host tests (cargo test -p spidma) never compile or link this module.

#[cfg(feature = "hardware")]
pub mod hardware {
    //! Register writes and reset control. Only compiled with `--features hardware`.

    use crate::kernel::ShutdownMode;

    /// Program the MPU from [`super::mpu_register_pairs`].
    ///
    /// # Safety
    ///
    /// - Must be called before enabling D-cache (`SCB::enable_dcache()`).
    /// - Must be called before any DMA peripheral is initialized.
    /// - Must be called from privileged mode.
    #[allow(unsafe_code)]
    pub unsafe fn apply_mpu_config(mpu: &mut cortex_m::peripheral::MPU) {
        use super::mpu_register_pairs;

        // Disable MPU before reconfiguring (ARM DDI0489F §B3.5.1).
        unsafe {
            mpu.ctrl.write(0);
        }

        // RBAR has VALID=1, so writing it selects the region slot.
        for (rbar, rasr) in mpu_register_pairs() {
            unsafe {
                mpu.rbar.write(rbar);
                mpu.rasr.write(rasr);
            }
        }

        // ENABLE | PRIVDEFENA: unmapped regions keep the default memory map.
        unsafe {
            mpu.ctrl.write(0b101);
        }

        cortex_m::asm::isb();
        cortex_m::asm::dsb();
    }

    /// Zero-argument entry point for `main.rs`; call before `embassy_stm32::init()`.
    #[allow(unsafe_code)]
    pub fn apply_mpu_config_from_peripherals() {
        // SAFETY: called once at boot before any task or interrupt handler
        // runs. No other code holds Cortex-M peripherals yet.
        let mut cp = unsafe { cortex_m::Peripherals::steal() };
        // SAFETY: boot context, D-cache not yet enabled, no DMA initialised.
        unsafe { apply_mpu_config(&mut cp.MPU) };
    }

    /// Reset or park the core.
    pub fn shutdown(mode: ShutdownMode) -> ! {
        match mode {
            ShutdownMode::Reboot => {
                defmt::info!("rebooting");
                cortex_m::peripheral::SCB::sys_reset()
            }
            ShutdownMode::Halt => {
                defmt::info!("system halted");
                loop {
                    cortex_m::asm::wfi();
                }
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn mpu_covers_axi_sram_only() {
        let pairs = mpu_register_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0 & 0xFFFF_FFE0, 0x2400_0000);
    }

    #[test]
    fn mpu_step_precedes_cache_enable() {
        let mpu = BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains("MPU"));
        let cache = BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains("D-cache"));
        assert!(mpu < cache);
    }

    #[test]
    fn pll1q_divides_exactly_to_sixteen_megahertz() {
        let divider = spi_prescaler(SPI_KERNEL_CLOCK_HZ, crate::config::SPI_CLOCK_SPEED);
        assert_eq!(divider, 8);
        assert_eq!(SPI_KERNEL_CLOCK_HZ / divider, 16_000_000);
    }

    #[test]
    fn prescaler_never_exceeds_requested_clock() {
        assert_eq!(spi_prescaler(160_000_000, 16_000_000), 16);
        assert_eq!(spi_prescaler(1_000_000, 16_000_000), 2);
        assert_eq!(spi_prescaler(u32::MAX, 1), 256);
    }

    #[test]
    fn uart_clock_is_integer_multiple_of_baud() {
        assert_eq!(UART_KERNEL_CLOCK_HZ % crate::config::SERIAL_BAUD, 0);
    }
}
