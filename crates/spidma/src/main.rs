//! SPI DMA loopback harness - Main Entry Point
//!
//! Hardware-only entry point for STM32H743ZI (Nucleo-144).
//!
//! Pin assignments:
//!   PA5  = SPI1_SCK
//!   PA7  = SPI1_MOSI  (bridge to MISO for loopback)
//!   PA6  = SPI1_MISO
//!   PD14 = CE0 (active low)
//!   PD15 = CE1 (active low)
//!   PD8  = USART3_TX  (ST-LINK virtual COM port)
//!   PD9  = USART3_RX
//!   PB0  = LD1 (activity LED)

#![no_std]
#![no_main]

use core::ptr::addr_of_mut;

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{AnyPin, Level, Output, Pin, Speed};
use embassy_stm32::peripherals::{DMA1_CH0, DMA1_CH1, SPI1, USART3};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::Delay;
use panic_probe as _;
use static_cell::StaticCell;

use platform::dma::{is_dma_accessible, Align32};
use platform::{BitOrder, Board, Devices, SpiMode};
use spidma::boot;
use spidma::config::{BUILD_CMDLINE, SERIAL_BAUD, SPI_CONFIG, TEST_DATA_LENGTH};
use spidma::display::LedActivity;
use spidma::hal::stm32::{DefmtLogger, Nvic, TickTimer};
use spidma::hal::{BusSpiMaster, IoSerial};
use spidma::{Kernel, KernelOptions, TransferContext};

bind_interrupts!(struct Irqs {
    USART3 => usart::BufferedInterruptHandler<peripherals::USART3>;
});

/// Nucleo-H743ZI wiring
struct Nucleo;

impl Board for Nucleo {
    type Screen = LedActivity<Output<'static, AnyPin>, Delay>;
    type Serial = IoSerial<BufferedUart<'static, USART3>>;
    type Logger = DefmtLogger;
    type Interrupt = Nvic;
    type Timer = TickTimer;
    type Spi = BusSpiMaster<Spi<'static, SPI1, DMA1_CH0, DMA1_CH1>, Output<'static, AnyPin>>;
}

static TRANSFER_CONTEXT: TransferContext = TransferContext::new();

// Transfer buffers in AXI SRAM (DMA1 reachable, non-cacheable via MPU).
// NOLOAD section: contents are garbage until the kernel fills them.
#[link_section = ".axisram"]
static mut TX_BUFFER: Align32<[u8; TEST_DATA_LENGTH]> = Align32([0; TEST_DATA_LENGTH]);
#[link_section = ".axisram"]
static mut RX_BUFFER: Align32<[u8; TEST_DATA_LENGTH]> = Align32([0; TEST_DATA_LENGTH]);

static UART_TX_RING: StaticCell<[u8; 256]> = StaticCell::new();
static UART_RX_RING: StaticCell<[u8; 256]> = StaticCell::new();

fn embassy_spi_config() -> spi::Config {
    let mut config = spi::Config::default();
    config.frequency = Hertz(SPI_CONFIG.frequency);
    config.mode = match SPI_CONFIG.mode {
        SpiMode::Mode0 => spi::MODE_0,
        SpiMode::Mode1 => spi::MODE_1,
        SpiMode::Mode2 => spi::MODE_2,
        SpiMode::Mode3 => spi::MODE_3,
    };
    config.bit_order = match SPI_CONFIG.bit_order {
        BitOrder::MsbFirst => spi::BitOrder::MsbFirst,
        BitOrder::LsbFirst => spi::BitOrder::LsbFirst,
    };
    config
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // Step 1: MPU before embassy_stm32::init() enables the D-cache.
    boot::hardware::apply_mpu_config_from_peripherals();

    defmt::info!("spidma v{=str}", env!("CARGO_PKG_VERSION"));
    let p = embassy_stm32::init(boot::build_embassy_config());

    let spi_bus = Spi::new(
        p.SPI1,
        p.PA5,      // SCK
        p.PA7,      // MOSI
        p.PA6,      // MISO
        p.DMA1_CH0, // TX DMA
        p.DMA1_CH1, // RX DMA
        embassy_spi_config(),
    );
    let ce0 = Output::new(p.PD14.degrade(), Level::High, Speed::VeryHigh);
    let ce1 = Output::new(p.PD15.degrade(), Level::High, Speed::VeryHigh);

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = SERIAL_BAUD;
    let uart = match BufferedUart::new(
        p.USART3,
        Irqs,
        p.PD9, // RX
        p.PD8, // TX
        UART_TX_RING.init([0; 256]),
        UART_RX_RING.init([0; 256]),
        uart_config,
    ) {
        Ok(uart) => uart,
        Err(e) => {
            defmt::error!("USART3 configuration rejected: {}", defmt::Debug2Format(&e));
            boot::hardware::shutdown(spidma::ShutdownMode::Halt)
        }
    };

    let led = Output::new(p.PB0.degrade(), Level::Low, Speed::Low);

    let devices = Devices::<Nucleo> {
        screen: LedActivity::new(led, Delay),
        serial: IoSerial::new(uart),
        logger: DefmtLogger::new(),
        interrupt: Nvic,
        timer: TickTimer::new(),
        spi: BusSpiMaster::new(spi_bus, ce0, ce1, SPI_CONFIG),
    };

    // SAFETY: main runs once and these are the only references ever taken
    // to the two buffers; they live for the rest of the program.
    let (tx, rx) = unsafe { (&mut (*addr_of_mut!(TX_BUFFER)).0, &mut (*addr_of_mut!(RX_BUFFER)).0) };
    for buffer in [tx.as_ptr(), rx.as_ptr()] {
        let addr = buffer as u32;
        if !is_dma_accessible(addr, TEST_DATA_LENGTH as u32) {
            defmt::error!("transfer buffer at {=u32:#x} is not DMA reachable", addr);
            boot::hardware::shutdown(spidma::ShutdownMode::Halt);
        }
    }

    let options = KernelOptions::parse(BUILD_CMDLINE);
    let mut kernel = Kernel::new(devices, options, &TRANSFER_CONTEXT, tx, rx);

    if let Err(e) = kernel.initialize() {
        defmt::error!("boot failed: {}", e);
        boot::hardware::shutdown(spidma::ShutdownMode::Halt);
    }

    let mode = kernel.run().await;
    boot::hardware::shutdown(mode);
}
