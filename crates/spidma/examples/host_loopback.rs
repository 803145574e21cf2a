//! Host Loopback
//!
//! Runs the kernel on the desktop: loopback SPI master, scripted serial
//! console, rotor drawn into an in-memory framebuffer, logs via tracing.
//! The console first sends some noise, then the reboot magic.
//!
//! Run with: cargo run --example host_loopback --features emulator -- loglevel=3
//! (`RUST_LOG=debug` shows the hexdump). `width=` and `height=` shrink the
//! 64x64 framebuffer the rotor is drawn on; `logdev=stdout` is the only
//! log device, anything else falls back to the screen.

use embedded_graphics::mock_display::MockDisplay;
use embedded_graphics::pixelcolor::BinaryColor;
use tracing_subscriber::EnvFilter;

use platform::mocks::{MockInterrupt, MockSerial, MockSpiMaster};
use platform::{Board, Devices};
use spidma::config::{REBOOT_MAGIC, SPI_CONFIG, TEST_DATA_LENGTH};
use spidma::display::GraphicsRotor;
use spidma::hal::host::{TokioTimer, TracingLogger};
use spidma::{Kernel, KernelOptions, ShutdownMode, TransferContext};

/// Desktop stand-ins for the Nucleo peripherals
struct HostBoard;

impl Board for HostBoard {
    type Screen = GraphicsRotor<MockDisplay<BinaryColor>>;
    type Serial = MockSerial;
    type Logger = TracingLogger;
    type Interrupt = MockInterrupt;
    type Timer = TokioTimer;
    type Spi = MockSpiMaster;
}

static TRANSFER_CONTEXT: TransferContext = TransferContext::new();

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cmdline = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let options = KernelOptions::parse(&cmdline);

    let mut framebuffer = MockDisplay::new();
    framebuffer.set_allow_overdraw(true);

    let mut serial = MockSerial::new();
    serial.push_idle();
    serial.push_incoming(b"hello from the host");
    serial.push_idle();
    serial.push_incoming(REBOOT_MAGIC);

    let mut spi = MockSpiMaster::new(SPI_CONFIG);
    spi.set_latency_polls(16);

    let devices = Devices::<HostBoard> {
        screen: GraphicsRotor::new(framebuffer, BinaryColor::On, BinaryColor::Off)
            .with_screen_size(options.width(), options.height()),
        serial,
        logger: TracingLogger::new(),
        interrupt: MockInterrupt::new(),
        timer: TokioTimer::new(),
        spi,
    };

    let mut tx = Box::new([0u8; TEST_DATA_LENGTH]);
    let mut rx = Box::new([0u8; TEST_DATA_LENGTH]);
    let mut kernel = Kernel::new(devices, options, &TRANSFER_CONTEXT, &mut *tx, &mut *rx);

    kernel.initialize().map_err(|e| e.to_string())?;
    let mode = kernel.run().await;

    println!(
        "{} transfers completed, shutdown: {}",
        TRANSFER_CONTEXT.completed_transfers(),
        match mode {
            ShutdownMode::Halt => "halt",
            ShutdownMode::Reboot => "reboot",
        }
    );
    Ok(())
}
