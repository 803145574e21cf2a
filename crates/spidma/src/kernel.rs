//! Kernel: boot sequence and transfer loop
//!
//! # Boot order
//!
//! ```text
//! screen → serial (3 Mbaud) → logger → interrupt controller → timer → SPI master
//! ```
//!
//! The first stage that fails aborts the boot; later stages stay untouched.
//!
//! # Loop
//!
//! Every second the kernel polls the serial console, then clocks the test
//! pattern through the SPI master and spins the activity rotor until the
//! completion routine reports the outcome. The reboot magic on the console
//! ends the loop with [`ShutdownMode::Reboot`]; a failed transfer ends it
//! with [`ShutdownMode::Halt`].

use core::fmt;

use platform::{
    ActivityDisplay, Board, Devices, InterruptController, LogSeverity, SerialPort, Timer,
    TransferStatus,
};

use crate::completion::{spi_completion_routine, TransferContext};
use crate::config::{
    compile_time, HEXDUMP_LIMIT, LOG_SOURCE, POLL_PERIOD_MS, REBOOT_MAGIC, RECEIVE_PAUSE_MS,
    RX_FILL_BYTE, SERIAL_BAUD, SERIAL_BUFFER_LEN, SPI_CHIP_SELECT, STARTUP_BLINKS,
    TEST_DATA_LENGTH,
};
use crate::hexdump;
use crate::log::{Escaped, KernelLog};
use crate::options::KernelOptions;
use crate::transfer::SpiDmaMaster;

/// How the kernel wants the board to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownMode {
    /// Stop and wait for a power cycle
    Halt,
    /// Reset the board
    Reboot,
}

/// Boot stage, in initialization order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStage {
    /// Screen / activity display
    Screen,
    /// Serial console
    Serial,
    /// Logger
    Logger,
    /// Interrupt controller
    Interrupt,
    /// System timer
    Timer,
    /// SPI master and its DMA channels
    SpiMaster,
}

impl BootStage {
    /// All stages in the order they are initialized
    pub const ORDER: [Self; 6] = [
        Self::Screen,
        Self::Serial,
        Self::Logger,
        Self::Interrupt,
        Self::Timer,
        Self::SpiMaster,
    ];

    /// Device name used in logs and boot journals
    pub const fn name(self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Serial => "serial",
            Self::Logger => "logger",
            Self::Interrupt => "interrupt",
            Self::Timer => "timer",
            Self::SpiMaster => "spi",
        }
    }
}

impl fmt::Display for BootStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A collaborator failed to initialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{stage} initialization failed")]
pub struct BootError {
    /// Stage that failed
    pub stage: BootStage,
}

impl BootError {
    /// Failure at `stage`
    pub const fn new(stage: BootStage) -> Self {
        Self { stage }
    }
}

/// Fill `tx` with its index (mod 256) and `rx` with [`RX_FILL_BYTE`].
#[allow(clippy::cast_possible_truncation)] // index wraps at 256 by design of the pattern
pub fn fill_test_pattern(tx: &mut [u8], rx: &mut [u8]) {
    for (i, byte) in tx.iter_mut().enumerate() {
        *byte = i as u8;
    }
    rx.fill(RX_FILL_BYTE);
}

/// Serial input is exactly the reboot magic
pub fn is_reboot_magic(data: &[u8]) -> bool {
    data == REBOOT_MAGIC
}

/// The harness: owns the board devices, borrows the transfer buffers.
pub struct Kernel<'c, B: Board> {
    screen: B::Screen,
    serial: B::Serial,
    log: KernelLog<B::Logger>,
    interrupt: B::Interrupt,
    timer: B::Timer,
    spi: SpiDmaMaster<'c, B::Spi>,
    context: &'c TransferContext,
    tx: &'c mut [u8; TEST_DATA_LENGTH],
    rx: &'c mut [u8; TEST_DATA_LENGTH],
    options: KernelOptions,
}

impl<'c, B: Board> Kernel<'c, B> {
    /// Take over `devices` and blink the activity display.
    ///
    /// On the board `tx` and `rx` must be DMA reachable
    /// (see [`platform::dma::is_dma_accessible`]).
    pub fn new(
        devices: Devices<B>,
        options: KernelOptions,
        context: &'c TransferContext,
        tx: &'c mut [u8; TEST_DATA_LENGTH],
        rx: &'c mut [u8; TEST_DATA_LENGTH],
    ) -> Self {
        let Devices {
            mut screen,
            serial,
            logger,
            interrupt,
            timer,
            spi,
        } = devices;
        screen.blink(STARTUP_BLINKS);
        Self {
            screen,
            serial,
            log: KernelLog::new(logger, LOG_SOURCE, options.log_level()),
            interrupt,
            timer,
            spi: SpiDmaMaster::new(spi),
            context,
            tx,
            rx,
            options,
        }
    }

    /// Bring up all collaborators in boot order.
    pub fn initialize(&mut self) -> Result<(), BootError> {
        self.screen
            .initialize()
            .map_err(|_| BootError::new(BootStage::Screen))?;
        self.serial
            .initialize(SERIAL_BAUD)
            .map_err(|_| BootError::new(BootStage::Serial))?;

        let target = self
            .log
            .initialize(self.options.log_target())
            .map_err(|_| BootError::new(BootStage::Logger))?;

        if let Err(e) = self.interrupt.initialize() {
            return Err(self.stage_failed(BootStage::Interrupt, &e));
        }
        if let Err(e) = self.timer.initialize() {
            return Err(self.stage_failed(BootStage::Timer, &e));
        }
        if let Err(e) = self.spi.initialize() {
            return Err(self.stage_failed(BootStage::SpiMaster, &e));
        }

        let config = self.spi.config();
        self.log.debug(format_args!(
            "SPI0 at {} Hz, {:?}, log to {}",
            config.frequency, config.mode, target
        ));
        Ok(())
    }

    fn stage_failed(&mut self, stage: BootStage, error: &dyn fmt::Debug) -> BootError {
        self.log
            .error(format_args!("{stage} initialization failed: {error:?}"));
        BootError::new(stage)
    }

    /// Run until the console asks for a reboot or a transfer fails.
    pub async fn run(&mut self) -> ShutdownMode {
        self.log
            .notice(format_args!("Compile time: {}", compile_time()));
        loop {
            if let Some(mode) = self.step().await {
                return mode;
            }
        }
    }

    /// One loop iteration: wait, poll the console, transfer.
    pub async fn step(&mut self) -> Option<ShutdownMode> {
        self.timer.delay_ms(POLL_PERIOD_MS).await;

        if let Some(mode) = self.poll_serial().await {
            return Some(mode);
        }

        match self.transfer_once().await {
            TransferStatus::Completed => None,
            TransferStatus::Failed => Some(ShutdownMode::Halt),
        }
    }

    /// Non-blocking console read. Returns `Reboot` on the magic string,
    /// pauses after any other input.
    pub async fn poll_serial(&mut self) -> Option<ShutdownMode> {
        let mut buffer = [0u8; SERIAL_BUFFER_LEN];
        let received = match self.serial.read(&mut buffer).await {
            Ok(n) => n.min(SERIAL_BUFFER_LEN),
            Err(e) => {
                self.log.warning(format_args!("Serial read failed: {e:?}"));
                0
            }
        };
        if received == 0 {
            return None;
        }

        let data = buffer.get(..received).unwrap_or_default();
        self.log.notice(format_args!("Data received"));
        self.log.notice(format_args!("{}", Escaped(data)));

        if is_reboot_magic(data) {
            return Some(ShutdownMode::Reboot);
        }
        self.timer.delay_ms(RECEIVE_PAUSE_MS).await;
        None
    }

    /// Clock the test pattern through the SPI master once.
    ///
    /// The transfer and the rotor spin loop run joined: the loop keeps
    /// spinning while the completion routine has not cleared the flag.
    pub async fn transfer_once(&mut self) -> TransferStatus {
        let length = self.tx.len();
        self.log
            .notice(format_args!("Transfering {length} bytes over SPI0"));

        fill_test_pattern(self.tx.as_mut_slice(), self.rx.as_mut_slice());

        self.context.begin();
        self.spi
            .set_completion_routine(spi_completion_routine, self.context);

        let context = self.context;
        let screen = &mut self.screen;
        let transfer =
            self.spi
                .start_write_read(SPI_CHIP_SELECT, self.tx.as_slice(), self.rx.as_mut_slice());
        let spinner = async move {
            let mut count: u32 = 0;
            while context.is_running() {
                screen.rotor(0, count);
                count = count.wrapping_add(1);
                embassy_futures::yield_now().await;
            }
        };
        embassy_futures::join::join(transfer, spinner).await;

        let status = self
            .context
            .last_status()
            .unwrap_or(TransferStatus::Failed);
        match status {
            TransferStatus::Completed => {
                self.log.notice(format_args!("{length} bytes transfered"));
                if self.log.enabled(LogSeverity::Debug) {
                    self.log
                        .debug(format_args!("Dumping begin of received data:"));
                    let shown = self.rx.get(..length.min(HEXDUMP_LIMIT)).unwrap_or_default();
                    for line in hexdump::lines(shown) {
                        self.log.debug(format_args!("{line}"));
                    }
                }
            }
            TransferStatus::Failed => self.log.panic(format_args!("SPI transfer error")),
        }
        status
    }

    /// Options the kernel runs with
    pub fn options(&self) -> &KernelOptions {
        &self.options
    }

    /// Activity display
    pub fn screen(&self) -> &B::Screen {
        &self.screen
    }

    /// Serial console
    pub fn serial(&self) -> &B::Serial {
        &self.serial
    }

    /// Serial console, mutably
    pub fn serial_mut(&mut self) -> &mut B::Serial {
        &mut self.serial
    }

    /// Logger
    pub fn logger(&self) -> &B::Logger {
        self.log.inner()
    }

    /// Interrupt controller
    pub fn interrupt(&self) -> &B::Interrupt {
        &self.interrupt
    }

    /// System timer
    pub fn timer(&self) -> &B::Timer {
        &self.timer
    }

    /// SPI master
    pub fn spi(&self) -> &B::Spi {
        self.spi.inner()
    }

    /// SPI master, mutably
    pub fn spi_mut(&mut self) -> &mut B::Spi {
        self.spi.inner_mut()
    }

    /// Shared transfer state
    pub fn context(&self) -> &TransferContext {
        self.context
    }

    /// Data received by the last transfer
    pub fn received(&self) -> &[u8] {
        self.rx.as_slice()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::large_stack_arrays,
    clippy::cast_possible_truncation,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::config::SPI_CONFIG;
    use platform::mocks::{MockBoard, MockError};
    use platform::LogTarget;

    struct Buffers {
        tx: [u8; TEST_DATA_LENGTH],
        rx: [u8; TEST_DATA_LENGTH],
    }

    impl Buffers {
        fn new() -> Self {
            Self {
                tx: [0; TEST_DATA_LENGTH],
                rx: [0; TEST_DATA_LENGTH],
            }
        }
    }

    fn kernel<'c>(
        ctx: &'c TransferContext,
        buffers: &'c mut Buffers,
        cmdline: &str,
    ) -> Kernel<'c, MockBoard> {
        Kernel::new(
            Devices::mock(SPI_CONFIG),
            KernelOptions::parse(cmdline),
            ctx,
            &mut buffers.tx,
            &mut buffers.rx,
        )
    }

    #[test]
    fn construction_blinks_five_times() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let k = kernel(&ctx, &mut buffers, "");
        assert_eq!(k.screen().blinks(), 5);
    }

    #[test]
    fn pattern_counts_up_and_wraps() {
        let mut tx = [0u8; 300];
        let mut rx = [0u8; 300];
        fill_test_pattern(&mut tx, &mut rx);
        assert_eq!(tx[0], 0);
        assert_eq!(tx[255], 255);
        assert_eq!(tx[256], 0);
        assert_eq!(tx[299], 43);
        assert!(rx.iter().all(|b| *b == 0x55));
    }

    #[test]
    fn magic_must_match_exactly() {
        assert!(is_reboot_magic(b"tAgHQP3Lw2NZcW8Uru7jnf"));
        assert!(!is_reboot_magic(b"tAgHQP3Lw2NZcW8Uru7jnf\n"));
        assert!(!is_reboot_magic(b"tAgHQP3Lw2NZcW8Uru7jn"));
        assert!(!is_reboot_magic(b""));
    }

    #[test]
    fn boot_initializes_everything_and_targets_screen() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut k = kernel(&ctx, &mut buffers, "");
        k.initialize().unwrap();

        assert!(k.screen().is_initialized());
        assert_eq!(k.serial().baud_rate(), Some(3_000_000));
        assert_eq!(k.logger().target(), Some(&LogTarget::Screen));
        assert!(k.interrupt().is_initialized());
        assert!(k.timer().is_initialized());
        assert!(k.spi().is_initialized());
    }

    #[test]
    fn boot_error_names_stage() {
        let err = BootError::new(BootStage::Interrupt);
        let mut text = std::string::String::new();
        core::fmt::write(&mut text, format_args!("{err}")).unwrap();
        assert_eq!(text, "interrupt initialization failed");
    }

    #[tokio::test]
    async fn transfer_loops_back_pattern() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut k = kernel(&ctx, &mut buffers, "");
        k.initialize().unwrap();

        assert_eq!(k.transfer_once().await, TransferStatus::Completed);
        assert_eq!(k.received()[0], 0);
        assert_eq!(k.received()[1999], (1999 % 256) as u8);
        assert!(k.logger().contains("Transfering 2000 bytes over SPI0"));
        assert!(k.logger().contains("2000 bytes transfered"));
        assert!(k.logger().contains("Dumping begin of received data:"));
        assert!(k.screen().rotor_calls() > 0);
        assert_eq!(k.spi().transfers(), &[(SPI_CHIP_SELECT, 2000)]);
    }

    #[tokio::test]
    async fn hexdump_suppressed_below_debug() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut k = kernel(&ctx, &mut buffers, "loglevel=3");
        k.initialize().unwrap();

        k.transfer_once().await;
        assert!(k.logger().contains("2000 bytes transfered"));
        assert_eq!(k.logger().at(LogSeverity::Debug).count(), 0);
    }

    #[tokio::test]
    async fn failed_transfer_halts() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut k = kernel(&ctx, &mut buffers, "");
        k.initialize().unwrap();
        k.spi_mut().fail_transfers();

        assert_eq!(k.step().await, Some(ShutdownMode::Halt));
        let panics: std::vec::Vec<_> = k.logger().at(LogSeverity::Panic).collect();
        assert_eq!(panics.len(), 1);
        assert_eq!(panics[0].message, "SPI transfer error");
        assert!(!ctx.is_running());
    }

    #[tokio::test]
    async fn serial_noise_pauses_four_seconds() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut k = kernel(&ctx, &mut buffers, "");
        k.initialize().unwrap();
        k.serial_mut().push_incoming(b"hello");

        assert_eq!(k.step().await, None);
        assert_eq!(k.timer().delays(), &[1000, 4000]);
        assert!(k.logger().contains("Data received"));
        assert!(k.logger().contains("hello"));
        assert_eq!(k.spi().transfers().len(), 1);
    }

    #[tokio::test]
    async fn magic_reboots_before_transfer() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut k = kernel(&ctx, &mut buffers, "");
        k.initialize().unwrap();
        k.serial_mut().push_idle();
        k.serial_mut().push_incoming(REBOOT_MAGIC);

        assert_eq!(k.run().await, ShutdownMode::Reboot);
        assert_eq!(k.spi().transfers().len(), 1);
        assert_eq!(k.timer().delays(), &[1000, 1000]);
        assert_eq!(ctx.completed_transfers(), 1);
    }

    #[test]
    fn mock_error_is_reported_through_logger() {
        let ctx = TransferContext::new();
        let mut buffers = Buffers::new();
        let mut devices = Devices::mock(SPI_CONFIG);
        devices.timer.fail_init();
        let mut k: Kernel<'_, MockBoard> = Kernel::new(
            devices,
            KernelOptions::default(),
            &ctx,
            &mut buffers.tx,
            &mut buffers.rx,
        );

        assert_eq!(k.initialize(), Err(BootError::new(BootStage::Timer)));
        let errors: std::vec::Vec<_> = k.logger().at(LogSeverity::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains(&std::format!("{:?}", MockError::InitFailed)));
        assert!(!k.spi().is_initialized());
    }
}
