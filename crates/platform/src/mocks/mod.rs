//! Mock implementations for testing
//!
//! This module provides mock implementations of all collaborator traits
//! for use in unit and integration tests and in the host emulator.

#![cfg(any(test, feature = "std"))]

use core::cell::RefCell;
use core::fmt;
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use crate::*;

/// Error returned by every mock collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// `initialize` was told to fail
    InitFailed,
    /// The DMA engine was told to fail
    TransferFailed,
    /// TX and RX buffers differ in length
    LengthMismatch,
}

/// Shared record of `initialize` calls, in call order.
#[derive(Debug, Clone, Default)]
pub struct BootJournal(Rc<RefCell<Vec<&'static str>>>);

impl BootJournal {
    /// Empty journal
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, device: &'static str) {
        self.0.borrow_mut().push(device);
    }

    /// Device names in initialization order
    pub fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}

/// Common init bookkeeping shared by the mocks
#[derive(Debug, Default)]
struct InitState {
    initialized: bool,
    fail: bool,
    journal: Option<BootJournal>,
}

impl InitState {
    fn initialize(&mut self, device: &'static str) -> Result<(), MockError> {
        if let Some(journal) = &self.journal {
            journal.record(device);
        }
        if self.fail {
            return Err(MockError::InitFailed);
        }
        self.initialized = true;
        Ok(())
    }
}

// ── Screen ──────────────────────────────────────────────────────────────────

/// Mock screen: counts rotor updates and blinks
#[derive(Debug, Default)]
pub struct MockScreen {
    init: InitState,
    rotor_calls: u32,
    last_rotor: Option<(u32, u32)>,
    blinks: u32,
}

impl MockScreen {
    /// Create new mock screen
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail
    pub fn fail_init(&mut self) {
        self.init.fail = true;
    }

    /// `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.init.initialized
    }

    /// Number of rotor updates so far
    pub fn rotor_calls(&self) -> u32 {
        self.rotor_calls
    }

    /// `(index, count)` of the most recent rotor update
    pub fn last_rotor(&self) -> Option<(u32, u32)> {
        self.last_rotor
    }

    /// Number of blinks requested
    pub fn blinks(&self) -> u32 {
        self.blinks
    }
}

impl ActivityDisplay for MockScreen {
    type Error = MockError;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.init.initialize("screen")
    }

    fn rotor(&mut self, index: u32, count: u32) {
        self.rotor_calls = self.rotor_calls.saturating_add(1);
        self.last_rotor = Some((index, count));
    }

    fn blink(&mut self, times: u32) {
        self.blinks = self.blinks.saturating_add(times);
    }
}

// ── Serial ──────────────────────────────────────────────────────────────────

/// Mock serial console: each scripted chunk is returned by one `read` call.
#[derive(Debug, Default)]
pub struct MockSerial {
    init: InitState,
    baud_rate: Option<u32>,
    incoming: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    reads: usize,
}

impl MockSerial {
    /// Create new mock serial port with nothing to read
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail
    pub fn fail_init(&mut self) {
        self.init.fail = true;
    }

    /// Queue bytes for a later `read`
    pub fn push_incoming(&mut self, data: &[u8]) {
        self.incoming.push_back(data.to_vec());
    }

    /// Queue an empty poll (a `read` that returns 0)
    pub fn push_idle(&mut self) {
        self.incoming.push_back(Vec::new());
    }

    /// Baud rate passed to `initialize`
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.init.initialized
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of `read` calls
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SerialPort for MockSerial {
    type Error = MockError;

    fn initialize(&mut self, baud_rate: u32) -> Result<(), Self::Error> {
        self.init.initialize("serial")?;
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.reads = self.reads.saturating_add(1);
        let Some(chunk) = self.incoming.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buffer.len());
        if let (Some(dst), Some(src)) = (buffer.get_mut(..n), chunk.get(..n)) {
            dst.copy_from_slice(src);
        }
        Ok(n)
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.written.extend_from_slice(data);
        Ok(())
    }
}

// ── Logger ──────────────────────────────────────────────────────────────────

/// One message captured by [`MockLogger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Source tag
    pub source: String,
    /// Severity
    pub severity: LogSeverity,
    /// Formatted text
    pub message: String,
}

/// Device names every [`MockLogger`] knows: screen console and first UART
pub const MOCK_LOG_DEVICES: [&str; 2] = ["tty1", "ttyS1"];

/// Mock logger: records every message
#[derive(Debug)]
pub struct MockLogger {
    init: InitState,
    devices: Vec<String>,
    target: Option<LogTarget>,
    records: Vec<LogRecord>,
}

impl Default for MockLogger {
    fn default() -> Self {
        Self {
            init: InitState::default(),
            devices: MOCK_LOG_DEVICES.iter().map(ToString::to_string).collect(),
            target: None,
            records: Vec::new(),
        }
    }
}

impl MockLogger {
    /// Create new mock logger knowing [`MOCK_LOG_DEVICES`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register another output device name
    pub fn add_device(&mut self, name: &str) {
        self.devices.push(name.to_string());
    }

    /// Make `initialize` fail
    pub fn fail_init(&mut self) {
        self.init.fail = true;
    }

    /// `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.init.initialized
    }

    /// Target passed to `initialize`
    pub fn target(&self) -> Option<&LogTarget> {
        self.target.as_ref()
    }

    /// All captured messages
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Some message equals `text`
    pub fn contains(&self, text: &str) -> bool {
        self.records.iter().any(|r| r.message == text)
    }

    /// Number of messages equal to `text`
    pub fn count(&self, text: &str) -> usize {
        self.records.iter().filter(|r| r.message == text).count()
    }

    /// Messages at exactly `severity`
    pub fn at(&self, severity: LogSeverity) -> impl Iterator<Item = &LogRecord> {
        self.records.iter().filter(move |r| r.severity == severity)
    }
}

impl Logger for MockLogger {
    type Error = MockError;

    fn initialize(&mut self, target: &LogTarget) -> Result<(), Self::Error> {
        self.init.initialize("logger")?;
        self.target = Some(target.clone());
        Ok(())
    }

    fn has_device(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d == name)
    }

    fn write(&mut self, source: &str, severity: LogSeverity, message: fmt::Arguments<'_>) {
        self.records.push(LogRecord {
            source: source.to_string(),
            severity,
            message: message.to_string(),
        });
    }
}

// ── Interrupt controller ────────────────────────────────────────────────────

/// Mock interrupt controller
#[derive(Debug, Default)]
pub struct MockInterrupt {
    init: InitState,
}

impl MockInterrupt {
    /// Create new mock interrupt controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail
    pub fn fail_init(&mut self) {
        self.init.fail = true;
    }

    /// `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.init.initialized
    }
}

impl InterruptController for MockInterrupt {
    type Error = MockError;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.init.initialize("interrupt")
    }
}

// ── Timer ───────────────────────────────────────────────────────────────────

/// Mock timer: delays return immediately and are recorded
#[derive(Debug, Default)]
pub struct MockTimer {
    init: InitState,
    delays: Vec<u32>,
}

impl MockTimer {
    /// Create new mock timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` fail
    pub fn fail_init(&mut self) {
        self.init.fail = true;
    }

    /// `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.init.initialized
    }

    /// Every requested delay, in order
    pub fn delays(&self) -> &[u32] {
        &self.delays
    }
}

impl Timer for MockTimer {
    type Error = MockError;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.init.initialize("timer")
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

// ── SPI master ──────────────────────────────────────────────────────────────

/// Mock SPI master wired as a loopback (MOSI to MISO).
///
/// The transfer future yields `latency_polls` times before finishing so
/// callers observe a transfer that is still running.
#[derive(Debug)]
pub struct MockSpiMaster {
    init: InitState,
    config: SpiConfig,
    latency_polls: u32,
    fail_transfers: bool,
    transfers: Vec<(ChipSelect, usize)>,
}

impl MockSpiMaster {
    /// Create a loopback master with the given bus configuration
    pub fn new(config: SpiConfig) -> Self {
        Self {
            init: InitState::default(),
            config,
            latency_polls: 3,
            fail_transfers: false,
            transfers: Vec::new(),
        }
    }

    /// Make `initialize` fail
    pub fn fail_init(&mut self) {
        self.init.fail = true;
    }

    /// Make every transfer report an error
    pub fn fail_transfers(&mut self) {
        self.fail_transfers = true;
    }

    /// Number of executor polls a transfer stays in flight
    pub fn set_latency_polls(&mut self, polls: u32) {
        self.latency_polls = polls;
    }

    /// `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.init.initialized
    }

    /// `(chip select, length)` of every transfer started
    pub fn transfers(&self) -> &[(ChipSelect, usize)] {
        &self.transfers
    }
}

impl SpiMaster for MockSpiMaster {
    type Error = MockError;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.init.initialize("spi")
    }

    async fn write_read(
        &mut self,
        chip_select: ChipSelect,
        read: &mut [u8],
        write: &[u8],
    ) -> Result<(), Self::Error> {
        self.transfers.push((chip_select, write.len()));
        for _ in 0..self.latency_polls {
            embassy_futures::yield_now().await;
        }
        if self.fail_transfers {
            return Err(MockError::TransferFailed);
        }
        if read.len() != write.len() {
            return Err(MockError::LengthMismatch);
        }
        read.copy_from_slice(write);
        Ok(())
    }

    fn config(&self) -> SpiConfig {
        self.config
    }
}

// ── Board ───────────────────────────────────────────────────────────────────

/// Board made entirely of mocks
pub struct MockBoard;

impl Board for MockBoard {
    type Screen = MockScreen;
    type Serial = MockSerial;
    type Logger = MockLogger;
    type Interrupt = MockInterrupt;
    type Timer = MockTimer;
    type Spi = MockSpiMaster;
}

impl Devices<MockBoard> {
    /// Fresh mocks with a loopback SPI master at `spi_config`
    pub fn mock(spi_config: SpiConfig) -> Self {
        Self {
            screen: MockScreen::new(),
            serial: MockSerial::new(),
            logger: MockLogger::new(),
            interrupt: MockInterrupt::new(),
            timer: MockTimer::new(),
            spi: MockSpiMaster::new(spi_config),
        }
    }

    /// Like [`Devices::mock`], recording `initialize` calls into `journal`
    pub fn mock_with_journal(spi_config: SpiConfig, journal: &BootJournal) -> Self {
        let mut devices = Self::mock(spi_config);
        devices.screen.init.journal = Some(journal.clone());
        devices.serial.init.journal = Some(journal.clone());
        devices.logger.init.journal = Some(journal.clone());
        devices.interrupt.init.journal = Some(journal.clone());
        devices.timer.init.journal = Some(journal.clone());
        devices.spi.init.journal = Some(journal.clone());
        devices
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const CONFIG: SpiConfig = SpiConfig::new(16_000_000, SpiMode::Mode0);

    #[tokio::test]
    async fn test_mock_spi_loopback() {
        let mut spi = MockSpiMaster::new(CONFIG);
        let tx = [1u8, 2, 3, 4];
        let mut rx = [0x55u8; 4];
        spi.write_read(ChipSelect::Ce0, &mut rx, &tx).await.unwrap();
        assert_eq!(rx, tx);
        assert_eq!(spi.transfers(), &[(ChipSelect::Ce0, 4)]);
    }

    #[tokio::test]
    async fn test_mock_spi_failure() {
        let mut spi = MockSpiMaster::new(CONFIG);
        spi.fail_transfers();
        let mut rx = [0x55u8; 2];
        let result = spi.write_read(ChipSelect::Ce1, &mut rx, &[9, 9]).await;
        assert_eq!(result, Err(MockError::TransferFailed));
        assert_eq!(rx, [0x55, 0x55]);
    }

    #[tokio::test]
    async fn test_mock_serial_script() {
        let mut serial = MockSerial::new();
        serial.push_idle();
        serial.push_incoming(b"hello");
        let mut buf = [0u8; 100];
        assert_eq!(serial.read(&mut buf).await.unwrap(), 0);
        assert_eq!(serial.read(&mut buf).await.unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(serial.read(&mut buf).await.unwrap(), 0);
        assert_eq!(serial.reads(), 3);
    }

    #[test]
    fn test_mock_logger_records() {
        let mut logger = MockLogger::new();
        logger.initialize(&LogTarget::Screen).unwrap();
        logger.write("kernel", LogSeverity::Notice, format_args!("{} bytes", 16));
        assert!(logger.contains("16 bytes"));
        assert_eq!(logger.records()[0].source, "kernel");
        assert_eq!(logger.target(), Some(&LogTarget::Screen));
    }

    #[test]
    fn test_mock_logger_device_names() {
        let mut logger = MockLogger::new();
        assert!(logger.has_device("tty1"));
        assert!(logger.has_device("ttyS1"));
        assert!(!logger.has_device("ttyAMA0"));
        logger.add_device("ttyAMA0");
        assert!(logger.has_device("ttyAMA0"));
    }

    #[test]
    fn test_journal_records_failed_init_too() {
        let journal = BootJournal::new();
        let mut devices = Devices::mock_with_journal(CONFIG, &journal);
        devices.timer.fail_init();
        assert!(devices.screen.initialize().is_ok());
        assert_eq!(devices.timer.initialize(), Err(MockError::InitFailed));
        assert_eq!(journal.entries(), vec!["screen", "timer"]);
        assert!(!devices.timer.is_initialized());
    }

    #[tokio::test]
    async fn test_mock_timer_records_delays() {
        let mut timer = MockTimer::new();
        timer.delay_ms(1000).await;
        timer.delay_ms(4000).await;
        assert_eq!(timer.delays(), &[1000, 4000]);
    }
}
