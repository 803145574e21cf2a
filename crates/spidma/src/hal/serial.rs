//! Serial console over an `embedded-io-async` UART

use embassy_futures::select::{select, Either};
use embedded_io_async::{Read, Write};
use platform::SerialPort;

/// [`SerialPort`] over a buffered UART.
///
/// The UART is configured when it is constructed (embassy takes the baud
/// rate in its driver config); `initialize` only records the rate.
pub struct IoSerial<U> {
    uart: U,
    baud_rate: Option<u32>,
}

impl<U> IoSerial<U> {
    /// Wrap a UART already running at the console baud rate
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            baud_rate: None,
        }
    }

    /// Rate passed to `initialize`
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }
}

impl<U: Read + Write> SerialPort for IoSerial<U> {
    type Error = U::Error;

    fn initialize(&mut self, baud_rate: u32) -> Result<(), Self::Error> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    /// Returns what the receive buffer already holds, or 0 without waiting.
    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        if buffer.is_empty() {
            return Ok(0);
        }
        match select(self.uart.read(buffer), core::future::ready(())).await {
            Either::First(result) => result,
            Either::Second(()) => Ok(0),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.uart.write_all(data).await?;
        self.uart.flush().await
    }
}
