//! Collaborator interfaces for the SPI DMA loopback harness
//!
//! The harness drives six external devices: screen, serial console,
//! logger, interrupt controller, timer and SPI master. This crate defines
//! the narrow trait each of them is reached through, so the harness runs
//! unchanged against embassy-stm32 drivers on the board and against mocks
//! on the host.
//!
//! # Architecture Layers
//!
//! ```text
//! Harness (spidma crate: boot sequence, run loop)
//!         ↓
//! Collaborator traits (this crate)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC) / mocks
//! ```
//!
//! # Features
//!
//! - `std`: Enable the [`mocks`] module outside of tests
//! - `defmt`: Derive `defmt::Format` on the public types
//!
//! # Example
//!
//! ```no_run
//! use platform::{ChipSelect, SpiMaster};
//!
//! async fn loopback<S: SpiMaster>(spi: &mut S) -> Result<(), S::Error> {
//!     let tx = [0xA5u8; 4];
//!     let mut rx = [0u8; 4];
//!     spi.write_read(ChipSelect::Ce0, &mut rx, &tx).await
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

pub mod board;
pub mod display;
pub mod dma;
pub mod log;
pub mod mocks;
pub mod mpu;
pub mod peripheral;
pub mod system;

pub use board::{Board, Devices};
pub use display::{rotor_glyph, ActivityDisplay};
pub use log::{LogSeverity, LogTarget, Logger};
pub use peripheral::{
    BitOrder, ChipSelect, ChipSelectError, SerialPort, SpiConfig, SpiMaster, SpiMode,
    TransferStatus,
};
pub use system::{InterruptController, Timer};
