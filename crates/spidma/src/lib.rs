//! SPI DMA loopback harness
//!
//! Brings up screen, serial console, logger, interrupt controller, timer
//! and SPI master, then repeatedly clocks a 2000-byte test pattern through
//! the SPI master's DMA engine and logs what came back.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (main.rs / host_loopback example)
//!         ↓
//! Kernel (boot sequence, run loop, completion protocol)
//!         ↓
//! Collaborator traits (platform crate)
//!         ↓
//! Adapters (hal, display) → Embassy HAL / host mocks
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for STM32H7 target (embassy, defmt)
//! - `emulator` - Build for desktop runs (tokio, tracing)
//! - `std` - Enable standard library (platform mocks outside of tests)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --example host_loopback --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_async)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod boot;
pub mod completion;
pub mod config;
pub mod display;
pub mod hal;
pub mod hexdump;
pub mod kernel;
pub mod log;
pub mod options;
pub mod transfer;

// Re-export key types
pub use completion::{CompletionRoutine, TransferContext};
pub use kernel::{BootError, BootStage, Kernel, ShutdownMode};
pub use options::KernelOptions;
pub use transfer::SpiDmaMaster;
