//! Adapters from the collaborator traits to concrete drivers
//!
//! The bus-level adapters ([`BusSpiMaster`], [`IoSerial`]) only need the
//! `embedded-hal-async` / `embedded-io-async` traits, so they build and are
//! tested on the host. Target-specific pieces live behind features:
//!
//! - `hardware`: [`stm32`] (embassy timer, NVIC, defmt logger)
//! - `emulator`: [`host`] (tokio timer, tracing logger)

pub mod serial;
pub mod spi;

#[cfg(feature = "hardware")]
pub mod stm32;

#[cfg(feature = "emulator")]
pub mod host;

pub use serial::IoSerial;
pub use spi::{BusError, BusSpiMaster};
