//! Activity displays
//!
//! Two ways to show that the kernel is alive:
//!
//! - [`GraphicsRotor`]: spinning glyph on any `embedded-graphics` target
//!   (host framebuffer, SPI panel)
//! - [`LedActivity`]: a single status LED (Nucleo LD1) on the board

pub mod led;
pub mod rotor;

pub use led::LedActivity;
pub use rotor::{GraphicsRotor, ROTOR_CELL_HEIGHT, ROTOR_CELL_WIDTH};
