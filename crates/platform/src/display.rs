//! Activity display abstraction
//!
//! The harness has nothing to draw except a busy indicator while the DMA
//! engine runs, so the screen collaborator is reduced to a rotor.

/// Screen (or status LED) showing that the main loop is alive.
pub trait ActivityDisplay {
    /// Error type for display operations
    type Error: core::fmt::Debug;

    /// Bring the display up. Called first in the boot sequence.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Advance the rotor in slot `index` to phase `count`.
    ///
    /// Called in a tight loop; implementations must be cheap and must not
    /// block.
    fn rotor(&mut self, index: u32, count: u32);

    /// Blink `times` to show the board came out of reset.
    fn blink(&mut self, times: u32) {
        let _ = times;
    }
}

/// Glyph sequence of the text rotor
pub const ROTOR_GLYPHS: [char; 4] = ['-', '\\', '|', '/'];

/// Glyph shown for phase `count`.
#[must_use]
#[allow(clippy::indexing_slicing)] // Safety: index is masked to 0..4
pub const fn rotor_glyph(count: u32) -> char {
    ROTOR_GLYPHS[(count & 3) as usize]
}
