//! Spinning rotor glyph on an `embedded-graphics` draw target

use core::fmt::Debug;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::{Dimensions, DrawTarget, Drawable, Point, Primitive, Size};
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use platform::{rotor_glyph, ActivityDisplay};

/// Width of one rotor cell in pixels
pub const ROTOR_CELL_WIDTH: u32 = 6;

/// Height of one rotor cell in pixels
pub const ROTOR_CELL_HEIGHT: u32 = 10;

/// Rotors drawn right to left from the top-right corner of the screen.
///
/// The screen defaults to the whole draw target; `with_screen_size`
/// shrinks it.
pub struct GraphicsRotor<D: DrawTarget> {
    target: D,
    screen: Size,
    foreground: D::Color,
    background: D::Color,
}

impl<D> GraphicsRotor<D>
where
    D: DrawTarget,
    D::Error: Debug,
{
    /// Draw in `foreground` on `background`
    pub fn new(target: D, foreground: D::Color, background: D::Color) -> Self {
        let screen = target.bounding_box().size;
        Self {
            target,
            screen,
            foreground,
            background,
        }
    }

    /// Limit the screen to `width` x `height` pixels, as the `width=` and
    /// `height=` options request. 0 keeps the target's size on that axis,
    /// and the target's size caps both.
    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        let full = self.target.bounding_box().size;
        let pick = |requested: u32, available: u32| match requested {
            0 => available,
            n => n.min(available),
        };
        self.screen = Size::new(pick(width, full.width), pick(height, full.height));
        self
    }

    /// Screen size in use
    pub fn screen_size(&self) -> Size {
        self.screen
    }

    /// Underlying draw target
    pub fn target(&self) -> &D {
        &self.target
    }

    /// Cell of rotor `index`, `None` when it falls off the screen.
    pub fn cell(&self, index: u32) -> Option<Rectangle> {
        if self.screen.height < ROTOR_CELL_HEIGHT {
            return None;
        }
        let right = index.checked_add(1)?.checked_mul(ROTOR_CELL_WIDTH)?;
        let x = i32::try_from(self.screen.width.checked_sub(right)?).ok()?;
        Some(Rectangle::new(
            Point::new(x, 0),
            Size::new(ROTOR_CELL_WIDTH, ROTOR_CELL_HEIGHT),
        ))
    }

    fn draw_glyph(&mut self, index: u32, count: u32) -> Result<(), D::Error> {
        let Some(cell) = self.cell(index) else {
            return Ok(());
        };
        cell.into_styled(PrimitiveStyle::with_fill(self.background))
            .draw(&mut self.target)?;

        let mut utf8 = [0u8; 4];
        let glyph = rotor_glyph(count).encode_utf8(&mut utf8);
        let style = MonoTextStyle::new(&FONT_6X10, self.foreground);
        Text::with_baseline(glyph, cell.top_left, style, Baseline::Top).draw(&mut self.target)?;
        Ok(())
    }
}

impl<D> ActivityDisplay for GraphicsRotor<D>
where
    D: DrawTarget,
    D::Error: Debug,
{
    type Error = D::Error;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.target.clear(self.background)
    }

    fn rotor(&mut self, index: u32, count: u32) {
        // A missed frame is harmless; the next spin redraws the cell.
        let _ = self.draw_glyph(index, count);
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects, clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::pixelcolor::BinaryColor;

    fn rotor() -> GraphicsRotor<MockDisplay<BinaryColor>> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        GraphicsRotor::new(display, BinaryColor::On, BinaryColor::Off)
    }

    fn lit_pixels(rotor: &GraphicsRotor<MockDisplay<BinaryColor>>, x0: i32) -> usize {
        (x0..x0 + 6)
            .flat_map(|x| (0..10).map(move |y| Point::new(x, y)))
            .filter(|p| rotor.target().get_pixel(*p) == Some(BinaryColor::On))
            .count()
    }

    #[test]
    fn rotor_draws_glyph_in_top_right_cell() {
        let mut r = rotor();
        r.rotor(0, 0);
        assert!(lit_pixels(&r, 58) > 0);
        assert_eq!(lit_pixels(&r, 52), 0);
    }

    #[test]
    fn consecutive_counts_draw_different_glyphs() {
        let mut a = rotor();
        let mut b = rotor();
        a.rotor(0, 0);
        b.rotor(0, 2);
        assert_ne!(lit_pixels(&a, 58), lit_pixels(&b, 58));
    }

    #[test]
    fn second_rotor_uses_next_cell_to_the_left() {
        let mut r = rotor();
        r.rotor(1, 3);
        assert_eq!(lit_pixels(&r, 58), 0);
        assert!(lit_pixels(&r, 52) > 0);
    }

    #[test]
    fn requested_width_moves_the_rotor() {
        let mut r = rotor().with_screen_size(32, 0);
        assert_eq!(r.screen_size(), Size::new(32, 64));
        r.rotor(0, 0);
        assert!(lit_pixels(&r, 26) > 0);
        assert_eq!(lit_pixels(&r, 58), 0);
    }

    #[test]
    fn screen_options_reach_the_rotor() {
        let options = crate::KernelOptions::parse("width=32 height=20");
        let r = rotor().with_screen_size(options.width(), options.height());
        assert_eq!(r.screen_size(), Size::new(32, 20));
        assert_eq!(r.cell(0).unwrap().top_left, Point::new(26, 0));
    }

    #[test]
    fn requested_size_is_capped_by_the_target() {
        let r = rotor().with_screen_size(640, 480);
        assert_eq!(r.screen_size(), Size::new(64, 64));
        assert_eq!(r.cell(0).unwrap().top_left, Point::new(58, 0));
    }

    #[test]
    fn cells_off_screen_are_skipped() {
        let mut r = rotor().with_screen_size(12, 0);
        assert!(r.cell(1).is_some());
        assert!(r.cell(2).is_none());
        r.rotor(2, 0);
        assert!((0..=58).all(|x| lit_pixels(&r, x) == 0));

        let short = rotor().with_screen_size(0, 8);
        assert!(short.cell(0).is_none());
    }
}
