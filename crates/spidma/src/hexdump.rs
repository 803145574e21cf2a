//! Hexdump of received data
//!
//! ```text
//! 0000: 00 01 02 03 04 05 06 07-08 09 0A 0B 0C 0D 0E 0F
//! 0010: 10 11 12
//! ```
//!
//! Offsets count from the start of the dumped slice and wrap at 0x10000.

use core::fmt::Write;

/// Bytes rendered per line
pub const BYTES_PER_LINE: usize = 16;

/// Capacity of one rendered line ("OOOO: " + 16 × "XX" + 15 separators)
pub const LINE_CAPACITY: usize = 64;

/// One rendered hexdump line
pub type HexLine = heapless::String<LINE_CAPACITY>;

/// Iterator over the lines of a hexdump
#[derive(Debug, Clone)]
pub struct HexLines<'a> {
    chunks: core::slice::Chunks<'a, u8>,
    offset: usize,
}

impl Iterator for HexLines<'_> {
    type Item = HexLine;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let line = format_line(self.offset, chunk);
        self.offset = self.offset.wrapping_add(chunk.len());
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for HexLines<'_> {}

/// Lines of a hexdump of `data`
pub fn lines(data: &[u8]) -> HexLines<'_> {
    HexLines {
        chunks: data.chunks(BYTES_PER_LINE),
        offset: 0,
    }
}

/// Render up to 16 bytes starting at `offset`. Extra bytes are ignored.
pub fn format_line(offset: usize, bytes: &[u8]) -> HexLine {
    let mut line = HexLine::new();
    // Worst case is 53 characters, so writes into the line cannot overflow.
    let _ = write!(line, "{:04X}:", offset & 0xFFFF);
    for (i, byte) in bytes.iter().take(BYTES_PER_LINE).enumerate() {
        let separator = if i == BYTES_PER_LINE / 2 { '-' } else { ' ' };
        let _ = write!(line, "{separator}{byte:02X}");
    }
    line
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    #[test]
    fn full_line_has_dash_between_halves() {
        let data: [u8; 16] = core::array::from_fn(|i| i as u8);
        assert_eq!(
            format_line(0, &data).as_str(),
            "0000: 00 01 02 03 04 05 06 07-08 09 0A 0B 0C 0D 0E 0F"
        );
    }

    #[test]
    fn last_line_may_be_short() {
        let data: [u8; 19] = core::array::from_fn(|i| i as u8);
        let dump: std::vec::Vec<HexLine> = lines(&data).collect();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump.get(1).map(HexLine::as_str), Some("0010: 10 11 12"));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(lines(&[]).count(), 0);
    }

    #[test]
    fn received_pattern_dump_is_eight_lines() {
        let rx: [u8; 128] = core::array::from_fn(|i| i as u8);
        let dump: std::vec::Vec<HexLine> = lines(&rx).collect();
        assert_eq!(dump.len(), 8);
        assert_eq!(
            dump.last().map(HexLine::as_str),
            Some("0070: 70 71 72 73 74 75 76 77-78 79 7A 7B 7C 7D 7E 7F")
        );
    }

    #[test]
    fn offset_wraps_at_sixteen_bits() {
        assert!(format_line(0x1_0020, &[0xAB]).starts_with("0020: AB"));
    }
}
