//! Last-frame capture window.
//!
//! The IP latches TDATA of the most recent beat into consecutive 32-bit
//! registers starting at [`LAST_FRAME`](crate::regs::LAST_FRAME). Word 0
//! holds bytes 0..4 of the beat, little-endian, and so on. A width that is
//! not a multiple of four leaves the tail of the last word undefined.

use crate::regs::{LAST_FRAME, REGISTER_BYTES};

/// Widest stream the window is synthesized for (1024-bit TDATA).
pub const MAX_FRAME_BYTES: u32 = 128;

/// Number of 32-bit words covering `width_bytes`.
pub const fn word_count(width_bytes: u32) -> u32 {
    width_bytes.div_ceil(REGISTER_BYTES)
}

/// Register offset of frame word `index`, `None` if it overflows the
/// register address space.
pub const fn word_offset(index: u32) -> Option<u32> {
    match index.checked_mul(REGISTER_BYTES) {
        Some(delta) => LAST_FRAME.checked_add(delta),
        None => None,
    }
}

/// Offsets of every word covering `width_bytes`, in order.
///
/// Returns `None` when `width_bytes` exceeds [`MAX_FRAME_BYTES`]; reading
/// past the window would reach registers of neighbouring IPs.
pub fn word_offsets(width_bytes: u32) -> Option<impl Iterator<Item = u32>> {
    if width_bytes > MAX_FRAME_BYTES {
        return None;
    }
    // Within the window every offset is far below u32::MAX
    Some((0..word_count(width_bytes)).map(|i| LAST_FRAME + i * REGISTER_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_rounds_up() {
        assert_eq!(word_count(0), 0);
        assert_eq!(word_count(1), 1);
        assert_eq!(word_count(4), 1);
        assert_eq!(word_count(5), 2);
        assert_eq!(word_count(64), 16);
        assert_eq!(word_count(MAX_FRAME_BYTES), 32);
    }

    #[test]
    fn offsets_follow_window() {
        let offsets: Vec<u32> = word_offsets(10).unwrap().collect();
        assert_eq!(offsets, vec![0x30, 0x34, 0x38]);
        let last = word_offsets(MAX_FRAME_BYTES).unwrap().last();
        assert_eq!(last, Some(LAST_FRAME + 31 * 4));
    }

    #[test]
    fn widths_past_window_are_rejected() {
        assert!(word_offsets(MAX_FRAME_BYTES + 1).is_none());
        assert!(word_offsets(u32::MAX).is_none());
    }

    #[test]
    fn word_offset_does_not_overflow() {
        assert_eq!(word_offset(0), Some(LAST_FRAME));
        assert_eq!(word_offset(2), Some(0x38));
        assert_eq!(word_offset(u32::MAX / 4), None);
        assert_eq!(word_offset(u32::MAX), None);
    }
}
