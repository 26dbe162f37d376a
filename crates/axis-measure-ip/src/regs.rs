//! Register map of the AXIS measurement IP.
//!
//! ```text
//! 0x10  CONTROL            write START/STOP/CLEAR, read back last code
//! 0x14  ASSERTIONS lo      beats transferred (TVALID && TREADY)
//! 0x18  ASSERTIONS hi
//! 0x1C  CYCLES lo          clock cycles while running
//! 0x20  CYCLES hi
//! 0x24  LATENCY lo         cycles from start to first beat
//! 0x28  LATENCY hi
//! 0x2C  AXIS_DATA_WIDTH    stream data width in bytes
//! 0x30  LAST_FRAME[0..]    raw TDATA of the last beat, little-endian words
//! ```
//!
//! Offsets 0x00..0x10 belong to the standard HLS AXI4-Lite block
//! (ap_ctrl, GIE, IER, ISR) and are not used by the driver.

// ── Control ──────────────────────────────────────────────────────────────────

/// Control register.
pub const CONTROL: u32 = 0x10;

// ── Counters ─────────────────────────────────────────────────────────────────

/// Assertion counter, low word. High word at `+4`.
pub const ASSERTIONS: u32 = 0x14;
/// Cycle counter, low word. High word at `+4`.
pub const CYCLES: u32 = 0x1C;
/// First-beat latency counter, low word. High word at `+4`.
pub const LATENCY: u32 = 0x24;

// ── Stream description ───────────────────────────────────────────────────────

/// Stream data width in bytes, as synthesized.
pub const AXIS_DATA_WIDTH: u32 = 0x2C;
/// First word of the captured last-frame window.
pub const LAST_FRAME: u32 = 0x30;

/// Width of one register in bytes.
pub const REGISTER_BYTES: u32 = 4;

/// Control register codes.
pub mod control {
    /// Stop counting, keep counter values.
    pub const STOP: u32 = 0x0;
    /// Start counting.
    pub const START: u32 = 0x1;
    /// Reset all counters to zero and stop.
    pub const CLEAR: u32 = 0x2;
}

/// A command written to [`CONTROL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCode {
    /// Stop counting.
    Stop,
    /// Start counting.
    Start,
    /// Clear counters (also stops).
    Clear,
}

impl ControlCode {
    /// Raw register value for this code.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Stop => control::STOP,
            Self::Start => control::START,
            Self::Clear => control::CLEAR,
        }
    }
}

impl From<ControlCode> for u32 {
    fn from(code: ControlCode) -> Self {
        code.bits()
    }
}

impl TryFrom<u32> for ControlCode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            control::STOP => Ok(Self::Stop),
            control::START => Ok(Self::Start),
            control::CLEAR => Ok(Self::Clear),
            other => Err(other),
        }
    }
}

/// Decoded read-back of [`CONTROL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlState {
    /// Counter is running.
    Running,
    /// Counter is stopped, values held.
    Stopped,
    /// Last command was a clear; counter is stopped at zero.
    Cleared,
    /// Value written through `set_control_register` that is not a known code.
    Unknown(u32),
}

impl ControlState {
    /// Decode a raw control register value.
    pub const fn from_bits(value: u32) -> Self {
        match value {
            control::START => Self::Running,
            control::STOP => Self::Stopped,
            control::CLEAR => Self::Cleared,
            other => Self::Unknown(other),
        }
    }

    /// Only an exact START read-back counts as running.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Cleared => write!(f, "cleared"),
            Self::Unknown(raw) => write!(f, "unknown ({raw:#x})"),
        }
    }
}

/// One of the three 64-bit counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Transferred beats.
    Assertions,
    /// Clock cycles.
    Cycles,
    /// Cycles to the first beat.
    Latency,
}

impl Counter {
    /// All counters, in register order.
    pub const ALL: [Self; 3] = [Self::Assertions, Self::Cycles, Self::Latency];

    /// Offset of the low word.
    pub const fn lo(self) -> u32 {
        match self {
            Self::Assertions => ASSERTIONS,
            Self::Cycles => CYCLES,
            Self::Latency => LATENCY,
        }
    }

    /// Offset of the high word.
    pub const fn hi(self) -> u32 {
        self.lo() + REGISTER_BYTES
    }

    /// Short lowercase name, for logs and CLI output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Assertions => "assertions",
            Self::Cycles => "cycles",
            Self::Latency => "latency",
        }
    }
}

/// Join the two halves of a split counter.
pub const fn join(hi: u32, lo: u32) -> u64 {
    ((hi as u64) << 32) | lo as u64
}

/// Split a 64-bit value into `(hi, lo)`.
#[allow(clippy::cast_possible_truncation)]
pub const fn split(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_adjacent_pairs() {
        assert_eq!(Counter::Assertions.hi(), 0x18);
        assert_eq!(Counter::Cycles.lo(), Counter::Assertions.hi() + 4);
        assert_eq!(Counter::Latency.hi(), 0x28);
        assert_eq!(AXIS_DATA_WIDTH, Counter::Latency.hi() + 4);
        assert_eq!(LAST_FRAME, AXIS_DATA_WIDTH + 4);
    }

    #[test]
    fn join_puts_hi_in_upper_word() {
        assert_eq!(join(0x1, 0x0), 1 << 32);
        assert_eq!(join(0xdead_beef, 0x0123_4567), 0xdead_beef_0123_4567);
        assert_eq!(split(0xdead_beef_0123_4567), (0xdead_beef, 0x0123_4567));
    }

    #[test]
    fn control_codes() {
        assert_eq!(ControlCode::Start.bits(), 1);
        assert_eq!(ControlCode::Stop.bits(), 0);
        assert_eq!(ControlCode::Clear.bits(), 2);
        assert_eq!(ControlCode::try_from(2), Ok(ControlCode::Clear));
        assert_eq!(ControlCode::try_from(7), Err(7));
    }

    #[test]
    fn only_start_is_active() {
        assert!(ControlState::from_bits(1).is_active());
        assert!(!ControlState::from_bits(0).is_active());
        assert!(!ControlState::from_bits(2).is_active());
        assert!(!ControlState::from_bits(3).is_active());
        assert_eq!(ControlState::from_bits(9), ControlState::Unknown(9));
    }
}
