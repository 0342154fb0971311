//! Counter readings and tick arithmetic

use core::fmt;

/// Counter ticks per second (1 tick = 1 microsecond)
pub const TICKS_PER_SEC: u32 = 1_000_000;

/// A reading of the free-running hardware counter.
///
/// The counter wraps modulo 2^32, so readings only make sense relative to
/// each other. All arithmetic here wraps on `u32`; promoting to a wider or
/// signed type would break the cancellation between counter wrap and
/// subtraction wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    /// Counter value zero
    pub const ZERO: Self = Self(0);

    /// Wrap a raw counter reading
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Ticks elapsed since `earlier`.
    ///
    /// Correct across one counter wrap as long as the true elapsed time is
    /// below 2^32 ticks.
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// The counter value `ticks` after this one
    pub const fn offset(self, ticks: u32) -> Tick {
        Tick(self.0.wrapping_add(ticks))
    }

    /// Check if this reading is after `other` (within half the counter range)
    pub const fn is_after(self, other: Tick) -> bool {
        let diff = self.0.wrapping_sub(other.0);
        diff != 0 && diff < u32::MAX / 2
    }
}

impl From<u32> for Tick {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{=u32}", self.0);
    }
}

/// Interval of `micros` microseconds
pub const fn micros(micros: u32) -> u32 {
    micros
}

/// Interval of `millis` milliseconds, saturating at `u32::MAX` ticks
pub const fn millis(millis: u32) -> u32 {
    millis.saturating_mul(TICKS_PER_SEC / 1000)
}

/// Interval of `secs` seconds, saturating at `u32::MAX` ticks
pub const fn secs(secs: u32) -> u32 {
    secs.saturating_mul(TICKS_PER_SEC)
}

/// Macro to write timer intervals with a unit
///
/// ```
/// assert_eq!(swt_core::interval!(250 us), 250);
/// assert_eq!(swt_core::interval!(3 ms), 3_000);
/// assert_eq!(swt_core::interval!(2 s), 2_000_000);
/// ```
#[macro_export]
macro_rules! interval {
    ($value:literal us) => {
        $crate::time::micros($value)
    };
    ($value:literal ms) => {
        $crate::time::millis($value)
    };
    ($value:literal s) => {
        $crate::time::secs($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_across_wrap() {
        let before = Tick::new(0xFFFF_FFF0);
        let after = Tick::new(0x0000_0010);
        assert_eq!(after.elapsed_since(before), 0x20);
    }

    #[test]
    fn offset_wraps() {
        assert_eq!(Tick::new(0xFFFF_FFF0).offset(32), Tick::new(16));
    }

    #[test]
    fn is_after_handles_wrap() {
        assert!(Tick::new(5).is_after(Tick::new(u32::MAX - 5)));
        assert!(!Tick::new(u32::MAX - 5).is_after(Tick::new(5)));
        assert!(!Tick::new(7).is_after(Tick::new(7)));
    }

    #[test]
    fn unit_helpers_saturate() {
        assert_eq!(millis(5), 5_000);
        assert_eq!(secs(u32::MAX), u32::MAX);
        assert_eq!(interval!(10 ms), 10_000);
    }
}
