//! Timer ids and slots

use core::fmt;

use crate::{SwtError, SwtResult};

/// Stable handle naming one slot of the timer table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerId(usize);

impl TimerId {
    /// Validate `raw` against a table of `capacity` slots
    pub fn new(raw: usize, capacity: usize) -> SwtResult<Self> {
        if raw < capacity {
            Ok(Self(raw))
        } else {
            Err(SwtError::InvalidId { id: raw, capacity })
        }
    }

    /// Create an id without validation
    pub(crate) const fn new_unchecked(raw: usize) -> Self {
        Self(raw)
    }

    /// Get the raw slot index
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "timer#{=usize}", self.0);
    }
}

/// State of one timer.
///
/// `interval == 0` marks the slot inactive, in which case `remaining` and
/// `fire_count` are zero as well. While active, `remaining` stays within
/// `0..=interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSlot {
    interval: u32,
    remaining: u32,
    fire_count: u32,
}

impl TimerSlot {
    /// Inactive slot
    pub const INACTIVE: Self = Self {
        interval: 0,
        remaining: 0,
        fire_count: 0,
    };

    /// Freshly armed slot. A zero interval yields an inactive slot.
    pub const fn armed(interval: u32) -> Self {
        Self {
            interval,
            remaining: interval,
            fire_count: 0,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.interval != 0
    }

    /// Period in ticks
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Ticks until the next fire
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Fires since the slot was armed
    pub const fn fire_count(&self) -> u32 {
        self.fire_count
    }

    /// Catch up with `elapsed` ticks of real time.
    ///
    /// A deadline that already passed clamps to zero so the next interrupt
    /// fires it.
    pub(crate) fn advance(&mut self, elapsed: u32) {
        self.remaining = self.remaining.saturating_sub(elapsed);
    }

    /// Consume `amount` ticks; returns `true` if the slot fired.
    pub(crate) fn expire(&mut self, amount: u32) -> bool {
        self.advance(amount);
        if self.remaining == 0 {
            self.remaining = self.interval;
            self.fire_count = self.fire_count.wrapping_add(1);
            true
        } else {
            false
        }
    }
}

/// Copy of one active slot, as reported by introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerSnapshot {
    pub id: TimerId,
    pub interval: u32,
    pub remaining: u32,
    pub fire_count: u32,
}

impl TimerSnapshot {
    pub(crate) const fn of(id: TimerId, slot: &TimerSlot) -> Self {
        Self {
            id,
            interval: slot.interval,
            remaining: slot.remaining,
            fire_count: slot.fire_count,
        }
    }
}

impl fmt::Display for TimerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timer {} - Interval: {} us, Remain: {} us, Times fired: {}",
            self.id.0, self.interval, self.remaining, self.fire_count
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerSnapshot {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{}: interval={=u32} remaining={=u32} fired={=u32}",
            self.id,
            self.interval,
            self.remaining,
            self.fire_count
        );
    }
}
