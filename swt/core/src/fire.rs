//! Fire notifications and engine diagnostics

use core::fmt;

use heapless::{Deque, Vec};

use crate::slot::TimerId;
use crate::time::Tick;

/// One fire of one timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FireEvent {
    pub id: TimerId,
    /// Fire count of the timer including this fire
    pub fire_count: u32,
    /// Counter value at which the deadline elapsed
    pub due: u32,
}

impl fmt::Display for FireEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Firing timer id = {}", self.id.index())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FireEvent {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "fire {} #{=u32} at {=u32}",
            self.id,
            self.fire_count,
            self.due
        );
    }
}

/// Ids of the timers that fired in a single interrupt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FiredSet<const N: usize> {
    ids: Vec<TimerId, N>,
}

impl<const N: usize> FiredSet<N> {
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    pub(crate) fn insert(&mut self, id: TimerId) {
        // At most one entry per slot, so the set never overflows.
        let pushed = self.ids.push(id);
        debug_assert!(pushed.is_ok(), "{id} fired twice in one interrupt");
    }

    pub fn contains(&self, id: usize) -> bool {
        self.ids.iter().any(|fired| fired.index() == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TimerId> + '_ {
        self.ids.iter().copied()
    }

    /// Raw ids in slot order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.ids.iter().map(|id| id.index())
    }
}

/// Bounded FIFO of fire events waiting for the foreground
pub(crate) struct FireQueue<const Q: usize> {
    events: Deque<FireEvent, Q>,
}

impl<const Q: usize> FireQueue<Q> {
    pub(crate) const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Append an event; returns `false` if the queue was full and the event
    /// was dropped.
    pub(crate) fn push(&mut self, event: FireEvent) -> bool {
        self.events.push_back(event).is_ok()
    }

    pub(crate) fn pop(&mut self) -> Option<FireEvent> {
        self.events.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}

/// Counters describing engine health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// Interrupt handler invocations
    pub interrupts: u32,
    /// Timer fires across all slots
    pub fires: u32,
    /// Interrupts taken while no timer was scheduled, or latched before a
    /// rearm moved the comparator further out
    pub spurious: u32,
    /// Rearms whose compare value was already behind the counter
    pub overruns: u32,
    /// Fire events lost because the notification queue was full
    pub dropped_notifications: u32,
}

impl Diagnostics {
    pub const fn new() -> Self {
        Self {
            interrupts: 0,
            fires: 0,
            spurious: 0,
            overruns: 0,
            dropped_notifications: 0,
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interrupts={} fires={} spurious={} overruns={} dropped={}",
            self.interrupts, self.fires, self.spurious, self.overruns, self.dropped_notifications
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Diagnostics {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "irq={=u32} fires={=u32} spurious={=u32} overruns={=u32} dropped={=u32}",
            self.interrupts,
            self.fires,
            self.spurious,
            self.overruns,
            self.dropped_notifications
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fired_set_holds_one_entry_per_slot() {
        let mut set = FiredSet::<3>::new();
        for raw in [2, 0, 1] {
            set.insert(TimerId::new_unchecked(raw));
        }
        assert_eq!(set.len(), 3);
        assert!(set.contains(0) && set.contains(2));
        assert_eq!(set.indices().collect::<std::vec::Vec<_>>(), [2, 0, 1]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "fired twice")]
    fn fired_set_overflow_is_caught() {
        let mut set = FiredSet::<1>::new();
        set.insert(TimerId::new_unchecked(0));
        set.insert(TimerId::new_unchecked(0));
    }

    #[test]
    fn full_queue_rejects_newest() {
        let mut queue = FireQueue::<1>::new();
        let event = |fire_count| FireEvent {
            id: TimerId::new_unchecked(0),
            fire_count,
            due: 0,
        };
        assert!(queue.push(event(1)));
        assert!(!queue.push(event(2)));
        assert_eq!(queue.pop().map(|e| e.fire_count), Some(1));
        assert_eq!(queue.len(), 0);
    }
}
