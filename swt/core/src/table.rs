//! Fixed-capacity timer table with reconciliation and minimum search

use crate::slot::{TimerId, TimerSlot, TimerSnapshot};
use crate::time::Tick;
use crate::SwtResult;

/// Table of `N` timer slots indexed by [`TimerId`].
///
/// Inactive slots are skipped by every computation, so `last_reconciled_at`
/// is never read before the first timer is armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerTable<const N: usize> {
    slots: [TimerSlot; N],
    last_reconciled_at: Tick,
}

impl<const N: usize> TimerTable<N> {
    /// Create a table with every slot inactive
    pub const fn new() -> Self {
        Self {
            slots: [TimerSlot::INACTIVE; N],
            last_reconciled_at: Tick::ZERO,
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Validate a raw id against this table
    pub fn id(&self, raw: usize) -> SwtResult<TimerId> {
        TimerId::new(raw, N)
    }

    /// Get the slot for `id`
    pub fn slot(&self, id: TimerId) -> Option<&TimerSlot> {
        self.slots.get(id.index())
    }

    /// All slots, active or not
    pub fn slots(&self) -> &[TimerSlot; N] {
        &self.slots
    }

    /// Counter value of the last reconciliation
    pub const fn last_reconciled_at(&self) -> Tick {
        self.last_reconciled_at
    }

    /// Overwrite `id` with a freshly armed slot; a zero interval deactivates it
    pub fn arm(&mut self, id: TimerId, interval: u32) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = TimerSlot::armed(interval);
        }
    }

    /// Deactivate `id`; returns `false` if it was already inactive
    pub fn disarm(&mut self, id: TimerId) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.is_active() => {
                *slot = TimerSlot::INACTIVE;
                true
            }
            _ => false,
        }
    }

    /// Advance every active slot except `exclude` by the ticks elapsed since
    /// the last reconciliation, then record `now` as the new reference point.
    pub fn reconcile(&mut self, now: Tick, exclude: Option<TimerId>) {
        let elapsed = now.elapsed_since(self.last_reconciled_at);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_active() || exclude.map(TimerId::index) == Some(index) {
                continue;
            }
            slot.advance(elapsed);
        }
        self.last_reconciled_at = now;
    }

    /// Record `now` as the reference point without touching any slot
    pub fn mark_reconciled(&mut self, now: Tick) {
        self.last_reconciled_at = now;
    }

    /// Smallest `remaining` among active slots, `None` if there are none
    pub fn minimal_remaining(&self) -> Option<u32> {
        self.slots
            .iter()
            .filter(|slot| slot.is_active())
            .map(TimerSlot::remaining)
            .min()
    }

    /// Take `amount` ticks off every active slot and fire those that reach
    /// zero. `on_fire` runs once per fired slot, after its reset. Returns the
    /// number of fired slots.
    pub fn expire<F>(&mut self, amount: u32, mut on_fire: F) -> usize
    where
        F: FnMut(TimerId, &TimerSlot),
    {
        let mut fired = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_active() && slot.expire(amount) {
                fired += 1;
                on_fire(TimerId::new_unchecked(index), slot);
            }
        }
        fired
    }

    /// Iterate over active slots in id order
    pub fn active(&self) -> impl Iterator<Item = TimerSnapshot> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_active())
            .map(|(index, slot)| TimerSnapshot::of(TimerId::new_unchecked(index), slot))
    }

    /// Number of active slots
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_active()).count()
    }
}

impl<const N: usize> Default for TimerTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
