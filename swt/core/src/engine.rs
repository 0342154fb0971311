//! Timer engine: arm, disarm and the compare interrupt handler.
//!
//! Foreground code calls [`Engine::set_timer`] and [`Engine::remove_timer`];
//! the interrupt service routine of the hardware timer calls
//! [`Engine::on_interrupt`]. Each entry point holds a critical section for
//! its whole body, which on a single-core target masks the timer interrupt
//! and on a hosted target serialises the simulated interrupt thread.

use core::cell::RefCell;
use core::convert::Infallible;
use core::fmt;

use critical_section::Mutex;
use heapless::Vec;

use crate::fire::{Diagnostics, FireEvent, FireQueue, FiredSet};
use crate::hw::TimerHardware;
use crate::slot::{TimerId, TimerSnapshot};
use crate::table::TimerTable;
use crate::time::Tick;
use crate::{SwtResult, DEFAULT_CAPACITY, DEFAULT_QUEUE_DEPTH};

/// Outcome of a successful [`Engine::remove_timer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disarm {
    /// The timer was active and is now inactive
    Removed,
    /// The timer was not active; nothing changed
    AlreadyInactive,
}

impl fmt::Display for Disarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disarm::Removed => write!(f, "Timer removed"),
            Disarm::AlreadyInactive => write!(f, "Timer is already inactive"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Disarm {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Disarm::Removed => defmt::write!(fmt, "Removed"),
            Disarm::AlreadyInactive => defmt::write!(fmt, "AlreadyInactive"),
        }
    }
}

enum Handled {
    Serviced,
    Overrun,
    Spurious,
    /// Latched before a foreground rearm moved the comparator further out
    Stale,
}

struct EngineState<const N: usize, const Q: usize> {
    table: TimerTable<N>,
    /// Delay the comparator was last programmed with, relative to
    /// `table.last_reconciled_at()`. `None` when nothing is scheduled.
    armed_delta: Option<u32>,
    fires: FireQueue<Q>,
    diag: Diagnostics,
}

impl<const N: usize, const Q: usize> EngineState<N, Q> {
    const fn new() -> Self {
        Self {
            table: TimerTable::new(),
            armed_delta: None,
            fires: FireQueue::new(),
            diag: Diagnostics::new(),
        }
    }

    /// Program the comparator for the soonest deadline after `now`.
    ///
    /// With no active timer the comparator keeps its previous value; an
    /// interrupt taken in that state is treated as spurious.
    fn rearm<H: TimerHardware>(&mut self, hw: &H, now: Tick) -> Option<u32> {
        self.armed_delta = self.table.minimal_remaining();
        if let Some(delta) = self.armed_delta {
            hw.write_compare(now.offset(delta).raw());
        }
        self.armed_delta
    }
}

/// Software timer engine over one hardware comparator.
///
/// `N` is the number of timer slots, `Q` the depth of the fire notification
/// queue. Both are fixed at compile time; the engine never allocates.
///
/// ```
/// use std::cell::Cell;
/// use swt_core::{Engine, TimerHardware};
///
/// #[derive(Default)]
/// struct Regs {
///     counter: Cell<u32>,
///     compare: Cell<u32>,
/// }
///
/// impl TimerHardware for Regs {
///     fn read_counter(&self) -> u32 {
///         self.counter.get()
///     }
///     fn write_compare(&self, value: u32) {
///         self.compare.set(value)
///     }
///     fn clear_interrupt(&self) {}
/// }
///
/// let engine: Engine<Regs, 4> = Engine::new(Regs::default());
/// engine.hardware().counter.set(100);
/// engine.set_timer(2, 40).unwrap();
/// assert_eq!(engine.hardware().compare.get(), 140);
///
/// engine.hardware().counter.set(140);
/// let fired = engine.on_interrupt();
/// assert!(fired.contains(2));
/// assert_eq!(engine.hardware().compare.get(), 180);
/// ```
pub struct Engine<H, const N: usize = DEFAULT_CAPACITY, const Q: usize = DEFAULT_QUEUE_DEPTH> {
    hw: H,
    state: Mutex<RefCell<EngineState<N, Q>>>,
}

impl<H: TimerHardware, const N: usize, const Q: usize> Engine<H, N, Q> {
    /// Create an engine with every timer inactive.
    ///
    /// The hardware is not touched until the first timer is armed, so this
    /// can initialise a `static`.
    pub const fn new(hw: H) -> Self {
        Self {
            hw,
            state: Mutex::new(RefCell::new(EngineState::new())),
        }
    }

    /// Number of timer slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The hardware timer driven by this engine
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    fn with_state<R>(&self, f: impl FnOnce(&H, &mut EngineState<N, Q>) -> R) -> R {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            f(&self.hw, &mut state)
        })
    }

    /// Arm timer `id` with a period of `interval_us` ticks.
    ///
    /// The timer first fires `interval_us` ticks from now and then every
    /// `interval_us` ticks. Re-arming an active timer restarts it and resets
    /// its fire count. A zero interval deactivates the timer.
    ///
    /// Intervals must stay well above the interrupt handling latency; the
    /// engine does not enforce this. See [`Diagnostics::overruns`].
    pub fn set_timer(&self, id: usize, interval_us: u32) -> SwtResult<()> {
        let id = TimerId::new(id, N)?;

        let next = self.with_state(|hw, state| {
            state.table.arm(id, interval_us);
            let now = Tick::new(hw.read_counter());
            state.table.reconcile(now, Some(id));
            state.rearm(hw, now).map(|delta| now.offset(delta))
        });

        if interval_us == 0 {
            log::debug!("{id} deactivated by zero interval");
        } else {
            log::debug!("{id} armed every {interval_us} us");
        }
        if let Some(next) = next {
            log::trace!("next compare at {next}");
        }
        Ok(())
    }

    /// Deactivate timer `id`.
    ///
    /// The comparator is left alone: if it was programmed for this timer the
    /// resulting interrupt just reconciles the remaining timers.
    pub fn remove_timer(&self, id: usize) -> SwtResult<Disarm> {
        let id = TimerId::new(id, N)?;

        if self.with_state(|_, state| state.table.disarm(id)) {
            log::debug!("{id} removed");
            Ok(Disarm::Removed)
        } else {
            log::info!("{id} is already inactive");
            Ok(Disarm::AlreadyInactive)
        }
    }

    /// Compare interrupt handler.
    ///
    /// Call from the interrupt service routine of the hardware timer. Every
    /// active timer is advanced by the delay the comparator was programmed
    /// with; those reaching zero fire, are reloaded with their interval and
    /// get one notification each. The comparator is then programmed for the
    /// next deadline and the interrupt is cleared.
    ///
    /// An interrupt that latched before `set_timer` moved the comparator to a
    /// later deadline is stale: the table was already brought up to date, so
    /// it is only cleared and counted in [`Diagnostics::spurious`].
    ///
    /// Returns the ids that fired in this invocation.
    pub fn on_interrupt(&self) -> FiredSet<N> {
        let mut fired = FiredSet::new();

        let handled = self.with_state(|hw, state| {
            state.diag.interrupts = state.diag.interrupts.wrapping_add(1);

            let Some(amount) = state.armed_delta else {
                state.diag.spurious = state.diag.spurious.wrapping_add(1);
                hw.clear_interrupt();
                return Handled::Spurious;
            };

            let due = state.table.last_reconciled_at().offset(amount);
            if due.is_after(Tick::new(hw.read_counter())) {
                state.diag.spurious = state.diag.spurious.wrapping_add(1);
                hw.clear_interrupt();
                return Handled::Stale;
            }

            let EngineState {
                table, fires, diag, ..
            } = &mut *state;
            table.expire(amount, |id, slot| {
                fired.insert(id);
                diag.fires = diag.fires.wrapping_add(1);
                let event = FireEvent {
                    id,
                    fire_count: slot.fire_count(),
                    due: due.raw(),
                };
                if !fires.push(event) {
                    diag.dropped_notifications = diag.dropped_notifications.wrapping_add(1);
                }
            });

            let now = Tick::new(hw.read_counter());
            state.table.mark_reconciled(now);
            let overrun = match state.rearm(hw, now) {
                Some(delta) => Tick::new(hw.read_counter()).elapsed_since(now) > delta,
                None => false,
            };
            if overrun {
                state.diag.overruns = state.diag.overruns.wrapping_add(1);
            }

            hw.clear_interrupt();
            if overrun {
                Handled::Overrun
            } else {
                Handled::Serviced
            }
        });

        match handled {
            Handled::Serviced => log::trace!("interrupt fired {} timers", fired.len()),
            Handled::Overrun => log::warn!("compare value already passed, intervals too short"),
            Handled::Spurious => log::debug!("spurious timer interrupt"),
            Handled::Stale => log::debug!("stale timer interrupt, comparator already rearmed"),
        }
        fired
    }

    /// Pop the oldest fire notification without blocking.
    ///
    /// Use with `nb::block!` to wait for the next fire.
    pub fn read_fire(&self) -> nb::Result<FireEvent, Infallible> {
        self.with_state(|_, state| state.fires.pop())
            .ok_or(nb::Error::WouldBlock)
    }

    /// Hand every queued notification to `f`, oldest first. Returns the
    /// number of notifications delivered.
    ///
    /// `f` runs outside the critical section.
    pub fn drain_fires(&self, mut f: impl FnMut(FireEvent)) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.read_fire() {
            f(event);
            delivered += 1;
        }
        delivered
    }

    /// Number of queued notifications
    pub fn pending_fires(&self) -> usize {
        self.with_state(|_, state| state.fires.len())
    }

    /// Active timers in id order
    pub fn list_active(&self) -> Vec<TimerSnapshot, N> {
        self.with_state(|_, state| state.table.active().collect())
    }

    /// Copy of the whole timer table
    pub fn snapshot(&self) -> TimerTable<N> {
        self.with_state(|_, state| state.table.clone())
    }

    /// Counter value the comparator is currently programmed for, if any
    /// timer is scheduled
    pub fn next_deadline(&self) -> Option<Tick> {
        self.with_state(|_, state| {
            state
                .armed_delta
                .map(|delta| state.table.last_reconciled_at().offset(delta))
        })
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.with_state(|_, state| state.diag)
    }
}
