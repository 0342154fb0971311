//! Deterministic interrupt delivery

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use swt_core::{Engine, DEFAULT_CAPACITY, DEFAULT_QUEUE_DEPTH};

use crate::hardware::SimHardware;
use crate::SimConfig;

/// Interrupts delivered at one counter value before the stepper gives up on
/// the current tick
const MAX_BURST: usize = 1024;

/// One delivered interrupt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptRecord {
    /// Counter value when the handler ran
    pub at: u32,
    /// Ids that fired, in slot order
    pub fired: Vec<usize>,
}

/// An [`Engine`] wired to simulated hardware.
///
/// The counter only moves through [`Simulation::advance`], which jumps from
/// one compare match to the next and runs the interrupt handler exactly at
/// each match. Counter steps take the same critical section as the engine,
/// so the counter never moves in the middle of an engine operation.
pub struct Simulation<const N: usize = DEFAULT_CAPACITY, const Q: usize = DEFAULT_QUEUE_DEPTH> {
    engine: Engine<SimHardware, N, Q>,
    hw: SimHardware,
    stepping: Mutex<()>,
    back_to_back: AtomicU32,
}

impl<const N: usize, const Q: usize> Simulation<N, Q> {
    pub fn new(config: &SimConfig) -> Self {
        Self::starting_at(config.start_counter)
    }

    /// Simulation whose counter starts at `counter`
    pub fn starting_at(counter: u32) -> Self {
        let hw = SimHardware::new(counter);
        Self {
            engine: Engine::new(hw.clone()),
            hw,
            stepping: Mutex::new(()),
            back_to_back: AtomicU32::new(0),
        }
    }

    pub fn engine(&self) -> &Engine<SimHardware, N, Q> {
        &self.engine
    }

    pub fn hardware(&self) -> &SimHardware {
        &self.hw
    }

    /// Current counter value
    pub fn counter(&self) -> u32 {
        self.hw.counter()
    }

    /// Interrupts delivered at the same counter value as the previous one,
    /// i.e. without the foreground getting a single tick in between
    pub fn back_to_back(&self) -> u32 {
        self.back_to_back.load(Ordering::Relaxed)
    }

    /// Run the counter forward by `ticks`, delivering every interrupt on the
    /// way. Interrupts already due at the current counter are delivered
    /// first, so `advance(0)` flushes them.
    pub fn advance(&self, ticks: u32) -> Vec<InterruptRecord> {
        let _stepping = self
            .stepping
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut records = Vec::new();
        let mut left = ticks;

        loop {
            self.deliver_due(&mut records);
            if left == 0 {
                return records;
            }

            // Measure and step under one critical section so a compare
            // written by the foreground in between is never jumped over.
            let step = critical_section::with(|_| {
                let step = self
                    .hw
                    .ticks_to_compare()
                    .map_or(left, |distance| distance.min(left));
                self.hw.step(step);
                step
            });
            left -= step;
        }
    }

    /// Run the counter forward until it reads `target`
    pub fn advance_to(&self, target: u32) -> Vec<InterruptRecord> {
        self.advance(target.wrapping_sub(self.counter()))
    }

    fn deliver_due(&self, records: &mut Vec<InterruptRecord>) {
        let mut burst = 0;
        while self.hw.poll() {
            if burst == MAX_BURST {
                log::error!(
                    "{MAX_BURST} interrupts at counter {} without progress",
                    self.counter()
                );
                return;
            }
            burst += 1;

            let at = self.counter();
            if records.last().is_some_and(|last| last.at == at) {
                self.back_to_back.fetch_add(1, Ordering::Relaxed);
            }
            let fired = self.engine.on_interrupt();
            records.push(InterruptRecord {
                at,
                fired: fired.indices().collect(),
            });
        }
    }
}

impl<const N: usize, const Q: usize> Default for Simulation<N, Q> {
    fn default() -> Self {
        Self::starting_at(0)
    }
}
