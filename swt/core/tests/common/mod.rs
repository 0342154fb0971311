//! Single-threaded register model shared by the engine tests

#![allow(dead_code)]

use std::cell::Cell;

use swt_core::{Engine, TimerHardware};

#[derive(Default)]
pub struct Regs {
    pub counter: Cell<u32>,
    pub compare: Cell<u32>,
    /// Set by a compare write, consumed when the interrupt is delivered
    pub armed: Cell<bool>,
    pub clears: Cell<u32>,
}

impl Regs {
    pub fn starting_at(counter: u32) -> Self {
        let regs = Self::default();
        regs.counter.set(counter);
        regs
    }
}

impl TimerHardware for Regs {
    fn read_counter(&self) -> u32 {
        self.counter.get()
    }

    fn write_compare(&self, value: u32) {
        self.compare.set(value);
        self.armed.set(true);
    }

    fn clear_interrupt(&self) {
        self.clears.set(self.clears.get() + 1);
    }
}

/// One delivered interrupt: counter value and the ids that fired
pub type Delivery = (u32, Vec<usize>);

/// Run the counter forward by `ticks`, delivering every interrupt exactly at
/// its compare value.
pub fn advance<const N: usize, const Q: usize>(
    engine: &Engine<Regs, N, Q>,
    ticks: u32,
) -> Vec<Delivery> {
    let regs = engine.hardware();
    let mut left = ticks;
    let mut deliveries = Vec::new();

    loop {
        if regs.armed.get() {
            let distance = regs.compare.get().wrapping_sub(regs.counter.get());
            if distance <= left {
                regs.counter.set(regs.compare.get());
                left -= distance;
                regs.armed.set(false);
                let fired = engine.on_interrupt();
                deliveries.push((regs.counter.get(), fired.indices().collect()));
                continue;
            }
        }
        regs.counter.set(regs.counter.get().wrapping_add(left));
        return deliveries;
    }
}

/// Counter values at which `id` fired
pub fn fire_ticks(deliveries: &[Delivery], id: usize) -> Vec<u32> {
    deliveries
        .iter()
        .filter(|(_, fired)| fired.contains(&id))
        .map(|(at, _)| *at)
        .collect()
}
