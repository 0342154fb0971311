//! Simulated timer register block

use std::sync::{Arc, Mutex, MutexGuard};

use swt_core::TimerHardware;

#[derive(Debug, Default)]
struct Registers {
    counter: u32,
    compare: u32,
    /// Counter value when `compare` was written
    written_at: u32,
    /// A compare value is programmed and has not matched yet
    armed: bool,
    /// Interrupt line latched and not yet cleared
    pending: bool,
    clears: u64,
}

impl Registers {
    /// Ticks the counter still has to travel before matching `compare`
    fn distance(&self) -> u32 {
        self.compare.wrapping_sub(self.written_at)
    }

    fn travelled(&self) -> u32 {
        self.counter.wrapping_sub(self.written_at)
    }

    fn latch(&mut self) {
        if self.armed && self.travelled() >= self.distance() {
            self.armed = false;
            self.pending = true;
        }
    }
}

/// Register model of the hardware timer.
///
/// Cloning yields another handle to the same registers. The comparator
/// latches the interrupt once the counter has travelled at least
/// `compare - counter_at_write` ticks since the write, so writing the current
/// counter value fires immediately and jumps past the compare value still
/// fire. The latch is evaluated by [`SimHardware::poll`] and by counter steps,
/// never inside `write_compare`, so a handler that rearms and then clears
/// does not lose an immediately due interrupt.
#[derive(Debug, Clone, Default)]
pub struct SimHardware {
    regs: Arc<Mutex<Registers>>,
}

impl SimHardware {
    /// Create a register block whose counter starts at `counter`
    pub fn new(counter: u32) -> Self {
        Self {
            regs: Arc::new(Mutex::new(Registers {
                counter,
                ..Registers::default()
            })),
        }
    }

    fn regs(&self) -> MutexGuard<'_, Registers> {
        // Registers hold plain integers; a poisoned lock still has valid data.
        self.regs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current counter value
    pub fn counter(&self) -> u32 {
        self.regs().counter
    }

    /// Last value written to the compare register
    pub fn compare(&self) -> u32 {
        self.regs().compare
    }

    /// A compare value is programmed and has not matched yet
    pub fn is_armed(&self) -> bool {
        self.regs().armed
    }

    /// Number of interrupt clear writes
    pub fn clear_count(&self) -> u64 {
        self.regs().clears
    }

    /// Ticks until the armed compare value matches; `Some(0)` if it is due
    /// now, `None` if nothing is armed.
    pub fn ticks_to_compare(&self) -> Option<u32> {
        let regs = self.regs();
        regs.armed
            .then(|| regs.distance().saturating_sub(regs.travelled()))
    }

    /// Evaluate the comparator and report whether the interrupt line is
    /// asserted
    pub fn poll(&self) -> bool {
        let mut regs = self.regs();
        regs.latch();
        regs.pending
    }

    /// Run the counter forward by `ticks`
    pub fn step(&self, ticks: u32) {
        let mut regs = self.regs();
        regs.counter = regs.counter.wrapping_add(ticks);
        regs.latch();
    }
}

impl TimerHardware for SimHardware {
    fn read_counter(&self) -> u32 {
        self.counter()
    }

    fn write_compare(&self, value: u32) {
        let mut regs = self.regs();
        regs.compare = value;
        regs.written_at = regs.counter;
        regs.armed = true;
    }

    fn clear_interrupt(&self) {
        let mut regs = self.regs();
        regs.pending = false;
        regs.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_exactly_at_compare() {
        let hw = SimHardware::new(100);
        hw.write_compare(110);
        assert_eq!(hw.ticks_to_compare(), Some(10));

        hw.step(9);
        assert!(!hw.poll());
        hw.step(1);
        assert!(hw.poll());
        assert!(!hw.is_armed());

        hw.clear_interrupt();
        assert!(!hw.poll());
        assert_eq!(hw.clear_count(), 1);
    }

    #[test]
    fn write_at_counter_fires_immediately() {
        let hw = SimHardware::new(7);
        hw.write_compare(7);
        assert_eq!(hw.ticks_to_compare(), Some(0));
        assert!(hw.poll());
    }

    #[test]
    fn rearm_then_clear_keeps_due_interrupt() {
        let hw = SimHardware::new(50);
        hw.write_compare(50);
        hw.clear_interrupt();
        assert!(hw.poll());
    }

    #[test]
    fn jump_past_compare_still_fires() {
        let hw = SimHardware::new(0xFFFF_FFF0);
        hw.write_compare(0x10);
        hw.step(0x40);
        assert!(hw.poll());
        assert_eq!(hw.counter(), 0x30);
    }

    #[test]
    fn clones_share_registers() {
        let hw = SimHardware::new(0);
        let other = hw.clone();
        other.step(5);
        assert_eq!(hw.counter(), 5);
    }
}
