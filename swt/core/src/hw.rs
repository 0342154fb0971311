//! Hardware counter interface

/// The single hardware timer the engine multiplexes.
///
/// Mirrors a three-register block: a free-running 32-bit counter (read-only),
/// a compare register (write-only) and an interrupt clear register
/// (write-only). Registers are accessed through `&self` because they live
/// outside the engine's state and are touched from interrupt context.
pub trait TimerHardware {
    /// Current value of the free-running counter
    fn read_counter(&self) -> u32;

    /// Program the comparator.
    ///
    /// The interrupt fires when the counter reaches `value`, including after a
    /// counter wrap. Writing the current counter value fires immediately.
    fn write_compare(&self, value: u32);

    /// De-assert the level interrupt. Called at the end of every handler.
    fn clear_interrupt(&self);
}

impl<T: TimerHardware + ?Sized> TimerHardware for &T {
    fn read_counter(&self) -> u32 {
        (**self).read_counter()
    }

    fn write_compare(&self, value: u32) {
        (**self).write_compare(value)
    }

    fn clear_interrupt(&self) {
        (**self).clear_interrupt()
    }
}
