#![cfg_attr(not(test), no_std)]

//! Memory-mapped port of the SWT hardware timer.
//!
//! The timer block is a free-running 32-bit counter at 1 MHz with three
//! registers:
//!
//! | offset | access | meaning                                   |
//! |--------|--------|-------------------------------------------|
//! | `0x0`  | RO     | current counter value                     |
//! | `0x4`  | WO     | compare value, interrupt when reached     |
//! | `0x8`  | WO     | interrupt clear, any value                |
//!
//! Bind [`MmioTimer`] to an [`Engine`] in a `static` and call
//! [`Engine::on_interrupt`] from the timer's interrupt vector:
//!
//! ```ignore
//! static TIMERS: MmioEngine = Engine::new(unsafe { MmioTimer::new(TMR_BASE) });
//!
//! #[interrupt]
//! fn TIMER() {
//!     TIMERS.on_interrupt();
//! }
//! ```
//!
//! With the `cortex-m` feature, critical sections come from
//! `cortex-m`'s single-core implementation, which masks interrupts.

use core::ptr;

use swt_core::{Engine, TimerHardware, DEFAULT_CAPACITY};

/// Base address of the timer block in the reference memory map
pub const TMR_BASE: usize = 0x1000_1000;

/// Offset of the read-only counter register
pub const TMR_VAL_OFFSET: usize = 0x0;
/// Offset of the write-only compare register
pub const TMR_CMP_OFFSET: usize = 0x4;
/// Offset of the write-only interrupt clear register
pub const TMR_INT_CLR_OFFSET: usize = 0x8;

/// Engine over the memory-mapped timer with the default capacity
pub type MmioEngine = Engine<MmioTimer, DEFAULT_CAPACITY>;

/// Volatile access to the timer register block
#[derive(Debug)]
pub struct MmioTimer {
    base: *mut u32,
}

// SAFETY: the registers are plain 32-bit MMIO words; single reads and writes
// are atomic on the target and the engine serialises every access through a
// critical section.
unsafe impl Send for MmioTimer {}
unsafe impl Sync for MmioTimer {}

impl MmioTimer {
    /// Bind to the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to the timer register block (or memory laid out like
    /// it), valid for volatile 32-bit access at the three offsets for the
    /// lifetime of the returned value, and no other driver may use the block.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    /// Bind to a block at a pointer, keeping its provenance.
    ///
    /// # Safety
    ///
    /// Same requirements as [`MmioTimer::new`].
    pub const unsafe fn from_ptr(base: *mut u32) -> Self {
        Self { base }
    }

    fn register(&self, offset: usize) -> *mut u32 {
        self.base
            .cast::<u8>()
            .wrapping_add(offset)
            .cast::<u32>()
    }
}

impl TimerHardware for MmioTimer {
    fn read_counter(&self) -> u32 {
        // SAFETY: guaranteed valid by the constructor contract.
        unsafe { ptr::read_volatile(self.register(TMR_VAL_OFFSET)) }
    }

    fn write_compare(&self, value: u32) {
        // SAFETY: guaranteed valid by the constructor contract.
        unsafe { ptr::write_volatile(self.register(TMR_CMP_OFFSET), value) }
    }

    fn clear_interrupt(&self) {
        // SAFETY: guaranteed valid by the constructor contract.
        unsafe { ptr::write_volatile(self.register(TMR_INT_CLR_OFFSET), 1) }
    }
}
