#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # SWT Core
//!
//! Multiplexes a fixed number of periodic software timers onto one free-running
//! 32-bit counter and a single compare interrupt.
//!
//! The [`Engine`] owns a [`TimerTable`] of slots indexed by stable ids. Arming a
//! timer brings every other active slot up to date with the counter and
//! reprograms the comparator for the soonest deadline; the interrupt handler
//! fires the slots that reached zero and reprograms the comparator again. All
//! entry points run inside a critical section, so the table is never observed
//! half-updated from either context.

use core::fmt;

pub mod engine;
pub mod fire;
pub mod hw;
pub mod slot;
pub mod table;
pub mod time;

pub use engine::*;
pub use fire::*;
pub use hw::*;
pub use slot::*;
pub use table::*;
pub use time::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of timer slots in the reference system
pub const DEFAULT_CAPACITY: usize = 10;

/// Default depth of the fire notification queue
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

/// Result type used throughout the engine
pub type SwtResult<T> = Result<T, SwtError>;

/// Errors returned by engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwtError {
    /// Timer id outside `[0, capacity)`
    InvalidId { id: usize, capacity: usize },
}

impl fmt::Display for SwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwtError::InvalidId { id, capacity } => write!(
                f,
                "timer id {} exceeds limit, maximal is {}",
                id,
                capacity.saturating_sub(1)
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SwtError {}

#[cfg(feature = "defmt")]
impl defmt::Format for SwtError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SwtError::InvalidId { id, capacity } => {
                defmt::write!(fmt, "InvalidId({=usize}/{=usize})", id, capacity)
            }
        }
    }
}
