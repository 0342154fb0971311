//! Host-side console for the SWT timer engine.
//!
//! Drives an engine bound to simulated hardware whose counter follows wall
//! time, with the menu of the reference system: display, set and remove
//! timers, plus fire notification and diagnostics views.

pub mod commands;
pub mod console;

pub use commands::{parse_line, Command, Input, ParseError};
pub use console::{print_fires, Console};

#[cfg(test)]
mod tests;
