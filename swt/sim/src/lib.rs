//! # SWT Simulation
//!
//! Host-side stand-in for the hardware timer: a register model
//! ([`SimHardware`]), a deterministic stepper that delivers each compare
//! interrupt exactly at its counter value ([`Simulation`]), and a background
//! thread that drives the stepper from wall time ([`Clock`]).
//!
//! Critical sections use the `critical-section` std implementation, a
//! process-wide lock, so engine calls from the foreground thread and
//! interrupt delivery from the clock thread never interleave.

use std::io;
use std::time::Duration;

use thiserror::Error;

pub mod clock;
pub mod hardware;
pub mod stepper;

pub use clock::Clock;
pub use hardware::SimHardware;
pub use stepper::{InterruptRecord, Simulation};

/// Wall time per counter tick in the reference system (1 MHz counter)
pub const DEFAULT_TICK_DURATION: Duration = Duration::from_micros(1);

/// How often the clock thread catches the counter up with wall time
pub const DEFAULT_STEP_PERIOD: Duration = Duration::from_millis(1);

/// Errors raised by the simulation harness
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid simulation config: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to spawn clock thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Configuration of the simulated timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Counter value at power-up
    pub start_counter: u32,
    /// Wall time per counter tick; larger values slow the simulation down
    pub tick_duration: Duration,
    /// Wall time between clock thread wake-ups
    pub step_period: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_counter: 0,
            tick_duration: DEFAULT_TICK_DURATION,
            step_period: DEFAULT_STEP_PERIOD,
        }
    }
}

impl SimConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.tick_duration.is_zero() {
            return Err(SimError::InvalidConfig("tick duration must be non-zero"));
        }
        if self.step_period.is_zero() {
            return Err(SimError::InvalidConfig("step period must be non-zero"));
        }
        Ok(())
    }
}

/// Builder for ergonomic simulation configuration construction.
#[derive(Debug, Clone, Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Sets the counter value at power-up.
    pub fn start_counter(mut self, counter: u32) -> Self {
        self.config.start_counter = counter;
        self
    }

    /// Sets the wall time per counter tick.
    pub fn tick_duration(mut self, tick: Duration) -> Self {
        self.config.tick_duration = tick;
        self
    }

    /// Sets how often the clock thread wakes up.
    pub fn step_period(mut self, period: Duration) -> Self {
        self.config.step_period = period;
        self
    }

    /// Builds the configuration, rejecting zero durations.
    pub fn build(self) -> Result<SimConfig, SimError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
