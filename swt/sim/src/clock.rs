//! Real-time clock thread for the simulation
//!
//! Maps wall time onto counter ticks and advances the simulation from a
//! background thread. Sleeps until absolute wake-up times to avoid drift, and
//! lets the stepper deliver every interrupt that fell inside the elapsed
//! window at its exact counter value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::stepper::Simulation;
use crate::{SimConfig, SimError};

/// Handle to a running clock thread. Dropping it stops the thread.
pub struct Clock {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Clock {
    /// Spawn the clock thread driving `sim`
    pub fn start<const N: usize, const Q: usize>(
        sim: Arc<Simulation<N, Q>>,
        config: &SimConfig,
    ) -> Result<Self, SimError> {
        config.validate()?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let tick = config.tick_duration;
        let period = config.step_period;

        let handle = thread::Builder::new()
            .name("swt-clock".into())
            .spawn(move || clock_thread(&*sim, tick, period, &flag))
            .map_err(SimError::Spawn)?;

        log::debug!("clock started: {tick:?} per tick, stepping every {period:?}");
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the thread and wait for it to finish
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("clock thread panicked");
            }
            log::debug!("clock stopped");
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn clock_thread<const N: usize, const Q: usize>(
    sim: &Simulation<N, Q>,
    tick: Duration,
    period: Duration,
    running: &AtomicBool,
) {
    let start = Instant::now();
    let tick_nanos = tick.as_nanos().max(1);
    let mut next_wake = start;
    let mut applied: u128 = 0;

    while running.load(Ordering::Relaxed) {
        next_wake += period;
        let now = Instant::now();
        if next_wake > now {
            thread::sleep(next_wake - now);
        }

        let due = start.elapsed().as_nanos() / tick_nanos;
        let mut behind = due - applied;
        while behind > 0 {
            let chunk = u32::try_from(behind).unwrap_or(u32::MAX);
            let records = sim.advance(chunk);
            if !records.is_empty() {
                log::trace!("{} interrupts up to counter {}", records.len(), sim.counter());
            }
            behind -= u128::from(chunk);
        }
        applied = due;
    }
}
