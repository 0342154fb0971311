use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use swt_sim::{Clock, SimConfig, Simulation};
use swtctl::{print_fires, Console};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Software timers over one simulated hardware timer")]
struct Opts {
    /// Wall-clock microseconds per counter tick; 1 runs in real time
    #[arg(long, env = "SWT_TIME_SCALE", default_value_t = 1.0, value_name = "US")]
    time_scale: f64,

    /// Counter value at start-up, decimal or 0x-prefixed hex
    #[arg(long, env = "SWT_START_COUNTER", default_value = "0", value_parser = parse_counter)]
    start_counter: u32,

    /// Print listings, fires and stats as JSON lines
    #[arg(long, env = "SWT_JSON")]
    json: bool,

    /// Milliseconds between clock updates and fire printouts
    #[arg(long, env = "SWT_TICK_MS", default_value_t = 1, value_name = "MS")]
    tick_ms: u64,
}

impl Opts {
    fn sim_config(&self) -> Result<SimConfig> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            bail!("--time-scale must be a positive number, got {}", self.time_scale);
        }
        let tick = Duration::try_from_secs_f64(self.time_scale / 1_000_000.0)
            .context("--time-scale out of range")?;

        SimConfig::builder()
            .start_counter(self.start_counter)
            .tick_duration(tick)
            .step_period(Duration::from_millis(self.tick_ms))
            .build()
            .context("invalid simulation settings")
    }
}

fn parse_counter(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|err| format!("invalid counter value `{value}`: {err}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    let config = opts.sim_config()?;
    tracing::info!(?config, "starting simulated timer");

    let sim: Arc<Simulation> = Arc::new(Simulation::new(&config));
    let clock = Clock::start(Arc::clone(&sim), &config).context("failed to start the clock")?;

    ctrlc::set_handler(|| {
        tracing::info!("interrupted");
        process::exit(130);
    })
    .context("failed to install the Ctrl-C handler")?;

    let running = Arc::new(AtomicBool::new(true));
    let printer = {
        let sim = Arc::clone(&sim);
        let running = Arc::clone(&running);
        let period = config.step_period;
        let json = opts.json;
        thread::Builder::new()
            .name("swt-fires".into())
            .spawn(move || {
                while running.load(Ordering::Relaxed) {
                    thread::sleep(period);
                    if let Err(err) = print_fires(&*sim, &mut io::stdout().lock(), json) {
                        tracing::error!(%err, "failed to print fires");
                        break;
                    }
                }
            })
            .context("failed to start the fire printer")?
    };

    let result = Console::new(&*sim, io::stdin().lock(), io::stdout())
        .json(opts.json)
        .run();

    running.store(false, Ordering::Relaxed);
    if printer.join().is_err() {
        tracing::error!("fire printer panicked");
    }
    clock.stop();
    tracing::info!(diagnostics = %sim.engine().diagnostics(), "stopped");

    result.context("console I/O failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accepts_hex_and_decimal() {
        assert_eq!(parse_counter("0xFFFFFFF0"), Ok(0xFFFF_FFF0));
        assert_eq!(parse_counter("1000"), Ok(1000));
        assert!(parse_counter("0x1_0000_0000").is_err());
    }

    #[test]
    fn time_scale_sets_tick_duration() {
        let opts = Opts::try_parse_from(["swtctl", "--time-scale", "1000", "--tick-ms", "5"]).unwrap();
        let config = opts.sim_config().unwrap();
        assert_eq!(config.tick_duration, Duration::from_millis(1));
        assert_eq!(config.step_period, Duration::from_millis(5));
    }

    #[test]
    fn non_positive_time_scale_is_rejected() {
        let opts = Opts::try_parse_from(["swtctl", "--time-scale", "0"]).unwrap();
        assert!(opts.sim_config().is_err());
    }
}
