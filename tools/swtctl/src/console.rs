//! Interactive menu over a running simulation

use std::io::{self, BufRead, Write};

use colored::Colorize;
use serde::Serialize;
use swt_core::{Diagnostics, Disarm, SwtError, TimerSnapshot};
use swt_sim::Simulation;

use crate::commands::{self, Command, Input, ParseError};

const MENU: &str = "\
Choose what to do:
1. Display timers
2. Set a new timer
3. Remove a timer
4. Quit";

const HELP: &str = "\
Commands:
  1 | display            list active timers
  2 | set <id> <us>      arm timer <id> every <us> microseconds
  3 | remove <id>        deactivate timer <id>
  fires                  print queued fire notifications
  stats                  print engine diagnostics
  help                   show this help
  4 | quit               leave the console";

#[derive(Serialize)]
struct Stats {
    counter: u32,
    next_deadline: Option<u32>,
    pending_fires: usize,
    back_to_back: u32,
    #[serde(flatten)]
    diagnostics: Diagnostics,
}

/// Print every queued fire notification. Returns the number printed.
pub fn print_fires<W: Write, const N: usize, const Q: usize>(
    sim: &Simulation<N, Q>,
    out: &mut W,
    json: bool,
) -> io::Result<usize> {
    let mut result = Ok(());
    let printed = sim.engine().drain_fires(|event| {
        if result.is_err() {
            return;
        }
        result = if json {
            serde_json::to_string(&event)
                .map_err(io::Error::from)
                .and_then(|line| writeln!(out, "{line}"))
        } else {
            writeln!(out, "{event}")
        };
    });
    result.map(|()| printed)
}

/// Line-oriented console reading commands from `input` and writing to `out`
pub struct Console<'a, R, W, const N: usize, const Q: usize> {
    sim: &'a Simulation<N, Q>,
    input: R,
    out: W,
    json: bool,
}

impl<'a, R: BufRead, W: Write, const N: usize, const Q: usize> Console<'a, R, W, N, Q> {
    pub fn new(sim: &'a Simulation<N, Q>, input: R, out: W) -> Self {
        Self {
            sim,
            input,
            out,
            json: false,
        }
    }

    /// Print listings, fires and stats as JSON lines
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Run until `quit` or end of input
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            print_fires(self.sim, &mut self.out, self.json)?;
            writeln!(self.out, "{MENU}")?;
            self.out.flush()?;

            let Some(line) = self.read_line()? else {
                tracing::debug!("console input closed");
                return Ok(());
            };

            let command = match commands::parse_line(&line) {
                Ok(None) => continue,
                Ok(Some(Input::Ready(command))) => command,
                Ok(Some(Input::NeedsSetArgs)) => {
                    match self.prompt("Insert timer ID and desired interval (ex: 1, 5):")? {
                        Some(args) => match commands::parse_set_args(&args) {
                            Ok(command) => command,
                            Err(err) => {
                                self.report(&err)?;
                                continue;
                            }
                        },
                        None => return Ok(()),
                    }
                }
                Ok(Some(Input::NeedsRemoveId)) => match self.prompt("Insert timer ID to remove:")? {
                    Some(args) => match commands::parse_remove_args(&args) {
                        Ok(command) => command,
                        Err(err) => {
                            self.report(&err)?;
                            continue;
                        }
                    },
                    None => return Ok(()),
                },
                Err(err) => {
                    self.report(&err)?;
                    continue;
                }
            };

            if command == Command::Quit {
                return Ok(());
            }
            self.execute(command)?;
        }
    }

    /// Run one command
    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        tracing::debug!(?command, "console command");
        match command {
            Command::Display => self.display(),
            Command::Set { id, interval } => match self.sim.engine().set_timer(id, interval) {
                Ok(()) => Ok(()),
                Err(err) => self.engine_error(err),
            },
            Command::Remove { id } => match self.sim.engine().remove_timer(id) {
                Ok(Disarm::Removed) => Ok(()),
                Ok(Disarm::AlreadyInactive) => writeln!(self.out, "Timer is already inactive"),
                Err(err) => self.engine_error(err),
            },
            Command::Fires => {
                if print_fires(self.sim, &mut self.out, self.json)? == 0 && !self.json {
                    writeln!(self.out, "No pending fires")?;
                }
                Ok(())
            }
            Command::Stats => self.stats(),
            Command::Help => writeln!(self.out, "{HELP}"),
            Command::Quit => Ok(()),
        }
    }

    fn display(&mut self) -> io::Result<()> {
        let timers = self.sim.engine().list_active();
        if self.json {
            let timers: &[TimerSnapshot] = &timers;
            let line = serde_json::to_string(timers).map_err(io::Error::from)?;
            return writeln!(self.out, "{line}");
        }

        if timers.is_empty() {
            return writeln!(self.out, "All timers are inactive");
        }
        for timer in &timers {
            writeln!(self.out, "{timer}")?;
        }
        Ok(())
    }

    fn stats(&mut self) -> io::Result<()> {
        let engine = self.sim.engine();
        let stats = Stats {
            counter: self.sim.counter(),
            next_deadline: engine.next_deadline().map(|tick| tick.raw()),
            pending_fires: engine.pending_fires(),
            back_to_back: self.sim.back_to_back(),
            diagnostics: engine.diagnostics(),
        };

        if self.json {
            let line = serde_json::to_string(&stats).map_err(io::Error::from)?;
            return writeln!(self.out, "{line}");
        }

        writeln!(self.out, "counter:       {}", stats.counter)?;
        match stats.next_deadline {
            Some(deadline) => writeln!(self.out, "next compare:  {deadline}")?,
            None => writeln!(self.out, "next compare:  none")?,
        }
        writeln!(self.out, "pending fires: {}", stats.pending_fires)?;
        writeln!(self.out, "back to back:  {}", stats.back_to_back)?;
        writeln!(self.out, "{}", stats.diagnostics)
    }

    fn engine_error(&mut self, err: SwtError) -> io::Result<()> {
        tracing::warn!(%err, "command rejected");
        let SwtError::InvalidId { capacity, .. } = err;
        writeln!(
            self.out,
            "{}",
            format!(
                "ERROR: Timer ID exceeds limit, maximal is: {}",
                capacity.saturating_sub(1)
            )
            .red()
        )
    }

    fn report(&mut self, err: &ParseError) -> io::Result<()> {
        writeln!(self.out, "{}", format!("Error: {err}").red())
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}
