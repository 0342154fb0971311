//! Console command parsing
//!
//! Every menu entry accepts its number or its name. `set` and `remove` take
//! their arguments on the same line (`set 1 5`, `2 1, 5`) or, when given
//! alone, on a follow-up line after a prompt.

use thiserror::Error;

/// Errors produced while parsing console input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Illegal command `{0}`")]
    UnknownCommand(String),
    #[error("expected {0}")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a valid number")]
    InvalidNumber(String),
    #[error("unexpected input after command: `{0}`")]
    TrailingInput(String),
}

/// A fully specified console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// List active timers
    Display,
    /// Arm a timer
    Set { id: usize, interval: u32 },
    /// Deactivate a timer
    Remove { id: usize },
    /// Print queued fire notifications
    Fires,
    /// Print engine diagnostics
    Stats,
    Help,
    Quit,
}

/// Result of parsing one menu line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Ready(Command),
    /// `set` without arguments, read `id, interval` next
    NeedsSetArgs,
    /// `remove` without arguments, read `id` next
    NeedsRemoveId,
}

/// Parse one menu line; `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<Input>, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    if word.is_empty() {
        return Ok(None);
    }

    let input = match word.to_ascii_lowercase().as_str() {
        "1" | "display" | "list" | "ls" => no_args(Command::Display, rest)?,
        "2" | "set" => {
            if rest.is_empty() {
                Input::NeedsSetArgs
            } else {
                Input::Ready(parse_set_args(rest)?)
            }
        }
        "3" | "remove" | "rm" => {
            if rest.is_empty() {
                Input::NeedsRemoveId
            } else {
                Input::Ready(parse_remove_args(rest)?)
            }
        }
        "4" | "quit" | "exit" | "q" => no_args(Command::Quit, rest)?,
        "fires" => no_args(Command::Fires, rest)?,
        "stats" => no_args(Command::Stats, rest)?,
        "help" | "?" => no_args(Command::Help, rest)?,
        _ => return Err(ParseError::UnknownCommand(line.to_string())),
    };
    Ok(Some(input))
}

/// Parse `id, interval` or `id interval`
pub fn parse_set_args(args: &str) -> Result<Command, ParseError> {
    let mut fields = fields(args);
    let id = number(fields.next(), "timer id")?;
    let interval = number(fields.next(), "interval")?;
    if let Some(extra) = fields.next() {
        return Err(ParseError::TrailingInput(extra.to_string()));
    }
    Ok(Command::Set { id, interval })
}

/// Parse a single timer id
pub fn parse_remove_args(args: &str) -> Result<Command, ParseError> {
    let mut fields = fields(args);
    let id = number(fields.next(), "timer id")?;
    if let Some(extra) = fields.next() {
        return Err(ParseError::TrailingInput(extra.to_string()));
    }
    Ok(Command::Remove { id })
}

fn no_args(command: Command, rest: &str) -> Result<Input, ParseError> {
    if rest.is_empty() {
        Ok(Input::Ready(command))
    } else {
        Err(ParseError::TrailingInput(rest.to_string()))
    }
}

fn fields(args: &str) -> impl Iterator<Item = &str> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
}

fn number<T: std::str::FromStr>(field: Option<&str>, what: &'static str) -> Result<T, ParseError> {
    let field = field.ok_or(ParseError::MissingArgument(what))?;
    field
        .parse()
        .map_err(|_| ParseError::InvalidNumber(field.to_string()))
}
