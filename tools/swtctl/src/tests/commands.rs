use crate::commands::{parse_line, parse_remove_args, parse_set_args};
use crate::{Command, Input, ParseError};

fn ready(line: &str) -> Command {
    match parse_line(line) {
        Ok(Some(Input::Ready(command))) => command,
        other => panic!("`{line}` parsed to {other:?}"),
    }
}

#[test]
fn menu_numbers_and_names_agree() {
    assert_eq!(ready("1"), Command::Display);
    assert_eq!(ready("display"), Command::Display);
    assert_eq!(ready("  LIST "), Command::Display);
    assert_eq!(ready("4"), Command::Quit);
    assert_eq!(ready("quit"), Command::Quit);
    assert_eq!(ready("fires"), Command::Fires);
    assert_eq!(ready("stats"), Command::Stats);
    assert_eq!(ready("help"), Command::Help);
}

#[test]
fn set_accepts_comma_or_space() {
    let expected = Command::Set { id: 1, interval: 5 };
    assert_eq!(ready("set 1 5"), expected);
    assert_eq!(ready("2 1, 5"), expected);
    assert_eq!(parse_set_args("1,5"), Ok(expected));
}

#[test]
fn bare_set_and_remove_ask_for_arguments() {
    assert_eq!(parse_line("2"), Ok(Some(Input::NeedsSetArgs)));
    assert_eq!(parse_line("remove"), Ok(Some(Input::NeedsRemoveId)));
    assert_eq!(ready("3 7"), Command::Remove { id: 7 });
    assert_eq!(parse_remove_args(" 9 "), Ok(Command::Remove { id: 9 }));
}

#[test]
fn blank_line_is_ignored() {
    assert_eq!(parse_line("   \n"), Ok(None));
}

#[test]
fn malformed_input_is_reported() {
    assert_eq!(
        parse_line("5"),
        Err(ParseError::UnknownCommand("5".to_string()))
    );
    assert_eq!(
        parse_set_args("1"),
        Err(ParseError::MissingArgument("interval"))
    );
    assert_eq!(
        parse_set_args("one, 5"),
        Err(ParseError::InvalidNumber("one".to_string()))
    );
    assert_eq!(
        parse_set_args("1, -5"),
        Err(ParseError::InvalidNumber("-5".to_string()))
    );
    assert_eq!(
        parse_line("display now"),
        Err(ParseError::TrailingInput("now".to_string()))
    );
    assert_eq!(
        parse_remove_args("1 2"),
        Err(ParseError::TrailingInput("2".to_string()))
    );
}
