use std::io::Cursor;

use swt_sim::Simulation;

use crate::{Command, Console};

fn session(sim: &Simulation, input: &str) -> String {
    let mut out = Vec::new();
    Console::new(sim, Cursor::new(input), &mut out).run().unwrap();
    String::from_utf8(out).unwrap()
}

fn json_session(sim: &Simulation, input: &str) -> String {
    let mut out = Vec::new();
    Console::new(sim, Cursor::new(input), &mut out)
        .json(true)
        .run()
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn display_reports_inactive_table() {
    let sim: Simulation = Simulation::default();
    let out = session(&sim, "1\n4\n");
    assert!(out.starts_with("Choose what to do:\n1. Display timers\n"));
    assert!(out.contains("All timers are inactive"));
}

#[test]
fn set_then_display() {
    let sim: Simulation = Simulation::default();
    let out = session(&sim, "set 1 500\n1\nquit\n");
    assert!(out.contains("Timer 1 - Interval: 500 us, Remain: 500 us, Times fired: 0"));
}

#[test]
fn bare_set_prompts_for_arguments() {
    let sim: Simulation = Simulation::default();
    let out = session(&sim, "2\n3, 100\n1\n");
    assert!(out.contains("Insert timer ID and desired interval (ex: 1, 5):"));
    assert!(out.contains("Timer 3 - Interval: 100 us"));
}

#[test]
fn out_of_range_id_names_the_limit() {
    let sim: Simulation = Simulation::default();
    let out = session(&sim, "set 10 5\n");
    assert!(out.contains("ERROR: Timer ID exceeds limit, maximal is: 9"));
    assert!(sim.engine().list_active().is_empty());
}

#[test]
fn removing_inactive_timer_is_reported() {
    let sim: Simulation = Simulation::default();
    let out = session(&sim, "3\n2\n");
    assert!(out.contains("Insert timer ID to remove:"));
    assert!(out.contains("Timer is already inactive"));
}

#[test]
fn remove_deactivates_timer() {
    let sim: Simulation = Simulation::default();
    sim.engine().set_timer(4, 50).unwrap();
    let out = session(&sim, "remove 4\n1\n");
    assert!(!out.contains("Timer is already inactive"));
    assert!(out.contains("All timers are inactive"));
}

#[test]
fn illegal_command_keeps_console_running() {
    let sim: Simulation = Simulation::default();
    let out = session(&sim, "7\n1\n");
    assert!(out.contains("Error: Illegal command `7`"));
    assert!(out.contains("All timers are inactive"));
}

#[test]
fn queued_fires_are_printed_before_the_menu() {
    let sim: Simulation = Simulation::default();
    sim.engine().set_timer(0, 10).unwrap();
    sim.advance(25);

    let out = session(&sim, "fires\n");
    assert_eq!(out.matches("Firing timer id = 0").count(), 2);
    assert!(out.contains("No pending fires"));
    assert_eq!(sim.engine().pending_fires(), 0);
}

#[test]
fn json_listing_is_machine_readable() {
    let sim: Simulation = Simulation::default();
    sim.engine().set_timer(2, 40).unwrap();

    let out = json_session(&sim, "1\n");
    let line = out.lines().find(|line| line.starts_with('[')).unwrap();
    let timers: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(
        timers,
        serde_json::json!([{ "id": 2, "interval": 40, "remaining": 40, "fire_count": 0 }])
    );
}

#[test]
fn json_stats_include_diagnostics() {
    let sim: Simulation = Simulation::default();
    sim.engine().set_timer(0, 10).unwrap();
    sim.advance(30);

    let out = json_session(&sim, "stats\n");
    let line = out.lines().find(|line| line.contains("\"counter\"")).unwrap();
    let stats: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(stats["counter"], 30);
    assert_eq!(stats["next_deadline"], 40);
    assert_eq!(stats["interrupts"], 3);
    assert_eq!(stats["fires"], 3);
}

#[test]
fn execute_runs_a_single_command() {
    let sim: Simulation = Simulation::default();
    let mut out = Vec::new();
    let mut console = Console::new(&sim, Cursor::new(""), &mut out);
    console.execute(Command::Set { id: 0, interval: 7 }).unwrap();
    console.execute(Command::Stats).unwrap();
    drop(console);

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("counter:       0"));
    assert!(out.contains("next compare:  7"));
}
