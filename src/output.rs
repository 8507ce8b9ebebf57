//! Terminal output for the repair loop
//!
//! Plain ANSI escapes, no terminal crate. Every attempt gets a banner,
//! explanations are printed in blue, diffs in green/red, and the raw model
//! response is dumped in yellow when it could not be parsed.

use crate::diff::DiffLine;

/// ANSI color codes for terminal output.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
}

use colors::*;

pub fn print_attempt_banner(attempt: u32, limit: u32) {
    eprintln!("{RED}==========================={RESET}");
    eprintln!("{RED}attempt {attempt}/{limit}{RESET}");
    eprintln!("{RED}==========================={RESET}");
}

pub fn print_tests_passed(output: &str) {
    eprintln!("{GREEN}Tests passed{RESET}");
    print_test_output(output);
}

pub fn print_tests_failed(output: &str) {
    eprintln!("{BLUE}Test failed. Trying to fix...{RESET}");
    print_test_output(output);
}

fn print_test_output(output: &str) {
    let trimmed = output.trim_end();
    if !trimmed.is_empty() {
        eprintln!("Output:\n{trimmed}");
    }
}

pub fn print_explanations(explanations: &[&str]) {
    if explanations.is_empty() {
        return;
    }
    eprintln!("{BLUE}Explanations:{RESET}");
    for explanation in explanations {
        eprintln!("{BLUE}- {explanation}{RESET}");
    }
}

pub fn print_diff(lines: &[DiffLine]) {
    if lines.is_empty() {
        return;
    }
    eprintln!("\nChanges:");
    for line in lines {
        match line {
            DiffLine::Add(text) => eprintln!("{GREEN}+{text}{RESET}"),
            DiffLine::Remove(text) => eprintln!("{RED}-{text}{RESET}"),
            DiffLine::Context(text) => eprintln!(" {text}"),
        }
    }
}

/// Dump the raw model response so a bad reply can be diagnosed.
pub fn print_raw_response(raw: &str) {
    eprintln!("{YELLOW}\nMODEL RESPONSE:\n\n{raw}\n{RESET}");
}

pub fn print_invalid_response(reason: &str) {
    eprintln!("{RED}{reason}. Consuming one retry.{RESET}");
}

pub fn print_patch_applied() {
    eprintln!("{BLUE}Changes applied. Rerunning...{RESET}");
}

pub fn print_error(message: &str) {
    eprintln!("{RED}{BOLD}Error:{RESET} {message}");
}
