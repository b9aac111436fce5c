//! Help message display for CLI.

#![allow(clippy::print_stdout)]

use crate::config::Config;
use std::fmt::Write;

/// Print help message based on configuration state.
pub fn print_smart_help(config: &Config, config_exists: bool) {
    print!("{}", smart_help(config, config_exists));
}

/// Help text: a setup guide without a config file, else a usage reminder.
pub fn smart_help(config: &Config, config_exists: bool) -> String {
    if config_exists {
        configured_help(config)
    } else {
        first_time_help()
    }
}

fn first_time_help() -> String {
    [
        "No configuration found. Get started with flightcall:",
        "",
        "1. Segment recordings with the built-in defaults:",
        "   flightcall recordings/",
        "",
        "2. Optionally write a config file to tune the band-pass and thresholds:",
        "   flightcall config init",
        "   flightcall config path",
        "",
        "3. Add per-species settings as [profiles.<name>] tables and select one:",
        "   flightcall recordings/ --profile \"Anthus pratensis\"",
        "",
        "Run 'flightcall -h' for all options.",
        "",
    ]
    .join("\n")
}

fn configured_help(config: &Config) -> String {
    let mut text = String::new();
    text.push_str("Usage: flightcall [INPUTS]... [OPTIONS]\n\n");
    text.push_str("Example: flightcall recordings/ --strategy energy-threshold -j 4\n\n");
    if config.profiles.is_empty() {
        text.push_str("No profiles configured.\n");
    } else {
        text.push_str("Profiles:\n");
        for name in config.profiles.keys() {
            let _ = writeln!(text, "  {name}");
        }
    }
    text.push_str("\nRun 'flightcall -h' for all options.\n");
    text
}
