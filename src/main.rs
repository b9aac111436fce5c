//! flightcall CLI entry point.

#![allow(clippy::print_stderr)]

use flightcall::Error;

fn main() {
    match flightcall::run() {
        Ok(()) => {}
        Err(Error::Interrupted) => {
            eprintln!("error: interrupted");
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
