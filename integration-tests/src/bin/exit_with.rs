//! Demo program: exit with the given code
//!
//! Usage: exit-with <code>

use std::env;
use std::process;

fn main() {
    let code = match env::args().nth(1).map(|arg| arg.parse::<i32>()) {
        Some(Ok(code)) => code,
        Some(Err(e)) => {
            eprintln!("Invalid exit code: {}", e);
            process::exit(1);
        }
        None => {
            eprintln!("Usage: exit-with <code>");
            process::exit(1);
        }
    };
    process::exit(code);
}
