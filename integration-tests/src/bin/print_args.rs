//! Demo program: report how it was invoked
//!
//! Usage: print-args [args...]
//! Outputs one JSON object: {"argv0": ..., "args": [...], "cwd": ...}

use std::env;
use std::process::ExitCode;

use serde_json::json;

fn main() -> ExitCode {
    let mut args = env::args_os().map(|a| a.to_string_lossy().into_owned());
    let argv0 = args.next().unwrap_or_default();
    let args: Vec<String> = args.collect();

    let cwd = match env::current_dir() {
        Ok(dir) => dir.to_string_lossy().into_owned(),
        Err(e) => {
            eprintln!("Failed to get current directory: {}", e);
            return ExitCode::from(1);
        }
    };

    println!("{}", json!({ "argv0": argv0, "args": args, "cwd": cwd }));
    ExitCode::SUCCESS
}
