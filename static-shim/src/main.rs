//! Forwards every invocation to the target chosen at build time:
//!
//! ```text
//! SHIM_EXE='C:\tools\rg.exe' SHIM_WD='C:\work' cargo build -p static-shim --release
//! ```

use std::process;

use shim::{forward, logging, Error, StaticConfig};

fn run() -> shim::Result<i32> {
    let config = StaticConfig::from_build(option_env!("SHIM_EXE"), option_env!("SHIM_WD"));
    let metadata = config
        .to_metadata()
        .map_err(|e| Error::Usage(format!("invalid build configuration: {e}")))?;
    Ok(forward::forward(&metadata)?.exit_code)
}

fn main() {
    logging::init(false);
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("static-shim: {err}");
            err.exit_code()
        }
    };
    process::exit(code);
}
