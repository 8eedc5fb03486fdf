use std::env;
use std::process;

use shim::cli::{self, Command};
use shim::{create, forward, logging, Error, Mode, ShimFile};

fn run() -> shim::Result<i32> {
    let launcher = ShimFile::current()?;

    match Mode::detect(&launcher)? {
        Mode::Forward => {
            logging::init(false);
            Ok(forward::run(&launcher)?.exit_code)
        }
        Mode::Create => match cli::parse(env::args_os().skip(1))? {
            Command::Help => {
                print!("{}", cli::HELP);
                Ok(0)
            }
            Command::Create(request) => {
                logging::init(request.verbose);
                create::run(&launcher, &request)?;
                Ok(0)
            }
        },
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("shim: {err}");
            if let Error::Usage(_) = err {
                eprint!("\n{}", cli::HELP);
            }
            err.exit_code()
        }
    };
    process::exit(code);
}
