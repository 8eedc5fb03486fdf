//! Creator-mode command line: `/E<path> [/D<dir>] [/O<out>]`.
//!
//! Flags are matched on their first two characters, case-insensitively, and
//! a later occurrence overrides an earlier one. Anything else is ignored.
//!
//! Parsing only happens in creator mode, so `/?` is answered after the
//! launcher has probed its own file for a record. Nothing else is touched.

use std::ffi::OsStr;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const HELP: &str = "\
Creates a shim to an executable.

shim /E<path> [/D<dir>] [/O<out>]

  /E<path>    Path to executable
  /D<dir>     Working directory
  /O<out>     Output path
  /V          Verbose logging
";

/// Output name used when the target path has no directory part.
pub const DEFAULT_OUTPUT: &str = "shim.out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Create(SetupRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    pub target: String,
    pub working_dir: Option<String>,
    pub output: PathBuf,
    pub verbose: bool,
}

/// Parses the creator arguments (without `argv[0]`).
pub fn parse<I, S>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut target = None;
    let mut working_dir = None;
    let mut output = None;
    let mut verbose = false;

    for arg in args {
        let arg = arg.as_ref();
        let Some(text) = arg.to_str() else {
            if flag_of(&arg.to_string_lossy()).is_some() {
                return Err(Error::Usage(format!("argument {arg:?} is not valid Unicode")));
            }
            continue;
        };
        let Some((flag, value)) = flag_of(text) else {
            continue;
        };
        match flag {
            '?' => return Ok(Command::Help),
            'E' => target = non_empty(value),
            'D' => working_dir = non_empty(value),
            'O' => output = non_empty(value),
            'V' => verbose = true,
            _ => {}
        }
    }

    let target = target.ok_or_else(|| Error::Usage("missing /E<path>".to_owned()))?;
    let output = output.unwrap_or_else(|| default_output_name(&target));

    Ok(Command::Create(SetupRequest {
        target,
        working_dir,
        output: PathBuf::from(output),
        verbose,
    }))
}

/// Last path component of `target`, either separator style, or
/// [`DEFAULT_OUTPUT`] when there is none.
pub fn default_output_name(target: &str) -> String {
    match target.rfind(|c| c == '\\' || c == '/') {
        Some(sep) if sep + 1 < target.len() => target[sep + 1..].to_owned(),
        _ => DEFAULT_OUTPUT.to_owned(),
    }
}

// "/eC:\x.exe" -> ('E', "C:\x.exe")
fn flag_of(text: &str) -> Option<(char, &str)> {
    let rest = text.strip_prefix('/')?;
    let mut chars = rest.chars();
    let flag = chars.next()?.to_ascii_uppercase();
    Some((flag, chars.as_str()))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
