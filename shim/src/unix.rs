// Unix launcher. There is no raw command line here: the kernel hands over an
// argument vector, which is forwarded element by element and so arrives
// byte-identical without any re-quoting.

use std::env;
use std::ffi::{OsStr, OsString};
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::{Error, Result, EXIT_FAILURE};
use crate::forward::ProcessResult;
use crate::metadata::ShimMetadata;

/// What the operating system handed this process.
#[derive(Debug)]
pub struct Invocation {
    argv0: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn capture() -> Result<Self> {
        Ok(Self::from_args(env::args_os()))
    }

    fn from_args(args: impl IntoIterator<Item = OsString>) -> Self {
        let mut args = args.into_iter();
        let argv0 = args.next().unwrap_or_default();
        Self {
            argv0,
            args: args.collect(),
        }
    }

    pub fn argv0(&self) -> &OsStr {
        &self.argv0
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Starts the target, waits for it without a timeout and returns its
    /// exit code untouched.
    pub fn launch(&self, metadata: &ShimMetadata) -> Result<ProcessResult> {
        let mut command = Command::new(metadata.target());
        command.args(&self.args);
        if let Some(dir) = metadata.working_dir() {
            command.current_dir(dir);
        }
        debug!(?command, "launching target");

        let status = command.status().map_err(|source| Error::Launch {
            target: metadata.target().to_owned(),
            source,
        })?;
        debug!(%status, "target exited");

        Ok(ProcessResult {
            exit_code: exit_code(status),
        })
    }
}

// Exit code convention: 128 + signal number
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_arguments_after_argv0_are_forwarded() {
        let inv = Invocation::from_args(os(&["./rg", "-i", "two words", ""]));
        assert_eq!(inv.argv0(), "./rg");
        assert_eq!(inv.args(), os(&["-i", "two words", ""]).as_slice());
    }

    #[test]
    fn test_signal_maps_to_128_plus_number() {
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 128 + 9);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_exit_code_is_propagated() {
        let inv = Invocation::from_args(os(&["shim", "-c", "exit 42"]));
        let meta = ShimMetadata::new("sh", None).unwrap();
        assert_eq!(inv.launch(&meta).unwrap().exit_code, 42);
    }

    #[test]
    fn test_missing_target_is_launch_error() {
        let inv = Invocation::from_args(os(&["shim"]));
        let meta = ShimMetadata::new("/definitely/not/here/tool", None).unwrap();
        let err = inv.launch(&meta).unwrap_err();
        assert!(matches!(err, Error::Launch { .. }));
    }

    #[test]
    fn test_working_directory_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        std::fs::write(&marker, b"").unwrap();

        let inv = Invocation::from_args(os(&["shim", "-c", "test -f marker"]));
        let meta = ShimMetadata::new("sh", Some(dir.path().to_str().unwrap().to_owned())).unwrap();
        assert_eq!(inv.launch(&meta).unwrap().exit_code, 0);
    }
}
