//! Error types for shim operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::MetadataError;

/// Exit code for bad or missing setup arguments.
pub const EXIT_USAGE: i32 = 2;
/// Exit code when the target process could not be created.
pub const EXIT_LAUNCH: i32 = 127;
/// Exit code for every other launcher failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("failed to locate the running executable: {0}")]
    SelfPath(#[source] io::Error),

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write shim metadata to {}: {source}", .path.display())]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read shim metadata from {}: {source}", .path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("argv[0] {argv0:?} not found in the raw command line")]
    ArgvMismatch { argv0: String },

    #[error("failed to launch '{target}': {source}")]
    Launch {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process exit status the launcher terminates with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => EXIT_USAGE,
            Error::Launch { .. } => EXIT_LAUNCH,
            _ => EXIT_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_from_success() {
        let usage = Error::Usage("missing /E".into());
        let launch = Error::Launch {
            target: "nope.exe".into(),
            source: io::Error::from_raw_os_error(2),
        };
        let mismatch = Error::ArgvMismatch {
            argv0: "shim".into(),
        };

        assert_eq!(usage.exit_code(), EXIT_USAGE);
        assert_eq!(launch.exit_code(), EXIT_LAUNCH);
        assert_eq!(mismatch.exit_code(), EXIT_FAILURE);
        assert!([usage, launch, mismatch].iter().all(|e| e.exit_code() != 0));
    }

    #[test]
    fn test_launch_error_carries_os_code() {
        let err = Error::Launch {
            target: "missing.exe".into(),
            source: io::Error::from_raw_os_error(2),
        };
        let message = err.to_string();
        assert!(message.contains("missing.exe"));
        assert!(message.contains("os error 2"));
    }
}
