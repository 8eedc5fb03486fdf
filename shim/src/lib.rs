//! Launchers that forward their invocation to another program.
//!
//! A `shim` executable with no record attached to itself is a creator: it
//! copies itself and attaches `target|working_dir` to the copy. A copy with a
//! record is a forwarder: it launches the target with its own trailing
//! arguments and exits with the target's exit code.

pub mod cli;
pub mod config;
pub mod create;
pub mod error;
pub mod forward;
pub mod logging;
pub mod metadata;
pub mod mode;
pub mod reconstruct;
pub mod stream;

#[cfg(windows)]
#[path = "windows.rs"]
mod platform;

#[cfg(unix)]
#[path = "unix.rs"]
mod platform;

pub use config::StaticConfig;
pub use error::{Error, Result};
pub use forward::ProcessResult;
pub use metadata::ShimMetadata;
pub use mode::Mode;
pub use platform::Invocation;
pub use stream::ShimFile;
