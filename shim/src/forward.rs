//! Forwarder mode: launch the configured target with our own arguments.

use tracing::debug;

use crate::error::Result;
use crate::metadata::ShimMetadata;
use crate::platform::Invocation;
use crate::stream::ShimFile;

/// Outcome of a launched target. `exit_code` becomes the launcher's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
}

/// Forwards the current invocation to `metadata`'s target.
///
/// The invocation is captured before anything is spawned, so a command line
/// that cannot be reconstructed never starts a process.
pub fn forward(metadata: &ShimMetadata) -> Result<ProcessResult> {
    let invocation = Invocation::capture()?;
    debug!(argv0 = ?invocation.argv0(), %metadata, "forwarding invocation");
    let result = invocation.launch(metadata)?;
    debug!(exit_code = result.exit_code, "target finished");
    Ok(result)
}

/// Reads the record attached to `shim` and forwards to its target.
pub fn run(shim: &ShimFile) -> Result<ProcessResult> {
    let metadata = shim.metadata().read()?;
    forward(&metadata)
}
