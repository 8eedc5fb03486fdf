use crate::error::Result;
use crate::stream::ShimFile;

/// Role of this process, decided from the launcher's own file at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No record attached: build a new shim from the command line.
    Create,
    /// A record is attached: launch its target.
    Forward,
}

impl Mode {
    pub fn detect(launcher: &ShimFile) -> Result<Self> {
        if launcher.metadata().probe()? {
            Ok(Mode::Forward)
        } else {
            Ok(Mode::Create)
        }
    }
}
