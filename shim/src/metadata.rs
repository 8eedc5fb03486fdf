//! The record a shim carries about its target.
//!
//! Wire format: `<target>` optionally followed by `|<working_dir>`. There is no
//! escaping and no length prefix; the record ends where the stream ends.

use std::fmt;
use std::io;

use thiserror::Error;

/// Separates the target from the working directory. Not legal in Windows paths.
pub const DELIMITER: char = '|';

/// Longest path the launcher accepts for either field.
pub const PATH_LENGTH: usize = 65535;

/// Two fields plus the delimiter.
pub const MAX_RECORD_LEN: usize = PATH_LENGTH * 2 + 1;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("target path is empty")]
    EmptyTarget,

    #[error("working directory after '|' is empty")]
    EmptyWorkingDir,

    #[error("record contains {0} '|' delimiters, the field boundary is ambiguous")]
    Ambiguous(usize),

    #[error("{0} contains the reserved '|' character")]
    ReservedCharacter(&'static str),

    #[error("record is not valid UTF-8")]
    NotUtf8,

    #[error("record is larger than the 131071-byte limit")]
    Oversized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimMetadata {
    target: String,
    working_dir: Option<String>,
}

impl ShimMetadata {
    /// Builds a record, rejecting values the wire format cannot carry.
    pub fn new(
        target: impl Into<String>,
        working_dir: Option<String>,
    ) -> Result<Self, MetadataError> {
        let target = target.into();
        if target.is_empty() {
            return Err(MetadataError::EmptyTarget);
        }
        if target.contains(DELIMITER) {
            return Err(MetadataError::ReservedCharacter("target path"));
        }
        if let Some(dir) = &working_dir {
            if dir.is_empty() {
                return Err(MetadataError::EmptyWorkingDir);
            }
            if dir.contains(DELIMITER) {
                return Err(MetadataError::ReservedCharacter("working directory"));
            }
        }
        if target.len() > PATH_LENGTH || working_dir.as_ref().is_some_and(|d| d.len() > PATH_LENGTH)
        {
            return Err(MetadataError::Oversized);
        }
        Ok(Self {
            target,
            working_dir,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut record = self.target.clone().into_bytes();
        if let Some(dir) = &self.working_dir {
            record.push(DELIMITER as u8);
            record.extend_from_slice(dir.as_bytes());
        }
        record
    }

    pub fn decode(record: &[u8]) -> Result<Self, MetadataError> {
        if record.len() > MAX_RECORD_LEN {
            return Err(MetadataError::Oversized);
        }
        let text = std::str::from_utf8(record).map_err(|_| MetadataError::NotUtf8)?;

        let delimiters = text.matches(DELIMITER).count();
        if delimiters > 1 {
            return Err(MetadataError::Ambiguous(delimiters));
        }

        match text.split_once(DELIMITER) {
            Some((target, dir)) => Self::new(target, Some(dir.to_owned())),
            None => Self::new(text, None),
        }
    }
}

impl fmt::Display for ShimMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.working_dir {
            Some(dir) => write!(f, "{} (in {})", self.target, dir),
            None => write!(f, "{}", self.target),
        }
    }
}
