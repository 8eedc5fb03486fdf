//! Access to a shim executable as two things at once: a program image that can
//! be copied, and a named metadata stream attached to it.
//!
//! Windows keeps the record in the NTFS alternate data stream `<file>:Shim`.
//! Other hosts have no such primitive and append a trailer after the image.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata::{MetadataError, ShimMetadata, MAX_RECORD_LEN};

#[cfg(windows)]
mod ads;
#[cfg_attr(windows, allow(dead_code))]
pub mod trailer;

#[cfg(windows)]
use ads as backend;
#[cfg(not(windows))]
use trailer as backend;

/// An executable that may carry shim metadata.
#[derive(Debug, Clone)]
pub struct ShimFile {
    path: PathBuf,
}

impl ShimFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The executable of the running process.
    pub fn current() -> Result<Self> {
        env::current_exe().map(Self::new).map_err(Error::SelfPath)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> ProgramImage<'_> {
        ProgramImage { path: &self.path }
    }

    pub fn metadata(&self) -> MetadataStream<'_> {
        MetadataStream { path: &self.path }
    }
}

/// The primary content of the file: the launcher program itself.
pub struct ProgramImage<'a> {
    path: &'a Path,
}

impl ProgramImage<'_> {
    /// Size of the program bytes, excluding any attached record.
    pub fn content_len(&self) -> io::Result<u64> {
        backend::image_len(self.path)
    }

    pub fn copy_to(&self, dest: &Path) -> Result<u64> {
        let copied = fs::copy(self.path, dest).map_err(|source| Error::Copy {
            from: self.path.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        })?;
        debug!(bytes = copied, dest = %dest.display(), "copied launcher image");
        Ok(copied)
    }
}

/// The record attached to the file.
pub struct MetadataStream<'a> {
    path: &'a Path,
}

impl MetadataStream<'_> {
    /// Whether a record is attached. Only "not found" counts as absent;
    /// any other failure is reported.
    pub fn probe(&self) -> Result<bool> {
        let present = backend::probe(self.path).map_err(|e| self.read_error(e.into()))?;
        debug!(path = %self.path.display(), present, "probed metadata stream");
        Ok(present)
    }

    pub fn read(&self) -> Result<ShimMetadata> {
        let record = backend::read(self.path).map_err(|e| self.read_error(e))?;
        let metadata = ShimMetadata::decode(&record).map_err(|e| self.read_error(e))?;
        debug!(%metadata, "decoded shim metadata");
        Ok(metadata)
    }

    /// Creates or replaces the record. The program image is left untouched.
    pub fn write(&self, metadata: &ShimMetadata) -> Result<()> {
        backend::write(self.path, &metadata.encode()).map_err(|source| Error::MetadataWrite {
            path: self.path.to_path_buf(),
            source,
        })
    }

    fn read_error(&self, source: MetadataError) -> Error {
        Error::MetadataRead {
            path: self.path.to_path_buf(),
            source,
        }
    }
}

// Reads one more byte than allowed so an oversized record is detected rather
// than silently cut short.
fn read_bounded(reader: impl Read) -> std::result::Result<Vec<u8>, MetadataError> {
    let mut record = Vec::new();
    reader
        .take(MAX_RECORD_LEN as u64 + 1)
        .read_to_end(&mut record)?;
    if record.len() > MAX_RECORD_LEN {
        return Err(MetadataError::Oversized);
    }
    Ok(record)
}
