// NTFS alternate data stream backend.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::read_bounded;
use crate::metadata::MetadataError;

pub const STREAM_NAME: &str = "Shim";

// `C:\bin\rg.exe` -> `C:\bin\rg.exe:Shim`
fn stream_path(path: &Path) -> PathBuf {
    let mut stream = OsString::from(path.as_os_str());
    stream.push(":");
    stream.push(STREAM_NAME);
    PathBuf::from(stream)
}

pub fn probe(path: &Path) -> io::Result<bool> {
    // A missing file must not read as "no stream".
    fs::metadata(path)?;
    match File::open(stream_path(path)) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn read(path: &Path) -> Result<Vec<u8>, MetadataError> {
    let stream = File::open(stream_path(path))?;
    read_bounded(stream)
}

pub fn write(path: &Path, record: &[u8]) -> io::Result<()> {
    let mut stream = File::create(stream_path(path))?;
    stream.write_all(record)?;
    stream.sync_all()
}

// Streams do not count towards the size of the primary data.
pub fn image_len(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}
