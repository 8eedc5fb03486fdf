//! Trailer backend for hosts without named file streams.
//!
//! Layout after the untouched program image:
//!
//! ```text
//! [ record bytes ][ record length: u32 LE ][ b"SHIMMETA" ]
//! ```
//!
//! Loaders ignore bytes past the image, so the file still runs. The record is
//! located by reading backwards from the end of the file.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::read_bounded;
use crate::metadata::MetadataError;

pub const MAGIC: &[u8; 8] = b"SHIMMETA";

// Length field plus magic.
const FOOTER_LEN: u64 = 12;

struct Trailer {
    image_len: u64,
    record_len: u64,
}

// Ok(None) means no magic at the end of the file.
fn locate(file: &mut File) -> io::Result<Option<Trailer>> {
    let file_len = file.metadata()?.len();
    if file_len < FOOTER_LEN {
        return Ok(None);
    }

    let mut footer = [0u8; FOOTER_LEN as usize];
    file.seek(SeekFrom::Start(file_len - FOOTER_LEN))?;
    file.read_exact(&mut footer)?;
    if &footer[4..] != MAGIC {
        return Ok(None);
    }

    let record_len = u64::from(u32::from_le_bytes([
        footer[0], footer[1], footer[2], footer[3],
    ]));
    let image_len = (file_len - FOOTER_LEN)
        .checked_sub(record_len)
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "trailer length exceeds file size"))?;

    Ok(Some(Trailer {
        image_len,
        record_len,
    }))
}

pub fn probe(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    match locate(&mut file) {
        Ok(found) => Ok(found.is_some()),
        // A footer that is present but inconsistent still marks a shim; the
        // read reports the corruption.
        Err(e) if e.kind() == ErrorKind::InvalidData => Ok(true),
        Err(e) => Err(e),
    }
}

pub fn read(path: &Path) -> Result<Vec<u8>, MetadataError> {
    let mut file = File::open(path)?;
    let trailer = locate(&mut file)?
        .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "no shim trailer attached"))?;

    file.seek(SeekFrom::Start(trailer.image_len))?;
    read_bounded(file.take(trailer.record_len))
}

pub fn write(path: &Path, record: &[u8]) -> io::Result<()> {
    let record_len = u32::try_from(record.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "record too large for trailer"))?;

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;

    // Drop any previous trailer so the image is followed by exactly one.
    let image_len = match locate(&mut file)? {
        Some(old) => old.image_len,
        None => file.metadata()?.len(),
    };
    file.set_len(image_len)?;
    file.seek(SeekFrom::Start(image_len))?;

    file.write_all(record)?;
    file.write_all(&record_len.to_le_bytes())?;
    file.write_all(MAGIC)?;
    file.sync_all()
}

pub fn image_len(path: &Path) -> io::Result<u64> {
    let mut file = File::open(path)?;
    match locate(&mut file)? {
        Some(trailer) => Ok(trailer.image_len),
        None => Ok(file.metadata()?.len()),
    }
}
