//! Creator mode: copy the launcher and attach a record to the copy.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cli::SetupRequest;
use crate::error::{Error, Result};
use crate::metadata::ShimMetadata;
use crate::stream::ShimFile;

/// Writes a new shim at `request.output` that forwards to `request.target`.
///
/// The output is overwritten if it exists. When the record cannot be attached
/// the half-made copy is removed again.
pub fn create(launcher: &ShimFile, request: &SetupRequest) -> Result<ShimFile> {
    let metadata = ShimMetadata::new(request.target.as_str(), request.working_dir.clone())
        .map_err(|e| Error::Usage(e.to_string()))?;

    refuse_self_overwrite(launcher.path(), &request.output)?;

    launcher.image().copy_to(&request.output)?;
    let shim = ShimFile::new(&request.output);

    let attached = make_writable(shim.path()).and_then(|()| shim.metadata().write(&metadata));
    if let Err(err) = attached {
        if let Err(cleanup) = fs::remove_file(shim.path()) {
            warn!(
                path = %shim.path().display(),
                error = %cleanup,
                "failed to remove incomplete shim"
            );
        }
        return Err(err);
    }

    info!(output = %shim.path().display(), %metadata, "created shim");
    Ok(shim)
}

/// Creates the shim and prints the confirmation line.
pub fn run(launcher: &ShimFile, request: &SetupRequest) -> Result<()> {
    let shim = create(launcher, request)?;
    match &request.working_dir {
        Some(dir) => println!(
            "Created shim: {} -> {} with working directory {}",
            shim.path().display(),
            request.target,
            dir
        ),
        None => println!(
            "Created shim: {} -> {}",
            shim.path().display(),
            request.target
        ),
    }
    Ok(())
}

// The copy inherits the launcher's permissions, and installed launchers are
// often read-only.
fn make_writable(path: &Path) -> Result<()> {
    let copy_error = |source: io::Error| Error::Copy {
        from: path.to_path_buf(),
        to: path.to_path_buf(),
        source,
    };
    let mut perms = fs::metadata(path).map_err(copy_error)?.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if perms.mode() & 0o200 != 0 {
            return Ok(());
        }
        perms.set_mode(perms.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        if !perms.readonly() {
            return Ok(());
        }
        perms.set_readonly(false);
    }

    debug!(path = %path.display(), "clearing read-only flag on copy");
    fs::set_permissions(path, perms).map_err(copy_error)
}

fn refuse_self_overwrite(launcher: &Path, output: &Path) -> Result<()> {
    let Ok(output_canonical) = output.canonicalize() else {
        // Nothing there yet.
        return Ok(());
    };
    let launcher_canonical = launcher.canonicalize().unwrap_or_else(|_| launcher.to_path_buf());
    debug!(output = %output_canonical.display(), "output already exists");

    if output_canonical == launcher_canonical {
        return Err(Error::Copy {
            from: launcher.to_path_buf(),
            to: output.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "output is the running launcher itself",
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const IMAGE: &[u8] = b"\x7fELF launcher image bytes";

    fn launcher(dir: &Path) -> ShimFile {
        let path = dir.join("shim");
        fs::write(&path, IMAGE).unwrap();
        ShimFile::new(path)
    }

    fn request(target: &str, working_dir: Option<&str>, output: PathBuf) -> SetupRequest {
        SetupRequest {
            target: target.to_owned(),
            working_dir: working_dir.map(str::to_owned),
            output,
            verbose: false,
        }
    }

    #[test]
    fn test_create_copies_image_and_attaches_record() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());
        let out = dir.path().join("rg");

        let shim = create(&launcher, &request("/usr/bin/rg", Some("/srv"), out.clone())).unwrap();

        assert_eq!(shim.path(), out);
        assert!(fs::read(&out).unwrap().starts_with(IMAGE));
        assert_eq!(shim.image().content_len().unwrap(), IMAGE.len() as u64);

        let meta = shim.metadata().read().unwrap();
        assert_eq!(meta.target(), "/usr/bin/rg");
        assert_eq!(meta.working_dir(), Some("/srv"));

        // The source launcher stays a creator.
        assert!(!launcher.metadata().probe().unwrap());
    }

    #[test]
    fn test_create_overwrites_existing_shim() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());
        let out = dir.path().join("tool");

        create(&launcher, &request("old-target", Some("/old"), out.clone())).unwrap();
        let shim = create(&launcher, &request("new-target", None, out)).unwrap();

        let meta = shim.metadata().read().unwrap();
        assert_eq!(meta.target(), "new-target");
        assert_eq!(meta.working_dir(), None);
    }

    #[test]
    fn test_delimiter_in_target_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());
        let out = dir.path().join("bad");

        let err = create(&launcher, &request("a|b", None, out.clone())).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_refuses_to_overwrite_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());

        let err = create(&launcher, &request("tool", None, launcher.path().to_path_buf()))
            .unwrap_err();
        assert!(matches!(err, Error::Copy { .. }));
        assert_eq!(fs::read(launcher.path()).unwrap(), IMAGE);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_launcher_still_creates() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());
        fs::set_permissions(launcher.path(), fs::Permissions::from_mode(0o555)).unwrap();
        let out = dir.path().join("tool");

        let shim = create(&launcher, &request("/bin/true", None, out.clone())).unwrap();

        let mode = fs::metadata(&out).unwrap().permissions().mode();
        assert_ne!(mode & 0o200, 0, "copy must be owner-writable, mode {mode:o}");
        assert_eq!(mode & 0o111, 0o111);
        assert_eq!(shim.metadata().read().unwrap().target(), "/bin/true");
    }

    #[cfg(not(unix))]
    #[test]
    fn test_read_only_launcher_still_creates() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());
        let mut perms = fs::metadata(launcher.path()).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(launcher.path(), perms).unwrap();
        let out = dir.path().join("tool.exe");

        let shim = create(&launcher, &request(r"C:\tools\tool.exe", None, out.clone())).unwrap();

        assert!(!fs::metadata(&out).unwrap().permissions().readonly());
        assert_eq!(shim.metadata().read().unwrap().target(), r"C:\tools\tool.exe");
    }

    // An image ending in a footer whose length overruns the file: the copy
    // succeeds but the record cannot be attached to it.
    #[cfg(not(windows))]
    #[test]
    fn test_failed_attach_removes_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shim");
        let mut image = IMAGE.to_vec();
        image.extend_from_slice(&u32::MAX.to_le_bytes());
        image.extend_from_slice(crate::stream::trailer::MAGIC);
        fs::write(&path, &image).unwrap();
        let launcher = ShimFile::new(path);
        let out = dir.path().join("tool");

        let err = create(&launcher, &request("tool", None, out.clone())).unwrap_err();

        assert!(matches!(err, Error::MetadataWrite { .. }), "{err:?}");
        assert!(!out.exists());
    }

    #[test]
    fn test_unwritable_output_is_copy_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());
        let out = dir.path().join("missing").join("tool");

        let err = create(&launcher, &request("tool", None, out)).unwrap_err();
        assert!(matches!(err, Error::Copy { .. }));
    }
}
