use anyhow::{bail, Context, Result};
use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[cfg(windows)]
const EXE_EXT: &str = ".exe";
#[cfg(not(windows))]
const EXE_EXT: &str = "";

/// Launchers shipped in every release
const BINARIES: [&str; 2] = ["shim", "static-shim"];

/// Files to include next to bin/
const ROOT_FILES: [&str; 1] = ["README.md"];

/// Package built launchers into a .tar.gz release archive
#[derive(Parser)]
#[command(name = "create-release-archive")]
#[command(after_help = "Example: create-release-archive v0.1.0 shim-v0.1.0.tar.gz")]
struct Args {
    /// Release tag, used as the archive's top-level directory (shim-<tag>/)
    tag: String,

    /// Output .tar.gz file
    output: PathBuf,

    /// Directory holding the built binaries [default: <repo>/target/release]
    #[arg(long)]
    bin_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let repo_root = find_repo_root()?;
    let bin_dir = args
        .bin_dir
        .unwrap_or_else(|| repo_root.join("target").join("release"));

    create_release_archive(&repo_root, &bin_dir, &args.tag, &args.output)?;

    eprintln!("Created release archive: {}", args.output.display());
    Ok(())
}

fn create_release_archive(repo_root: &Path, bin_dir: &Path, tag: &str, output_path: &Path) -> Result<()> {
    let output_file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

    let encoder = GzEncoder::new(output_file, Compression::default());
    let mut archive = tar::Builder::new(encoder);
    let prefix = format!("shim-{}", tag);

    for name in BINARIES {
        let file_name = format!("{}{}", name, EXE_EXT);
        let source = bin_dir.join(&file_name);
        if !source.is_file() {
            bail!(
                "Missing {} in {} (run `cargo build --release` first)",
                file_name,
                bin_dir.display()
            );
        }
        append_file(&mut archive, &source, &format!("{}/bin/{}", prefix, file_name), 0o755)?;
    }

    for file in ROOT_FILES {
        append_file(&mut archive, &repo_root.join(file), &format!("{}/{}", prefix, file), 0o644)?;
    }

    // Finish writing the archive
    archive
        .into_inner()
        .context("Failed to finalize archive")?
        .finish()
        .context("Failed to finish compression")?;

    Ok(())
}

fn append_file<W: std::io::Write>(
    archive: &mut tar::Builder<W>,
    source: &Path,
    archive_path: &str,
    mode: u32,
) -> Result<()> {
    let metadata =
        fs::metadata(source).with_context(|| format!("Failed to read metadata for {}", source.display()))?;
    let mut header = tar::Header::new_gnu();
    header.set_size(metadata.len());
    header.set_mode(mode);
    header.set_cksum();

    let mut file_handle = File::open(source).with_context(|| format!("Failed to open {}", source.display()))?;

    archive
        .append_data(&mut header, archive_path, &mut file_handle)
        .with_context(|| format!("Failed to add {} to archive", archive_path))?;

    eprintln!("Added: {}", archive_path);
    Ok(())
}

fn find_repo_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;

    // Walk up from current directory to the workspace manifest
    let mut dir = current_dir.as_path();
    loop {
        let manifest = dir.join("Cargo.toml");
        if manifest.is_file() {
            let contents = fs::read_to_string(&manifest)
                .with_context(|| format!("Failed to read {}", manifest.display()))?;
            if contents.lines().any(|line| line.trim() == "[workspace]") {
                return Ok(dir.to_path_buf());
            }
        }

        dir = dir
            .parent()
            .context("Could not find repository root (no workspace Cargo.toml found)")?;
    }
}
