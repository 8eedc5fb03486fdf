//! Test runner for the shim launchers
//!
//! This test runner validates the launchers end to end by:
//! 1. Creating shims with the real `shim` binary for the demo programs
//! 2. Checking that each created shim carries the unmodified launcher image
//! 3. Running the shims and validating arguments, working directory and exit codes
//! 4. Running the build-time configured `static-shim`
//!
//! Usage: test-runner --shim <path> --static-shim <path> --test-binaries <dir>

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::Parser;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Executable extension
#[cfg(windows)]
const EXE_EXT: &str = ".exe";
#[cfg(not(windows))]
const EXE_EXT: &str = "";

/// Exit code of a shim whose target cannot be started
const EXIT_LAUNCH: i32 = 127;

/// End-to-end tests for shim and static-shim
#[derive(Parser)]
#[command(name = "test-runner")]
struct TestConfig {
    /// Path to the self-shimming launcher
    #[arg(long = "shim")]
    shim_path: PathBuf,
    /// Path to the build-time configured launcher (built without SHIM_EXE)
    #[arg(long = "static-shim")]
    static_shim_path: PathBuf,
    /// Directory containing the demo binaries (print-args, exit-with)
    #[arg(long = "test-binaries")]
    test_binaries_dir: PathBuf,
    /// Working directory for test artifacts (default: temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

impl TestConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.shim_path.exists() {
            return Err(format!("Shim not found: {}", self.shim_path.display()));
        }
        if !self.static_shim_path.exists() {
            return Err(format!("Static shim not found: {}", self.static_shim_path.display()));
        }
        if !self.test_binaries_dir.exists() {
            return Err(format!("Test binaries dir not found: {}", self.test_binaries_dir.display()));
        }
        Ok(())
    }

    fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join("shim-tests"))
    }

    fn demo(&self, name: &str) -> PathBuf {
        self.test_binaries_dir.join(format!("{}{}", name, EXE_EXT))
    }

    /// Fresh directory for one test
    fn test_dir(&self, name: &str) -> Result<PathBuf, String> {
        let dir = self.work_dir().join(name);
        fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        Ok(dir)
    }
}

/// Run a program and collect (stdout, stderr, exit code)
fn run(program: &Path, args: &[&str], cwd: &Path) -> Result<(String, String, i32), String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| format!("Failed to run {}: {}", program.display(), e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    Ok((stdout, stderr, exit_code))
}

/// Create a shim at `dir/name` forwarding to `target`
fn create_shim(
    config: &TestConfig,
    dir: &Path,
    name: &str,
    target: &Path,
    working_dir: Option<&Path>,
) -> Result<PathBuf, String> {
    let output = dir.join(format!("{}{}", name, EXE_EXT));
    let target_flag = format!("/E{}", target.display());
    let output_flag = format!("/O{}", output.display());
    let dir_flag = working_dir.map(|wd| format!("/D{}", wd.display()));

    let mut args = vec![target_flag.as_str(), output_flag.as_str()];
    if let Some(flag) = &dir_flag {
        args.push(flag);
    }

    let (stdout, stderr, exit_code) = run(&config.shim_path, &args, dir)?;
    if exit_code != 0 {
        return Err(format!("Shim creation failed with exit code {}: {}", exit_code, stderr));
    }
    if !stdout.contains("Created shim") {
        return Err(format!("Missing confirmation in output: {}", stdout));
    }
    if !output.exists() {
        return Err(format!("Shim was not created: {}", output.display()));
    }

    Ok(output)
}

fn parse_print_args(stdout: &str) -> Result<Value, String> {
    serde_json::from_str(stdout.trim()).map_err(|e| format!("Invalid JSON from print-args: {}: {}", e, stdout))
}

fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Test: a created shim starts with the exact bytes of the launcher
fn test_image_is_preserved(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: image_is_preserved");

    let dir = config.test_dir("image_is_preserved")?;
    let shim = create_shim(config, &dir, "print-args", &config.demo("print-args"), None)?;

    let launcher = fs::read(&config.shim_path).map_err(|e| format!("Failed to read launcher: {}", e))?;
    let created = fs::read(&shim).map_err(|e| format!("Failed to read shim: {}", e))?;

    if created.len() < launcher.len() {
        return Err(format!(
            "Shim is shorter than the launcher: {} < {}",
            created.len(),
            launcher.len()
        ));
    }

    let expected = sha256_hex(&launcher);
    let actual = sha256_hex(&created[..launcher.len()]);
    if expected != actual {
        return Err(format!("Launcher image differs: expected {}, got {}", expected, actual));
    }

    println!("    PASS");
    Ok(())
}

/// Test: arguments reach the target unchanged
fn test_arguments_forwarded(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: arguments_forwarded");

    let dir = config.test_dir("arguments_forwarded")?;
    let shim = create_shim(config, &dir, "print-args", &config.demo("print-args"), None)?;

    let expected = ["alpha", "two words", "--flag=value", "/Enot-a-flag"];
    let (stdout, stderr, exit_code) = run(&shim, &expected, &dir)?;
    if exit_code != 0 {
        return Err(format!("Shim failed with exit code {}: {}", exit_code, stderr));
    }

    let report = parse_print_args(&stdout)?;
    let args: Vec<&str> = report["args"]
        .as_array()
        .ok_or_else(|| format!("Missing args in output: {}", stdout))?
        .iter()
        .filter_map(Value::as_str)
        .collect();
    if args != expected {
        return Err(format!("Expected args {:?} but got {:?}", expected, args));
    }

    // Without /D the target runs where the shim was started
    let cwd = PathBuf::from(report["cwd"].as_str().unwrap_or_default());
    if !same_dir(&cwd, &dir) {
        return Err(format!("Expected cwd {} but got {}", dir.display(), cwd.display()));
    }

    println!("    PASS");
    Ok(())
}

/// Test: the stored working directory is applied
fn test_working_directory(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: working_directory");

    let dir = config.test_dir("working_directory")?;
    let wd = dir.join("wd");
    fs::create_dir_all(&wd).map_err(|e| format!("Failed to create wd: {}", e))?;
    let shim = create_shim(config, &dir, "print-args", &config.demo("print-args"), Some(&wd))?;

    let (stdout, stderr, exit_code) = run(&shim, &[], &dir)?;
    if exit_code != 0 {
        return Err(format!("Shim failed with exit code {}: {}", exit_code, stderr));
    }

    let report = parse_print_args(&stdout)?;
    let cwd = PathBuf::from(report["cwd"].as_str().unwrap_or_default());
    if !same_dir(&cwd, &wd) {
        return Err(format!("Expected cwd {} but got {}", wd.display(), cwd.display()));
    }

    println!("    PASS");
    Ok(())
}

/// Test: the target's exit code becomes the shim's
fn test_exit_code_propagation(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: exit_code_propagation");

    let dir = config.test_dir("exit_code_propagation")?;
    let shim = create_shim(config, &dir, "exit-with", &config.demo("exit-with"), None)?;

    for code in [0, 1, 42] {
        let arg = code.to_string();
        let (_, stderr, exit_code) = run(&shim, &[&arg], &dir)?;
        if exit_code != code {
            return Err(format!("Expected exit code {} but got {}: {}", code, exit_code, stderr));
        }
    }

    println!("    PASS");
    Ok(())
}

/// Test: a missing target is a launch failure, never success
fn test_missing_target(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: missing_target");

    let dir = config.test_dir("missing_target")?;
    let target = dir.join(format!("does-not-exist{}", EXE_EXT));
    let shim = create_shim(config, &dir, "ghost", &target, None)?;

    let (_, stderr, exit_code) = run(&shim, &["ignored"], &dir)?;
    if exit_code != EXIT_LAUNCH {
        return Err(format!("Expected exit code {} but got {}: {}", EXIT_LAUNCH, exit_code, stderr));
    }
    if !stderr.contains("does-not-exist") {
        return Err(format!("Diagnostic should name the target: {}", stderr));
    }

    println!("    PASS");
    Ok(())
}

/// Test: without /O the shim is named after the target
fn test_default_output_name(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: default_output_name");

    let dir = config.test_dir("default_output_name")?;
    let target = config.demo("exit-with");
    let target_flag = format!("/E{}", target.display());

    let (_, stderr, exit_code) = run(&config.shim_path, &[&target_flag], &dir)?;
    if exit_code != 0 {
        return Err(format!("Shim creation failed with exit code {}: {}", exit_code, stderr));
    }

    let expected = dir.join(format!("exit-with{}", EXE_EXT));
    if !expected.exists() {
        return Err(format!("Expected shim at {}", expected.display()));
    }

    let (_, _, exit_code) = run(&expected, &["9"], &dir)?;
    if exit_code != 9 {
        return Err(format!("Expected exit code 9 but got {}", exit_code));
    }

    println!("    PASS");
    Ok(())
}

/// Test: /? prints help and touches nothing
fn test_help(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: help");

    let dir = config.test_dir("help")?;
    let (stdout, stderr, exit_code) = run(&config.shim_path, &["/?"], &dir)?;
    if exit_code != 0 {
        return Err(format!("Help failed with exit code {}: {}", exit_code, stderr));
    }
    if !stdout.contains("/E<path>") {
        return Err(format!("Help text missing /E: {}", stdout));
    }

    let entries = fs::read_dir(&dir).map_err(|e| format!("Failed to list {}: {}", dir.display(), e))?;
    if entries.count() != 0 {
        return Err("Help created files".to_string());
    }

    // Missing /E: help on stderr and a usage failure
    let (_, stderr, exit_code) = run(&config.shim_path, &["/Dsomewhere"], &dir)?;
    if exit_code == 0 {
        return Err("Missing /E should fail".to_string());
    }
    if !stderr.contains("/E<path>") {
        return Err(format!("Expected help on stderr: {}", stderr));
    }

    println!("    PASS");
    Ok(())
}

/// Test: static-shim forwards to the default shell
fn test_static_shim(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: static_shim");

    let dir = config.test_dir("static_shim")?;

    #[cfg(windows)]
    let args = ["/C", "exit 5"];
    #[cfg(not(windows))]
    let args = ["-c", "exit 5"];

    let (_, stderr, exit_code) = run(&config.static_shim_path, &args, &dir)?;
    if exit_code != 5 {
        return Err(format!("Expected exit code 5 but got {}: {}", exit_code, stderr));
    }

    println!("    PASS");
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn main() -> ExitCode {
    println!("=== Shim Test Suite ===");
    println!();

    let config = TestConfig::parse();
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        eprintln!("Use --help for usage information");
        return ExitCode::from(1);
    }

    // Clean and recreate work directory
    let work_dir = config.work_dir();
    if work_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&work_dir) {
            eprintln!("Warning: Failed to clean work dir: {}", e);
        }
    }
    if let Err(e) = fs::create_dir_all(&work_dir) {
        eprintln!("Error: Failed to create work dir: {}", e);
        return ExitCode::from(1);
    }

    println!("Configuration:");
    println!("  Shim:          {}", config.shim_path.display());
    println!("  Static shim:   {}", config.static_shim_path.display());
    println!("  Test binaries: {}", config.test_binaries_dir.display());
    println!("  Work dir:      {}", work_dir.display());
    println!();

    let tests: Vec<(&str, fn(&TestConfig) -> Result<(), String>)> = vec![
        ("image_is_preserved", test_image_is_preserved),
        ("arguments_forwarded", test_arguments_forwarded),
        ("working_directory", test_working_directory),
        ("exit_code_propagation", test_exit_code_propagation),
        ("missing_target", test_missing_target),
        ("default_output_name", test_default_output_name),
        ("help", test_help),
        ("static_shim", test_static_shim),
    ];

    let mut passed = 0;
    let mut failed = 0;

    println!("Running {} tests...", tests.len());
    println!();

    for (_name, test_fn) in &tests {
        match test_fn(&config) {
            Ok(()) => {
                passed += 1;
            }
            Err(e) => {
                println!("  FAILED: {}", e);
                failed += 1;
            }
        }
    }

    println!();
    println!("=== Results ===");
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!();

    if failed > 0 {
        ExitCode::from(1)
    } else {
        println!("All tests passed!");
        ExitCode::SUCCESS
    }
}
