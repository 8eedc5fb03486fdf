use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const SHIM: &str = env!("CARGO_BIN_EXE_shim");

fn run(program: &Path, args: &[&str], cwd: &Path) -> Output {
    Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {}: {e}", program.display()))
}

fn create(dir: &Path, args: &[&str]) -> Output {
    run(Path::new(SHIM), args, dir)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_exits_zero_and_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = create(dir.path(), &["/?"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("/E<path>"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn missing_target_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = create(dir.path(), &["/Dsomewhere"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing /E"), "stderr: {stderr}");
    assert!(stderr.contains("/O<out>"), "help should follow the error");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn output_defaults_to_target_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let output = create(dir.path(), &[r"/EC:\tools\foo.exe"]);

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    assert!(dir.path().join("foo.exe").is_file());
    assert!(stdout(&output).contains(r"C:\tools\foo.exe"));
}

#[test]
fn created_shim_starts_with_launcher_image() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("copy");
    let output = create(dir.path(), &["/Etool", &format!("/O{}", out.display())]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");

    let launcher = fs::read(SHIM).unwrap();
    let shim = fs::read(&out).unwrap();
    assert!(shim.len() > launcher.len());
    assert_eq!(&shim[..launcher.len()], &launcher[..]);
}

#[cfg(unix)]
mod forwarding {
    use super::*;

    fn make_shim(dir: &Path, name: &str, extra: &[&str]) -> PathBuf {
        let out = dir.join(name);
        let out_flag = format!("/O{}", out.display());
        let mut args = vec![out_flag.as_str()];
        args.extend_from_slice(extra);
        let output = create(dir, &args);
        assert_eq!(output.status.code(), Some(0), "{output:?}");
        out
    }

    #[test]
    fn exit_code_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let shim = make_shim(dir.path(), "sh-shim", &["/Esh"]);

        assert_eq!(run(&shim, &["-c", "exit 0"], dir.path()).status.code(), Some(0));
        assert_eq!(run(&shim, &["-c", "exit 7"], dir.path()).status.code(), Some(7));
    }

    #[test]
    fn arguments_pass_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let shim = make_shim(dir.path(), "printf-shim", &["/Eprintf"]);

        let output = run(&shim, &["[%s]", "two words", "/Efoo", ""], dir.path());
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout(&output), "[two words][/Efoo][]");
    }

    #[test]
    fn working_directory_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        let dir_flag = format!("/D{}", work.display());
        let shim = make_shim(dir.path(), "pwd-shim", &["/Epwd", &dir_flag]);

        let output = run(&shim, &["-P"], dir.path());
        assert_eq!(output.status.code(), Some(0));
        let printed = PathBuf::from(stdout(&output).trim());
        assert_eq!(printed, work.canonicalize().unwrap());
    }

    #[test]
    fn missing_target_fails_to_launch() {
        let dir = tempfile::tempdir().unwrap();
        let shim = make_shim(dir.path(), "ghost", &["/E/definitely/not/here"]);

        let output = run(&shim, &[], dir.path());
        assert_eq!(output.status.code(), Some(127));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("/definitely/not/here"), "stderr: {stderr}");
    }

    #[test]
    fn forwarder_ignores_creator_flags() {
        let dir = tempfile::tempdir().unwrap();
        let shim = make_shim(dir.path(), "echo-shim", &["/Eecho"]);

        let output = run(&shim, &["/?"], dir.path());
        assert_eq!(stdout(&output), "/?\n");
    }
}
