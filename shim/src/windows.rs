// Windows launcher: the raw command line in, CreateProcessW out.
// The trailing arguments are cut from GetCommandLineW so the target receives
// exactly the text the user typed.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr;

use tracing::debug;
use windows_sys::Win32::Foundation::WAIT_FAILED;
use windows_sys::Win32::System::Environment::GetCommandLineW;
use windows_sys::Win32::System::Threading::{
    CreateProcessW, GetExitCodeProcess, WaitForSingleObject, INFINITE, PROCESS_INFORMATION,
    STARTUPINFOW,
};

use crate::error::{Error, Result};
use crate::forward::ProcessResult;
use crate::metadata::ShimMetadata;
use crate::reconstruct::{self, ArgvMismatch};

/// What the operating system handed this process.
#[derive(Debug)]
pub struct Invocation {
    raw: Vec<u16>,
    argv0: OsString,
    tail: Vec<u16>,
}

impl Invocation {
    pub fn capture() -> Result<Self> {
        let argv0 = env::args_os().next().unwrap_or_default();
        Self::from_parts(raw_command_line(), argv0)
    }

    fn from_parts(raw: Vec<u16>, argv0: OsString) -> Result<Self> {
        let wide_argv0: Vec<u16> = argv0.encode_wide().collect();
        let tail = reconstruct::trailing_args(&raw, &wide_argv0)
            .map_err(|ArgvMismatch| Error::ArgvMismatch {
                argv0: argv0.to_string_lossy().into_owned(),
            })?
            .to_vec();
        Ok(Self { raw, argv0, tail })
    }

    pub fn argv0(&self) -> &OsStr {
        &self.argv0
    }

    /// Command line for the target: its path followed by our trailing text.
    pub fn child_command_line(&self, target: &str) -> Vec<u16> {
        let target: Vec<u16> = OsStr::new(target).encode_wide().collect();
        // Quoted when blank, so `C:\Program Files\x.exe` is not run as `C:\Program`.
        reconstruct::child_command_line(&target, &self.tail)
    }

    /// Starts the target, waits for it without a timeout and returns its
    /// exit code untouched.
    pub fn launch(&self, metadata: &ShimMetadata) -> Result<ProcessResult> {
        let launch_error = |source: io::Error| Error::Launch {
            target: metadata.target().to_owned(),
            source,
        };

        let mut command_line = self.child_command_line(metadata.target());
        debug!(
            raw = %String::from_utf16_lossy(&self.raw),
            child = %String::from_utf16_lossy(&command_line),
            "rebuilt command line"
        );
        command_line.push(0);
        let working_dir = metadata.working_dir().map(to_wide_nul);

        // SAFETY: both structs are plain C data for which all-zero is valid.
        let mut startup: STARTUPINFOW = unsafe { mem::zeroed() };
        startup.cb = mem::size_of::<STARTUPINFOW>() as u32;
        let mut info: PROCESS_INFORMATION = unsafe { mem::zeroed() };

        // Null application name: the first token of the command line names
        // the program and is searched for the usual way.
        // SAFETY: command_line and working_dir are NUL-terminated and outlive
        // the call; CreateProcessW may write into command_line.
        let created = unsafe {
            CreateProcessW(
                ptr::null(),
                command_line.as_mut_ptr(),
                ptr::null(),
                ptr::null(),
                1, // inherit stdio handles
                0,
                ptr::null(),
                working_dir.as_ref().map_or(ptr::null(), |dir| dir.as_ptr()),
                &startup,
                &mut info,
            )
        };
        if created == 0 {
            return Err(launch_error(io::Error::last_os_error()));
        }

        // SAFETY: CreateProcessW succeeded, so both handles are open and ours
        // to close. Wrapping them first closes them on every path below.
        let process = unsafe { OwnedHandle::from_raw_handle(info.hProcess) };
        let _thread = unsafe { OwnedHandle::from_raw_handle(info.hThread) };
        debug!(pid = info.dwProcessId, "target started");

        let exit_code = wait_for_exit(&process).map_err(launch_error)?;
        Ok(ProcessResult {
            exit_code: exit_code as i32,
        })
    }
}

fn wait_for_exit(process: &OwnedHandle) -> io::Result<u32> {
    let handle = process.as_raw_handle();
    // SAFETY: handle is a live process handle owned by `process`.
    unsafe {
        if WaitForSingleObject(handle, INFINITE) == WAIT_FAILED {
            return Err(io::Error::last_os_error());
        }
        let mut exit_code: u32 = 0;
        if GetExitCodeProcess(handle, &mut exit_code) == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(exit_code)
    }
}

fn raw_command_line() -> Vec<u16> {
    // SAFETY: GetCommandLineW returns a NUL-terminated string that lives as
    // long as the process.
    unsafe {
        let line = GetCommandLineW();
        std::slice::from_raw_parts(line, wstrlen(line)).to_vec()
    }
}

// Get the length of a null-terminated wide string
unsafe fn wstrlen(s: *const u16) -> usize {
    let mut len = 0;
    while *s.add(len) != 0 {
        len += 1;
    }
    len
}

fn to_wide_nul(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(Some(0)).collect()
}
