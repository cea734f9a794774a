//! Game launch
//!
//! The game is started with the in-game handler's install command, so the
//! loader installs the configured mod on start-up. The child is never waited
//! on; the bootstrapper exits right after it is created.

use std::path::PathBuf;
#[cfg(not(windows))]
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::origin::Origin;
use crate::paths::InstallationPath;

/// Program name placed in front of the handler arguments
pub const ARGV0_PLACEHOLDER: &str = "progname-dummy";
/// First argument the handler looks for
pub const HANDLER_VERB: &str = "dvmod-handler";
pub const INSTALL_COMMAND: &str = "install";

/// Everything needed to start the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub working_dir: PathBuf,
    pub argv0: String,
    /// Arguments after argv0
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(install: &InstallationPath, game_executable: &str, origin: &Origin) -> Self {
        Self {
            executable: install.join(game_executable),
            working_dir: install.as_path().to_path_buf(),
            argv0: ARGV0_PLACEHOLDER.to_string(),
            args: vec![
                HANDLER_VERB.to_string(),
                INSTALL_COMMAND.to_string(),
                origin.as_str().to_string(),
            ],
        }
    }

    pub fn from_config(install: &InstallationPath, config: &BootstrapConfig) -> Self {
        Self::new(install, &config.game_executable, &config.origin)
    }

    /// Full command line, `progname-dummy dvmod-handler install <origin>`
    pub fn command_line(&self) -> String {
        std::iter::once(self.argv0.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Starts processes
pub trait Spawner {
    /// Start the process described by `spec` and return its id without waiting
    fn spawn(&self, spec: &LaunchSpec) -> std::io::Result<u32>;
}

impl<T: Spawner + ?Sized> Spawner for &T {
    fn spawn(&self, spec: &LaunchSpec) -> std::io::Result<u32> {
        (**self).spawn(spec)
    }
}

/// Default [`Spawner`] for the host platform
///
/// On Windows the process is created with the literal command line from
/// [`LaunchSpec::command_line`], so the child sees the placeholder as its
/// first token. Elsewhere [`std::process::Command`] is used with argv0 set to
/// the placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpawner;

#[cfg(windows)]
impl Spawner for CommandSpawner {
    fn spawn(&self, spec: &LaunchSpec) -> std::io::Result<u32> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            CreateProcessW, PROCESS_INFORMATION, STARTUPINFOW,
        };

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let application = to_wide(spec.executable.as_os_str());
        let directory = to_wide(spec.working_dir.as_os_str());
        // CreateProcessW may write into the command line buffer.
        let mut command_line = to_wide(OsStr::new(&spec.command_line()));

        // SAFETY: both structs are plain data for which all-zero is valid.
        let mut startup: STARTUPINFOW = unsafe { std::mem::zeroed() };
        startup.cb = std::mem::size_of::<STARTUPINFOW>() as u32;
        let mut info: PROCESS_INFORMATION = unsafe { std::mem::zeroed() };

        // SAFETY: every string is NUL-terminated and outlives the call.
        let created = unsafe {
            CreateProcessW(
                application.as_ptr(),
                command_line.as_mut_ptr(),
                std::ptr::null(),
                std::ptr::null(),
                0,
                0,
                std::ptr::null(),
                directory.as_ptr(),
                &startup,
                &mut info,
            )
        };
        if created == 0 {
            return Err(std::io::Error::last_os_error());
        }

        // The child is never waited on.
        unsafe {
            CloseHandle(info.hThread);
            CloseHandle(info.hProcess);
        }
        Ok(info.dwProcessId)
    }
}

#[cfg(not(windows))]
impl Spawner for CommandSpawner {
    fn spawn(&self, spec: &LaunchSpec) -> std::io::Result<u32> {
        let mut cmd = Command::new(&spec.executable);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&spec.argv0);
        }

        let child = cmd.spawn()?;
        Ok(child.id())
    }
}

/// Launches the game through a [`Spawner`]
pub struct ProcessLauncher<P> {
    spawner: P,
}

impl<P: Spawner> ProcessLauncher<P> {
    pub fn new(spawner: P) -> Self {
        Self { spawner }
    }

    pub fn launch(&self, spec: &LaunchSpec) -> Result<u32> {
        debug!(
            "Launching {} in {} as `{}`",
            spec.executable.display(),
            spec.working_dir.display(),
            spec.command_line()
        );

        match self.spawner.spawn(spec) {
            Ok(pid) => {
                info!("Started {} (pid {})", spec.executable.display(), pid);
                Ok(pid)
            }
            Err(e) => Err(BootstrapError::spawn(&spec.executable, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn origin() -> Origin {
        Origin::parse("dvmod://mod/couplers-overhaul").unwrap()
    }

    #[test]
    fn test_builds_spec_from_install_path() {
        let install = InstallationPath::new(r"C:\Games\Title\");
        let spec = LaunchSpec::new(&install, "Title.exe", &origin());

        assert_eq!(spec.executable, PathBuf::from(r"C:\Games\Title\Title.exe"));
        assert_eq!(spec.working_dir, PathBuf::from(r"C:\Games\Title\"));
        assert_eq!(
            spec.command_line(),
            "progname-dummy dvmod-handler install dvmod://mod/couplers-overhaul"
        );
    }

    #[test]
    fn test_origin_is_passed_verbatim() {
        let install = InstallationPath::new("/games/title/");
        let origin = Origin::parse("https://example.com/mods/a%20b.zip?x=1").unwrap();
        let spec = LaunchSpec::new(&install, "Title.exe", &origin);

        assert_eq!(spec.args.last().map(String::as_str), Some("https://example.com/mods/a%20b.zip?x=1"));
    }

    struct FailingSpawner(i32);

    impl Spawner for FailingSpawner {
        fn spawn(&self, _spec: &LaunchSpec) -> io::Result<u32> {
            Err(io::Error::from_raw_os_error(self.0))
        }
    }

    #[test]
    fn test_spawn_failure_carries_os_code() {
        let install = InstallationPath::new("/games/title/");
        let spec = LaunchSpec::new(&install, "Title.exe", &origin());

        let err = ProcessLauncher::new(FailingSpawner(5)).launch(&spec).unwrap_err();

        match err {
            BootstrapError::Spawn { program, code, description } => {
                assert_eq!(program, PathBuf::from("/games/title/Title.exe"));
                assert_eq!(code, 5);
                assert_eq!(description, crate::error::os_error_description(&io::Error::from_raw_os_error(5)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_executable_fails_to_spawn() {
        let temp_dir = tempfile::tempdir().unwrap();
        let install = InstallationPath::from_path(temp_dir.path());
        let spec = LaunchSpec::new(&install, "DoesNotExist.exe", &origin());

        let err = ProcessLauncher::new(CommandSpawner).launch(&spec).unwrap_err();

        assert_eq!(err.category(), "spawn");
    }
}
