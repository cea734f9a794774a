//! User-facing failure reporting and exit status
//!
//! Only two failures reach the user: a missing installation, which ends the
//! run with [`EXIT_LOOKUP_FAILED`], and a failed game launch, which is shown
//! but still exits with [`EXIT_SUCCESS`].

use tracing::{debug, error};

use crate::error::BootstrapError;

pub const EXIT_SUCCESS: i32 = 0;
/// Exit status when the installation cannot be found
pub const EXIT_LOOKUP_FAILED: i32 = -1;

pub const LOOKUP_FAILURE_MESSAGE: &str = "unable to find installation";
pub const SPAWN_FAILURE_MESSAGE: &str = "failed to execute";

/// Title of failure dialogs
pub const DIALOG_CAPTION: &str = "dvmod";

/// Surface for failure messages
pub trait Reporter {
    fn show(&self, message: &str);
}

impl<T: Reporter + ?Sized> Reporter for &T {
    fn show(&self, message: &str) {
        (**self).show(message)
    }
}

/// Writes failures to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn show(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// Shows failures in a modal message box; falls back to stderr off Windows
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogReporter;

impl Reporter for DialogReporter {
    #[cfg(windows)]
    fn show(&self, message: &str) {
        use windows_sys::Win32::UI::WindowsAndMessaging::{MB_ICONERROR, MB_OK, MessageBoxW};

        let text = to_wide(message);
        let caption = to_wide(DIALOG_CAPTION);
        // SAFETY: both buffers are NUL-terminated and outlive the call.
        unsafe {
            MessageBoxW(std::ptr::null_mut(), text.as_ptr(), caption.as_ptr(), MB_OK | MB_ICONERROR);
        }
    }

    #[cfg(not(windows))]
    fn show(&self, message: &str) {
        ConsoleReporter.show(message);
    }
}

#[cfg(windows)]
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Maps failures to user messages and exit codes
pub struct ErrorReporter<R> {
    reporter: R,
}

impl<R: Reporter> ErrorReporter<R> {
    pub fn new(reporter: R) -> Self {
        Self { reporter }
    }

    /// Report `err` if it is user-visible and return the exit status it implies
    pub fn report(&self, err: &BootstrapError) -> i32 {
        match err {
            BootstrapError::Lookup { .. } => {
                error!("{}", err);
                self.reporter.show(LOOKUP_FAILURE_MESSAGE);
                EXIT_LOOKUP_FAILED
            }
            BootstrapError::Spawn { description, .. } => {
                error!("{}", err);
                self.reporter.show(&spawn_message(description));
                EXIT_SUCCESS
            }
            other => {
                debug!("Not reporting {} error: {}", other.category(), other);
                EXIT_SUCCESS
            }
        }
    }
}

/// Dialog text for a failed launch
pub fn spawn_message(description: &str) -> String {
    format!("{SPAWN_FAILURE_MESSAGE}\n\n{description}")
}
