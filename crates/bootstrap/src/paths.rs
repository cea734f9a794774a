//! Installation directory and the paths derived from it

use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Absolute install directory of the game, always ending with a separator
///
/// Sub-paths are appended by plain concatenation, so the base is normalized
/// once on construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPath(String);

impl InstallationPath {
    /// Normalize a raw directory string to end with a path separator
    ///
    /// Both `/` and `\` count as separators, since registry values use the
    /// Windows form regardless of where the string is handled.
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        // Registry strings may carry their terminator along.
        while raw.ends_with('\0') {
            raw.pop();
        }
        if !raw.ends_with(['/', '\\']) {
            raw.push(MAIN_SEPARATOR);
        }
        Self(raw)
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy().into_owned())
    }

    /// Join the base directory with a relative file name
    pub fn join(&self, relative: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.0, relative))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for InstallationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Suffix appended to the loader configuration when it is moved aside
pub const BACKUP_SUFFIX: &str = ".old";

/// Path a file is moved to when backed up
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
