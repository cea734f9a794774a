//! Installation discovery
//!
//! The game's install directory is read from its uninstall metadata in the
//! registry. Which registry view holds it depends on the host architecture and
//! on the installer that wrote it, so both views are tried in a fixed order.

pub mod registry;

use std::fmt;
use tracing::{debug, info};

use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::paths::InstallationPath;

pub use registry::RegistryStore;

/// Registry view a lookup goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryView {
    /// `KEY_WOW64_32KEY`
    Wow32,
    /// `KEY_WOW64_64KEY`
    Wow64,
}

impl RegistryView {
    /// Views in lookup order
    pub const LOOKUP_ORDER: [RegistryView; 2] = [RegistryView::Wow32, RegistryView::Wow64];
}

impl fmt::Display for RegistryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryView::Wow32 => write!(f, "32-bit view"),
            RegistryView::Wow64 => write!(f, "64-bit view"),
        }
    }
}

/// Read access to the OS configuration store
pub trait InstallStore {
    /// Read a string value from `key` under the given view
    fn read_string(&self, view: RegistryView, key: &str, value: &str) -> std::io::Result<String>;
}

impl<T: InstallStore + ?Sized> InstallStore for &T {
    fn read_string(&self, view: RegistryView, key: &str, value: &str) -> std::io::Result<String> {
        (**self).read_string(view, key, value)
    }
}

/// Resolves the game's installation directory
pub struct InstallLocator<S> {
    store: S,
    key: String,
    value: String,
}

impl<S: InstallStore> InstallLocator<S> {
    pub fn new(store: S, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn from_config(store: S, config: &BootstrapConfig) -> Self {
        Self::new(store, &config.registry_key, &config.registry_value)
    }

    /// Query each view in order; the first hit wins
    pub fn locate(&self) -> Result<InstallationPath> {
        let mut attempts = Vec::new();

        for view in RegistryView::LOOKUP_ORDER {
            match self.store.read_string(view, &self.key, &self.value) {
                Ok(raw) => {
                    let path = InstallationPath::new(raw);
                    info!("Found installation via {}: {}", view, path);
                    return Ok(path);
                }
                Err(e) => {
                    debug!("Lookup of {}\\{} via {} failed: {}", self.key, self.value, view, e);
                    attempts.push((view, e.to_string()));
                }
            }
        }

        Err(BootstrapError::Lookup {
            key: self.key.clone(),
            value: self.value.clone(),
            attempts,
        })
    }
}
