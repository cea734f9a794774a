//! Windows registry access for installation discovery

use std::io;

use super::{InstallStore, RegistryView};

/// [`InstallStore`] backed by `HKEY_LOCAL_MACHINE`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryStore;

impl RegistryStore {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
impl InstallStore for RegistryStore {
    fn read_string(&self, view: RegistryView, key: &str, value: &str) -> io::Result<String> {
        use winreg::RegKey;
        use winreg::enums::*;

        let flag = match view {
            RegistryView::Wow32 => KEY_WOW64_32KEY,
            RegistryView::Wow64 => KEY_WOW64_64KEY,
        };

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let subkey = hklm.open_subkey_with_flags(key, KEY_READ | flag)?;
        subkey.get_value::<String, _>(value)
    }
}

#[cfg(not(windows))]
impl InstallStore for RegistryStore {
    fn read_string(&self, view: RegistryView, key: &str, _value: &str) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no registry on this platform ({view} of {key})"),
        ))
    }
}
