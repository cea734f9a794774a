//! Mod-loader payload
//!
//! The payload is three files dropped next to the game executable. If the
//! loader executable is already there the payload counts as installed and
//! nothing is touched. Otherwise the current loader configuration is moved
//! aside and all three files are downloaded in a fixed order.
//!
//! Backup and download failures never stop the run. They are logged and
//! recorded in the returned [`PayloadOutcome`], and the game is launched
//! regardless.

pub mod http;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::paths::{InstallationPath, backup_path};

pub use http::HttpClient;

/// Role of a payload file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    LoaderExecutable,
    LoaderConfig,
    SupportLibrary,
}

/// One file of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFile {
    pub kind: PayloadKind,
    /// Path relative to the download base URL
    pub remote_path: &'static str,
    /// Path relative to the installation directory
    pub local_path: &'static str,
}

pub const LOADER_EXECUTABLE: PayloadFile = PayloadFile {
    kind: PayloadKind::LoaderExecutable,
    remote_path: "dvmod.exe",
    local_path: "dvmod.exe",
};

pub const LOADER_CONFIG: PayloadFile = PayloadFile {
    kind: PayloadKind::LoaderConfig,
    remote_path: "doorstop_config.ini",
    local_path: "doorstop_config.ini",
};

pub const SUPPORT_LIBRARY: PayloadFile = PayloadFile {
    kind: PayloadKind::SupportLibrary,
    remote_path: "version.dll",
    local_path: "version.dll",
};

/// Payload files in download order
pub const PAYLOAD_FILES: [PayloadFile; 3] = [LOADER_EXECUTABLE, LOADER_CONFIG, SUPPORT_LIBRARY];

/// Something that can place a remote resource at a local path
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Fetch `url` into `dest_path`, returning the number of bytes written
    async fn fetch(&self, url: &Url, dest_path: &Path) -> Result<u64>;
}

#[async_trait]
impl<T: PayloadSource + ?Sized> PayloadSource for &T {
    async fn fetch(&self, url: &Url, dest_path: &Path) -> Result<u64> {
        (**self).fetch(url, dest_path).await
    }
}

/// What happened to the existing loader configuration
#[derive(Debug)]
pub enum BackupOutcome {
    /// Configuration moved aside
    Moved { from: PathBuf, to: PathBuf },
    /// Nothing to back up
    Missing,
    /// Rename failed or a backup already existed; ignored
    Failed(BootstrapError),
}

/// Result of a single payload download
#[derive(Debug)]
pub struct DownloadRecord {
    pub file: PayloadFile,
    pub url: String,
    pub destination: PathBuf,
    /// Bytes written, or the error that was ignored
    pub result: Result<u64>,
}

/// Outcome of [`PayloadFetcher::ensure`]
#[derive(Debug)]
pub enum PayloadOutcome {
    /// Loader executable found; nothing was backed up or downloaded
    AlreadyInstalled { loader: PathBuf },
    /// Fresh install attempted
    Installed {
        backup: BackupOutcome,
        downloads: Vec<DownloadRecord>,
    },
}

impl PayloadOutcome {
    pub fn download_count(&self) -> usize {
        match self {
            PayloadOutcome::AlreadyInstalled { .. } => 0,
            PayloadOutcome::Installed { downloads, .. } => downloads.len(),
        }
    }
}

/// Makes sure the loader payload is present in the installation directory
pub struct PayloadFetcher<S> {
    source: S,
    base_url: Url,
}

impl<S: PayloadSource> PayloadFetcher<S> {
    pub fn new(source: S, base_url: Url) -> Self {
        Self { source, base_url }
    }

    pub fn from_config(source: S, config: &BootstrapConfig) -> Self {
        Self::new(source, config.base_url.clone())
    }

    /// Install the payload unless the loader executable is already present
    pub async fn ensure(&self, install: &InstallationPath) -> PayloadOutcome {
        let loader = install.join(LOADER_EXECUTABLE.local_path);
        if is_file(&loader).await {
            info!("Loader already installed: {}", loader.display());
            return PayloadOutcome::AlreadyInstalled { loader };
        }

        info!("Loader not found, installing payload into {}", install);
        let backup = backup_config(&install.join(LOADER_CONFIG.local_path)).await;

        let mut downloads = Vec::with_capacity(PAYLOAD_FILES.len());
        for file in PAYLOAD_FILES {
            downloads.push(self.download(install, file).await);
        }

        PayloadOutcome::Installed { backup, downloads }
    }

    async fn download(&self, install: &InstallationPath, file: PayloadFile) -> DownloadRecord {
        let destination = install.join(file.local_path);
        let url = self.base_url.join(file.remote_path);

        let result = match &url {
            Ok(url) => self.source.fetch(url, &destination).await,
            Err(e) => Err(BootstrapError::InvalidUrl {
                url: format!("{}{}", self.base_url, file.remote_path),
                suggestion: "Payload paths must be relative to the base URL".to_string(),
                source: *e,
            }),
        };

        match &result {
            Ok(size) => info!("Downloaded {} ({} bytes)", destination.display(), size),
            Err(e) => warn!("Ignoring {} failure for {}: {}", e.category(), destination.display(), e),
        }

        DownloadRecord {
            file,
            url: url.map(String::from).unwrap_or_else(|_| file.remote_path.to_string()),
            destination,
            result,
        }
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// Move the loader configuration to `<name>.old`
///
/// An existing backup is never replaced: it holds the configuration from
/// before the first install, so the move fails instead.
async fn backup_config(config: &Path) -> BackupOutcome {
    if !is_file(config).await {
        debug!("No loader configuration to back up at {}", config.display());
        return BackupOutcome::Missing;
    }

    let target = backup_path(config);
    let moved = if fs::try_exists(&target).await.unwrap_or(false) {
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "backup target already exists",
        ))
    } else {
        fs::rename(config, &target).await
    };

    match moved {
        Ok(()) => {
            info!("Backed up {} to {}", config.display(), target.display());
            BackupOutcome::Moved {
                from: config.to_path_buf(),
                to: target,
            }
        }
        Err(source) => {
            let error = BootstrapError::Backup {
                from: config.to_path_buf(),
                to: target,
                source,
            };
            warn!("Ignoring {} failure: {}", error.category(), error);
            BackupOutcome::Failed(error)
        }
    }
}
