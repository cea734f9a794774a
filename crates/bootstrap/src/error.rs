//! Error types for the bootstrap flow
//!
//! Only [`BootstrapError::Lookup`] stops a run. Backup and download errors are
//! logged and dropped by the payload fetcher, and spawn errors are shown to the
//! user without changing the exit status.

use std::path::PathBuf;
use thiserror::Error;

use crate::locator::RegistryView;

/// Errors raised while preparing or launching the game
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Neither registry view yielded an installation directory
    #[error("unable to find installation (tried {})", describe_attempts(.attempts))]
    Lookup {
        key: String,
        value: String,
        attempts: Vec<(RegistryView, String)>,
    },

    /// Moving the loader configuration aside failed
    #[error("Failed to back up '{from}' to '{to}'")]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP-related errors with context
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP request to '{url}' returned status {status}")]
    HttpStatus {
        url: String,
        status: u16,
    },

    /// File system I/O errors with file context
    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// URL parsing errors with helpful suggestions
    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: url::ParseError,
    },

    /// Origin value rejected during configuration
    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin {
        origin: String,
        reason: String,
    },

    /// The game process could not be created
    #[error("failed to execute '{program}': {description} (os error {code})")]
    Spawn {
        program: PathBuf,
        code: i32,
        description: String,
    },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

fn describe_attempts(attempts: &[(RegistryView, String)]) -> String {
    if attempts.is_empty() {
        return "no registry views".to_string();
    }
    attempts
        .iter()
        .map(|(view, reason)| format!("{view}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Write,
    Create,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
        }
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

impl BootstrapError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BootstrapError::Lookup { .. } => "lookup",
            BootstrapError::Backup { .. } => "backup",
            BootstrapError::HttpRequest { .. } => "http_request",
            BootstrapError::HttpStatus { .. } => "http_status",
            BootstrapError::FileSystem { .. } => "file_system",
            BootstrapError::InvalidUrl { .. } => "invalid_url",
            BootstrapError::InvalidOrigin { .. } => "invalid_origin",
            BootstrapError::Spawn { .. } => "spawn",
            BootstrapError::Configuration { .. } => "configuration",
        }
    }

    /// Build a spawn error from the OS error returned by process creation
    pub fn spawn(program: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let code = error.raw_os_error().unwrap_or(-1);
        BootstrapError::Spawn {
            program: program.into(),
            code,
            description: os_error_description(error),
        }
    }
}

/// Human-readable text for an OS error, as formatted by the operating system
///
/// The standard library asks the OS for this text (`FormatMessageW` on
/// Windows, `strerror_r` elsewhere); the trailing "(os error N)" it appends is
/// stripped so callers can place the code themselves.
pub fn os_error_description(error: &std::io::Error) -> String {
    match error.raw_os_error() {
        Some(code) => {
            let text = std::io::Error::from_raw_os_error(code).to_string();
            let suffix = format!(" (os error {code})");
            text.strip_suffix(&suffix).unwrap_or(&text).trim().to_string()
        }
        None => error.to_string(),
    }
}
