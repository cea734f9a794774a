//! Configuration for a bootstrap run
//!
//! Every fixed value of the flow lives here: where the registry keeps the
//! install directory, where the loader payload is served from, which
//! executable to start and which mod origin to hand it.

use std::time::Duration;
use url::Url;

use crate::error::{BootstrapError, Result};
use crate::origin::{DEFAULT_ORIGIN, Origin};

/// Uninstall key written by Steam for Derail Valley
pub const DEFAULT_REGISTRY_KEY: &str =
    r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\Steam App 588030";
/// Registry value holding the install directory
pub const DEFAULT_REGISTRY_VALUE: &str = "InstallLocation";
/// Where the loader payload is served from
pub const DEFAULT_BASE_URL: &str = "http://dvmod.goip.de/";
pub const DEFAULT_GAME_EXECUTABLE: &str = "DerailValley.exe";
pub const DEFAULT_USER_AGENT: &str = "Derail Valley Mod Installer";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable overriding the origin at runtime
pub const ORIGIN_ENV: &str = "DVMOD_ORIGIN";
/// Environment variable overriding the download base URL
pub const BASE_URL_ENV: &str = "DVMOD_BASE_URL";

/// Origin baked in at compile time, falling back to the built-in default
pub fn compiled_origin() -> &'static str {
    option_env!("DVMOD_ORIGIN").unwrap_or(DEFAULT_ORIGIN)
}

/// Configuration for a bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Registry key (under HKLM) of the game's uninstall metadata
    pub registry_key: String,
    /// Registry value naming the install directory
    pub registry_value: String,
    /// Base URL of the payload server, always ending with `/`
    pub base_url: Url,
    /// Game executable, relative to the install directory
    pub game_executable: String,
    /// Mod origin passed to the handler
    pub origin: Origin,
    /// Limit on establishing a connection; transfers themselves never time out
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl BootstrapConfig {
    pub fn builder() -> BootstrapConfigBuilder {
        BootstrapConfigBuilder::new()
    }

    /// Configuration with every built-in default
    pub fn defaults() -> Result<Self> {
        Self::builder().build()
    }
}

/// Builder for [`BootstrapConfig`]
///
/// Values are stored raw and validated in [`BootstrapConfigBuilder::build`], so
/// CLI flags and environment variables can be fed in without pre-checking.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfigBuilder {
    registry_key: Option<String>,
    registry_value: Option<String>,
    base_url: Option<String>,
    game_executable: Option<String>,
    origin: Option<String>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl BootstrapConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up `DVMOD_ORIGIN` and `DVMOD_BASE_URL`, loading `.env` first
    pub fn from_env(mut self) -> Self {
        dotenv::dotenv().ok(); // Ignore error if .env not present
        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            self.origin = Some(origin);
        }
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            self.base_url = Some(base_url);
        }
        self
    }

    pub fn registry_key(mut self, key: impl Into<String>) -> Self {
        self.registry_key = Some(key.into());
        self
    }

    pub fn registry_value(mut self, value: impl Into<String>) -> Self {
        self.registry_value = Some(value.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn game_executable(mut self, name: impl Into<String>) -> Self {
        self.game_executable = Some(name.into());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<BootstrapConfig> {
        let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let origin = match self.origin {
            Some(raw) => Origin::parse(raw)?,
            None => Origin::parse(compiled_origin())?,
        };

        let game_executable = self
            .game_executable
            .unwrap_or_else(|| DEFAULT_GAME_EXECUTABLE.to_string());
        if game_executable.trim().is_empty() {
            return Err(BootstrapError::Configuration {
                message: "game executable name is empty".to_string(),
            });
        }

        Ok(BootstrapConfig {
            registry_key: self
                .registry_key
                .unwrap_or_else(|| DEFAULT_REGISTRY_KEY.to_string()),
            registry_value: self
                .registry_value
                .unwrap_or_else(|| DEFAULT_REGISTRY_VALUE.to_string()),
            base_url,
            game_executable,
            origin,
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

/// Parse a base URL and make sure it ends with `/` so joins append to it
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&normalized).map_err(|source| BootstrapError::InvalidUrl {
        url: raw.to_string(),
        suggestion: "URL must be absolute (include http:// or https://)".to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BootstrapError::Configuration {
            message: format!("unsupported base URL scheme '{other}', use http:// or https://"),
        }),
    }
}
