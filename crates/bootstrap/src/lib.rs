//! dvmod bootstrap library
//!
//! Prepares a Derail Valley installation for modding and starts the game with
//! the mod loader's install handler:
//!
//! 1. find the install directory in the registry ([`locator`]),
//! 2. fetch the loader payload if it is missing ([`payload`]),
//! 3. start the game with `dvmod-handler install <origin>` ([`launch`]),
//! 4. tell the user when something went wrong ([`report`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bootstrap::{
//!     BootstrapConfig, Bootstrapper, CommandSpawner, DialogReporter, HttpClient,
//!     RegistryStore,
//! };
//!
//! # async fn example() -> bootstrap::Result<()> {
//! let config = BootstrapConfig::builder()
//!     .origin("dvmod://mod/couplers-overhaul")
//!     .build()?;
//! let http = HttpClient::from_config(&config)?;
//!
//! let bootstrapper = Bootstrapper::new(config, RegistryStore, http, CommandSpawner, DialogReporter);
//! let report = bootstrapper.run().await;
//! std::process::exit(report.exit_code);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod launch;
pub mod locator;
pub mod origin;
pub mod paths;
pub mod payload;
pub mod report;
pub mod runner;

// Re-export commonly used types for convenience
pub use config::{BootstrapConfig, BootstrapConfigBuilder};
pub use error::{BootstrapError, FileOperation, Result};
pub use launch::{CommandSpawner, LaunchSpec, ProcessLauncher, Spawner};
pub use locator::{InstallLocator, InstallStore, RegistryStore, RegistryView};
pub use origin::Origin;
pub use paths::InstallationPath;
pub use payload::{HttpClient, PayloadFetcher, PayloadOutcome, PayloadSource};
pub use report::{ConsoleReporter, DialogReporter, ErrorReporter, Reporter};
pub use runner::{Bootstrapper, LaunchOutcome, RunReport};

#[cfg(test)]
mod tests;
