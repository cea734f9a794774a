//! The bootstrap run
//!
//! locate → (payload) → launch, strictly in that order, each step awaited
//! before the next one starts:
//!
//! ```text
//! Start → Locate ─fail→ Report → Exit(-1)
//!           │
//!           └ok→ CheckPayload ─present→ Launch
//!                     └absent→ Backup → Download×3 → Launch
//! Launch ─fail→ Report → Exit(0)
//!   └ok→ Exit(0)
//! ```

use tracing::info;

use crate::config::BootstrapConfig;
use crate::error::BootstrapError;
use crate::launch::{LaunchSpec, ProcessLauncher, Spawner};
use crate::locator::{InstallLocator, InstallStore};
use crate::paths::InstallationPath;
use crate::payload::{PayloadFetcher, PayloadOutcome, PayloadSource};
use crate::report::{EXIT_SUCCESS, ErrorReporter, Reporter};

/// How the launch step ended
#[derive(Debug)]
pub enum LaunchOutcome {
    Started { pid: u32 },
    Failed(BootstrapError),
}

/// Everything a run did, stage by stage
///
/// Later stages are `None` when an earlier one stopped the run.
#[derive(Debug)]
pub struct RunReport {
    pub install: Option<InstallationPath>,
    pub payload: Option<PayloadOutcome>,
    pub launch_spec: Option<LaunchSpec>,
    pub launch: Option<LaunchOutcome>,
    pub exit_code: i32,
}

/// Wires the four stages together
pub struct Bootstrapper<S, F, P, R> {
    config: BootstrapConfig,
    locator: InstallLocator<S>,
    fetcher: PayloadFetcher<F>,
    launcher: ProcessLauncher<P>,
    reporter: ErrorReporter<R>,
    install_override: Option<InstallationPath>,
}

impl<S, F, P, R> Bootstrapper<S, F, P, R>
where
    S: InstallStore,
    F: PayloadSource,
    P: Spawner,
    R: Reporter,
{
    pub fn new(config: BootstrapConfig, store: S, source: F, spawner: P, reporter: R) -> Self {
        Self {
            locator: InstallLocator::from_config(store, &config),
            fetcher: PayloadFetcher::from_config(source, &config),
            launcher: ProcessLauncher::new(spawner),
            reporter: ErrorReporter::new(reporter),
            install_override: None,
            config,
        }
    }

    /// Use `dir` instead of asking the registry
    pub fn with_install_dir(mut self, dir: InstallationPath) -> Self {
        self.install_override = Some(dir);
        self
    }

    pub async fn run(&self) -> RunReport {
        let origin = &self.config.origin;
        info!(
            "Bootstrapping with origin {} (scheme: {})",
            origin,
            origin.scheme().unwrap_or("none")
        );

        let install = match &self.install_override {
            Some(dir) => {
                info!("Using installation override: {}", dir);
                dir.clone()
            }
            None => match self.locator.locate() {
                Ok(path) => path,
                Err(e) => {
                    let exit_code = self.reporter.report(&e);
                    return RunReport {
                        install: None,
                        payload: None,
                        launch_spec: None,
                        launch: None,
                        exit_code,
                    };
                }
            },
        };

        let payload = self.fetcher.ensure(&install).await;

        let spec = LaunchSpec::from_config(&install, &self.config);
        let (launch, exit_code) = match self.launcher.launch(&spec) {
            Ok(pid) => (LaunchOutcome::Started { pid }, EXIT_SUCCESS),
            Err(e) => {
                let exit_code = self.reporter.report(&e);
                (LaunchOutcome::Failed(e), exit_code)
            }
        };

        RunReport {
            install: Some(install),
            payload: Some(payload),
            launch_spec: Some(spec),
            launch: Some(launch),
            exit_code,
        }
    }
}
