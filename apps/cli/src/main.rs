//! dvmod-bootstrap: prepare Derail Valley for modding and start it with the
//! mod handler

use anyhow::{Context, Result};
use bootstrap::{
    BootstrapConfig, Bootstrapper, CommandSpawner, ConsoleReporter, DialogReporter, HttpClient,
    InstallationPath, RegistryStore, Reporter,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "dvmod-bootstrap", version, about = "Install the dvmod loader and launch Derail Valley")]
struct Args {
    /// Mod origin handed to the in-game handler (at most 127 ASCII bytes)
    #[arg(long)]
    origin: Option<String>,

    /// Base URL the loader payload is downloaded from
    #[arg(long)]
    base_url: Option<String>,

    /// Use this game directory instead of looking it up in the registry
    #[arg(long)]
    install_dir: Option<PathBuf>,

    /// Report failures on the console instead of in a dialog
    #[arg(long)]
    no_dialog: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    let http = HttpClient::from_config(&config).context("Failed to set up the payload downloader")?;

    let exit_code = if args.no_dialog {
        run(config, http, &args, ConsoleReporter).await
    } else {
        run(config, http, &args, DialogReporter).await
    };

    std::process::exit(exit_code);
}

/// Flags win over `DVMOD_ORIGIN` / `DVMOD_BASE_URL`, which win over defaults
fn build_config(args: &Args) -> Result<BootstrapConfig> {
    let mut builder = BootstrapConfig::builder().from_env();
    if let Some(origin) = &args.origin {
        builder = builder.origin(origin.clone());
    }
    if let Some(base_url) = &args.base_url {
        builder = builder.base_url(base_url.clone());
    }
    builder.build().context("Invalid bootstrap configuration")
}

async fn run<R: Reporter>(config: BootstrapConfig, http: HttpClient, args: &Args, reporter: R) -> i32 {
    let mut bootstrapper = Bootstrapper::new(config, RegistryStore::new(), http, CommandSpawner, reporter);
    if let Some(dir) = &args.install_dir {
        bootstrapper = bootstrapper.with_install_dir(InstallationPath::from_path(dir));
    }

    let report = bootstrapper.run().await;
    tracing::debug!("Run finished: {:?}", report);
    report.exit_code
}
