mod commands;
mod config;
mod video;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::debug;

use camdir_core::{CapabilityDirectory, MatchPolicy};

use commands::{devices, matching, Cli, Commands};
use config::CliConfig;
use video::NokhwaBackend;

/// Parse arguments, run one command and print its JSON result to stdout.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let config = CliConfig::load(&config_path)?;

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .init();
    debug!("Using config {}", config_path.display());

    let backend = NokhwaBackend::new()
        .with_orientations(&config.orientations)
        .context("Invalid orientation in config")?;
    let directory = open_directory(backend, config.policy)?;

    match cli.command {
        Commands::Devices => print(&devices::list_devices(&directory)?, cli.pretty),
        Commands::Caps { device } => print(&devices::capabilities(&directory, &device)?, cli.pretty),
        Commands::Orientation { device } => print(&devices::orientation(&directory, &device)?, cli.pretty),
        Commands::Watch {
            device,
            interval,
            count,
        } => devices::watch_capabilities(
            &directory,
            &device,
            Duration::from_secs(interval),
            count,
            |report| print(report, cli.pretty),
        ),
        Commands::Best {
            device,
            width,
            height,
            fps,
            format,
            all,
        } => {
            let requested = matching::request(width, height, fps, format);
            let report = matching::best_match(&directory, &device, requested, all)
                .with_context(|| format!("No match for {requested} on device {device}"))?;
            print(&report, cli.pretty)
        }
    }
}

fn open_directory(
    backend: NokhwaBackend,
    policy: MatchPolicy,
) -> anyhow::Result<CapabilityDirectory<NokhwaBackend>> {
    CapabilityDirectory::new(backend, policy).context("Failed to open camera directory")
}

fn print<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
