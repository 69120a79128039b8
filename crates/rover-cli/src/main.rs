mod config;
mod runtime;

use anyhow::Result;
use clap::{Parser, Subcommand};
use time::UtcOffset;
use tracing::{info, warn};

use rover_control::{doctor as control_doctor, LogPresenter};
use rover_link::doctor as link_doctor;

use crate::config::{load_config, Config};
use crate::runtime::Runtime;

#[derive(Debug, Parser)]
#[command(name = "rover", version, about = "Rover console - radar sweep, laser interlock and battery telemetry")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the config and probe the configured serial devices.
    Doctor,
    /// Run the console.
    Run,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Read before any other thread exists; the lookup is refused afterwards.
    let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run => Runtime::new(&cfg, utc_offset, LogPresenter)?.run().await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    control_doctor::check_control(&cfg.control)?;
    control_doctor::check_history(&cfg.history)?;

    for (name, link) in [("radar", &cfg.radar), ("battery", &cfg.battery), ("drive", &cfg.drive)] {
        match link {
            Some(l) => {
                link_doctor::check_link(name, l)?;
                link_doctor::probe_link(name, l);
            }
            None => warn!("doctor: no [{}] section, link disabled", name),
        }
    }

    info!("doctor: OK");
    Ok(())
}
