use anyhow::Result;
use tracing::{info, warn};

use crate::{open_port, LinkConfig};

pub fn check_link(name: &str, cfg: &LinkConfig) -> Result<()> {
    anyhow::ensure!(!cfg.serial_dev.trim().is_empty(), "{}.serial_dev missing", name);
    anyhow::ensure!(cfg.baud > 0, "{}.baud invalid", name);
    Ok(())
}

/// Tries to open the configured device. Unavailable ports are reported,
/// not treated as errors: the console runs without them.
pub fn probe_link(name: &str, cfg: &LinkConfig) -> bool {
    if !cfg.enable {
        info!("doctor: {} link disabled", name);
        return false;
    }
    match open_port(cfg) {
        Ok(_) => {
            info!("doctor: {} link OK ({} @ {})", name, cfg.serial_dev, cfg.baud);
            true
        }
        Err(e) => {
            warn!("doctor: {} link unavailable: {:#}", name, e);
            false
        }
    }
}
