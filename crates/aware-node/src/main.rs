//! # Aware Node
//!
//! Daemon hosting the Wi-Fi Aware control-plane engine.
//!
//! ```text
//!  caller ──EngineHandle──→ owner task ──FirmwareCommand──→ firmware
//!                              ↑   │                          │
//!                  FirmwareEvent   └──Notification──→ metrics bridge ──→ log
//!                              └──────────────────────────────┘
//! ```
//!
//! Ctrl+C stops the owner task; every pending transaction resolves as
//! aborted before the process exits.

use anyhow::{Context, Result};
use tracing::info;

use aware_core::EnableRequest;
use aware_node::{load_config, AwareNode};
use aware_telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let _telemetry = init_telemetry(config.telemetry.clone())
        .await
        .context("failed to initialize telemetry")?;

    if let Some(path) = &config.config_path {
        info!(path = %path.display(), "engine configuration loaded");
    }

    let node = AwareNode::start(&config);
    node.bootstrap(EnableRequest::default()).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    node.shutdown().await
}
