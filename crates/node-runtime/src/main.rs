//! # Nanograph Node Runtime
//!
//! Runs a nanopublication store with its update scheduler until Ctrl+C.
//! Configuration comes from the environment; see `container::config`.

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::container::{LoggingConfig, NodeConfig};
use node_runtime::logging::init_logging;
use node_runtime::NodeRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env())?;

    let config = NodeConfig::from_env().context("Invalid configuration")?;
    let runtime = NodeRuntime::new(config).context("Failed to build node")?;
    runtime.start();

    info!("Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
