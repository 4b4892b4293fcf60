//! Prism Node binary
//!
//! An admission node for the Prism message DAG.

use prism_node::{NodeConfig, PrismNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prism_node=info,prism=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Prism Node");

    let config = NodeConfig::from_env();

    let node = PrismNode::new(config)?;
    node.run().await?;

    Ok(())
}
