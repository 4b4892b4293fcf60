//! Node configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for a Prism node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Quorum diversity threshold
    pub diversity: usize,

    /// Validator reward fraction in basis points
    pub reward_fraction_bps: u32,

    /// Protocol pool account
    pub pool_account: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(
            std::env::var("PRISM_DATA_DIR").unwrap_or_else(|_| "./prism-data".to_string()),
        );

        let api_addr = std::env::var("PRISM_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid PRISM_API_ADDR");

        let diversity = std::env::var("PRISM_DIVERSITY")
            .ok()
            .map(|s| s.parse().expect("Invalid PRISM_DIVERSITY"))
            .unwrap_or(5);

        let reward_fraction_bps = std::env::var("PRISM_REWARD_BPS")
            .ok()
            .map(|s| s.parse().expect("Invalid PRISM_REWARD_BPS"))
            .unwrap_or(4_000);

        let pool_account =
            std::env::var("PRISM_POOL_ACCOUNT").unwrap_or_else(|_| "prism.pool".to_string());

        Self {
            data_dir,
            api_addr,
            diversity,
            reward_fraction_bps,
            pool_account,
        }
    }
}
