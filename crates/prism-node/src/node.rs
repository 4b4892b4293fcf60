//! Prism node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API for clients (submissions, lookups, validators, accounts)
//! - The admission engine behind one RwLock; a write guard per submission
//!   keeps rotation and settlement serialized

use std::sync::Arc;

use prism_engine::{AdmissionEngine, EngineConfig};
use prism_quorum::ValidatorRegistry;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::api::{self, Engine};
use crate::config::NodeConfig;
use crate::error::Result;
use crate::storage::{open_db, RocksLedger, RocksStore};

/// A Prism node instance.
pub struct PrismNode {
    engine: Arc<RwLock<Engine>>,
    config: NodeConfig,
}

impl PrismNode {
    /// Create a new node: open storage, reload the validator registry, wire
    /// up the engine.
    pub fn new(config: NodeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let db = open_db(&config.data_dir)?;
        let store = RocksStore::new(Arc::clone(&db));
        let ledger = RocksLedger::new(db)?;

        // Registered validators survive restarts.
        let mut registry = ValidatorRegistry::new();
        for validator in store.list_validators()? {
            if let Err(e) = registry.register(validator.id.clone(), validator.band, validator.stake)
            {
                warn!(validator = %validator.id, error = %e, "skipping persisted validator");
            }
        }
        info!(
            validators = registry.len(),
            bands = registry.distinct_band_count(),
            "registry loaded"
        );

        let engine_config = EngineConfig::default()
            .with_diversity(config.diversity)
            .with_reward_fraction_bps(config.reward_fraction_bps)
            .with_pool_account(config.pool_account.clone());
        let engine = AdmissionEngine::new(store, ledger, registry, engine_config);

        Ok(Self {
            engine: Arc::new(RwLock::new(engine)),
            config,
        })
    }

    /// Shared engine handle (for API handlers and tests).
    pub fn engine(&self) -> Arc<RwLock<Engine>> {
        Arc::clone(&self.engine)
    }

    /// Run the HTTP API until shutdown.
    pub async fn run(self) -> Result<()> {
        let router = api::build_router(self.engine());

        info!(addr = %self.config.api_addr, "prism node listening");
        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(crate::error::Error::Io)?;

        Ok(())
    }
}
