use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Node configuration, flat so the keys map 1:1 onto environment variables
/// (`DATABASE_URL`, `MINING_ENABLED`, …). A `tenebra.toml` file may provide
/// defaults; the environment wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub listen_addr: String,
    pub public_url: String,
    pub node_env: String,
    pub mining_enabled: bool,
    pub staking_enabled: bool,
    pub gen_genesis: bool,
}

impl NodeConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("database_url", "postgres://localhost:5432/tenebra")?
            .set_default("database_pool_size", 10i64)?
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("public_url", "localhost:8080")?
            .set_default("node_env", "development")?
            .set_default("mining_enabled", true)?
            .set_default("staking_enabled", false)?
            .set_default("gen_genesis", false)?;
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let cfg = builder.add_source(config::Environment::default()).build()?;
        let mut loaded: Self = cfg.try_deserialize()?;
        // Only one block-production method may be active.
        if loaded.mining_enabled {
            loaded.staking_enabled = false;
        }
        Ok(loaded)
    }

    pub fn is_production(&self) -> bool {
        self.node_env == "production"
    }

    pub fn is_test(&self) -> bool {
        self.node_env == "test"
    }
}

/// Protocol constants, surfaced verbatim through `/motd`. Threaded through
/// the engines as read-only shared state; tests tweak individual fields.
#[derive(Debug, Clone, Serialize)]
pub struct Constants {
    pub wallet_version: u16,
    pub nonce_max_size: usize,
    pub name_cost: i64,
    pub min_work: i64,
    pub max_work: i64,
    pub work_factor: f64,
    pub seconds_per_block: u64,
    pub validator_penalty: i64,
    pub address_prefix: char,
    pub name_suffix: String,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            wallet_version: 16,
            nonce_max_size: 24,
            name_cost: 500,
            min_work: 100,
            max_work: 100_000,
            work_factor: 0.025,
            seconds_per_block: 60,
            validator_penalty: 500,
            address_prefix: 't',
            name_suffix: "tst".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let constants = Constants::default();
        assert_eq!(constants.wallet_version, 16);
        assert_eq!(constants.name_cost, 500);
        assert_eq!(constants.max_work, 100_000);
        assert_eq!(constants.validator_penalty, constants.name_cost);
        assert_eq!(constants.address_prefix, 't');
    }
}
