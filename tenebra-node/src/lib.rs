use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tenebra_config::{Constants, NodeConfig};
use tenebra_consensus::{scheduler, BlockEngine, StakingEngine};
use tenebra_core::EventSink;
use tenebra_ledger::{NameEngine, TransactionEngine};
use tenebra_rpc::ws::WsHub;
use tenebra_rpc::ApiState;
use tenebra_storage::{FastState, PgStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run_node(config_path: Option<&Path>) -> Result<()> {
    let config = Arc::new(NodeConfig::load(config_path)?);
    init_logging();
    info!(
        mining = config.mining_enabled,
        staking = config.staking_enabled,
        env = %config.node_env,
        "starting tenebra node"
    );

    let constants = Arc::new(Constants::default());
    let store = Arc::new(
        PgStore::connect(&config.database_url, config.database_pool_size)
            .await
            .context("connecting to postgres")?,
    );
    let state = Arc::new(FastState::new(
        &constants,
        config.mining_enabled,
        config.staking_enabled,
    ));

    let hub = Arc::new(WsHub::new());
    let sink: Arc<dyn EventSink> = hub.clone();

    let blocks = Arc::new(BlockEngine::new(
        store.clone(),
        state.clone(),
        sink.clone(),
        constants.clone(),
    ));
    if config.gen_genesis {
        blocks.ensure_genesis().await.context("generating genesis block")?;
    }

    let staking = Arc::new(StakingEngine::new(
        store.clone(),
        state.clone(),
        sink.clone(),
        constants.clone(),
    ));
    let transactions = Arc::new(TransactionEngine::new(
        store.clone(),
        sink.clone(),
        constants.clone(),
    ));
    let names = Arc::new(NameEngine::new(store.clone(), sink.clone(), constants.clone()));

    scheduler::spawn(store.clone(), state.clone(), staking.clone(), constants.clone());

    let addr: SocketAddr = config.listen_addr.parse().context("parsing listen_addr")?;
    let api = ApiState {
        store,
        state,
        constants,
        config,
        hub,
        transactions,
        names,
        blocks,
        staking,
    };
    tenebra_rpc::serve(addr, api).await.context("http server failed")?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
