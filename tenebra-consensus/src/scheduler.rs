use std::sync::Arc;
use std::time::Duration;

use tenebra_config::Constants;
use tenebra_storage::{auth_log, FastState, PgStore};
use tracing::{debug, error};

use crate::staking::StakingEngine;

/// Spawns the periodic jobs: the one-minute work sampler, the hourly auth-log
/// sweep, and (when staking is on) the per-epoch validator election. Every
/// tick swallows and logs its own errors so the schedulers survive transient
/// database faults.
pub fn spawn(
    store: Arc<PgStore>,
    state: Arc<FastState>,
    staking: Arc<StakingEngine>,
    constants: Arc<Constants>,
) {
    let sampler_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sampler_state.sample_work();
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match auth_log::prune(store.pool()).await {
                Ok(removed) if removed > 0 => debug!(removed, "pruned auth log"),
                Ok(_) => {}
                Err(err) => error!("auth log prune failed: {err}"),
            }
        }
    });

    if state.staking_enabled() {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(constants.seconds_per_block));
            // The first tick fires immediately; skip it so the initial epoch
            // gets a full window.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(err) = staking.select_validator().await {
                    error!("validator election failed: {err}");
                }
            }
        });
    }
}
