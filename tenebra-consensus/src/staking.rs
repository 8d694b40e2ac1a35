use std::sync::Arc;

use rand::Rng;
use tenebra_config::Constants;
use tenebra_core::{Event, EventSink, StakeInfo, TenebraError};
use tenebra_ledger::{auth, RequestMeta};
use tenebra_storage::{addresses, transactions, FastState, PgStore};
use tracing::{debug, info};

/// Picks the staker owning the draw `r` on the cumulative stake line.
/// Boundaries resolve to the earlier entry.
pub fn pick_validator(stakers: &[(String, i64)], r: i64) -> Option<&str> {
    let mut cumulative = 0i64;
    for (address, stake) in stakers {
        cumulative += stake;
        if cumulative > r {
            return Some(address);
        }
    }
    None
}

/// Deposit/withdraw/penalise plus the per-epoch validator election.
pub struct StakingEngine {
    store: Arc<PgStore>,
    state: Arc<FastState>,
    sink: Arc<dyn EventSink>,
    constants: Arc<Constants>,
}

impl StakingEngine {
    pub fn new(
        store: Arc<PgStore>,
        state: Arc<FastState>,
        sink: Arc<dyn EventSink>,
        constants: Arc<Constants>,
    ) -> Self {
        Self { store, state, sink, constants }
    }

    pub async fn deposit(
        &self,
        meta: &RequestMeta,
        private_key: &str,
        amount: i64,
    ) -> Result<StakeInfo, TenebraError> {
        if amount < 1 {
            return Err(TenebraError::InvalidParameter("amount".into()));
        }
        let sender = auth::authenticate(&self.store, meta, private_key, &self.constants).await?;

        let mut dbtx = self.store.begin().await?;
        let row = addresses::get(&mut *dbtx, &sender.address)
            .await?
            .ok_or(TenebraError::AddressNotFound)?;
        if row.balance < amount {
            return Err(TenebraError::InsufficientFunds);
        }
        addresses::add_stake(&mut *dbtx, &sender.address, amount).await?;
        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: Some("staking"),
                to: &sender.address,
                value: amount,
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        dbtx.commit().await?;

        let stake = StakeInfo {
            owner: sender.address.clone(),
            stake: row.stake + amount,
            active: true,
        };
        debug!(owner = %stake.owner, stake = stake.stake, "stake deposited");
        self.sink.emit(Event::Transaction { transaction });
        self.sink.emit(Event::Stake { stake: stake.clone() });
        Ok(stake)
    }

    pub async fn withdraw(
        &self,
        meta: &RequestMeta,
        private_key: &str,
        amount: i64,
    ) -> Result<StakeInfo, TenebraError> {
        if amount < 1 {
            return Err(TenebraError::InvalidParameter("amount".into()));
        }
        let sender = auth::authenticate(&self.store, meta, private_key, &self.constants).await?;

        let mut dbtx = self.store.begin().await?;
        let row = addresses::get(&mut *dbtx, &sender.address)
            .await?
            .ok_or(TenebraError::AddressNotFound)?;
        if row.stake < amount {
            return Err(TenebraError::InsufficientFunds);
        }
        addresses::remove_stake(&mut *dbtx, &sender.address, amount).await?;
        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: Some(&sender.address),
                to: "staking",
                value: amount,
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        dbtx.commit().await?;

        let stake = StakeInfo {
            owner: sender.address.clone(),
            stake: row.stake - amount,
            active: row.stake - amount > 0,
        };
        debug!(owner = %stake.owner, stake = stake.stake, "stake withdrawn");
        self.sink.emit(Event::Transaction { transaction });
        self.sink.emit(Event::Stake { stake: stake.clone() });
        Ok(stake)
    }

    /// Docks a validator that let its epoch lapse: up to `validator_penalty`
    /// moves from stake to the penalty counter and the stake is benched.
    pub async fn penalize(&self, address: &str) -> Result<(), TenebraError> {
        let mut dbtx = self.store.begin().await?;
        let Some(row) = addresses::get(&mut *dbtx, address).await? else {
            return Ok(());
        };
        let penalty = self.constants.validator_penalty.min(row.stake);
        addresses::apply_penalty(&mut *dbtx, address, penalty).await?;
        dbtx.commit().await?;

        info!(%address, penalty, "validator penalised");
        self.sink.emit(Event::Stake {
            stake: StakeInfo {
                owner: address.to_string(),
                stake: row.stake - penalty,
                active: false,
            },
        });
        Ok(())
    }

    /// The per-epoch election. Penalises a validator still holding the slot,
    /// then draws the next one weighted by active stake.
    pub async fn select_validator(&self) -> Result<(), TenebraError> {
        let previous = self.state.validator();
        if !previous.is_empty() {
            self.penalize(&previous).await?;
        }

        let stakers: Vec<(String, i64)> = addresses::stakers_for_election(self.store.pool())
            .await?
            .into_iter()
            .map(|row| (row.address, row.stake))
            .collect();
        let total: i64 = stakers.iter().map(|(_, stake)| stake).sum();

        let validator = if total > 0 {
            let r = rand::thread_rng().gen_range(0..total);
            pick_validator(&stakers, r).unwrap_or_default().to_string()
        } else {
            String::new()
        };

        debug!(%validator, total, "validator elected");
        self.state.set_validator(validator.clone());
        self.sink.emit(Event::Validator { validator });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stakers(weights: &[(&str, i64)]) -> Vec<(String, i64)> {
        weights.iter().map(|(a, s)| (a.to_string(), *s)).collect()
    }

    #[test]
    fn draw_walks_the_cumulative_line() {
        let stakers = stakers(&[("t74tq2hsh6", 100), ("t1o1uuxmb4", 200), ("trqtnrp18z", 50)]);
        assert_eq!(pick_validator(&stakers, 0), Some("t74tq2hsh6"));
        assert_eq!(pick_validator(&stakers, 99), Some("t74tq2hsh6"));
        assert_eq!(pick_validator(&stakers, 100), Some("t1o1uuxmb4"));
        assert_eq!(pick_validator(&stakers, 299), Some("t1o1uuxmb4"));
        assert_eq!(pick_validator(&stakers, 300), Some("trqtnrp18z"));
        assert_eq!(pick_validator(&stakers, 349), Some("trqtnrp18z"));
        assert_eq!(pick_validator(&stakers, 350), None);
    }

    #[test]
    fn boundary_prefers_earlier_entry() {
        let stakers = stakers(&[("t74tq2hsh6", 100), ("t1o1uuxmb4", 100)]);
        // r = 99 is the last point inside the first staker's segment.
        assert_eq!(pick_validator(&stakers, 99), Some("t74tq2hsh6"));
        assert_eq!(pick_validator(&stakers, 100), Some("t1o1uuxmb4"));
    }

    #[test]
    fn zero_weight_stakers_never_win() {
        let stakers = stakers(&[("t74tq2hsh6", 0), ("t1o1uuxmb4", 10)]);
        assert_eq!(pick_validator(&stakers, 0), Some("t1o1uuxmb4"));
    }

    #[test]
    fn empty_pool_elects_nobody() {
        assert_eq!(pick_validator(&[], 0), None);
    }
}
