use std::sync::Arc;

use chrono::Utc;
use tenebra_config::Constants;
use tenebra_core::crypto::sha256_hex;
use tenebra_core::errors::is_unique_violation;
use tenebra_core::{validation, AuthLogType, Block, Event, EventSink, TenebraError};
use tenebra_ledger::{auth, RequestMeta};
use tenebra_storage::{addresses, blocks, names, transactions, FastState, PgStore};
use tracing::info;

use crate::work;

/// Hash prefix used when the previous block predates hashes.
const NULL_SHORT_HASH: &str = "000000000000";

/// Burn address credited with nothing; owns the genesis block.
const GENESIS_ADDRESS: &str = "t000000000";

/// Validates and lands submitted blocks. A coarse lock serialises
/// submissions so competing solutions for one height race inside Postgres
/// only on the hash constraint.
pub struct BlockEngine {
    store: Arc<PgStore>,
    state: Arc<FastState>,
    sink: Arc<dyn EventSink>,
    constants: Arc<Constants>,
    submit_lock: tokio::sync::Mutex<()>,
}

impl BlockEngine {
    pub fn new(
        store: Arc<PgStore>,
        state: Arc<FastState>,
        sink: Arc<dyn EventSink>,
        constants: Arc<Constants>,
    ) -> Self {
        Self {
            store,
            state,
            sink,
            constants,
            submit_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Inserts block 1 on an empty chain so there is always a previous hash
    /// to mine against.
    pub async fn ensure_genesis(&self) -> Result<(), TenebraError> {
        if blocks::count(self.store.pool()).await? > 0 {
            self.state.set_genesis_genned();
            return Ok(());
        }
        blocks::insert(
            self.store.pool(),
            &"0".repeat(64),
            GENESIS_ADDRESS,
            &[],
            Utc::now(),
            self.constants.max_work,
            25,
            None,
            None,
        )
        .await?;
        self.state.set_genesis_genned();
        info!("generated genesis block");
        Ok(())
    }

    /// Gate, check the solution, land every side effect in one transaction,
    /// then retarget and broadcast.
    pub async fn submit(
        &self,
        meta: &RequestMeta,
        address: &str,
        nonce: &[u8],
    ) -> Result<(Block, i64), TenebraError> {
        let mining = self.state.mining_enabled();
        let staking = self.state.staking_enabled();
        if !mining && !staking {
            return Err(TenebraError::MiningDisabled);
        }
        if !validation::is_v2_address(address) {
            return Err(TenebraError::InvalidParameter("address".into()));
        }
        if nonce.is_empty() {
            return Err(TenebraError::MissingParameter("nonce".into()));
        }
        if nonce.len() > self.constants.nonce_max_size {
            return Err(TenebraError::LargeParameter("nonce".into()));
        }

        let _guard = self.submit_lock.lock().await;

        let last = blocks::last(self.store.pool())
            .await?
            .ok_or(TenebraError::BlockNotFound)?;
        let last_short = last.short_hash().unwrap_or(NULL_SHORT_HASH).to_string();
        let hash = sha256_hex(&[address.as_bytes(), last_short.as_bytes(), nonce]);

        let current_work = self.state.work();
        if mining {
            if !work::check_solution(&hash, current_work) && !self.state.free_nonce() {
                return Err(TenebraError::SolutionIncorrect);
            }
        } else if address != self.state.validator() {
            return Err(TenebraError::UnselectedValidator);
        }

        let now = Utc::now();
        let mut dbtx = self.store.begin().await?;

        let unpaid_names = names::count_unpaid(&mut *dbtx).await?;
        let unpaid_penalties = addresses::count_unpaid_penalties(&mut *dbtx).await?;
        let value = work::base_block_value(last.id) + unpaid_names + unpaid_penalties;

        let seconds = (now - last.time).num_seconds();
        let new_work = work::retarget(current_work, seconds, &self.constants);

        let block = blocks::insert(
            &mut *dbtx,
            &hash,
            address,
            nonce,
            now,
            current_work,
            value,
            meta.useragent.as_deref(),
            meta.origin.as_deref(),
        )
        .await
        .map_err(|err| match err {
            TenebraError::Database(db) if is_unique_violation(&db, Some("blocks_hash_key")) => {
                TenebraError::SolutionDuplicate
            }
            other => other,
        })?;

        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: None,
                to: address,
                value,
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        names::decrement_unpaid(&mut *dbtx).await?;
        addresses::decrement_penalties(&mut *dbtx).await?;
        addresses::credit(&mut *dbtx, address, value).await?;

        dbtx.commit().await?;

        self.state.set_work(new_work);
        if staking {
            // This epoch's block has landed; an empty validator tells the
            // next tick there is nobody left to penalise.
            self.state.set_validator(String::new());
        }
        auth::log_attempt(&self.store, meta, address, AuthLogType::Mining).await;

        info!(height = block.id, %address, value, new_work, "block accepted");
        self.sink.emit(Event::Block { block: block.clone(), new_work });
        self.sink.emit(Event::Transaction { transaction });
        Ok((block, new_work))
    }
}
