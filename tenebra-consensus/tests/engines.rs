//! Engine tests against a real Postgres instance. Run with a scratch
//! database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/tenebra_test cargo test -- --ignored --test-threads=1
//! ```
//!
//! Single-threaded because block production decrements every unpaid name,
//! so concurrent tests would see each other's decrements.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tenebra_config::Constants;
use tenebra_consensus::{BlockEngine, StakingEngine};
use tenebra_core::crypto::make_v2_address;
use tenebra_core::events::NullSink;
use tenebra_core::{TenebraError, TransactionType};
use tenebra_ledger::{RequestMeta, TransactionEngine, NameEngine};
use tenebra_storage::{addresses, names, FastState, PgStore};

struct Harness {
    store: Arc<PgStore>,
    state: Arc<FastState>,
    constants: Arc<Constants>,
    blocks: BlockEngine,
    staking: StakingEngine,
    transactions: TransactionEngine,
    names: NameEngine,
}

async fn harness() -> Harness {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for test");
    let store = Arc::new(PgStore::connect(&url, 5).await.unwrap());
    let constants = Arc::new(Constants::default());
    let state = Arc::new(FastState::new(&constants, true, false));
    let sink = Arc::new(NullSink);
    let blocks = BlockEngine::new(store.clone(), state.clone(), sink.clone(), constants.clone());
    blocks.ensure_genesis().await.unwrap();
    Harness {
        staking: StakingEngine::new(store.clone(), state.clone(), sink.clone(), constants.clone()),
        transactions: TransactionEngine::new(store.clone(), sink.clone(), constants.clone()),
        names: NameEngine::new(store.clone(), sink.clone(), constants.clone()),
        blocks,
        store,
        state,
        constants,
    }
}

fn fresh_key(label: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    format!("{label}-{nanos}")
}

fn fresh_name(label: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    format!("{label}{nanos}")
}

fn meta() -> RequestMeta {
    RequestMeta {
        ip: Some("127.0.0.1".into()),
        useragent: Some("engine-tests".into()),
        origin: None,
    }
}

#[tokio::test]
#[ignore]
async fn free_nonce_block_pays_base_plus_bonuses() {
    let h = harness().await;
    let key = fresh_key("miner");
    let miner = make_v2_address(&key, h.constants.address_prefix);
    h.state.set_free_nonce(true);

    let last = tenebra_storage::blocks::last(h.store.pool()).await.unwrap().unwrap();
    let unpaid_names = names::count_unpaid(h.store.pool()).await.unwrap();
    let unpaid_penalties = addresses::count_unpaid_penalties(h.store.pool()).await.unwrap();
    let base = if last.id < 325 { 25 } else { 1 };

    let (block, new_work) = h.blocks.submit(&meta(), &miner, &[1, 2, 3]).await.unwrap();
    assert_eq!(block.id, last.id + 1);
    assert_eq!(block.value, base + unpaid_names + unpaid_penalties);
    assert!(new_work >= h.constants.min_work && new_work <= h.constants.max_work);

    let row = addresses::get(h.store.pool(), &miner).await.unwrap().unwrap();
    assert_eq!(row.balance, block.value);
    assert_eq!(row.totalin, block.value);
}

#[tokio::test]
#[ignore]
async fn block_decrements_unpaid_names() {
    let h = harness().await;
    h.state.set_free_nonce(true);

    let buyer_key = fresh_key("name-buyer");
    let buyer = make_v2_address(&buyer_key, h.constants.address_prefix);
    addresses::credit(h.store.pool(), &buyer, 1_000).await.unwrap();
    let name = fresh_name("decay");
    let name = name.as_str();
    let purchased = h.names.purchase(&meta(), &buyer_key, name).await.unwrap();
    assert_eq!(purchased.unpaid, h.constants.name_cost);

    let miner_key = fresh_key("decay-miner");
    let miner = make_v2_address(&miner_key, h.constants.address_prefix);
    h.blocks.submit(&meta(), &miner, &[9]).await.unwrap();

    let after = names::get(h.store.pool(), name).await.unwrap().unwrap();
    assert_eq!(after.unpaid, h.constants.name_cost - 1);
}

#[tokio::test]
#[ignore]
async fn transfer_conserves_value() {
    let h = harness().await;
    let sender_key = fresh_key("sender");
    let sender = make_v2_address(&sender_key, h.constants.address_prefix);
    let recipient = make_v2_address(&fresh_key("recipient"), h.constants.address_prefix);
    addresses::credit(h.store.pool(), &sender, 100).await.unwrap();

    let tx = h
        .transactions
        .send(&meta(), &sender_key, &recipient, 30, None)
        .await
        .unwrap();
    assert_eq!(tx.transaction_type(), TransactionType::Transfer);

    let from = addresses::get(h.store.pool(), &sender).await.unwrap().unwrap();
    let to = addresses::get(h.store.pool(), &recipient).await.unwrap().unwrap();
    assert_eq!(from.balance, 70);
    assert_eq!(from.totalout, 30);
    assert_eq!(to.balance, 30);
    assert_eq!(to.totalin, 30);
}

#[tokio::test]
#[ignore]
async fn overspend_is_rejected() {
    let h = harness().await;
    let sender_key = fresh_key("pauper");
    let recipient = make_v2_address(&fresh_key("recipient"), h.constants.address_prefix);

    let err = h
        .transactions
        .send(&meta(), &sender_key, &recipient, 10, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TenebraError::InsufficientFunds));
}

#[tokio::test]
#[ignore]
async fn name_purchase_and_transfer() {
    let h = harness().await;
    let buyer_key = fresh_key("buyer");
    let buyer = make_v2_address(&buyer_key, h.constants.address_prefix);
    let heir = make_v2_address(&fresh_key("heir"), h.constants.address_prefix);
    addresses::credit(h.store.pool(), &buyer, 1_000).await.unwrap();

    let name = fresh_name("keep");
    let name = name.as_str();
    let purchased = h.names.purchase(&meta(), &buyer_key, name).await.unwrap();
    assert_eq!(purchased.owner, buyer);
    assert_eq!(purchased.original_owner, buyer);
    assert_eq!(purchased.unpaid, h.constants.name_cost);

    let row = addresses::get(h.store.pool(), &buyer).await.unwrap().unwrap();
    assert_eq!(row.balance, 1_000 - h.constants.name_cost);

    let transferred = h.names.transfer(&meta(), &buyer_key, name, &heir).await.unwrap();
    assert_eq!(transferred.owner, heir);
    assert_eq!(transferred.original_owner, buyer);
    assert!(transferred.updated >= transferred.registered);

    // The old owner no longer controls the name.
    let err = h.names.transfer(&meta(), &buyer_key, name, &buyer).await.unwrap_err();
    assert!(matches!(err, TenebraError::NotNameOwner));
}

#[tokio::test]
#[ignore]
async fn pay_to_name_routes_to_owner() {
    let h = harness().await;
    let buyer_key = fresh_key("shopkeeper");
    let buyer = make_v2_address(&buyer_key, h.constants.address_prefix);
    addresses::credit(h.store.pool(), &buyer, 1_000).await.unwrap();
    let name = fresh_name("shop");
    let name = name.as_str();
    h.names.purchase(&meta(), &buyer_key, name).await.unwrap();

    let payer_key = fresh_key("payer");
    let payer = make_v2_address(&payer_key, h.constants.address_prefix);
    addresses::credit(h.store.pool(), &payer, 50).await.unwrap();

    let target = format!("till@{name}.{}", h.constants.name_suffix);
    let tx = h.transactions.send(&meta(), &payer_key, &target, 25, None).await.unwrap();
    assert_eq!(tx.to, buyer);
    assert_eq!(tx.sent_name.as_deref(), Some(name));
    assert_eq!(tx.sent_metaname.as_deref(), Some("till"));

    let owner_row = addresses::get(h.store.pool(), &buyer).await.unwrap().unwrap();
    assert_eq!(owner_row.balance, 1_000 - h.constants.name_cost + 25);
    let payer_row = addresses::get(h.store.pool(), &payer).await.unwrap().unwrap();
    assert_eq!(payer_row.balance, 25);
}

#[tokio::test]
#[ignore]
async fn stake_deposit_withdraw_round_trip() {
    let h = harness().await;
    let key = fresh_key("staker");
    let address = make_v2_address(&key, h.constants.address_prefix);
    addresses::credit(h.store.pool(), &address, 1_000).await.unwrap();

    let stake = h.staking.deposit(&meta(), &key, 400).await.unwrap();
    assert_eq!(stake.stake, 400);
    assert!(stake.active);
    let row = addresses::get(h.store.pool(), &address).await.unwrap().unwrap();
    assert_eq!(row.balance, 600);
    assert_eq!(row.stake, 400);
    assert!(row.stake_active);

    let stake = h.staking.withdraw(&meta(), &key, 400).await.unwrap();
    assert_eq!(stake.stake, 0);
    assert!(!stake.active);
    let row = addresses::get(h.store.pool(), &address).await.unwrap().unwrap();
    assert_eq!(row.balance, 1_000);
    assert_eq!(row.stake, 0);
    assert!(!row.stake_active);
}

#[tokio::test]
#[ignore]
async fn lapsed_validator_is_penalised() {
    let h = harness().await;
    let key = fresh_key("lapsed");
    let address = make_v2_address(&key, h.constants.address_prefix);
    addresses::credit(h.store.pool(), &address, 1_000).await.unwrap();
    h.staking.deposit(&meta(), &key, 400).await.unwrap();

    h.staking.penalize(&address).await.unwrap();

    let row = addresses::get(h.store.pool(), &address).await.unwrap().unwrap();
    let expected = h.constants.validator_penalty.min(400);
    assert_eq!(row.stake, 400 - expected);
    assert_eq!(row.penalty, expected);
    assert!(!row.stake_active);
}
