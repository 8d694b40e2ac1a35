//! Store primitives against a real Postgres instance:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/tenebra_test cargo test -p tenebra-storage -- --ignored
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use tenebra_core::AuthLogType;
use tenebra_storage::{addresses, auth_log, blocks, PgStore};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for test");
    PgStore::connect(&url, 5).await.unwrap()
}

fn fresh_address(tag: char) -> String {
    // Valid v2 shape, unique enough for a scratch database.
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    format!("t{tag}{:08}", nanos % 100_000_000)
}

#[tokio::test]
#[ignore]
async fn credit_creates_then_accumulates() {
    let store = store().await;
    let address = fresh_address('c');

    addresses::credit(store.pool(), &address, 40).await.unwrap();
    addresses::credit(store.pool(), &address, 2).await.unwrap();

    let row = addresses::get(store.pool(), &address).await.unwrap().unwrap();
    assert_eq!(row.balance, 42);
    assert_eq!(row.totalin, 42);
    assert_eq!(row.totalout, 0);
    assert!(row.privatekey_hash.is_none());
}

#[tokio::test]
#[ignore]
async fn debit_tracks_totalout() {
    let store = store().await;
    let address = fresh_address('d');
    addresses::credit(store.pool(), &address, 100).await.unwrap();
    addresses::debit(store.pool(), &address, 60).await.unwrap();

    let row = addresses::get(store.pool(), &address).await.unwrap().unwrap();
    assert_eq!(row.balance, 40);
    assert_eq!(row.totalin, 100);
    assert_eq!(row.totalout, 60);
}

#[tokio::test]
#[ignore]
async fn duplicate_block_hash_is_rejected() {
    let store = store().await;
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let hash = format!("{nanos:064x}");
    let address = fresh_address('b');
    let now = chrono::Utc::now();

    blocks::insert(store.pool(), &hash, &address, &[1], now, 100_000, 25, None, None)
        .await
        .unwrap();
    let err = blocks::insert(store.pool(), &hash, &address, &[2], now, 100_000, 25, None, None)
        .await
        .unwrap_err();
    match err {
        tenebra_core::TenebraError::Database(db) => {
            assert!(tenebra_core::errors::is_unique_violation(&db, Some("blocks_hash_key")));
        }
        other => panic!("expected a database error, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn auth_log_dedups_within_window() {
    let store = store().await;
    let address = fresh_address('a');
    let ip = "203.0.113.7";

    assert!(!auth_log::recent_exists(store.pool(), ip, &address, AuthLogType::Auth).await.unwrap());
    auth_log::insert(store.pool(), ip, &address, AuthLogType::Auth, None, None)
        .await
        .unwrap();
    assert!(auth_log::recent_exists(store.pool(), ip, &address, AuthLogType::Auth).await.unwrap());
    // Mining attempts are a separate dedup key.
    assert!(!auth_log::recent_exists(store.pool(), ip, &address, AuthLogType::Mining).await.unwrap());
}
