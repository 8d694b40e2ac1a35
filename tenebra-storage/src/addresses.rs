use sqlx::PgExecutor;
use tenebra_core::{Address, TenebraError};

pub async fn get(db: impl PgExecutor<'_>, address: &str) -> Result<Option<Address>, TenebraError> {
    let row = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE address = $1")
        .bind(address)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn count(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

pub async fn list(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Address>, TenebraError> {
    let rows = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses ORDER BY firstseen ASC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn rich(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Address>, TenebraError> {
    let rows = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses ORDER BY balance DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Bulk fetch for the lookup API.
pub async fn get_many(
    db: impl PgExecutor<'_>,
    addresses: &[String],
) -> Result<Vec<Address>, TenebraError> {
    let rows = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE address = ANY($1)")
        .bind(addresses)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Creates the row on first contact, otherwise adds to `balance`/`totalin`.
/// Single statement so it is atomic under the caller's transaction.
pub async fn credit(
    db: impl PgExecutor<'_>,
    address: &str,
    amount: i64,
) -> Result<(), TenebraError> {
    sqlx::query(
        "INSERT INTO addresses(address, balance, totalin) VALUES ($1, $2, $2)
         ON CONFLICT (address) DO UPDATE
         SET balance = addresses.balance + EXCLUDED.balance,
             totalin = addresses.totalin + EXCLUDED.totalin",
    )
    .bind(address)
    .bind(amount)
    .execute(db)
    .await?;
    Ok(())
}

/// Moves `amount` out of an existing address. The caller has already checked
/// funds under the same transaction.
pub async fn debit(
    db: impl PgExecutor<'_>,
    address: &str,
    amount: i64,
) -> Result<(), TenebraError> {
    sqlx::query(
        "UPDATE addresses SET balance = balance - $2, totalout = totalout + $2 WHERE address = $1",
    )
    .bind(address)
    .bind(amount)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn create(
    db: impl PgExecutor<'_>,
    address: &str,
    privatekey_hash: Option<&str>,
) -> Result<Address, TenebraError> {
    let row = sqlx::query_as::<_, Address>(
        "INSERT INTO addresses(address, privatekey_hash) VALUES ($1, $2) RETURNING *",
    )
    .bind(address)
    .bind(privatekey_hash)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn set_privatekey_hash(
    db: impl PgExecutor<'_>,
    address: &str,
    hash: &str,
) -> Result<(), TenebraError> {
    sqlx::query("UPDATE addresses SET privatekey_hash = $2 WHERE address = $1")
        .bind(address)
        .bind(hash)
        .execute(db)
        .await?;
    Ok(())
}

/// Balance -> stake under one row update; activates the stake.
pub async fn add_stake(
    db: impl PgExecutor<'_>,
    address: &str,
    amount: i64,
) -> Result<(), TenebraError> {
    sqlx::query(
        "UPDATE addresses SET balance = balance - $2, stake = stake + $2, stake_active = TRUE
         WHERE address = $1",
    )
    .bind(address)
    .bind(amount)
    .execute(db)
    .await?;
    Ok(())
}

/// Stake -> balance; deactivates once the stake is fully withdrawn.
pub async fn remove_stake(
    db: impl PgExecutor<'_>,
    address: &str,
    amount: i64,
) -> Result<(), TenebraError> {
    sqlx::query(
        "UPDATE addresses SET balance = balance + $2, stake = stake - $2,
                stake_active = (stake - $2) > 0
         WHERE address = $1",
    )
    .bind(address)
    .bind(amount)
    .execute(db)
    .await?;
    Ok(())
}

/// Moves `amount` from stake into the penalty counter and benches the staker.
pub async fn apply_penalty(
    db: impl PgExecutor<'_>,
    address: &str,
    amount: i64,
) -> Result<(), TenebraError> {
    sqlx::query(
        "UPDATE addresses SET stake = stake - $2, penalty = penalty + $2, stake_active = FALSE
         WHERE address = $1",
    )
    .bind(address)
    .bind(amount)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_stakes(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Address>, TenebraError> {
    let rows = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE stake > 0 ORDER BY stake DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_stakes(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE stake > 0")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

/// Election candidates: active stakers only, in insertion order so the
/// cumulative draw is stable.
pub async fn stakers_for_election(db: impl PgExecutor<'_>) -> Result<Vec<Address>, TenebraError> {
    let rows = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE stake > 0 AND stake_active ORDER BY firstseen ASC, address ASC",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_penalties(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Address>, TenebraError> {
    let rows = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE penalty > 0 ORDER BY penalty DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_unpaid_penalties(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE penalty > 0")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

/// Per-block penalty decay, mirroring unpaid-name decay.
pub async fn decrement_penalties(db: impl PgExecutor<'_>) -> Result<(), TenebraError> {
    sqlx::query("UPDATE addresses SET penalty = penalty - 1 WHERE penalty > 0")
        .execute(db)
        .await?;
    Ok(())
}

/// Sum of circulating value: spendable balances plus bonded stake.
pub async fn supply(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let sum: (i64,) = sqlx::query_as(
        "SELECT (COALESCE(SUM(balance), 0) + COALESCE(SUM(stake), 0))::BIGINT FROM addresses",
    )
    .fetch_one(db)
    .await?;
    Ok(sum.0)
}
