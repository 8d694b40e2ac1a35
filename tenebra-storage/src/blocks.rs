use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use tenebra_core::{Block, TenebraError};

/// Sortable columns for the lookup API. Dynamic ORDER BY is assembled from
/// this whitelist only.
pub const SORT_COLUMNS: &[&str] = &["id", "hash", "address", "time", "difficulty", "value"];

fn order_clause(order_by: &str, asc: bool) -> String {
    let direction = if asc { "ASC" } else { "DESC" };
    // hash is nullable on legacy rows; keep those at the end either way.
    if order_by == "hash" {
        format!("hash {direction} NULLS LAST")
    } else {
        format!("{order_by} {direction}")
    }
}

pub async fn last(db: impl PgExecutor<'_>) -> Result<Option<Block>, TenebraError> {
    let row = sqlx::query_as::<_, Block>("SELECT * FROM blocks ORDER BY id DESC LIMIT 1")
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn get(db: impl PgExecutor<'_>, height: i64) -> Result<Option<Block>, TenebraError> {
    let row = sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE id = $1")
        .bind(height)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn count(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blocks")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

pub async fn list(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
    asc: bool,
) -> Result<Vec<Block>, TenebraError> {
    let sql = format!(
        "SELECT * FROM blocks ORDER BY {} LIMIT $1 OFFSET $2",
        order_clause("id", asc)
    );
    let rows = sqlx::query_as::<_, Block>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn list_sorted(
    db: impl PgExecutor<'_>,
    order_by: &str,
    asc: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Block>, TenebraError> {
    if !SORT_COLUMNS.contains(&order_by) {
        return Err(TenebraError::InvalidParameter("orderBy".into()));
    }
    let sql = format!(
        "SELECT * FROM blocks ORDER BY {} LIMIT $1 OFFSET $2",
        order_clause(order_by, asc)
    );
    let rows = sqlx::query_as::<_, Block>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Inserts the next block. A duplicate hash trips the unique constraint,
/// which the block engine surfaces as `SolutionDuplicate`.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    db: impl PgExecutor<'_>,
    hash: &str,
    address: &str,
    nonce: &[u8],
    time: DateTime<Utc>,
    difficulty: i64,
    value: i64,
    useragent: Option<&str>,
    origin: Option<&str>,
) -> Result<Block, TenebraError> {
    let row = sqlx::query_as::<_, Block>(
        "INSERT INTO blocks(hash, address, nonce, time, difficulty, value, useragent, origin)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(hash)
    .bind(address)
    .bind(nonce)
    .bind(time)
    .bind(difficulty)
    .bind(value)
    .bind(useragent)
    .bind(origin)
    .fetch_one(db)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ordering_keeps_nulls_last() {
        assert_eq!(order_clause("hash", true), "hash ASC NULLS LAST");
        assert_eq!(order_clause("hash", false), "hash DESC NULLS LAST");
        assert_eq!(order_clause("id", false), "id DESC");
    }
}
