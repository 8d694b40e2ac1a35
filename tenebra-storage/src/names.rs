use sqlx::PgExecutor;
use tenebra_core::{Name, TenebraError};

pub const SORT_COLUMNS: &[&str] = &["name", "owner", "original_owner", "registered", "updated", "unpaid"];

pub async fn get(db: impl PgExecutor<'_>, name: &str) -> Result<Option<Name>, TenebraError> {
    let row = sqlx::query_as::<_, Name>("SELECT * FROM names WHERE name = $1")
        .bind(name)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn count(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM names")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

pub async fn list(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Name>, TenebraError> {
    let rows =
        sqlx::query_as::<_, Name>("SELECT * FROM names ORDER BY name ASC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;
    Ok(rows)
}

pub async fn newest(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Name>, TenebraError> {
    let rows = sqlx::query_as::<_, Name>(
        "SELECT * FROM names ORDER BY registered DESC LIMIT $1 OFFSET $2",
    )
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
) -> Result<Vec<Name>, TenebraError> {
    if !SORT_COLUMNS.contains(&order_by) {
        return Err(TenebraError::InvalidParameter("orderBy".into()));
    }
    let direction = if asc { "ASC" } else { "DESC" };
    let sql = format!("SELECT * FROM names ORDER BY {order_by} {direction} LIMIT $1 OFFSET $2");
    let rows = sqlx::query_as::<_, Name>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn list_by_owner(
    db: impl PgExecutor<'_>,
    owner: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Name>, TenebraError> {
    let rows = sqlx::query_as::<_, Name>(
        "SELECT * FROM names WHERE owner = $1 ORDER BY name ASC LIMIT $2 OFFSET $3",
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_owner(db: impl PgExecutor<'_>, owner: &str) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM names WHERE owner = $1")
        .bind(owner)
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    name: &str,
    owner: &str,
    unpaid: i64,
) -> Result<Name, TenebraError> {
    let row = sqlx::query_as::<_, Name>(
        "INSERT INTO names(name, owner, original_owner, unpaid) VALUES ($1, $2, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(owner)
    .bind(unpaid)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn set_owner(
    db: impl PgExecutor<'_>,
    name: &str,
    owner: &str,
) -> Result<Name, TenebraError> {
    let row = sqlx::query_as::<_, Name>(
        "UPDATE names SET owner = $2, updated = now() WHERE name = $1 RETURNING *",
    )
    .bind(name)
    .bind(owner)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn set_a_record(
    db: impl PgExecutor<'_>,
    name: &str,
    a: Option<&str>,
) -> Result<Name, TenebraError> {
    let row = sqlx::query_as::<_, Name>(
        "UPDATE names SET a = $2, updated = now() WHERE name = $1 RETURNING *",
    )
    .bind(name)
    .bind(a)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Names still contributing to the block reward.
pub async fn count_unpaid(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM names WHERE unpaid > 0")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

/// Per-block decay; saturates at zero via the predicate.
pub async fn decrement_unpaid(db: impl PgExecutor<'_>) -> Result<(), TenebraError> {
    sqlx::query("UPDATE names SET unpaid = unpaid - 1 WHERE unpaid > 0")
        .execute(db)
        .await?;
    Ok(())
}
