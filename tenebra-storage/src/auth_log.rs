use chrono::{Duration, Utc};
use sqlx::PgExecutor;
use tenebra_core::{AuthLogType, TenebraError};

/// Window inside which repeated attempts from the same `(ip, address, type)`
/// triple are not logged again.
const DEDUP_MINUTES: i64 = 30;

/// Entries older than this are pruned by the hourly job.
const RETENTION_DAYS: i64 = 30;

pub async fn recent_exists(
    db: impl PgExecutor<'_>,
    ip: &str,
    address: &str,
    log_type: AuthLogType,
) -> Result<bool, TenebraError> {
    let cutoff = Utc::now() - Duration::minutes(DEDUP_MINUTES);
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM auth_log WHERE ip = $1 AND address = $2 AND type = $3 AND time > $4",
    )
    .bind(ip)
    .bind(address)
    .bind(log_type.as_str())
    .bind(cutoff)
    .fetch_one(db)
    .await?;
    Ok(row.0 > 0)
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    ip: &str,
    address: &str,
    log_type: AuthLogType,
    useragent: Option<&str>,
    origin: Option<&str>,
) -> Result<(), TenebraError> {
    sqlx::query(
        "INSERT INTO auth_log(ip, address, type, useragent, origin) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(ip)
    .bind(address)
    .bind(log_type.as_str())
    .bind(useragent)
    .bind(origin)
    .execute(db)
    .await?;
    Ok(())
}

/// Hourly retention sweep; returns the number of rows removed.
pub async fn prune(db: impl PgExecutor<'_>) -> Result<u64, TenebraError> {
    let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
    let result = sqlx::query("DELETE FROM auth_log WHERE time < $1")
        .bind(cutoff)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
