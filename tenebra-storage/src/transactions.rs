use sqlx::PgExecutor;
use tenebra_core::{TenebraError, Transaction};

pub const SORT_COLUMNS: &[&str] = &["id", "from", "to", "value", "time", "name"];

/// Everything needed to persist one ledger entry. `from = None` marks a
/// mined credit.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction<'a> {
    pub from: Option<&'a str>,
    pub to: &'a str,
    pub value: i64,
    pub name: Option<&'a str>,
    pub op: Option<&'a str>,
    pub sent_metaname: Option<&'a str>,
    pub sent_name: Option<&'a str>,
    pub useragent: Option<&'a str>,
    pub origin: Option<&'a str>,
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    new: NewTransaction<'_>,
) -> Result<Transaction, TenebraError> {
    let row = sqlx::query_as::<_, Transaction>(
        r#"INSERT INTO transactions("from", "to", value, name, op, sent_metaname, sent_name, useragent, origin)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *"#,
    )
    .bind(new.from)
    .bind(new.to)
    .bind(new.value)
    .bind(new.name)
    .bind(new.op)
    .bind(new.sent_metaname)
    .bind(new.sent_name)
    .bind(new.useragent)
    .bind(new.origin)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn get(db: impl PgExecutor<'_>, id: i64) -> Result<Option<Transaction>, TenebraError> {
    let row = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn count(db: impl PgExecutor<'_>) -> Result<i64, TenebraError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

pub async fn list(
    db: impl PgExecutor<'_>,
    limit: i64,
    offset: i64,
    asc: bool,
) -> Result<Vec<Transaction>, TenebraError> {
    let direction = if asc { "ASC" } else { "DESC" };
    let sql = format!("SELECT * FROM transactions ORDER BY id {direction} LIMIT $1 OFFSET $2");
    let rows = sqlx::query_as::<_, Transaction>(&sql)
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
) -> Result<Vec<Transaction>, TenebraError> {
    if !SORT_COLUMNS.contains(&order_by) {
        return Err(TenebraError::InvalidParameter("orderBy".into()));
    }
    let direction = if asc { "ASC" } else { "DESC" };
    let sql = format!(
        r#"SELECT * FROM transactions ORDER BY "{order_by}" {direction} LIMIT $1 OFFSET $2"#
    );
    let rows = sqlx::query_as::<_, Transaction>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn count_by_address(
    db: impl PgExecutor<'_>,
    address: &str,
) -> Result<i64, TenebraError> {
    let count: (i64,) =
        sqlx::query_as(r#"SELECT COUNT(*) FROM transactions WHERE "from" = $1 OR "to" = $1"#)
            .bind(address)
            .fetch_one(db)
            .await?;
    Ok(count.0)
}

pub async fn list_by_address(
    db: impl PgExecutor<'_>,
    address: &str,
    limit: i64,
    offset: i64,
    asc: bool,
) -> Result<Vec<Transaction>, TenebraError> {
    let direction = if asc { "ASC" } else { "DESC" };
    let sql = format!(
        r#"SELECT * FROM transactions WHERE "from" = $1 OR "to" = $1
           ORDER BY id {direction} LIMIT $2 OFFSET $3"#
    );
    let rows = sqlx::query_as::<_, Transaction>(&sql)
        .bind(address)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Which facet of a transaction an extended search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Address,
    Name,
    Metadata,
}

impl SearchKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "address" => Some(SearchKind::Address),
            "name" => Some(SearchKind::Name),
            "metadata" => Some(SearchKind::Metadata),
            _ => None,
        }
    }

    fn predicate(&self) -> &'static str {
        match self {
            SearchKind::Address => r#""from" = $1 OR "to" = $1"#,
            SearchKind::Name => "name = $1 OR sent_name = $1",
            SearchKind::Metadata => "op LIKE $1",
        }
    }

    fn bind_value(&self, query: &str) -> String {
        match self {
            SearchKind::Metadata => {
                format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"))
            }
            _ => query.to_string(),
        }
    }
}

pub async fn search_count(
    db: impl PgExecutor<'_>,
    kind: SearchKind,
    query: &str,
) -> Result<i64, TenebraError> {
    let sql = format!("SELECT COUNT(*) FROM transactions WHERE {}", kind.predicate());
    let count: (i64,) = sqlx::query_as(&sql)
        .bind(kind.bind_value(query))
        .fetch_one(db)
        .await?;
    Ok(count.0)
}

pub async fn search(
    db: impl PgExecutor<'_>,
    kind: SearchKind,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>, TenebraError> {
    let sql = format!(
        "SELECT * FROM transactions WHERE {} ORDER BY id DESC LIMIT $2 OFFSET $3",
        kind.predicate()
    );
    let rows = sqlx::query_as::<_, Transaction>(&sql)
        .bind(kind.bind_value(query))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}
