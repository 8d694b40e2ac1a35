pub mod addresses;
pub mod auth_log;
pub mod blocks;
pub mod names;
pub mod state;
pub mod transactions;

pub use state::FastState;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tenebra_core::TenebraError;
use tracing::info;

/// Handle to the durable store. Mutating paths obtain a transaction through
/// [`PgStore::begin`] so every side effect of one operation commits or rolls
/// back together.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, TenebraError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!("connected to postgres");
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, TenebraError> {
        Ok(self.pool.begin().await?)
    }

    async fn migrate(&self) -> Result<(), TenebraError> {
        // Minimal schema creation, one statement per query. In production
        // this would be handled by migration files.
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS addresses(
                address VARCHAR(10) PRIMARY KEY,
                balance BIGINT NOT NULL DEFAULT 0,
                totalin BIGINT NOT NULL DEFAULT 0,
                totalout BIGINT NOT NULL DEFAULT 0,
                stake BIGINT NOT NULL DEFAULT 0,
                penalty BIGINT NOT NULL DEFAULT 0,
                stake_active BOOLEAN NOT NULL DEFAULT FALSE,
                locked BOOLEAN NOT NULL DEFAULT FALSE,
                privatekey_hash VARCHAR(64),
                firstseen TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
            r#"
            CREATE TABLE IF NOT EXISTS blocks(
                id BIGSERIAL PRIMARY KEY,
                hash VARCHAR(64) UNIQUE,
                address VARCHAR(10) NOT NULL,
                nonce BYTEA NOT NULL,
                time TIMESTAMPTZ NOT NULL DEFAULT now(),
                difficulty BIGINT NOT NULL,
                value BIGINT NOT NULL,
                useragent TEXT,
                origin TEXT
            )"#,
            r#"
            CREATE TABLE IF NOT EXISTS transactions(
                id BIGSERIAL PRIMARY KEY,
                "from" VARCHAR(10),
                "to" VARCHAR(64) NOT NULL,
                value BIGINT NOT NULL,
                time TIMESTAMPTZ NOT NULL DEFAULT now(),
                name VARCHAR(64),
                op VARCHAR(255),
                sent_metaname VARCHAR(64),
                sent_name VARCHAR(64),
                useragent TEXT,
                origin TEXT
            )"#,
            r#"CREATE INDEX IF NOT EXISTS transactions_from_idx ON transactions("from")"#,
            r#"CREATE INDEX IF NOT EXISTS transactions_to_idx ON transactions("to")"#,
            r#"
            CREATE TABLE IF NOT EXISTS names(
                name VARCHAR(64) PRIMARY KEY,
                owner VARCHAR(10) NOT NULL,
                original_owner VARCHAR(10) NOT NULL,
                registered TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated TIMESTAMPTZ NOT NULL DEFAULT now(),
                a VARCHAR(255),
                unpaid BIGINT NOT NULL DEFAULT 0
            )"#,
            r#"CREATE INDEX IF NOT EXISTS names_owner_idx ON names(owner)"#,
            r#"
            CREATE TABLE IF NOT EXISTS auth_log(
                id BIGSERIAL PRIMARY KEY,
                ip TEXT NOT NULL,
                address VARCHAR(10) NOT NULL,
                time TIMESTAMPTZ NOT NULL DEFAULT now(),
                type TEXT NOT NULL,
                useragent TEXT,
                origin TEXT
            )"#,
            r#"CREATE INDEX IF NOT EXISTS auth_log_time_idx ON auth_log(time)"#,
        ];
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}
