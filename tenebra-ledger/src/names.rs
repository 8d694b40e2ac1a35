use std::sync::Arc;

use tenebra_config::Constants;
use tenebra_core::{validation, Event, EventSink, Name, TenebraError};
use tenebra_storage::{addresses, names, transactions, PgStore};
use tracing::debug;

use crate::{auth, RequestMeta};

/// Purchase, transfer and record updates for registered names.
pub struct NameEngine {
    store: Arc<PgStore>,
    sink: Arc<dyn EventSink>,
    constants: Arc<Constants>,
}

impl NameEngine {
    pub fn new(store: Arc<PgStore>, sink: Arc<dyn EventSink>, constants: Arc<Constants>) -> Self {
        Self { store, sink, constants }
    }

    pub fn cost(&self) -> i64 {
        self.constants.name_cost
    }

    /// The name bonus: one TST per block for every name still paying off.
    pub async fn bonus(&self) -> Result<i64, TenebraError> {
        names::count_unpaid(self.store.pool()).await
    }

    pub async fn purchase(
        &self,
        meta: &RequestMeta,
        private_key: &str,
        name: &str,
    ) -> Result<Name, TenebraError> {
        if !validation::is_valid_name(name) {
            return Err(TenebraError::InvalidParameter("name".into()));
        }
        if names::get(self.store.pool(), name).await?.is_some() {
            return Err(TenebraError::NameTaken);
        }
        let buyer = auth::authenticate(&self.store, meta, private_key, &self.constants).await?;
        if buyer.balance < self.constants.name_cost {
            return Err(TenebraError::InsufficientFunds);
        }

        let mut dbtx = self.store.begin().await?;
        let row = addresses::get(&mut *dbtx, &buyer.address)
            .await?
            .ok_or(TenebraError::AddressNotFound)?;
        if row.balance < self.constants.name_cost {
            return Err(TenebraError::InsufficientFunds);
        }
        addresses::debit(&mut *dbtx, &buyer.address, self.constants.name_cost).await?;
        let purchased =
            names::insert(&mut *dbtx, name, &buyer.address, self.constants.name_cost).await?;
        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: Some(&buyer.address),
                to: "name",
                value: self.constants.name_cost,
                name: Some(name),
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        dbtx.commit().await?;

        debug!(%name, owner = %buyer.address, "name purchased");
        self.sink.emit(Event::Transaction { transaction });
        self.sink.emit(Event::Name { name: purchased.clone() });
        Ok(purchased)
    }

    pub async fn transfer(
        &self,
        meta: &RequestMeta,
        private_key: &str,
        name: &str,
        to: &str,
    ) -> Result<Name, TenebraError> {
        if !validation::is_valid_address(to) {
            return Err(TenebraError::InvalidParameter("address".into()));
        }
        let sender = auth::authenticate(&self.store, meta, private_key, &self.constants).await?;
        let row = names::get(self.store.pool(), name)
            .await?
            .ok_or(TenebraError::NameNotFound)?;
        if row.owner != sender.address {
            return Err(TenebraError::NotNameOwner);
        }

        let mut dbtx = self.store.begin().await?;
        let updated = names::set_owner(&mut *dbtx, name, to).await?;
        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: Some(&sender.address),
                to,
                value: 0,
                name: Some(name),
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        dbtx.commit().await?;

        debug!(%name, from = %sender.address, %to, "name transferred");
        self.sink.emit(Event::Transaction { transaction });
        self.sink.emit(Event::Name { name: updated.clone() });
        Ok(updated)
    }

    /// Sets or clears the A record. An empty `a` clears it.
    pub async fn update_a(
        &self,
        meta: &RequestMeta,
        private_key: &str,
        name: &str,
        a: Option<&str>,
    ) -> Result<Name, TenebraError> {
        let a = a.filter(|a| !a.is_empty());
        if let Some(a) = a {
            if !validation::is_valid_a_record(a) {
                return Err(TenebraError::InvalidParameter("a".into()));
            }
        }
        let sender = auth::authenticate(&self.store, meta, private_key, &self.constants).await?;
        let row = names::get(self.store.pool(), name)
            .await?
            .ok_or(TenebraError::NameNotFound)?;
        if row.owner != sender.address {
            return Err(TenebraError::NotNameOwner);
        }

        let mut dbtx = self.store.begin().await?;
        let updated = names::set_a_record(&mut *dbtx, name, a).await?;
        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: Some(&sender.address),
                to: "a",
                value: 0,
                name: Some(name),
                op: a,
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        dbtx.commit().await?;

        self.sink.emit(Event::Transaction { transaction });
        self.sink.emit(Event::Name { name: updated.clone() });
        Ok(updated)
    }
}
