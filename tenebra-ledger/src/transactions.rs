use std::sync::Arc;

use tenebra_config::Constants;
use tenebra_core::{validation, Address, Event, EventSink, TenebraError, Transaction};
use tenebra_storage::{addresses, names, transactions, PgStore};
use tracing::debug;

use crate::{auth, RequestMeta};

/// A payment target: either a literal address or a registered name, with an
/// optional metaname prefix (`metaname@name.tst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Address(String),
    Name { metaname: Option<String>, name: String },
}

/// Parses the `to` field of a payment. Names must carry the configured
/// suffix; bare names are treated as malformed rather than guessed at.
pub fn parse_recipient(raw: &str, constants: &Constants) -> Option<Recipient> {
    if validation::is_valid_address(raw) {
        return Some(Recipient::Address(raw.to_string()));
    }
    let (metaname, rest) = match raw.split_once('@') {
        Some((metaname, rest)) => (Some(metaname), rest),
        None => (None, raw),
    };
    let name = rest.strip_suffix(&constants.name_suffix)?.strip_suffix('.')?;
    if !validation::is_valid_name(name) {
        return None;
    }
    if let Some(metaname) = metaname {
        let ok = !metaname.is_empty()
            && metaname.len() <= 32
            && metaname
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !ok {
            return None;
        }
    }
    Some(Recipient::Name {
        metaname: metaname.map(String::from),
        name: name.to_string(),
    })
}

/// Atomic value movement between addresses, with name-aware routing.
pub struct TransactionEngine {
    store: Arc<PgStore>,
    sink: Arc<dyn EventSink>,
    constants: Arc<Constants>,
}

impl TransactionEngine {
    pub fn new(store: Arc<PgStore>, sink: Arc<dyn EventSink>, constants: Arc<Constants>) -> Self {
        Self { store, sink, constants }
    }

    /// The `POST /transactions` operation: authenticate, resolve the
    /// recipient, move the value.
    pub async fn send(
        &self,
        meta: &RequestMeta,
        private_key: &str,
        to: &str,
        amount: i64,
        metadata: Option<&str>,
    ) -> Result<Transaction, TenebraError> {
        if amount < 1 {
            return Err(TenebraError::InvalidParameter("amount".into()));
        }
        if let Some(metadata) = metadata {
            if !validation::is_valid_metadata(metadata) {
                return Err(TenebraError::InvalidParameter("metadata".into()));
            }
        }
        let recipient = parse_recipient(to, &self.constants)
            .ok_or_else(|| TenebraError::InvalidParameter("to".into()))?;
        let sender = auth::authenticate(&self.store, meta, private_key, &self.constants).await?;

        let (to_address, sent_metaname, sent_name) = match recipient {
            Recipient::Address(address) => (address, None, None),
            Recipient::Name { metaname, name } => {
                let row = names::get(self.store.pool(), &name)
                    .await?
                    .ok_or(TenebraError::NameNotFound)?;
                (row.owner, metaname, Some(name))
            }
        };

        self.push_transaction(
            meta,
            &sender,
            &to_address,
            amount,
            metadata,
            None,
            sent_metaname.as_deref(),
            sent_name.as_deref(),
        )
        .await
    }

    /// Moves `amount` from `sender` to `to` under one DB transaction and
    /// broadcasts the committed row. The recipient row is created lazily.
    #[allow(clippy::too_many_arguments)]
    pub async fn push_transaction(
        &self,
        meta: &RequestMeta,
        sender: &Address,
        to: &str,
        amount: i64,
        metadata: Option<&str>,
        name: Option<&str>,
        sent_metaname: Option<&str>,
        sent_name: Option<&str>,
    ) -> Result<Transaction, TenebraError> {
        let mut dbtx = self.store.begin().await?;

        // Re-read under the transaction so concurrent spends serialise.
        let row = addresses::get(&mut *dbtx, &sender.address)
            .await?
            .ok_or(TenebraError::AddressNotFound)?;
        if row.balance < amount {
            return Err(TenebraError::InsufficientFunds);
        }

        addresses::debit(&mut *dbtx, &sender.address, amount).await?;
        addresses::credit(&mut *dbtx, to, amount).await?;
        let transaction = transactions::insert(
            &mut *dbtx,
            transactions::NewTransaction {
                from: Some(&sender.address),
                to,
                value: amount,
                name,
                op: metadata,
                sent_metaname,
                sent_name,
                useragent: meta.useragent.as_deref(),
                origin: meta.origin.as_deref(),
            },
        )
        .await?;
        dbtx.commit().await?;

        debug!(from = %sender.address, %to, %amount, "transaction committed");
        self.sink.emit(Event::Transaction { transaction: transaction.clone() });
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> Constants {
        Constants::default()
    }

    #[test]
    fn recipient_parses_addresses() {
        assert_eq!(
            parse_recipient("t74tq2hsh6", &constants()),
            Some(Recipient::Address("t74tq2hsh6".into()))
        );
        // legacy hex addresses are valid targets
        assert_eq!(
            parse_recipient("a5dfb396d3", &constants()),
            Some(Recipient::Address("a5dfb396d3".into()))
        );
    }

    #[test]
    fn recipient_parses_names() {
        assert_eq!(
            parse_recipient("example.tst", &constants()),
            Some(Recipient::Name { metaname: None, name: "example".into() })
        );
        assert_eq!(
            parse_recipient("shop@example.tst", &constants()),
            Some(Recipient::Name {
                metaname: Some("shop".into()),
                name: "example".into()
            })
        );
    }

    #[test]
    fn recipient_rejects_malformed() {
        assert_eq!(parse_recipient("example", &constants()), None);
        assert_eq!(parse_recipient("example.kst", &constants()), None);
        assert_eq!(parse_recipient("@example.tst", &constants()), None);
        assert_eq!(parse_recipient("UPPER@example.tst", &constants()), None);
        assert_eq!(parse_recipient("exampletst", &constants()), None);
        assert_eq!(parse_recipient("", &constants()), None);
    }
}
