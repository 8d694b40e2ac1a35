use serde::Serialize;
use serde_json::json;

use crate::types::{Block, Name, StakeInfo, Transaction};

/// Subscription categories a session can listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionLevel {
    Blocks,
    Transactions,
    OwnTransactions,
    Names,
    Stake,
    Validator,
}

impl SubscriptionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionLevel::Blocks => "blocks",
            SubscriptionLevel::Transactions => "transactions",
            SubscriptionLevel::OwnTransactions => "ownTransactions",
            SubscriptionLevel::Names => "names",
            SubscriptionLevel::Stake => "stake",
            SubscriptionLevel::Validator => "validator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blocks" => Some(SubscriptionLevel::Blocks),
            "transactions" => Some(SubscriptionLevel::Transactions),
            "ownTransactions" => Some(SubscriptionLevel::OwnTransactions),
            "names" => Some(SubscriptionLevel::Names),
            "stake" => Some(SubscriptionLevel::Stake),
            "validator" => Some(SubscriptionLevel::Validator),
            _ => None,
        }
    }
}

/// Typed events emitted by the engines after each committed operation.
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    Block { block: Block, new_work: i64 },
    Transaction { transaction: Transaction },
    Name { name: Name },
    Stake { stake: StakeInfo },
    Validator { validator: String },
}

impl Event {
    pub fn event_name(&self) -> &'static str {
        match self {
            Event::Block { .. } => "block",
            Event::Transaction { .. } => "transaction",
            Event::Name { .. } => "name",
            Event::Stake { .. } => "stake",
            Event::Validator { .. } => "validator",
        }
    }

    /// Subscription categories this event is delivered on.
    pub fn levels(&self) -> &'static [SubscriptionLevel] {
        match self {
            Event::Block { .. } => &[SubscriptionLevel::Blocks],
            Event::Transaction { .. } => {
                &[SubscriptionLevel::Transactions, SubscriptionLevel::OwnTransactions]
            }
            Event::Name { .. } => &[SubscriptionLevel::Names],
            Event::Stake { .. } => &[SubscriptionLevel::Stake],
            Event::Validator { .. } => &[SubscriptionLevel::Validator],
        }
    }

    /// Whether a session subscribed with `levels` and authenticated as
    /// `address` should receive this event. `ownTransactions` is the only
    /// address-scoped category.
    pub fn delivered_to(
        &self,
        levels: &std::collections::HashSet<SubscriptionLevel>,
        address: Option<&str>,
    ) -> bool {
        match self {
            Event::Transaction { transaction } => {
                if levels.contains(&SubscriptionLevel::Transactions) {
                    return true;
                }
                if levels.contains(&SubscriptionLevel::OwnTransactions) {
                    return matches!(address, Some(a) if transaction.concerns(a));
                }
                false
            }
            other => other.levels().iter().any(|l| levels.contains(l)),
        }
    }

    /// Wire message pushed to subscribed sessions.
    pub fn to_message(&self) -> serde_json::Value {
        let mut message = json!({ "type": "event", "event": self.event_name() });
        let body = match self {
            Event::Block { block, new_work } => json!({ "block": block, "new_work": new_work }),
            Event::Transaction { transaction } => json!({ "transaction": transaction }),
            Event::Name { name } => json!({ "name": name }),
            Event::Stake { stake } => json!({ "stake": stake }),
            Event::Validator { validator } => json!({ "validator": validator }),
        };
        if let (Some(target), Some(fields)) = (message.as_object_mut(), body.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        message
    }
}

/// Seam between the engines and the session fan-out: engines emit without
/// knowing who listens. Emission happens after the owning DB transaction
/// commits and must never fail the operation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Sink that drops everything, for tests and offline tooling.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn transfer(from: &str, to: &str) -> Event {
        Event::Transaction {
            transaction: Transaction {
                id: 1,
                from: Some(from.into()),
                to: to.into(),
                value: 5,
                time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                name: None,
                op: None,
                sent_metaname: None,
                sent_name: None,
                useragent: None,
                origin: None,
            },
        }
    }

    #[test]
    fn own_transactions_are_address_scoped() {
        let event = transfer("t74tq2hsh6", "t1o1uuxmb4");
        let own: HashSet<_> = [SubscriptionLevel::OwnTransactions].into_iter().collect();
        assert!(event.delivered_to(&own, Some("t74tq2hsh6")));
        assert!(event.delivered_to(&own, Some("t1o1uuxmb4")));
        assert!(!event.delivered_to(&own, Some("trqtnrp18z")));
        assert!(!event.delivered_to(&own, None));

        let all: HashSet<_> = [SubscriptionLevel::Transactions].into_iter().collect();
        assert!(event.delivered_to(&all, None));
    }

    #[test]
    fn message_envelope() {
        let event = Event::Validator { validator: "t74tq2hsh6".into() };
        let message = event.to_message();
        assert_eq!(message["type"], "event");
        assert_eq!(message["event"], "validator");
        assert_eq!(message["validator"], "t74tq2hsh6");
    }
}
