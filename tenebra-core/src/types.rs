use chrono::{DateTime, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

/// Ledger row for a single address. `privatekey_hash` never leaves the node.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Address {
    pub address: String,
    pub balance: i64,
    pub totalin: i64,
    pub totalout: i64,
    pub stake: i64,
    pub penalty: i64,
    pub stake_active: bool,
    pub locked: bool,
    pub privatekey_hash: Option<String>,
    pub firstseen: DateTime<Utc>,
}

impl Address {
    pub fn stake_info(&self) -> StakeInfo {
        StakeInfo {
            owner: self.address.clone(),
            stake: self.stake,
            active: self.stake_active,
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Address", 6)?;
        s.serialize_field("address", &self.address)?;
        s.serialize_field("balance", &self.balance)?;
        s.serialize_field("totalin", &self.totalin)?;
        s.serialize_field("totalout", &self.totalout)?;
        s.serialize_field("stake", &self.stake)?;
        s.serialize_field("firstseen", &self.firstseen)?;
        s.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeInfo {
    pub owner: String,
    pub stake: i64,
    pub active: bool,
}

/// A block row; `id` doubles as the chain height. Legacy rows may carry a
/// null hash, every modern row's hash is unique.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Block {
    pub id: i64,
    pub hash: Option<String>,
    pub address: String,
    pub nonce: Vec<u8>,
    pub time: DateTime<Utc>,
    pub difficulty: i64,
    pub value: i64,
    pub useragent: Option<String>,
    pub origin: Option<String>,
}

impl Block {
    pub fn short_hash(&self) -> Option<&str> {
        self.hash.as_deref().map(|h| &h[..12.min(h.len())])
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Block", 7)?;
        s.serialize_field("height", &self.id)?;
        s.serialize_field("address", &self.address)?;
        s.serialize_field("hash", &self.hash)?;
        s.serialize_field("short_hash", &self.short_hash())?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("time", &self.time)?;
        s.serialize_field("difficulty", &self.difficulty)?;
        s.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Mined,
    Staking,
    NamePurchase,
    NameARecord,
    NameTransfer,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Mined => "mined",
            TransactionType::Staking => "staking",
            TransactionType::NamePurchase => "name_purchase",
            TransactionType::NameARecord => "name_a_record",
            TransactionType::NameTransfer => "name_transfer",
            TransactionType::Transfer => "transfer",
        }
    }
}

/// Append-only ledger entry. `op` holds user metadata for transfers and the
/// new A record for name updates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub from: Option<String>,
    pub to: String,
    pub value: i64,
    pub time: DateTime<Utc>,
    pub name: Option<String>,
    pub op: Option<String>,
    pub sent_metaname: Option<String>,
    pub sent_name: Option<String>,
    pub useragent: Option<String>,
    pub origin: Option<String>,
}

impl Transaction {
    pub fn transaction_type(&self) -> TransactionType {
        match (&self.from, &self.name) {
            (None, _) => TransactionType::Mined,
            (Some(from), _) if from == "staking" || self.to == "staking" => {
                TransactionType::Staking
            }
            (_, Some(_)) if self.to == "name" => TransactionType::NamePurchase,
            (_, Some(_)) if self.to == "a" => TransactionType::NameARecord,
            (_, Some(_)) => TransactionType::NameTransfer,
            _ => TransactionType::Transfer,
        }
    }

    /// True when `address` is either end of this transaction.
    pub fn concerns(&self, address: &str) -> bool {
        self.from.as_deref() == Some(address) || self.to == address
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Transaction", 10)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("from", &self.from)?;
        s.serialize_field("to", &self.to)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("time", &self.time)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("metadata", &self.op)?;
        s.serialize_field("sent_metaname", &self.sent_metaname)?;
        s.serialize_field("sent_name", &self.sent_name)?;
        s.serialize_field("type", self.transaction_type().as_str())?;
        s.end()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Name {
    pub name: String,
    pub owner: String,
    pub original_owner: String,
    pub registered: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub a: Option<String>,
    pub unpaid: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLogType {
    Auth,
    Mining,
}

impl AuthLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthLogType::Auth => "auth",
            AuthLogType::Mining => "mining",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(from: Option<&str>, to: &str, name: Option<&str>) -> Transaction {
        Transaction {
            id: 1,
            from: from.map(String::from),
            to: to.into(),
            value: 10,
            time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            name: name.map(String::from),
            op: None,
            sent_metaname: None,
            sent_name: None,
            useragent: None,
            origin: None,
        }
    }

    #[test]
    fn classification() {
        assert_eq!(tx(None, "t74tq2hsh6", None).transaction_type(), TransactionType::Mined);
        assert_eq!(
            tx(Some("staking"), "t74tq2hsh6", None).transaction_type(),
            TransactionType::Staking
        );
        assert_eq!(
            tx(Some("t74tq2hsh6"), "staking", None).transaction_type(),
            TransactionType::Staking
        );
        assert_eq!(
            tx(Some("t74tq2hsh6"), "name", Some("example")).transaction_type(),
            TransactionType::NamePurchase
        );
        assert_eq!(
            tx(Some("t74tq2hsh6"), "a", Some("example")).transaction_type(),
            TransactionType::NameARecord
        );
        assert_eq!(
            tx(Some("t74tq2hsh6"), "t1o1uuxmb4", Some("example")).transaction_type(),
            TransactionType::NameTransfer
        );
        assert_eq!(
            tx(Some("t74tq2hsh6"), "t1o1uuxmb4", None).transaction_type(),
            TransactionType::Transfer
        );
    }

    #[test]
    fn transaction_json_shape() {
        let value = serde_json::to_value(tx(Some("t74tq2hsh6"), "t1o1uuxmb4", None)).unwrap();
        assert_eq!(value["type"], "transfer");
        assert_eq!(value["from"], "t74tq2hsh6");
        assert!(value.get("useragent").is_none());
    }

    #[test]
    fn block_short_hash() {
        let block = Block {
            id: 1,
            hash: Some("00480dca7c6d2d33a6a2e9c1e9e7d2a4".into()),
            address: "t74tq2hsh6".into(),
            nonce: vec![0],
            time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            difficulty: 100_000,
            value: 25,
            useragent: None,
            origin: None,
        };
        assert_eq!(block.short_hash(), Some("00480dca7c6d"));
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["height"], 1);
        assert!(value.get("nonce").is_none());
    }
}
