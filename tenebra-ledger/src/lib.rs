pub mod auth;
pub mod names;
pub mod transactions;

pub use auth::{authenticate, verify};
pub use names::NameEngine;
pub use transactions::{parse_recipient, Recipient, TransactionEngine};

/// Request-scoped context carried from the adapters into the auth log.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub useragent: Option<String>,
    pub origin: Option<String>,
}
