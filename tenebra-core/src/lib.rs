pub mod crypto;
pub mod errors;
pub mod events;
pub mod types;
pub mod validation;

pub use errors::TenebraError;
pub use events::{Event, EventSink, SubscriptionLevel};
pub use types::{Address, AuthLogType, Block, Name, StakeInfo, Transaction, TransactionType};

pub type Result<T> = std::result::Result<T, TenebraError>;
