use thiserror::Error;

/// Every fallible ledger operation returns one of these; the HTTP and
/// WebSocket adapters map them onto wire error strings and status codes.
#[derive(Debug, Error)]
pub enum TenebraError {
    #[error("missing parameter {0}")]
    MissingParameter(String),
    #[error("invalid parameter {0}")]
    InvalidParameter(String),
    #[error("parameter {0} too large")]
    LargeParameter(String),
    #[error("authentication failed")]
    AuthFailed,
    #[error("address not found")]
    AddressNotFound,
    #[error("name not found")]
    NameNotFound,
    #[error("block not found")]
    BlockNotFound,
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("not the owner of the name")]
    NotNameOwner,
    #[error("solution incorrect")]
    SolutionIncorrect,
    #[error("address is not the selected validator")]
    UnselectedValidator,
    #[error("invalid websocket token")]
    InvalidToken,
    #[error("name already taken")]
    NameTaken,
    #[error("solution already submitted")]
    SolutionDuplicate,
    #[error("mining is disabled")]
    MiningDisabled,
    #[error("rate limit hit")]
    RateLimitHit,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl TenebraError {
    /// Wire-format error kind.
    pub fn error_string(&self) -> &'static str {
        use TenebraError::*;
        match self {
            MissingParameter(_) => "missing_parameter",
            InvalidParameter(_) => "invalid_parameter",
            LargeParameter(_) => "large_parameter",
            AuthFailed => "auth_failed",
            AddressNotFound => "address_not_found",
            NameNotFound => "name_not_found",
            BlockNotFound => "block_not_found",
            TransactionNotFound => "transaction_not_found",
            InsufficientFunds => "insufficient_funds",
            NotNameOwner => "not_name_owner",
            SolutionIncorrect => "solution_incorrect",
            UnselectedValidator => "unselected_validator",
            InvalidToken => "invalid_token",
            NameTaken => "name_taken",
            SolutionDuplicate => "solution_duplicate",
            MiningDisabled => "mining_disabled",
            RateLimitHit => "rate_limit_hit",
            Database(_) | Internal(_) => "server_error",
        }
    }

    pub fn http_status(&self) -> u16 {
        use TenebraError::*;
        match self {
            MissingParameter(_) | InvalidParameter(_) | LargeParameter(_) => 400,
            AuthFailed => 401,
            AddressNotFound | NameNotFound | BlockNotFound | TransactionNotFound => 404,
            InsufficientFunds | NotNameOwner | SolutionIncorrect | UnselectedValidator
            | InvalidToken => 403,
            NameTaken | SolutionDuplicate => 409,
            MiningDisabled => 423,
            RateLimitHit => 429,
            Database(_) | Internal(_) => 500,
        }
    }

    /// The offending parameter name, for `{ok:false, parameter:…}` responses.
    pub fn parameter(&self) -> Option<&str> {
        use TenebraError::*;
        match self {
            MissingParameter(p) | InvalidParameter(p) | LargeParameter(p) => Some(p),
            _ => None,
        }
    }
}

/// True when the database error is a unique-constraint violation, optionally
/// against one specific constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: Option<&str>) -> bool {
    if let sqlx::Error::Database(db) = err {
        if db.code().as_deref() == Some("23505") {
            return match constraint {
                Some(c) => db.constraint() == Some(c),
                None => true,
            };
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_round_trip() {
        assert_eq!(TenebraError::AuthFailed.http_status(), 401);
        assert_eq!(TenebraError::NameTaken.error_string(), "name_taken");
        assert_eq!(TenebraError::SolutionDuplicate.http_status(), 409);
        assert_eq!(TenebraError::MiningDisabled.http_status(), 423);
        assert_eq!(
            TenebraError::MissingParameter("to".into()).parameter(),
            Some("to")
        );
        assert_eq!(TenebraError::Internal("boom".into()).error_string(), "server_error");
    }
}
