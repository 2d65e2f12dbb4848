use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletDbError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Backend error: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("Invalid transaction hash: {0}")]
    InvalidHash(String),
    #[error("Precondition violated: {0}")]
    Precondition(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, WalletDbError>;

// Helper conversions
impl From<::config::ConfigError> for WalletDbError {
    fn from(e: ::config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
