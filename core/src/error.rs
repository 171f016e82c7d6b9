//! Error types for HEALCHAIN

use thiserror::Error;

/// Main error type for HEALCHAIN
#[derive(Error, Debug)]
pub enum HealchainError {
    // ============ Record Errors ============
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    // ============ Codec Errors ============
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Marshal failure: {0}")]
    MarshalFailure(String),

    // ============ Store Errors ============
    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ============ Invocation Errors ============
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HealchainError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        HealchainError::NotFound { kind, id: id.into() }
    }

    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        HealchainError::AlreadyExists { kind, id: id.into() }
    }
}

impl From<std::io::Error> for HealchainError {
    fn from(err: std::io::Error) -> Self {
        HealchainError::StoreFailure(err.to_string())
    }
}

impl From<serde_json::Error> for HealchainError {
    fn from(err: serde_json::Error) -> Self {
        HealchainError::MarshalFailure(err.to_string())
    }
}
