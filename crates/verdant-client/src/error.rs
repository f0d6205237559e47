//! error types for the carbon ledger workflows

use thiserror::Error;

/// errors from the ledger gateway boundary
///
/// typed discriminators replace message inspection: a user abort is
/// `RejectedByUser`, a concurrent verification is `AlreadyVerified`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("no signer attached to the wallet context")]
    Unavailable,

    #[error("user rejected the transaction")]
    RejectedByUser,

    #[error("value already verified on the ledger")]
    AlreadyVerified,

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// errors from the cipher provider
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("cipher system failed to initialize: {0}")]
    Init(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// workflow-boundary errors surfaced to callers
///
/// every variant is also mirrored into a transient error status notice;
/// nothing here is fatal to the session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cipher initialization failed: {0}")]
    Init(String),

    #[error("cipher system not initialized")]
    NotInitialized,

    #[error("ledger gateway unavailable: connect a signer and retry")]
    GatewayUnavailable,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("transaction rejected by user")]
    TransactionRejected,

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("load failed: {0}")]
    Load(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} already running")]
    Busy(&'static str),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
