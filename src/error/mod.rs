//! Error handling for the ledger
//!
//! Two kinds of failure live here. `BlockchainError` covers the environment and
//! programming-error class (crypto, I/O, transport, broken invariants).
//! `ValidationError` covers expected rejections of blocks and transactions; it
//! travels over the wire as a `Validation` result instead of an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Errors that are not plain validation failures
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Cryptographic operation errors
    Crypto(String),
    /// Network communication errors
    Network(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// In-memory chain or mempool invariants no longer hold
    Corrupted(String),
    /// A node refused a request
    Rejected { status: u16, message: String },
    /// Wallet cannot cover an amount plus its fee
    InsufficientFunds { required: i64, available: i64 },
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Corrupted(msg) => write!(f, "Corrupted chain state: {msg}"),
            BlockchainError::Rejected { status, message } => {
                write!(f, "Request rejected ({status}): {message}")
            }
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "Insufficient funds: required {required}, available {available}"
            ),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

/// Every way a transaction, block or chain can be rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    // Inputs and outputs
    AmountInvalid,
    MissingReference,
    MissingSignature,
    BadSignature,

    // Transactions
    HashMismatch,
    OutputsInvalid,
    InputInvalid(Vec<String>),
    InsufficientInputs { inputs: i64, outputs: i64 },
    OutputNotBoundToTx,
    RewardExceeded { amount: i64, allowed: i64 },

    // Blocks
    IndexInvalid { expected: i64, found: i64 },
    PreviousHashInvalid,
    TimestampInvalid,
    NotMined,
    NoFeeTx,
    MultipleFeeTx,
    FeeRecipientMismatch,
    FeeOutputsInvalid,
    InvalidTransactions(Vec<String>),
    HashInvalid,

    // Chain and mempool admission
    PendingLimitExceeded { pending: usize },
    UtxoUnavailable,
    FeeTxSubmitted,
    TxInvalid(Box<ValidationError>),
    DuplicateInChain,
    DuplicateInMempool,
    NoNextBlock,
    BlockInvalid(Box<ValidationError>),
    MempoolMismatch,
    ChainInvalid { index: usize, cause: Box<ValidationError> },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::AmountInvalid => write!(f, "Amount must be greater than 0."),
            ValidationError::MissingReference => write!(f, "Previous tx is required."),
            ValidationError::MissingSignature => write!(f, "Signature is required."),
            ValidationError::BadSignature => write!(f, "Invalid tx input signature."),
            ValidationError::HashMismatch => write!(f, "Invalid hash."),
            ValidationError::OutputsInvalid => write!(f, "Invalid TXO."),
            ValidationError::InputInvalid(messages) => {
                write!(f, "Invalid tx input: {}", messages.join(" "))
            }
            ValidationError::InsufficientInputs { inputs, outputs } => write!(
                f,
                "Invalid tx: input amounts ({inputs}) must be equal to or greater than output amounts ({outputs})."
            ),
            ValidationError::OutputNotBoundToTx => write!(f, "Invalid TXO reference hash."),
            ValidationError::RewardExceeded { amount, allowed } => {
                write!(f, "Invalid tx reward: {amount} exceeds the allowed {allowed}.")
            }
            ValidationError::IndexInvalid { expected, found } => {
                write!(f, "Invalid index: expected {expected}, found {found}.")
            }
            ValidationError::PreviousHashInvalid => write!(f, "Invalid previous hash."),
            ValidationError::TimestampInvalid => write!(f, "Invalid timestamp."),
            ValidationError::NotMined => write!(f, "Block not mined."),
            ValidationError::NoFeeTx => write!(f, "No fee tx."),
            ValidationError::MultipleFeeTx => {
                write!(f, "Too many fees: only one fee transaction is allowed.")
            }
            ValidationError::FeeRecipientMismatch => {
                write!(f, "Invalid fee tx: recipient different from miner.")
            }
            ValidationError::FeeOutputsInvalid => {
                write!(f, "Invalid fee tx: exactly one output is required.")
            }
            ValidationError::InvalidTransactions(messages) => {
                write!(f, "Invalid block due to invalid tx: {}", messages.join(" "))
            }
            ValidationError::HashInvalid => write!(f, "Invalid block hash."),
            ValidationError::PendingLimitExceeded { pending } => {
                write!(f, "This wallet already has {pending} pending tx inputs.")
            }
            ValidationError::UtxoUnavailable => {
                write!(f, "Invalid tx: the TXO is already spent or nonexistent.")
            }
            ValidationError::FeeTxSubmitted => {
                write!(f, "Fee transactions are only accepted inside mined blocks.")
            }
            ValidationError::TxInvalid(cause) => write!(f, "Invalid tx: {cause}"),
            ValidationError::DuplicateInChain => write!(f, "Duplicated tx in blockchain."),
            ValidationError::DuplicateInMempool => write!(f, "Duplicated tx in mempool."),
            ValidationError::NoNextBlock => write!(f, "There is no next block info."),
            ValidationError::BlockInvalid(cause) => write!(f, "Invalid block: {cause}"),
            ValidationError::MempoolMismatch => write!(f, "Invalid tx in block: mempool."),
            ValidationError::ChainInvalid { index, cause } => {
                write!(f, "Invalid block #{index}: {cause}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Wire form of a validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub success: bool,
    pub message: String,
}

impl Default for Validation {
    fn default() -> Self {
        Validation::ok()
    }
}

impl Validation {
    pub fn ok() -> Validation {
        Validation {
            success: true,
            message: String::new(),
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Validation {
        Validation {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Validation {
        Validation {
            success: false,
            message: message.into(),
        }
    }
}

impl From<&std::result::Result<(), ValidationError>> for Validation {
    fn from(result: &std::result::Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Validation::ok(),
            Err(e) => Validation::failed(e.to_string()),
        }
    }
}

impl From<std::result::Result<String, ValidationError>> for Validation {
    fn from(result: std::result::Result<String, ValidationError>) -> Self {
        match result {
            Ok(message) => Validation::ok_with(message),
            Err(e) => Validation::failed(e.to_string()),
        }
    }
}
