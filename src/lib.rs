//! # Protochain - a single-process UTXO ledger
//!
//! One in-memory chain of proof-of-work blocks, a mempool in front of it, and
//! a small TCP node that exposes both. Built for teaching, not for a network.
//!
//! ## How the code is organized
//! - `core/`: transactions, blocks, mining, the difficulty schedule, rewards
//!   and the `Blockchain` that owns chain and mempool
//! - `storage/`: the memory pool
//! - `wallet/`: key pairs and building signed transfers
//! - `network/`: the node API over a shared chain, its TCP server and client
//! - `config/`: environment-backed settings
//! - `utils/`: hashing, signing and JSON helpers
//! - `cli/`: command-line parsing plus the miner and wallet workflows
//!
//! ## Ground rules
//! - `Blockchain` is the only thing that mutates the chain or the mempool
//! - Rejections are `ValidationError`s, expected and frequent; everything
//!   else that can go wrong is a `BlockchainError`
//! - Mining happens on a private copy of a block, never under the chain lock

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    Block, BlockInfo, Blockchain, DifficultySchedule, ProofOfWork, Transaction,
    TransactionInput, TransactionOutput, TransactionSearch, TransactionType, FEE_PER_TX,
    MAX_DIFFICULTY, TX_PER_BLOCK,
};
pub use error::{BlockchainError, Result, Validation, ValidationError};
pub use network::{send_request, ApiResponse, NodeApi, Request, Server};
pub use storage::MemoryPool;
pub use utils::{current_timestamp, new_key_pair, sha256_hex, sign_message, verify_signature};
pub use wallet::Wallet;
