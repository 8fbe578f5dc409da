//! Core ledger functionality
//!
//! This module contains the fundamental ledger components: transactions and
//! their inputs/outputs, blocks and proof-of-work mining, the difficulty
//! schedule, reward rules, and the blockchain that owns chain and mempool.

pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, BlockData, BlockInfo};
pub use blockchain::{Blockchain, TransactionSearch, TX_PER_BLOCK};
pub use difficulty::{DifficultySchedule, DIFFICULTY_FACTOR, MAX_DIFFICULTY};
pub use monetary::{get_reward_amount, FEE_PER_TX};
pub use proof_of_work::ProofOfWork;
pub use transaction::{
    Transaction, TransactionData, TransactionInput, TransactionOutput, TransactionType,
};
