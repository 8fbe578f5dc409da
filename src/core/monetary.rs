//! Monetary rules of the ledger
//!
//! Amounts are plain integers. A miner earns a block reward that shrinks as
//! difficulty rises, plus a flat fee for every regular transaction it includes.

use crate::core::difficulty::MAX_DIFFICULTY;

/// Fee credited to the miner for every non-FEE transaction in a block
pub const FEE_PER_TX: i64 = 1;

/// Reward multiplier applied to the remaining difficulty headroom
pub const REWARD_PER_DIFFICULTY_STEP: i64 = 10;

/// Block reward for a given difficulty: `(MAX_DIFFICULTY - difficulty) * 10`
pub fn get_reward_amount(difficulty: u32) -> i64 {
    (MAX_DIFFICULTY as i64 - difficulty as i64) * REWARD_PER_DIFFICULTY_STEP
}

/// Total fees a miner may claim for `tx_count` regular transactions
pub fn collectable_fees(fee_per_tx: i64, tx_count: usize) -> i64 {
    fee_per_tx.saturating_mul(tx_count as i64)
}
