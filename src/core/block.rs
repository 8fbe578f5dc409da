use crate::core::monetary::collectable_fees;
use crate::core::{ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result, ValidationError};
use crate::utils::{current_timestamp, sha256_hex};
use serde::{Deserialize, Serialize};

/// Everything a miner needs to build the next acceptable block.
/// A read-only snapshot, not a reservation: two miners may hold the same one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub index: i64,
    pub previous_hash: String,
    pub difficulty: u32,
    pub max_difficulty: u32,
    pub fee_per_tx: i64,
    pub transactions: Vec<Transaction>,
}

impl BlockInfo {
    /// Largest reward a miner may claim for this template
    pub fn max_reward(&self) -> i64 {
        let regular = self.transactions.iter().filter(|tx| !tx.is_fee()).count();
        crate::core::get_reward_amount(self.difficulty)
            .saturating_add(collectable_fees(self.fee_per_tx, regular))
    }
}

/// Block fields as they arrive from outside, before defaults are resolved
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockData {
    pub index: i64,
    pub timestamp: Option<i64>,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    pub nonce: i64,
    pub miner: String,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "BlockData")]
pub struct Block {
    index: i64,
    timestamp: i64,
    previous_hash: String,
    transactions: Vec<Transaction>,
    nonce: i64,
    miner: String,
    hash: String,
}

impl TryFrom<BlockData> for Block {
    type Error = BlockchainError;

    fn try_from(data: BlockData) -> Result<Self> {
        Block::from_data(data)
    }
}

impl Block {
    /// A fresh, unmined block stamped with the current time
    pub fn new(index: i64, previous_hash: &str, transactions: Vec<Transaction>) -> Result<Block> {
        Block::from_data(BlockData {
            index,
            timestamp: Some(current_timestamp()?),
            previous_hash: previous_hash.to_string(),
            transactions,
            ..Default::default()
        })
    }

    pub fn from_data(data: BlockData) -> Result<Block> {
        let timestamp = match data.timestamp {
            Some(timestamp) => timestamp,
            None => current_timestamp()?,
        };
        let mut block = Block {
            index: data.index,
            timestamp,
            previous_hash: data.previous_hash,
            transactions: data.transactions,
            nonce: data.nonce,
            miner: data.miner,
            hash: String::new(),
        };
        block.hash = match data.hash.filter(|hash| !hash.is_empty()) {
            Some(hash) => hash,
            None => block.calculate_hash(),
        };
        Ok(block)
    }

    /// Copies index, previous hash and transactions from a mining template
    pub fn from_block_info(info: &BlockInfo) -> Result<Block> {
        Block::new(info.index, &info.previous_hash, info.transactions.clone())
    }

    /// Only meaningful before mining; the content hash follows the new list
    pub fn push_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
        self.hash = self.calculate_hash();
    }

    pub(crate) fn hash_with_nonce(&self, nonce: i64) -> String {
        let tx_hashes: String = self
            .transactions
            .iter()
            .map(|tx| tx.get_id())
            .collect();
        sha256_hex(&format!(
            "{}{}{}{}{}{}",
            self.index, self.previous_hash, tx_hashes, self.timestamp, nonce, self.miner
        ))
    }

    /// Content hash for the current nonce
    pub fn calculate_hash(&self) -> String {
        self.hash_with_nonce(self.nonce)
    }

    /// Unmined -> Mined. The only unbounded operation in the ledger;
    /// never call it while holding the chain lock.
    pub fn mine(&mut self, difficulty: u32, miner: &str) {
        self.miner = miner.to_string();
        let (nonce, hash) = ProofOfWork::new(difficulty).run(self);
        self.nonce = nonce;
        self.hash = hash;
    }

    pub fn is_valid(
        &self,
        previous_hash: &str,
        previous_index: i64,
        difficulty: u32,
        fee_per_tx: i64,
    ) -> std::result::Result<(), ValidationError> {
        // Cheap structural checks first
        // Indexes arrive from outside; never let them overflow
        let expected = previous_index.checked_add(1);
        if expected != Some(self.index) {
            return Err(ValidationError::IndexInvalid {
                expected: expected.unwrap_or(i64::MAX),
                found: self.index,
            });
        }
        if self.previous_hash != previous_hash {
            return Err(ValidationError::PreviousHashInvalid);
        }
        if self.timestamp < 1 {
            return Err(ValidationError::TimestampInvalid);
        }
        if self.nonce < 1 || self.miner.is_empty() {
            return Err(ValidationError::NotMined);
        }

        let fee_txs: Vec<&Transaction> = self.transactions.iter().filter(|tx| tx.is_fee()).collect();
        let fee_tx = match fee_txs.as_slice() {
            [] => return Err(ValidationError::NoFeeTx),
            [fee_tx] => fee_tx,
            _ => return Err(ValidationError::MultipleFeeTx),
        };
        match fee_tx.get_outputs() {
            [reward] if reward.get_to_address() == self.miner => {}
            [_] => return Err(ValidationError::FeeRecipientMismatch),
            _ => return Err(ValidationError::FeeOutputsInvalid),
        }

        let regular_count = self.transactions.len() - 1;
        let total_fees = collectable_fees(fee_per_tx, regular_count);
        let errors: Vec<String> = self
            .transactions
            .iter()
            .filter_map(|tx| tx.is_valid(difficulty, total_fees).err())
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(ValidationError::InvalidTransactions(errors));
        }

        if !ProofOfWork::new(difficulty).validate(self) {
            return Err(ValidationError::HashInvalid);
        }
        Ok(())
    }

    pub fn get_index(&self) -> i64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn get_miner(&self) -> &str {
        self.miner.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }
}
