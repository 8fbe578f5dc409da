use crate::core::{Block, DifficultySchedule};
use log::{debug, info};

/// Leading-zero proof of work over a block's content hash
pub struct ProofOfWork {
    difficulty: u32,
    prefix: String,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> ProofOfWork {
        ProofOfWork {
            difficulty,
            prefix: DifficultySchedule::target_prefix(difficulty),
        }
    }

    /// Validate proof-of-work for a block: the stored hash must be the real
    /// content hash and carry the required prefix
    pub fn validate(&self, block: &Block) -> bool {
        block.get_hash() == block.calculate_hash()
            && DifficultySchedule::meets_target(block.get_hash(), self.difficulty)
    }

    /// Increments the nonce until the content hash meets the target.
    /// No iteration bound and no cancellation: the caller owns a private copy
    /// of the block and simply drops it to give up.
    pub fn run(&self, block: &Block) -> (i64, String) {
        let mut nonce = block.get_nonce();
        debug!(
            "Mining block #{} with difficulty {}",
            block.get_index(),
            self.difficulty
        );
        loop {
            nonce += 1;
            let hash = block.hash_with_nonce(nonce);
            if hash.starts_with(&self.prefix) {
                info!("Mined block #{}: {hash} (nonce {nonce})", block.get_index());
                return (nonce, hash);
            }
        }
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Transaction, TransactionOutput};

    fn create_test_block() -> Block {
        let reward = Transaction::from_reward(TransactionOutput::new("miner", 10)).unwrap();
        Block::new(1, "previous_hash", vec![reward]).unwrap()
    }

    #[test]
    fn test_run_meets_prefix() {
        let block = create_test_block();
        let pow = ProofOfWork::new(2);
        let (nonce, hash) = pow.run(&block);

        assert!(nonce >= 1);
        assert!(hash.starts_with("00"));
        assert_eq!(hash, block.hash_with_nonce(nonce));
    }

    #[test]
    fn test_validate_requires_mined_hash() {
        let mut block = create_test_block();
        block.mine(1, "miner");
        assert!(ProofOfWork::new(1).validate(&block));
        assert!(!ProofOfWork::new(64).validate(&block));
        assert_eq!(ProofOfWork::new(1).get_difficulty(), 1);
    }

    #[test]
    fn test_zero_difficulty_stops_at_first_nonce() {
        let block = create_test_block();
        let (nonce, _) = ProofOfWork::new(0).run(&block);
        assert_eq!(nonce, 1);
    }
}
