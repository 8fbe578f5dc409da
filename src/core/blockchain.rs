// This is the core ledger - the single owner of the chain and the mempool
// Every mutation goes through add_transaction or add_block, so the invariants
// (contiguous indexes, linked hashes, no duplicate transactions) hold by construction

use crate::core::{
    get_reward_amount, Block, BlockInfo, DifficultySchedule, Transaction, TransactionInput,
    TransactionOutput, FEE_PER_TX, MAX_DIFFICULTY,
};
use crate::error::{BlockchainError, Result, ValidationError};
use crate::storage::MemoryPool;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Transactions per mining template, and the pending-input limit per sender
pub const TX_PER_BLOCK: usize = 2;

/// Where a transaction lives. Both indexes are -1 when it is nowhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSearch {
    pub mempool_index: i64,
    pub block_index: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction: Option<Transaction>,
}

impl TransactionSearch {
    fn not_found() -> TransactionSearch {
        TransactionSearch {
            mempool_index: -1,
            block_index: -1,
            transaction: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,  // index 0 is genesis, append-only
    mempool: MemoryPool, // admitted but not yet mined
}

impl Blockchain {
    // I synthesize the genesis block here: one FEE transaction paying the founding address
    pub fn new(genesis_address: &str) -> Result<Blockchain> {
        let difficulty = DifficultySchedule::for_chain_length(0);
        let reward = Transaction::from_reward(TransactionOutput::new(
            genesis_address,
            get_reward_amount(difficulty),
        ))?;

        let mut genesis = Block::new(0, "", vec![reward])?;
        genesis.mine(difficulty, genesis_address);
        info!(
            "Created genesis block {} rewarding {genesis_address}",
            genesis.get_hash()
        );

        Ok(Blockchain {
            blocks: vec![genesis],
            mempool: MemoryPool::new(),
        })
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn get_mempool(&self) -> &MemoryPool {
        &self.mempool
    }

    pub fn get_last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("The chain always holds its genesis block")
    }

    pub fn get_block(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.get_hash() == hash)
    }

    pub fn get_block_by_index(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn get_difficulty(&self) -> u32 {
        DifficultySchedule::for_chain_length(self.blocks.len())
    }

    /// Difficulty that was in force when block `index` joined the chain
    pub fn get_difficulty_for_block(&self, index: usize) -> u32 {
        DifficultySchedule::for_block(index)
    }

    pub fn get_fee_per_tx(&self) -> i64 {
        FEE_PER_TX
    }

    pub fn get_reward_amount(difficulty: u32) -> i64 {
        get_reward_amount(difficulty)
    }

    // Admission control for the mempool
    pub fn add_transaction(
        &mut self,
        tx: Transaction,
    ) -> std::result::Result<String, ValidationError> {
        let result = self.check_transaction(&tx);
        if let Err(e) = result {
            warn!("Rejected transaction {}: {e}", tx.get_id());
            return Err(e);
        }

        let hash = tx.get_id().to_string();
        self.mempool.add(tx);
        info!(
            "Accepted transaction {hash} ({} pending)",
            self.mempool.len()
        );
        Ok(hash)
    }

    fn check_transaction(&self, tx: &Transaction) -> std::result::Result<(), ValidationError> {
        // Duplicates first: a re-submitted transaction must always be reported as such,
        // even when its inputs have been spent since
        if self.find_in_blocks(tx.get_id()).is_some() {
            return Err(ValidationError::DuplicateInChain);
        }
        if self.mempool.contains(tx.get_id()) {
            return Err(ValidationError::DuplicateInMempool);
        }

        if let Some(first) = tx.get_inputs().first() {
            let pending = self.mempool.pending_inputs_from(first.get_from_address());
            if pending >= TX_PER_BLOCK {
                return Err(ValidationError::PendingLimitExceeded { pending });
            }

            // One output, one input: listing it twice would double its value
            let mut referenced = HashSet::new();
            for input in tx.get_inputs() {
                let reference = (input.get_previous_tx_hash(), input.get_from_address());
                if !referenced.insert(reference) || !self.is_spendable(input) {
                    return Err(ValidationError::UtxoUnavailable);
                }
            }
        }

        if tx.is_fee() {
            return Err(ValidationError::TxInvalid(Box::new(
                ValidationError::FeeTxSubmitted,
            )));
        }
        tx.is_valid(self.get_difficulty(), self.get_fee_per_tx())
            .map_err(|e| ValidationError::TxInvalid(Box::new(e)))
    }

    // An input may spend an unspent output of its sender that nobody in the mempool claims yet
    fn is_spendable(&self, input: &TransactionInput) -> bool {
        let available = self
            .get_utxo(input.get_from_address())
            .iter()
            .any(|txo| {
                txo.get_producing_tx_hash() == input.get_previous_tx_hash()
                    && txo.get_amount() >= input.get_amount()
            });
        let claimed = self.mempool.pending_inputs().any(|pending| {
            pending.get_previous_tx_hash() == input.get_previous_tx_hash()
                && pending.get_from_address() == input.get_from_address()
        });
        available && !claimed
    }

    pub fn add_block(&mut self, block: Block) -> std::result::Result<String, ValidationError> {
        let info = self.get_next_block().ok_or(ValidationError::NoNextBlock)?;

        if let Err(e) = block.is_valid(
            &info.previous_hash,
            info.index - 1,
            info.difficulty,
            info.fee_per_tx,
        ) {
            warn!("Rejected block #{}: {e}", block.get_index());
            return Err(ValidationError::BlockInvalid(Box::new(e)));
        }

        // Every regular transaction must come out of the mempool, exactly once
        let mined: Vec<&str> = block
            .get_transactions()
            .iter()
            .filter(|tx| !tx.is_fee())
            .map(|tx| tx.get_id())
            .collect();
        let remaining = self.mempool.without(&mined);
        if remaining.len() + mined.len() != self.mempool.len() {
            warn!(
                "Rejected block #{}: transactions not drawn from the mempool",
                block.get_index()
            );
            return Err(ValidationError::MempoolMismatch);
        }

        self.mempool.replace(remaining);
        let hash = block.get_hash().to_string();
        info!(
            "Added block #{} {hash} by {} ({} transactions)",
            block.get_index(),
            block.get_miner(),
            block.get_transactions().len()
        );
        self.blocks.push(block);
        Ok(hash)
    }

    /// Re-validates every block against its predecessor, tip first,
    /// each at the difficulty pinned to its own index
    pub fn is_valid(&self) -> std::result::Result<(), ValidationError> {
        for index in (1..self.blocks.len()).rev() {
            let current = &self.blocks[index];
            let previous = &self.blocks[index - 1];
            current
                .is_valid(
                    previous.get_hash(),
                    previous.get_index(),
                    self.get_difficulty_for_block(index),
                    self.get_fee_per_tx(),
                )
                .map_err(|cause| ValidationError::ChainInvalid {
                    index,
                    cause: Box::new(cause),
                })?;
        }
        Ok(())
    }

    /// Checks the structural invariants no API call should ever break
    pub fn check_integrity(&self) -> Result<()> {
        if self.blocks.is_empty() {
            return Err(BlockchainError::Corrupted("missing genesis block".to_string()));
        }
        for (position, block) in self.blocks.iter().enumerate() {
            if block.get_index() != position as i64 {
                return Err(BlockchainError::Corrupted(format!(
                    "block at position {position} carries index {}",
                    block.get_index()
                )));
            }
        }
        Ok(())
    }

    /// Mining template for the next block, or `None` when there is nothing to mine
    pub fn get_next_block(&self) -> Option<BlockInfo> {
        if self.mempool.is_empty() {
            return None;
        }

        let info = BlockInfo {
            index: self.blocks.len() as i64,
            previous_hash: self.blocks.last()?.get_hash().to_string(),
            difficulty: self.get_difficulty(),
            max_difficulty: MAX_DIFFICULTY,
            fee_per_tx: self.get_fee_per_tx(),
            transactions: self.mempool.take(TX_PER_BLOCK),
        };
        debug!(
            "Next block template #{} with {} transactions at difficulty {}",
            info.index,
            info.transactions.len(),
            info.difficulty
        );
        Some(info)
    }

    fn committed_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.blocks
            .iter()
            .flat_map(|block| block.get_transactions().iter())
    }

    fn find_in_blocks(&self, hash: &str) -> Option<(usize, &Transaction)> {
        self.blocks.iter().enumerate().find_map(|(index, block)| {
            block
                .get_transactions()
                .iter()
                .find(|tx| tx.get_id() == hash)
                .map(|tx| (index, tx))
        })
    }

    /// Committed inputs signed by `wallet` (the mempool is not consulted)
    pub fn get_tx_inputs(&self, wallet: &str) -> Vec<TransactionInput> {
        self.committed_transactions()
            .flat_map(|tx| tx.get_inputs().iter())
            .filter(|input| input.get_from_address() == wallet)
            .cloned()
            .collect()
    }

    /// Committed outputs paying `wallet`
    pub fn get_tx_outputs(&self, wallet: &str) -> Vec<TransactionOutput> {
        self.committed_transactions()
            .flat_map(|tx| tx.get_outputs().iter())
            .filter(|output| output.get_to_address() == wallet)
            .cloned()
            .collect()
    }

    /// Unspent outputs of `wallet`.
    /// Spent outputs are matched to inputs by equal amount, not by exact
    /// reference, so two outputs of the same amount are interchangeable here.
    pub fn get_utxo(&self, wallet: &str) -> Vec<TransactionOutput> {
        let mut outputs = self.get_tx_outputs(wallet);
        for input in self.get_tx_inputs(wallet) {
            if let Some(position) = outputs
                .iter()
                .position(|output| output.get_amount() == input.get_amount())
            {
                outputs.remove(position);
            }
        }
        outputs
    }

    pub fn get_balance(&self, wallet: &str) -> i64 {
        self.get_utxo(wallet)
            .iter()
            .map(TransactionOutput::get_amount)
            .sum()
    }

    // I look in the mempool first, then in the committed blocks
    pub fn get_transaction(&self, hash: &str) -> TransactionSearch {
        if let Some(position) = self.mempool.position(hash) {
            return TransactionSearch {
                mempool_index: position as i64,
                block_index: -1,
                transaction: self.mempool.get(position).cloned(),
            };
        }

        match self.find_in_blocks(hash) {
            Some((index, tx)) => TransactionSearch {
                mempool_index: -1,
                block_index: index as i64,
                transaction: Some(tx.clone()),
            },
            None => TransactionSearch::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_utils::{
        mine_next_block, mine_template, signed_transfer, spend, TestWallet,
    };

    fn new_chain(founder: &TestWallet) -> Blockchain {
        Blockchain::new(&founder.address).unwrap()
    }

    #[test]
    fn test_genesis_chain() {
        let founder = TestWallet::new();
        let chain = new_chain(&founder);

        assert_eq!(chain.get_blocks().len(), 1);
        assert_eq!(chain.is_valid(), Ok(()));
        assert!(chain.check_integrity().is_ok());
        assert_eq!(chain.get_balance(&founder.address), get_reward_amount(0));

        let genesis = chain.get_last_block();
        assert_eq!(genesis.get_index(), 0);
        assert_eq!(genesis.get_transactions().len(), 1);
        assert!(genesis.get_transactions()[0].is_fee());
    }

    #[test]
    fn test_no_template_without_transactions() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        assert!(chain.get_next_block().is_none());

        let mut block = Block::new(1, chain.get_last_block().get_hash(), vec![]).unwrap();
        block.mine(1, &founder.address);
        assert_eq!(chain.add_block(block), Err(ValidationError::NoNextBlock));
    }

    #[test]
    fn test_add_transaction_and_template() {
        let founder = TestWallet::new();
        let recipient = TestWallet::new();
        let mut chain = new_chain(&founder);

        let tx = spend(&chain, &founder, &recipient.address, 10);
        let hash = chain.add_transaction(tx.clone()).unwrap();
        assert_eq!(hash, tx.get_id());

        let info = chain.get_next_block().unwrap();
        assert_eq!(info.index, 1);
        assert_eq!(info.previous_hash, chain.get_last_block().get_hash());
        assert_eq!(info.difficulty, 1);
        assert_eq!(info.max_difficulty, MAX_DIFFICULTY);
        assert_eq!(info.fee_per_tx, FEE_PER_TX);
        assert_eq!(info.transactions, vec![tx]);
    }

    #[test]
    fn test_template_of_emptied_chain_is_none() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        let tx = spend(&chain, &founder, "recipient", 10);
        chain.add_transaction(tx).unwrap();

        chain.blocks.clear();
        assert!(chain.get_next_block().is_none());
    }

    #[test]
    fn test_duplicate_transactions() {
        let founder = TestWallet::new();
        let recipient = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);

        let tx = spend(&chain, &founder, &recipient.address, 10);
        chain.add_transaction(tx.clone()).unwrap();
        assert_eq!(
            chain.add_transaction(tx.clone()),
            Err(ValidationError::DuplicateInMempool)
        );

        mine_next_block(&mut chain, &miner.address);
        assert_eq!(
            chain.add_transaction(tx),
            Err(ValidationError::DuplicateInChain)
        );
    }

    #[test]
    fn test_unknown_or_spent_utxo() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);

        let forged = signed_transfer(&founder, "no_such_tx", 10, "someone", 9);
        assert_eq!(
            chain.add_transaction(forged),
            Err(ValidationError::UtxoUnavailable)
        );

        let genesis_tx = chain.get_last_block().get_transactions()[0].get_id().to_string();
        let too_much = signed_transfer(&founder, &genesis_tx, 10_000, "someone", 9);
        assert_eq!(
            chain.add_transaction(too_much),
            Err(ValidationError::UtxoUnavailable)
        );
    }

    #[test]
    fn test_double_spend_in_mempool() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);

        chain
            .add_transaction(spend(&chain, &founder, "alice", 10))
            .unwrap();
        let second = spend(&chain, &founder, "bob", 10);
        assert_eq!(
            chain.add_transaction(second),
            Err(ValidationError::UtxoUnavailable)
        );
    }

    #[test]
    fn test_same_output_spent_twice_in_one_tx() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        let genesis_tx = chain.get_last_block().get_transactions()[0].get_id().to_string();
        let value = get_reward_amount(0);

        let mut inputs = vec![];
        for _ in 0..2 {
            let mut input = TransactionInput::new(&genesis_tx, &founder.address, value);
            input.sign(&founder.private_key).unwrap();
            inputs.push(input);
        }
        let doubled = Transaction::new(
            crate::core::TransactionType::Regular,
            inputs,
            vec![TransactionOutput::new("thief", 2 * value - 1)],
        )
        .unwrap();

        assert_eq!(
            chain.add_transaction(doubled),
            Err(ValidationError::UtxoUnavailable)
        );
        assert!(chain.get_mempool().is_empty());
        assert_eq!(chain.get_balance(&founder.address), value);
        assert_eq!(chain.get_balance("thief"), 0);
    }

    #[test]
    fn test_pending_limit() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        let genesis_tx = chain.get_last_block().get_transactions()[0].get_id().to_string();

        chain.mempool.add(signed_transfer(&founder, "a", 10, "x", 9));
        chain.mempool.add(signed_transfer(&founder, "b", 10, "x", 9));

        let tx = signed_transfer(&founder, &genesis_tx, 10, "x", 9);
        assert_eq!(
            chain.add_transaction(tx),
            Err(ValidationError::PendingLimitExceeded { pending: 2 })
        );
    }

    #[test]
    fn test_invalid_transaction_is_wrapped() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        let genesis_tx = chain.get_last_block().get_transactions()[0].get_id().to_string();

        let greedy = signed_transfer(&founder, &genesis_tx, 10, "someone", 11);
        let err = chain.add_transaction(greedy).unwrap_err();
        assert!(matches!(err, ValidationError::TxInvalid(_)));
        assert!(err.to_string().starts_with("Invalid tx: "));
        assert!(chain.get_mempool().is_empty());
    }

    #[test]
    fn test_fee_transactions_cannot_be_submitted() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        let reward = Transaction::from_reward(TransactionOutput::new("me", 1)).unwrap();
        assert_eq!(
            chain.add_transaction(reward),
            Err(ValidationError::TxInvalid(Box::new(
                ValidationError::FeeTxSubmitted
            )))
        );
    }

    #[test]
    fn test_add_block_moves_transactions_out_of_mempool() {
        let founder = TestWallet::new();
        let recipient = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);

        let tx = spend(&chain, &founder, &recipient.address, 10);
        chain.add_transaction(tx.clone()).unwrap();
        let block = mine_next_block(&mut chain, &miner.address);

        assert_eq!(chain.get_blocks().len(), 2);
        assert!(chain.get_mempool().is_empty());
        assert_eq!(chain.get_last_block(), &block);
        assert_eq!(chain.is_valid(), Ok(()));

        assert_eq!(chain.get_balance(&recipient.address), 10);
        assert_eq!(
            chain.get_balance(&founder.address),
            get_reward_amount(0) - 10 - FEE_PER_TX
        );
        assert_eq!(
            chain.get_balance(&miner.address),
            get_reward_amount(1) + FEE_PER_TX
        );
    }

    #[test]
    fn test_block_with_negative_index_is_rejected() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);
        chain
            .add_transaction(spend(&chain, &founder, "someone", 10))
            .unwrap();

        let mut info = chain.get_next_block().unwrap();
        info.index = -1;
        let block = mine_template(&info, &miner.address);

        let err = chain.add_block(block).unwrap_err();
        assert!(err.to_string().contains("index"));
        assert_eq!(chain.get_blocks().len(), 1);
        assert_eq!(chain.get_mempool().len(), 1);
    }

    #[test]
    fn test_block_with_foreign_transaction_is_rejected() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);
        chain
            .add_transaction(spend(&chain, &founder, "someone", 10))
            .unwrap();

        let mut info = chain.get_next_block().unwrap();
        let outsider = TestWallet::new();
        info.transactions = vec![signed_transfer(&outsider, "elsewhere", 10, "x", 9)];
        let block = mine_template(&info, &miner.address);

        assert_eq!(chain.add_block(block), Err(ValidationError::MempoolMismatch));
        assert_eq!(chain.get_blocks().len(), 1);
        assert_eq!(chain.get_mempool().len(), 1);
    }

    #[test]
    fn test_stale_template_loses_the_race() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);
        chain
            .add_transaction(spend(&chain, &founder, "someone", 10))
            .unwrap();

        let info = chain.get_next_block().unwrap();
        let first = mine_template(&info, &miner.address);
        let second = mine_template(&info, &miner.address);

        assert!(chain.add_block(first).is_ok());
        assert_eq!(chain.add_block(second), Err(ValidationError::NoNextBlock));
        assert_eq!(chain.get_blocks().len(), 2);
    }

    #[test]
    fn test_template_takes_at_most_tx_per_block() {
        let founder = TestWallet::new();
        let mut chain = new_chain(&founder);
        for (index, sender) in ["a", "b", "c"].iter().enumerate() {
            chain
                .mempool
                .add(signed_transfer(&founder, sender, 10 + index as i64, "x", 9));
        }
        assert_eq!(chain.get_next_block().unwrap().transactions.len(), TX_PER_BLOCK);
    }

    #[test]
    fn test_is_valid_reports_failing_block() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);
        chain
            .add_transaction(spend(&chain, &founder, "someone", 10))
            .unwrap();
        mine_next_block(&mut chain, &miner.address);
        assert_eq!(chain.is_valid(), Ok(()));

        let tampered = chain.blocks[0].clone();
        chain.blocks[0] = Block::new(0, "", tampered.get_transactions().to_vec()).unwrap();
        match chain.is_valid() {
            Err(ValidationError::ChainInvalid { index, cause }) => {
                assert_eq!(index, 1);
                assert_eq!(*cause, ValidationError::PreviousHashInvalid);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_chain_links_and_difficulty_over_many_blocks() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);

        for _ in 0..6 {
            chain
                .add_transaction(spend(&chain, &founder, "someone", 1))
                .unwrap();
            mine_next_block(&mut chain, &miner.address);
        }

        assert_eq!(chain.get_blocks().len(), 7);
        assert_eq!(chain.get_difficulty(), 2);
        assert_eq!(chain.is_valid(), Ok(()));
        for index in 1..chain.get_blocks().len() {
            let block = &chain.get_blocks()[index];
            assert_eq!(block.get_index(), index as i64);
            assert_eq!(block.get_previous_hash(), chain.get_blocks()[index - 1].get_hash());
            let prefix = DifficultySchedule::target_prefix(chain.get_difficulty_for_block(index));
            assert!(block.get_hash().starts_with(&prefix));
        }
        assert_eq!(chain.get_difficulty_for_block(6), 2);
    }

    #[test]
    fn test_get_transaction() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);

        let genesis_tx = chain.get_last_block().get_transactions()[0].clone();
        let found = chain.get_transaction(genesis_tx.get_id());
        assert_eq!(found.block_index, 0);
        assert_eq!(found.mempool_index, -1);
        assert_eq!(found.transaction, Some(genesis_tx));

        let tx = spend(&chain, &founder, "someone", 10);
        chain.add_transaction(tx.clone()).unwrap();
        let pending = chain.get_transaction(tx.get_id());
        assert_eq!(pending.mempool_index, 0);
        assert_eq!(pending.block_index, -1);

        mine_next_block(&mut chain, &miner.address);
        assert_eq!(chain.get_transaction(tx.get_id()).block_index, 1);

        assert_eq!(chain.get_transaction("missing"), TransactionSearch::not_found());
    }

    #[test]
    fn test_utxo_matching_by_amount() {
        let founder = TestWallet::new();
        let miner = TestWallet::new();
        let mut chain = new_chain(&founder);

        chain
            .add_transaction(spend(&chain, &founder, "someone", 10))
            .unwrap();
        mine_next_block(&mut chain, &miner.address);

        let utxo = chain.get_utxo(&founder.address);
        assert_eq!(utxo.len(), 1);
        assert_eq!(utxo[0].get_amount(), get_reward_amount(0) - 11);
        assert_eq!(chain.get_tx_inputs(&founder.address).len(), 1);
        assert_eq!(chain.get_tx_outputs(&founder.address).len(), 2);
    }

    #[test]
    fn test_reward_amount() {
        assert_eq!(Blockchain::get_reward_amount(0), 620);
        assert_eq!(Blockchain::get_reward_amount(MAX_DIFFICULTY), 0);
    }
}
