//! Test utilities for ledger testing

use crate::core::{
    Block, BlockInfo, Blockchain, Transaction, TransactionInput, TransactionOutput,
    TransactionType,
};
use crate::wallet::Wallet;
use serde_json::json;

/// A wallet whose keys tests can reach directly
pub struct TestWallet {
    pub address: String,
    pub private_key: String,
}

impl TestWallet {
    pub fn new() -> TestWallet {
        let wallet = Wallet::new().expect("key generation should work in tests");
        TestWallet {
            address: wallet.get_address().to_string(),
            private_key: wallet.get_private_key().to_string(),
        }
    }

    pub fn wallet(&self) -> Wallet {
        Wallet::from_private_key(&self.private_key).expect("test key should load")
    }
}

impl Default for TestWallet {
    fn default() -> Self {
        Self::new()
    }
}

/// An output as it would appear inside transaction `tx_hash`
pub fn funded_output(owner: &str, amount: i64, tx_hash: &str) -> TransactionOutput {
    serde_json::from_value(json!({
        "toAddress": owner,
        "amount": amount,
        "producingTxHash": tx_hash,
    }))
    .expect("output json should decode")
}

/// A signed one-input, one-output transfer; the fee is `input_amount - output_amount`
pub fn signed_transfer(
    from: &TestWallet,
    previous_tx: &str,
    input_amount: i64,
    to: &str,
    output_amount: i64,
) -> Transaction {
    let mut input = TransactionInput::new(previous_tx, &from.address, input_amount);
    input.sign(&from.private_key).expect("signing should work");
    Transaction::new(
        TransactionType::Regular,
        vec![input],
        vec![TransactionOutput::new(to, output_amount)],
    )
    .expect("transaction should build")
}

/// A transfer paid from `from`'s current unspent outputs, with change and the standard fee
pub fn spend(chain: &Blockchain, from: &TestWallet, to: &str, amount: i64) -> Transaction {
    from.wallet()
        .create_transfer(
            &chain.get_utxo(&from.address),
            to,
            amount,
            chain.get_fee_per_tx(),
        )
        .expect("sender should be funded")
}

/// Appends the largest allowed reward to a template and mines it
pub fn mine_template(info: &BlockInfo, miner: &str) -> Block {
    let reward = Transaction::from_reward(TransactionOutput::new(miner, info.max_reward()))
        .expect("reward should build");
    let mut block = Block::from_block_info(info).expect("block should build");
    block.push_transaction(reward);
    block.mine(info.difficulty, miner);
    block
}

/// Mines the current template and adds it to `chain`
pub fn mine_next_block(chain: &mut Blockchain, miner: &str) -> Block {
    let info = chain
        .get_next_block()
        .expect("mempool should not be empty");
    let block = mine_template(&info, miner);
    chain
        .add_block(block.clone())
        .expect("freshly mined block should be accepted");
    block
}
