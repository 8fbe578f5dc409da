// Client-side workflows. Both only talk to the node through requests, so the
// slow part (mining) never runs anywhere near the chain lock.

use crate::core::{Block, BlockInfo, Transaction, TransactionOutput};
use crate::error::{Result, Validation};
use crate::network::{send_request, Request, WalletInfo};
use crate::wallet::Wallet;
use log::info;

/// Fetches the template, claims the full reward, mines locally and submits.
/// `None` when the node has nothing to mine.
pub fn mine_next(node: &str, miner: &Wallet) -> Result<Option<Block>> {
    let template: Option<BlockInfo> = send_request(node, &Request::NextBlock)?.into_result()?;
    let Some(info) = template else {
        return Ok(None);
    };

    let reward = Transaction::from_reward(TransactionOutput::new(
        miner.get_address(),
        info.max_reward(),
    ))?;
    let mut block = Block::from_block_info(&info)?;
    block.push_transaction(reward);

    info!(
        "Mining block #{} with {} transactions at difficulty {}",
        info.index,
        info.transactions.len(),
        info.difficulty
    );
    block.mine(info.difficulty, miner.get_address());

    let request = Request::SubmitBlock {
        block: serde_json::to_value(&block)?,
    };
    let validation: Validation = send_request(node, &request)?.into_result()?;
    info!("Block #{} accepted: {}", block.get_index(), validation.message);
    Ok(Some(block))
}

/// Pays `amount` to `to` out of `wallet`'s unspent outputs, change back to the wallet
pub fn send_funds(node: &str, wallet: &Wallet, to: &str, amount: i64) -> Result<Transaction> {
    let request = Request::GetWallet {
        address: wallet.get_address().to_string(),
    };
    let info: WalletInfo = send_request(node, &request)?.into_result()?;

    let tx = wallet.create_transfer(&info.utxo, to, amount, info.fee)?;
    let request = Request::SubmitTransaction {
        transaction: serde_json::to_value(&tx)?,
    };
    let validation: Validation = send_request(node, &request)?.into_result()?;
    info!("Transaction {} accepted", validation.message);
    Ok(tx)
}
