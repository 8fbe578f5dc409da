use crate::core::{Transaction, TransactionInput, TransactionOutput, TransactionType};
use crate::error::{BlockchainError, Result};
use crate::utils::{new_key_pair, public_key_of};
use log::debug;

#[derive(Clone)]
pub struct Wallet {
    private_key: String, // hex PKCS#8 document
    public_key: String,  // hex, also the wallet address
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let (private_key, public_key) = new_key_pair()?;
        Ok(Wallet {
            private_key,
            public_key,
        })
    }

    /// Recovers a wallet from its exported private key
    pub fn from_private_key(private_key: &str) -> Result<Wallet> {
        let public_key = public_key_of(private_key)?;
        Ok(Wallet {
            private_key: private_key.to_string(),
            public_key,
        })
    }

    pub fn get_address(&self) -> &str {
        self.public_key.as_str()
    }

    pub fn get_private_key(&self) -> &str {
        self.private_key.as_str()
    }

    // I spend whole outputs, oldest first, until amount + fee is covered;
    // whatever is left over comes back to me as change
    pub fn create_transfer(
        &self,
        utxo: &[TransactionOutput],
        to: &str,
        amount: i64,
        fee: i64,
    ) -> Result<Transaction> {
        let required = amount.saturating_add(fee);
        let mut inputs = vec![];
        let mut accumulated = 0i64;
        for txo in utxo {
            if accumulated >= required {
                break;
            }
            inputs.push(TransactionInput::from_txo(txo));
            accumulated = accumulated.saturating_add(txo.get_amount());
        }

        if amount < 1 || accumulated < required {
            return Err(BlockchainError::InsufficientFunds {
                required,
                available: accumulated,
            });
        }

        for input in inputs.iter_mut() {
            input.sign(&self.private_key)?;
        }

        let mut outputs = vec![TransactionOutput::new(to, amount)];
        let change = accumulated - required;
        if change > 0 {
            outputs.push(TransactionOutput::new(self.get_address(), change));
        }

        debug!(
            "Built transfer of {amount} to {to} from {} inputs ({change} change)",
            inputs.len()
        );
        Transaction::new(TransactionType::Regular, inputs, outputs)
    }
}
