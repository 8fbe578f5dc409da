// This file implements the transaction system - the way value moves in my ledger
// Outputs are claims on value, inputs spend earlier outputs, and every transaction
// hashes its own contents so any tampering shows up on validation

use crate::core::monetary::get_reward_amount;
use crate::error::{BlockchainError, Result, ValidationError};
use crate::utils::{current_timestamp, sha256_hex, sign_message, verify_signature};
use serde::{Deserialize, Serialize};

fn sum_amounts(amounts: impl Iterator<Item = i64>) -> i64 {
    amounts.fold(0i64, |acc, amount| acc.saturating_add(amount))
}

// REGULAR moves existing value, FEE pays the miner of a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    #[default]
    Regular,
    Fee,
}

impl TransactionType {
    fn code(&self) -> u8 {
        match self {
            TransactionType::Regular => 1,
            TransactionType::Fee => 2,
        }
    }
}

// This represents a transaction input - a signed claim against one earlier output
// Think of it as "I spend 10 of what transaction ABC123 paid me"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionInput {
    previous_tx_hash: String, // Hash of the transaction that produced the output I spend
    from_address: String,     // My public key, used to check the signature
    amount: i64,
    signature: String,
}

impl TransactionInput {
    // When I create a new transaction input (before signing)
    pub fn new(previous_tx_hash: &str, from_address: &str, amount: i64) -> TransactionInput {
        TransactionInput {
            previous_tx_hash: previous_tx_hash.to_string(),
            from_address: from_address.to_string(),
            amount,
            signature: String::new(),
        }
    }

    /// Builds an unsigned input that spends the whole of `txo`
    pub fn from_txo(txo: &TransactionOutput) -> TransactionInput {
        TransactionInput::new(&txo.producing_tx_hash, &txo.to_address, txo.amount)
    }

    pub fn get_previous_tx_hash(&self) -> &str {
        self.previous_tx_hash.as_str()
    }

    pub fn get_from_address(&self) -> &str {
        self.from_address.as_str()
    }

    pub fn get_amount(&self) -> i64 {
        self.amount
    }

    pub fn get_signature(&self) -> &str {
        self.signature.as_str()
    }

    /// The message that gets signed
    pub fn get_hash(&self) -> String {
        sha256_hex(&format!(
            "{}{}{}",
            self.previous_tx_hash, self.from_address, self.amount
        ))
    }

    pub fn sign(&mut self, private_key: &str) -> Result<()> {
        self.signature = sign_message(&self.get_hash(), private_key)?;
        Ok(())
    }

    pub fn is_valid(&self) -> std::result::Result<(), ValidationError> {
        if self.previous_tx_hash.is_empty() {
            return Err(ValidationError::MissingReference);
        }
        if self.signature.is_empty() {
            return Err(ValidationError::MissingSignature);
        }
        if self.amount < 1 {
            return Err(ValidationError::AmountInvalid);
        }
        if !verify_signature(&self.get_hash(), &self.signature, &self.from_address) {
            return Err(ValidationError::BadSignature);
        }
        Ok(())
    }
}

// This represents a transaction output - value that the owner of `to_address` can spend later
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionOutput {
    to_address: String,
    amount: i64,
    producing_tx_hash: String, // Always the hash of the transaction that holds me
}

impl TransactionOutput {
    pub fn new(to_address: &str, amount: i64) -> TransactionOutput {
        TransactionOutput {
            to_address: to_address.to_string(),
            amount,
            producing_tx_hash: String::new(),
        }
    }

    pub fn get_to_address(&self) -> &str {
        self.to_address.as_str()
    }

    pub fn get_amount(&self) -> i64 {
        self.amount
    }

    pub fn get_producing_tx_hash(&self) -> &str {
        self.producing_tx_hash.as_str()
    }

    pub fn get_hash(&self) -> String {
        sha256_hex(&format!("{}{}", self.to_address, self.amount))
    }

    pub fn is_valid(&self) -> std::result::Result<(), ValidationError> {
        if self.amount < 1 {
            return Err(ValidationError::AmountInvalid);
        }
        Ok(())
    }
}

/// Transaction fields as they arrive from outside, before defaults are resolved
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionData {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub timestamp: Option<i64>,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub hash: Option<String>,
}

// This is the main transaction structure - an atomic transfer of value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TransactionData")]
pub struct Transaction {
    #[serde(rename = "type")]
    tx_type: TransactionType,
    timestamp: i64,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
    hash: String,
}

impl TryFrom<TransactionData> for Transaction {
    type Error = BlockchainError;

    fn try_from(data: TransactionData) -> Result<Self> {
        Transaction::from_data(data)
    }
}

impl Transaction {
    // When I build a fresh transaction: timestamp now, hash fixed, outputs bound to it
    pub fn new(
        tx_type: TransactionType,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Transaction> {
        Transaction::from_data(TransactionData {
            tx_type,
            timestamp: Some(current_timestamp()?),
            inputs,
            outputs,
            hash: None,
        })
    }

    /// Resolves defaults once: a missing timestamp becomes "now" and a missing
    /// hash is computed, in which case the outputs are bound to it.
    /// A supplied hash is kept as-is so validation can catch tampering.
    pub fn from_data(data: TransactionData) -> Result<Transaction> {
        let timestamp = match data.timestamp {
            Some(timestamp) => timestamp,
            None => current_timestamp()?,
        };
        let mut tx = Transaction {
            tx_type: data.tx_type,
            timestamp,
            inputs: data.inputs,
            outputs: data.outputs,
            hash: String::new(),
        };

        match data.hash.filter(|hash| !hash.is_empty()) {
            Some(hash) => tx.hash = hash,
            None => tx.seal(),
        }
        Ok(tx)
    }

    /// The only sanctioned way to build a reward transaction
    pub fn from_reward(output: TransactionOutput) -> Result<Transaction> {
        Transaction::new(TransactionType::Fee, vec![], vec![output])
    }

    // I fix the hash and back-fill every output with it
    fn seal(&mut self) {
        self.hash = self.get_hash();
        for output in self.outputs.iter_mut() {
            output.producing_tx_hash = self.hash.clone();
        }
    }

    pub fn get_hash(&self) -> String {
        let from = self
            .inputs
            .iter()
            .map(|input| input.signature.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let to = self
            .outputs
            .iter()
            .map(TransactionOutput::get_hash)
            .collect::<Vec<_>>()
            .join(",");
        sha256_hex(&format!(
            "{}{}{}{}",
            self.tx_type.code(),
            from,
            to,
            self.timestamp
        ))
    }

    /// `inputs - outputs`, defined only when the transaction has inputs
    pub fn get_fee(&self) -> Option<i64> {
        if self.inputs.is_empty() {
            return None;
        }
        Some(self.input_amount().saturating_sub(self.output_amount()))
    }

    pub fn input_amount(&self) -> i64 {
        sum_amounts(self.inputs.iter().map(|input| input.amount))
    }

    pub fn output_amount(&self) -> i64 {
        sum_amounts(self.outputs.iter().map(|output| output.amount))
    }

    // Cheapest checks first: hash, then structure, then economics.
    // The order decides which single message a caller sees.
    pub fn is_valid(
        &self,
        difficulty: u32,
        total_fees: i64,
    ) -> std::result::Result<(), ValidationError> {
        if self.hash != self.get_hash() {
            return Err(ValidationError::HashMismatch);
        }

        if self.outputs.is_empty() || self.outputs.iter().any(|o| o.is_valid().is_err()) {
            return Err(ValidationError::OutputsInvalid);
        }

        if !self.inputs.is_empty() {
            let messages: Vec<String> = self
                .inputs
                .iter()
                .filter_map(|input| input.is_valid().err())
                .map(|e| e.to_string())
                .collect();
            if !messages.is_empty() {
                return Err(ValidationError::InputInvalid(messages));
            }

            let (inputs, outputs) = (self.input_amount(), self.output_amount());
            if inputs < outputs {
                return Err(ValidationError::InsufficientInputs { inputs, outputs });
            }
        }

        if self
            .outputs
            .iter()
            .any(|output| output.producing_tx_hash != self.hash)
        {
            return Err(ValidationError::OutputNotBoundToTx);
        }

        match self.tx_type {
            TransactionType::Regular => {
                // Only a FEE transaction may create value out of nothing
                if self.inputs.is_empty() {
                    return Err(ValidationError::InsufficientInputs {
                        inputs: 0,
                        outputs: self.output_amount(),
                    });
                }
            }
            TransactionType::Fee => {
                if !self.inputs.is_empty() {
                    return Err(ValidationError::InputInvalid(vec![
                        "Fee transactions take no inputs.".to_string(),
                    ]));
                }
                if self.outputs.len() != 1 {
                    return Err(ValidationError::FeeOutputsInvalid);
                }
                let allowed = get_reward_amount(difficulty).saturating_add(total_fees);
                let amount = self.output_amount();
                if amount > allowed {
                    return Err(ValidationError::RewardExceeded { amount, allowed });
                }
            }
        }

        Ok(())
    }

    pub fn is_fee(&self) -> bool {
        self.tx_type == TransactionType::Fee
    }

    pub fn get_type(&self) -> TransactionType {
        self.tx_type
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_id(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_inputs(&self) -> &[TransactionInput] {
        self.inputs.as_slice()
    }

    pub fn get_outputs(&self) -> &[TransactionOutput] {
        self.outputs.as_slice()
    }
}
