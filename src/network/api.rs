// The node's public operations, one per route. Every call takes the chain lock
// once, answers, and lets go - nothing slow ever happens while it is held.

use crate::core::{Block, BlockInfo, Blockchain, Transaction, TransactionOutput, TX_PER_BLOCK};
use crate::error::{BlockchainError, Result, Validation};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const MISSING_HASH: &str = "Unprocessable Entity: Invalid or incomplete data. Missing hash!";

/// HTTP-style reply: a status code and a JSON body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Serialize) -> ApiResponse {
        match serde_json::to_value(body) {
            Ok(body) => ApiResponse { status, body },
            Err(e) => ApiResponse::message(STATUS_INTERNAL_ERROR, &e.to_string()),
        }
    }

    pub fn message(status: u16, message: &str) -> ApiResponse {
        ApiResponse {
            status,
            body: Value::String(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < STATUS_BAD_REQUEST
    }

    /// Decodes a successful body, or turns a failed reply into `Rejected`
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        if !self.is_success() {
            let message = match &self.body {
                Value::String(message) => message.clone(),
                Value::Object(fields) => fields
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.body.to_string()),
                other => other.to_string(),
            };
            return Err(BlockchainError::Rejected {
                status: self.status,
                message,
            });
        }
        Ok(serde_json::from_value(self.body)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub mempool_size: usize,
    pub block_count: usize,
    pub is_valid: Validation,
    pub last_block: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolInfo {
    pub next: Vec<Transaction>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub balance: i64,
    pub fee: i64,
    pub utxo: Vec<TransactionOutput>,
}

/// Cloneable handle to the node's single chain
#[derive(Clone)]
pub struct NodeApi {
    chain: Arc<Mutex<Blockchain>>,
}

impl NodeApi {
    pub fn new(chain: Blockchain) -> NodeApi {
        NodeApi {
            chain: Arc::new(Mutex::new(chain)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Blockchain>> {
        self.chain
            .lock()
            .map_err(|_| BlockchainError::Corrupted("chain lock poisoned".to_string()))
    }

    // Runs `op` under the lock; a poisoned lock becomes a 500
    fn with_chain<F>(&self, op: F) -> ApiResponse
    where
        F: FnOnce(&mut Blockchain) -> ApiResponse,
    {
        match self.lock() {
            Ok(mut chain) => op(&mut chain),
            Err(e) => {
                error!("{e}");
                ApiResponse::message(STATUS_INTERNAL_ERROR, &e.to_string())
            }
        }
    }

    pub fn status(&self) -> ApiResponse {
        self.with_chain(|chain| {
            if let Err(e) = chain.check_integrity() {
                error!("{e}");
                return ApiResponse::message(STATUS_INTERNAL_ERROR, &e.to_string());
            }
            let status = NodeStatus {
                mempool_size: chain.get_mempool().len(),
                block_count: chain.get_blocks().len(),
                is_valid: Validation::from(&chain.is_valid()),
                last_block: chain.get_last_block().clone(),
            };
            ApiResponse::new(STATUS_OK, status)
        })
    }

    /// `null` body when the mempool is empty
    pub fn next_block_template(&self) -> ApiResponse {
        self.with_chain(|chain| {
            let info: Option<BlockInfo> = chain.get_next_block();
            ApiResponse::new(STATUS_OK, info)
        })
    }

    /// All-digit keys are indexes, anything else is a block hash
    pub fn block_by_index_or_hash(&self, key: &str) -> ApiResponse {
        self.with_chain(|chain| {
            let block = if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
                key.parse::<usize>()
                    .ok()
                    .and_then(|index| chain.get_block_by_index(index))
            } else {
                chain.get_block(key)
            };
            match block {
                Some(block) => ApiResponse::new(STATUS_OK, block),
                None => ApiResponse::message(STATUS_NOT_FOUND, "Block not found"),
            }
        })
    }

    pub fn mempool(&self) -> ApiResponse {
        self.with_chain(|chain| {
            let info = MempoolInfo {
                next: chain.get_mempool().take(TX_PER_BLOCK),
                total: chain.get_mempool().len(),
            };
            ApiResponse::new(STATUS_OK, info)
        })
    }

    pub fn submit_block(&self, payload: Value) -> ApiResponse {
        if payload.get("hash").is_none() {
            return ApiResponse::message(STATUS_UNPROCESSABLE, MISSING_HASH);
        }
        let block: Block = match serde_json::from_value(payload) {
            Ok(block) => block,
            Err(e) => {
                warn!("Undecodable block payload: {e}");
                return ApiResponse::message(STATUS_UNPROCESSABLE, &e.to_string());
            }
        };

        self.with_chain(|chain| Self::validation_response(chain.add_block(block).into()))
    }

    pub fn submit_transaction(&self, payload: Value) -> ApiResponse {
        let has_hash = payload
            .get("hash")
            .and_then(Value::as_str)
            .is_some_and(|hash| !hash.is_empty());
        if !has_hash {
            return ApiResponse::message(STATUS_UNPROCESSABLE, MISSING_HASH);
        }
        let tx: Transaction = match serde_json::from_value(payload) {
            Ok(tx) => tx,
            Err(e) => {
                warn!("Undecodable transaction payload: {e}");
                return ApiResponse::message(STATUS_UNPROCESSABLE, &e.to_string());
            }
        };

        self.with_chain(|chain| Self::validation_response(chain.add_transaction(tx).into()))
    }

    fn validation_response(validation: Validation) -> ApiResponse {
        let status = if validation.success {
            STATUS_CREATED
        } else {
            STATUS_BAD_REQUEST
        };
        ApiResponse::new(status, validation)
    }

    /// 404 (with the -1/-1 search body) when the hash is unknown
    pub fn transaction_by_hash(&self, hash: &str) -> ApiResponse {
        self.with_chain(|chain| {
            let search = chain.get_transaction(hash);
            let status = if search.transaction.is_some() {
                STATUS_OK
            } else {
                STATUS_NOT_FOUND
            };
            ApiResponse::new(status, search)
        })
    }

    pub fn wallet_info(&self, address: &str) -> ApiResponse {
        self.with_chain(|chain| {
            let utxo = chain.get_utxo(address);
            let info = WalletInfo {
                balance: utxo.iter().map(TransactionOutput::get_amount).sum(),
                fee: chain.get_fee_per_tx(),
                utxo,
            };
            ApiResponse::new(STATUS_OK, info)
        })
    }
}
