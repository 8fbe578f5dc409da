// JSON encoding used by the node transport
use crate::error::{BlockchainError, Result};
use serde::Serialize;

/// Serialize data as compact JSON bytes
pub fn serialize<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(data)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}
