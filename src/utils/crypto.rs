use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED,
    ECDSA_P256_SHA256_FIXED_SIGNING,
};

use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(BlockchainError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

/// SHA-256 of a string, as lowercase hex
pub fn sha256_hex(data: &str) -> String {
    let mut context = Context::new(&SHA256);
    context.update(data.as_bytes());
    let digest = context.finish();
    HEXLOWER.encode(digest.as_ref())
}

fn decode_hex(data: &str) -> Option<Vec<u8>> {
    HEXLOWER
        .decode(data.to_ascii_lowercase().as_bytes())
        .ok()
}

fn load_key_pair(private_key: &str) -> Result<EcdsaKeyPair> {
    let pkcs8 = decode_hex(private_key)
        .ok_or_else(|| BlockchainError::Crypto("Private key is not valid hex".to_string()))?;
    let rng = SystemRandom::new();
    EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &pkcs8, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}")))
}

/// Generates a key pair and returns `(private_key_hex, public_key_hex)`
pub fn new_key_pair() -> Result<(String, String)> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?;
    let private_key = HEXLOWER.encode(pkcs8.as_ref());
    let public_key = public_key_of(&private_key)?;
    Ok((private_key, public_key))
}

/// Derives the hex public key (the wallet address) from a hex PKCS#8 private key
pub fn public_key_of(private_key: &str) -> Result<String> {
    let key_pair = load_key_pair(private_key)?;
    Ok(HEXLOWER.encode(key_pair.public_key().as_ref()))
}

/// Signs a hex message digest with a hex PKCS#8 private key
pub fn sign_message(message: &str, private_key: &str) -> Result<String> {
    let key_pair = load_key_pair(private_key)?;
    let message = decode_hex(message)
        .ok_or_else(|| BlockchainError::Crypto("Message is not valid hex".to_string()))?;
    let rng = SystemRandom::new();
    let signature = key_pair
        .sign(&rng, &message)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to sign message: {e}")))?;
    Ok(HEXLOWER.encode(signature.as_ref()))
}

pub fn verify_signature(message: &str, signature: &str, public_key: &str) -> bool {
    let (Some(message), Some(signature), Some(public_key)) = (
        decode_hex(message),
        decode_hex(signature),
        decode_hex(public_key),
    ) else {
        return false;
    };
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key)
        .verify(&message, &signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_is_deterministic() {
        let first = sha256_hex("protochain");
        assert_eq!(first, sha256_hex("protochain"));
        assert_eq!(first.len(), 64);
        assert_ne!(first, sha256_hex("protochain!"));
    }

    #[test]
    fn test_sign_and_verify() {
        let (private_key, public_key) = new_key_pair().unwrap();
        let message = sha256_hex("payload");
        let signature = sign_message(&message, &private_key).unwrap();

        assert!(verify_signature(&message, &signature, &public_key));
        assert!(!verify_signature(&sha256_hex("other"), &signature, &public_key));
    }

    #[test]
    fn test_verify_rejects_malformed_hex() {
        let (_, public_key) = new_key_pair().unwrap();
        assert!(!verify_signature("zz", "zz", &public_key));
        assert!(!verify_signature(&sha256_hex("a"), "", "not-a-key"));
    }

    #[test]
    fn test_public_key_matches_generated_pair() {
        let (private_key, public_key) = new_key_pair().unwrap();
        assert_eq!(public_key_of(&private_key).unwrap(), public_key);
        assert!(public_key_of("1234").is_err());
    }
}
