//! Utility functions and helpers
//!
//! This module contains the cryptographic adapter (hashing, signing,
//! verification) and the JSON encoding helpers used on the wire.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    current_timestamp, new_key_pair, public_key_of, sha256_hex, sign_message, verify_signature,
};

pub use serialization::serialize;
