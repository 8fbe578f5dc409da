//! Wallet key management
//!
//! A wallet is a key pair. The hex public key doubles as the address, and the
//! wallet knows how to turn its unspent outputs into a signed transfer.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::Wallet;
