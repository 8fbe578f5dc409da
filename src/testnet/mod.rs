//! Helpers shared by the unit tests: throwaway wallets, funded outputs and
//! one-call mining against a live chain.

pub mod test_utils;

pub use test_utils::*;
