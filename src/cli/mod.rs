//! Command-line interface
//!
//! Argument parsing for the node binary, plus the two client workflows that
//! talk to a running node: the polling miner and the wallet transfer.

pub mod actions;
pub mod commands;

pub use actions::{mine_next, send_funds};
pub use commands::{Command, Opt};
