//! Node networking
//!
//! `api` holds the node's operations over the shared chain, `server` streams
//! JSON requests into them over TCP, and `client` is the calling side used by
//! the miner and wallet commands.

pub mod api;
pub mod client;
pub mod server;

pub use api::{ApiResponse, MempoolInfo, NodeApi, NodeStatus, WalletInfo};
pub use client::send_request;
pub use server::{Request, Server};
