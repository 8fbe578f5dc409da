//! Configuration management
//!
//! Node settings come from the environment once, at first use, and can be
//! overridden from the command line afterwards.

pub mod settings;

pub use settings::{Config, DEFAULT_NODE_ADDR, GLOBAL_CONFIG};
