use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::{PoisonError, RwLock};

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub const DEFAULT_NODE_ADDR: &str = "127.0.0.1:3000";

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
// Private key the miner is paid to
const MINER_WALLET_KEY: &str = "MINER_WALLET";
// Address credited by the genesis block
const GENESIS_WALLET_KEY: &str = "GENESIS_WALLET";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        map.insert(
            String::from(NODE_ADDRESS_KEY),
            String::from(DEFAULT_NODE_ADDR),
        );
        for key in [NODE_ADDRESS_KEY, MINER_WALLET_KEY, GENESIS_WALLET_KEY] {
            if let Ok(value) = env::var(key) {
                if !value.is_empty() {
                    map.insert(String::from(key), value);
                }
            }
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(String::from(key), value);
    }

    pub fn get_node_addr(&self) -> String {
        self.get(NODE_ADDRESS_KEY)
            .unwrap_or_else(|| String::from(DEFAULT_NODE_ADDR))
    }

    pub fn set_node_addr(&self, addr: String) {
        self.set(NODE_ADDRESS_KEY, addr);
    }

    pub fn get_miner_wallet(&self) -> Option<String> {
        self.get(MINER_WALLET_KEY)
    }

    pub fn set_miner_wallet(&self, private_key: String) {
        self.set(MINER_WALLET_KEY, private_key);
    }

    pub fn get_genesis_wallet(&self) -> Option<String> {
        self.get(GENESIS_WALLET_KEY)
    }

    pub fn set_genesis_wallet(&self, address: String) {
        self.set(GENESIS_WALLET_KEY, address);
    }
}
