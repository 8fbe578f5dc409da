use crate::core::{Transaction, TransactionInput};

/// Pending transactions in arrival order.
/// Owned by the `Blockchain`; it has no lock of its own.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    inner: Vec<Transaction>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool { inner: Vec::new() }
    }

    pub fn add(&mut self, tx: Transaction) {
        self.inner.push(tx);
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.position(hash).is_some()
    }

    pub fn position(&self, hash: &str) -> Option<usize> {
        self.inner.iter().position(|tx| tx.get_id() == hash)
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.inner.get(index)
    }

    /// The oldest `count` transactions, cloned
    pub fn take(&self, count: usize) -> Vec<Transaction> {
        self.inner.iter().take(count).cloned().collect()
    }

    /// Every input still waiting in the pool
    pub fn pending_inputs(&self) -> impl Iterator<Item = &TransactionInput> {
        self.inner.iter().flat_map(|tx| tx.get_inputs().iter())
    }

    /// Number of pending inputs signed by `address`
    pub fn pending_inputs_from(&self, address: &str) -> usize {
        self.pending_inputs()
            .filter(|input| input.get_from_address() == address)
            .count()
    }

    /// Pool contents without the given hashes; `self` is left untouched
    pub fn without(&self, hashes: &[&str]) -> Vec<Transaction> {
        self.inner
            .iter()
            .filter(|tx| !hashes.contains(&tx.get_id()))
            .cloned()
            .collect()
    }

    pub fn replace(&mut self, transactions: Vec<Transaction>) {
        self.inner = transactions;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get_all(&self) -> &[Transaction] {
        self.inner.as_slice()
    }
}
