use std::collections::HashMap;

/// Sparse word-addressed backing store. Cold locations read as zero.
///
/// Access latency is charged by the cache engine; the store only holds data.
#[derive(Debug, Default, Clone)]
pub struct BackingStore {
    words: HashMap<u32, u32>,
}

impl BackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, address: u32) -> u32 {
        self.words.get(&address).copied().unwrap_or(0)
    }

    pub fn write(&mut self, address: u32, word: u32) {
        self.words.insert(address, word);
    }

    /// Number of locations written so far.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
