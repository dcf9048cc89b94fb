pub mod lru;

use crate::{
    addr::Addr,
    cache::CacheLine,
    config::{CacheConfig, Mapping},
};

use self::lru::Lru;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss,
}

impl AccessResult {
    pub fn is_hit(self) -> bool {
        self == AccessResult::Hit
    }
}

/// Line selection policy, fixed when the cache is built.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// The index bits pick the line; nothing to track.
    DirectMapped,
    FullyAssociative(Lru),
}

impl Replacement {
    pub fn new(config: &CacheConfig) -> Self {
        match config.mapping() {
            Mapping::DirectMapped => Replacement::DirectMapped,
            Mapping::FullyAssociative => Replacement::FullyAssociative(Lru::new(config.lines())),
        }
    }

    /// Direct-mapped lookup: the line is the index.
    pub fn select_line(index: u32) -> usize {
        index as usize
    }

    /// First line, in array order, holding a valid word for `(tag, offset)`.
    pub fn find_match(lines: &[CacheLine], tag: u32, offset: u32) -> Option<usize> {
        lines.iter().position(|line| line.matches(tag, offset))
    }

    /// Candidate line for `addr`. For a fully-associative cache this is the
    /// matching line if there is one and the LRU victim otherwise.
    pub fn candidate(&self, lines: &[CacheLine], addr: &Addr) -> usize {
        match self {
            Replacement::DirectMapped => Self::select_line(addr.index),
            Replacement::FullyAssociative(lru) => {
                Self::find_match(lines, addr.tag, addr.offset).unwrap_or_else(|| lru.victim())
            }
        }
    }

    pub fn record_fill(&mut self, line: usize) {
        if let Replacement::FullyAssociative(lru) = self {
            lru.record_fill(line);
        }
    }
}
