use std::iter;

use log::trace;

use crate::{
    addr::{Addr, AddressDecoder},
    config::CacheConfig,
    memory::BackingStore,
    replace::{AccessResult, Replacement},
    trace::Request,
};

/// One cache line: a tag shared by all words, with validity tracked per word.
///
/// A word only matches when its own valid bit is set. Filling a word under a
/// new tag does not clear the other words' valid bits, so they go on matching
/// the new tag with whatever data they held before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u32,
    pub words: Vec<u32>,
    pub valid: Vec<bool>,
}

impl CacheLine {
    pub fn new(size: u32) -> Self {
        CacheLine {
            tag: 0,
            words: vec![0; size as usize],
            valid: vec![false; size as usize],
        }
    }

    pub fn matches(&self, tag: u32, offset: u32) -> bool {
        self.tag == tag && self.valid[offset as usize]
    }

    pub fn fill(&mut self, tag: u32, offset: u32, word: u32) {
        self.tag = tag;
        self.valid[offset as usize] = true;
        self.words[offset as usize] = word;
    }

    pub fn write_in_place(&mut self, offset: u32, word: u32) {
        self.words[offset as usize] = word;
        self.valid[offset as usize] = true;
    }
}

/// Where the engine is within the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Decoding,
    Resolving,
    Completed,
}

/// Outcome of one resolved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub result: AccessResult,
    pub line: usize,
    pub cycles: u64,
    /// Word returned to the requester; `None` for writes.
    pub data: Option<u32>,
}

impl Access {
    pub fn is_hit(&self) -> bool {
        self.result.is_hit()
    }
}

/// Write-through cache in front of a backing store.
#[derive(Debug)]
pub struct Cache {
    pub lines: Vec<CacheLine>,
    pub repl: Replacement,
    pub memory: BackingStore,
    decoder: AddressDecoder,
    cache_latency: u64,
    memory_latency: u64,
    state: EngineState,
}

impl Cache {
    pub fn new(config: &CacheConfig) -> Self {
        Cache {
            lines: iter::repeat_with(|| CacheLine::new(config.line_size()))
                .take(config.lines() as usize)
                .collect(),
            repl: Replacement::new(config),
            memory: BackingStore::new(),
            decoder: AddressDecoder::new(config),
            cache_latency: config.cache_latency() as u64,
            memory_latency: config.memory_latency() as u64,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn enter(&mut self, state: EngineState) {
        trace!("cache: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Resolves one request completely, including any backing-store round trip.
    pub fn access(&mut self, request: &Request) -> Access {
        self.enter(EngineState::Decoding);
        let addr = self.decoder.decode(request.address);

        self.enter(EngineState::Resolving);
        let line_idx = self.repl.candidate(&self.lines, &addr);
        let hit = self.lines[line_idx].matches(addr.tag, addr.offset);

        let access = match (hit, request.is_write()) {
            (true, false) => Access {
                result: AccessResult::Hit,
                line: line_idx,
                cycles: self.cache_latency,
                data: Some(self.lines[line_idx].words[addr.offset as usize]),
            },
            (true, true) => {
                self.lines[line_idx].write_in_place(addr.offset, request.data);
                self.memory.write(request.address, request.data);
                Access {
                    result: AccessResult::Hit,
                    line: line_idx,
                    cycles: self.cache_latency + self.memory_latency,
                    data: None,
                }
            }
            (false, false) => {
                let word = self.memory.read(request.address);
                self.fill(line_idx, &addr, word);
                Access {
                    result: AccessResult::Miss,
                    line: line_idx,
                    cycles: self.cache_latency + self.memory_latency,
                    data: Some(word),
                }
            }
            (false, true) => {
                self.fill(line_idx, &addr, request.data);
                self.memory.write(request.address, request.data);
                Access {
                    result: AccessResult::Miss,
                    line: line_idx,
                    cycles: self.cache_latency + self.memory_latency,
                    data: None,
                }
            }
        };

        self.enter(EngineState::Completed);
        self.enter(EngineState::Idle);
        access
    }

    fn fill(&mut self, line_idx: usize, addr: &Addr, word: u32) {
        self.lines[line_idx].fill(addr.tag, addr.offset, word);
        self.repl.record_fill(line_idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mapping;

    fn cache(mapping: Mapping, lines: u32, line_size: u32) -> Cache {
        Cache::new(&CacheConfig::new(mapping, lines, line_size, 1, 10).unwrap())
    }

    #[test]
    fn line_validity_is_per_word() {
        let mut line = CacheLine::new(4);
        assert!(!line.matches(0, 0));
        line.fill(3, 1, 0xAB);
        assert!(line.matches(3, 1));
        assert!(!line.matches(3, 0));

        // Retagging leaves the old word's valid bit in place.
        line.fill(4, 2, 0xCD);
        assert!(line.matches(4, 1));
        assert_eq!(line.words[1], 0xAB);
        assert!(!line.matches(3, 1));
    }

    #[test]
    fn write_in_place_keeps_tag() {
        let mut line = CacheLine::new(2);
        line.fill(9, 0, 1);
        line.write_in_place(1, 2);
        assert_eq!(line.tag, 9);
        assert!(line.matches(9, 1));
        assert_eq!(line.words[1], 2);
    }

    #[test]
    fn read_miss_fills_from_memory() {
        let mut cache = cache(Mapping::DirectMapped, 2, 4);
        cache.memory.write(0x5, 42);
        let access = cache.access(&Request::read(0x5));
        assert_eq!(access.result, AccessResult::Miss);
        assert_eq!(access.cycles, 11);
        assert_eq!(access.data, Some(42));

        let access = cache.access(&Request::read(0x5));
        assert!(access.is_hit());
        assert_eq!(access.cycles, 1);
        assert_eq!(access.data, Some(42));
        assert_eq!(cache.state(), EngineState::Idle);
    }

    #[test]
    fn writes_go_through_to_memory() {
        let mut cache = cache(Mapping::DirectMapped, 2, 4);
        let miss = cache.access(&Request::write(0x1, 5));
        assert_eq!(miss.result, AccessResult::Miss);
        assert_eq!(miss.cycles, 11);
        assert_eq!(cache.memory.read(0x1), 5);

        let hit = cache.access(&Request::write(0x1, 6));
        assert!(hit.is_hit());
        assert_eq!(hit.cycles, 11);
        assert_eq!(hit.data, None);
        assert_eq!(cache.memory.read(0x1), 6);
    }

    #[test]
    fn stale_words_match_after_retag() {
        // 1 line of 2 words: 0x0 and 0x2 share offset 0 but differ in tag.
        let mut cache = cache(Mapping::DirectMapped, 1, 2);
        cache.access(&Request::write(0x1, 11));
        cache.access(&Request::write(0x2, 22));

        // 0x3 has the new tag and offset 1, whose valid bit survived the retag.
        let access = cache.access(&Request::read(0x3));
        assert!(access.is_hit());
        assert_eq!(access.data, Some(11));
    }

    #[test]
    fn fully_associative_fills_victims_in_order() {
        let mut cache = cache(Mapping::FullyAssociative, 2, 1);
        assert_eq!(cache.access(&Request::read(0)).line, 0);
        assert_eq!(cache.access(&Request::read(1)).line, 1);
        assert_eq!(cache.access(&Request::read(2)).line, 0);
    }
}
