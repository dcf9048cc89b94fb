use std::collections::VecDeque;

use log::trace;

/// Fill-order queue for a fully-associative cache.
///
/// Front is the least recently filled line, back the most recently filled.
/// Hits do not touch the queue: only fills move a line to the back, so the
/// victim is the line filled longest ago even if it was read a moment ago.
#[derive(Debug, Clone)]
pub struct Lru {
    ru_order: VecDeque<u32>,
}

impl Lru {
    pub fn new(n_lines: u32) -> Self {
        Lru {
            ru_order: (0..n_lines).collect(),
        }
    }

    /// Line to evict on the next miss.
    pub fn victim(&self) -> usize {
        // The queue always holds every line exactly once and the
        // configuration guarantees at least one line.
        self.ru_order.front().copied().unwrap_or(0) as usize
    }

    pub fn record_fill(&mut self, line: usize) {
        let line = line as u32;
        if let Some(pos) = self.ru_order.iter().position(|&l| l == line) {
            self.ru_order.remove(pos);
        }
        self.ru_order.push_back(line);
        trace!("lru order after fill of line {line}: {:?}", self.ru_order);
    }

    /// Lines from least to most recently filled.
    pub fn order(&self) -> impl Iterator<Item = usize> + '_ {
        self.ru_order.iter().map(|&l| l as usize)
    }
}
