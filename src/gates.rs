//! Primitive gate estimate for realizing a cache organization in hardware.
//!
//! Storage is modeled as 6T SRAM with each transistor counted as a primitive
//! gate; multi-input AND/OR gates count as one gate each.

use crate::config::{CacheConfig, Mapping, WORD_BITS};

const TRANSISTORS_PER_BIT: u64 = 6;
const LRU_CONTROL_GATES_PER_LINE: u64 = 15;

/// Index decoder: a NOT per index bit, an AND per line, one wide OR.
pub fn mux_gates(lines: u64, index_bits: u64) -> u64 {
    index_bits + lines + 1
}

/// Tag comparator: an XOR per tag bit reduced by one AND.
pub fn comparator_gates(tag_bits: u64) -> u64 {
    tag_bits + 1
}

/// Data, tag and one valid bit per line.
pub fn storage_gates(line_size: u64, lines: u64, tag_bits: u64) -> u64 {
    lines * (line_size * WORD_BITS as u64 + tag_bits + 1) * TRANSISTORS_PER_BIT
}

pub fn lru_gates(lines: u64, tag_bits: u64) -> u64 {
    comparator_gates(tag_bits) * lines + lines * LRU_CONTROL_GATES_PER_LINE
}

pub fn gate_count(
    lines: u32,
    line_size: u32,
    tag_bits: u32,
    index_bits: u32,
    mapping: Mapping,
) -> u64 {
    let (lines, line_size) = (lines as u64, line_size as u64);
    let (tag_bits, index_bits) = (tag_bits as u64, index_bits as u64);
    let storage = storage_gates(line_size, lines, tag_bits);

    match mapping {
        Mapping::DirectMapped => {
            tag_bits * mux_gates(lines, index_bits) + comparator_gates(tag_bits) + storage
        }
        // +1 for the OR across the per-line hit signals.
        Mapping::FullyAssociative => {
            comparator_gates(tag_bits) * lines + storage + 1 + lru_gates(lines, tag_bits)
        }
    }
}

pub fn for_config(config: &CacheConfig) -> u64 {
    gate_count(
        config.lines(),
        config.line_size(),
        config.tag_bits(),
        config.index_bits(),
        config.mapping(),
    )
}
