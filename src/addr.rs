use crate::config::{CacheConfig, Mapping};

/// A word address split into its cache fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr {
    pub offset: u32,
    /// Always 0 for fully-associative layouts.
    pub index: u32,
    pub tag: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitSection {
    shift: u32,
    mask: u32,
}

impl BitSection {
    fn apply(&self, num: u32) -> u32 {
        // A shift of 32 leaves nothing behind, which `>>` would not allow.
        num.checked_shr(self.shift).unwrap_or(0) & self.mask
    }
}

/// Splits addresses into offset, index and tag for one cache organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDecoder {
    offset_sec: BitSection,
    index_sec: BitSection,
    tag_sec: BitSection,
}

impl AddressDecoder {
    pub fn new(config: &CacheConfig) -> Self {
        let offset_sec = BitSection {
            shift: 0,
            mask: config.line_size() - 1,
        };

        let index_shift = config.offset_bits();
        let index_sec = BitSection {
            shift: index_shift,
            mask: match config.mapping() {
                Mapping::DirectMapped => config.lines() - 1,
                Mapping::FullyAssociative => 0,
            },
        };

        let tag_sec = BitSection {
            shift: index_shift + config.index_bits(),
            mask: u32::MAX,
        };

        AddressDecoder {
            offset_sec,
            index_sec,
            tag_sec,
        }
    }

    pub fn decode(&self, address: u32) -> Addr {
        Addr {
            offset: self.offset_sec.apply(address),
            index: self.index_sec.apply(address),
            tag: self.tag_sec.apply(address),
        }
    }
}
