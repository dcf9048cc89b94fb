use std::{fmt, fs, path::Path, str::FromStr};

use pico_args::{Arguments, Keys};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bits per stored word.
pub const WORD_BITS: u32 = 32;
pub const WORD_BYTES: u32 = WORD_BITS / 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Mapping {
    #[serde(alias = "direct")]
    DirectMapped,
    #[serde(alias = "full")]
    FullyAssociative,
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::DirectMapped => f.write_str("direct-mapped"),
            Mapping::FullyAssociative => f.write_str("fully-associative"),
        }
    }
}

/// Unvalidated settings as they come from a JSON file or the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lines: u32,
    pub line_size: u32,
    pub cache_latency: u32,
    pub memory_latency: u32,
    pub mapping: Mapping,
    /// Cycle budget; `None` runs until the trace is exhausted.
    pub cycles: Option<u64>,
    pub range_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            lines: 16,
            line_size: 4,
            cache_latency: 1,
            memory_latency: 10,
            mapping: Mapping::DirectMapped,
            cycles: None,
            range_check: true,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn override_from_args(&mut self, args: &mut Arguments) -> Result<(), ConfigError> {
        let direct = args.contains("--direct-mapped");
        let full = args.contains("--fully-associative");
        match (direct, full) {
            (true, true) => return Err(ConfigError::ConflictingMapping),
            (true, false) => self.mapping = Mapping::DirectMapped,
            (false, true) => self.mapping = Mapping::FullyAssociative,
            (false, false) => {}
        }

        if let Some(cycles) = opt_number(args, ["-c", "--cycles"], "--cycles")? {
            self.cycles = Some(cycles);
        }
        if let Some(lines) = opt_number(args, "--lines", "--lines")? {
            self.lines = lines;
        }
        if let Some(line_size) = opt_number(args, "--line-size", "--line-size")? {
            self.line_size = line_size;
        }
        if let Some(latency) = opt_number(args, "--cache-latency", "--cache-latency")? {
            self.cache_latency = latency;
        }
        if let Some(latency) = opt_number(args, "--memory-latency", "--memory-latency")? {
            self.memory_latency = latency;
        }
        if args.contains("--no-range-check") {
            self.range_check = false;
        }
        Ok(())
    }
}

pub fn opt_number<T: FromStr>(
    args: &mut Arguments,
    keys: impl Into<Keys>,
    option: &'static str,
) -> Result<Option<T>, ConfigError> {
    let raw: Option<String> = args
        .opt_value_from_str(keys)
        .map_err(|err| ConfigError::InvalidNumber {
            option,
            value: err.to_string(),
        })?;
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { option, value })
    })
    .transpose()
}

/// Validated cache organization. Field widths are derived once here so the
/// decoder and engine never see a malformed layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    mapping: Mapping,
    lines: u32,
    line_size: u32,
    cache_latency: u32,
    memory_latency: u32,
    cycle_budget: Option<u64>,
    range_check: bool,
    offset_bits: u32,
    index_bits: u32,
}

impl CacheConfig {
    pub fn new(
        mapping: Mapping,
        lines: u32,
        line_size: u32,
        cache_latency: u32,
        memory_latency: u32,
    ) -> Result<Self, ConfigError> {
        let line_bits = log2_checked("lines", lines)?;
        let offset_bits = log2_checked("line_size", line_size)?;
        let index_bits = match mapping {
            Mapping::DirectMapped => line_bits,
            Mapping::FullyAssociative => 0,
        };
        if offset_bits + index_bits > 32 {
            return Err(ConfigError::AddressSpaceTooWide {
                offset_bits,
                index_bits,
            });
        }

        Ok(CacheConfig {
            mapping,
            lines,
            line_size,
            cache_latency,
            memory_latency,
            cycle_budget: None,
            range_check: true,
            offset_bits,
            index_bits,
        })
    }

    pub fn with_cycle_budget(mut self, budget: Option<u64>) -> Self {
        self.cycle_budget = budget;
        self
    }

    pub fn with_range_check(mut self, range_check: bool) -> Self {
        self.range_check = range_check;
        self
    }

    pub fn mapping(&self) -> Mapping {
        self.mapping
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn line_size(&self) -> u32 {
        self.line_size
    }

    pub fn cache_latency(&self) -> u32 {
        self.cache_latency
    }

    pub fn memory_latency(&self) -> u32 {
        self.memory_latency
    }

    pub fn cycle_budget(&self) -> Option<u64> {
        self.cycle_budget
    }

    pub fn range_check(&self) -> bool {
        self.range_check
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn tag_bits(&self) -> u32 {
        32 - self.offset_bits - self.index_bits
    }

    /// Size of the modeled address space in bytes.
    pub fn capacity_bytes(&self) -> u64 {
        self.lines as u64 * self.line_size as u64 * WORD_BYTES as u64
    }
}

impl TryFrom<Config> for CacheConfig {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Ok(CacheConfig::new(
            config.mapping,
            config.lines,
            config.line_size,
            config.cache_latency,
            config.memory_latency,
        )?
        .with_cycle_budget(config.cycles)
        .with_range_check(config.range_check))
    }
}

fn log2_checked(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { field });
    }
    if !value.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { field, value });
    }
    Ok(value.ilog2())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn derives_field_widths() {
        let config = CacheConfig::new(Mapping::DirectMapped, 16, 4, 1, 10).unwrap();
        assert_eq!(config.offset_bits(), 2);
        assert_eq!(config.index_bits(), 4);
        assert_eq!(config.tag_bits(), 26);

        let config = CacheConfig::new(Mapping::FullyAssociative, 16, 4, 1, 10).unwrap();
        assert_eq!(config.index_bits(), 0);
        assert_eq!(config.tag_bits(), 30);
    }

    #[test]
    fn single_line_single_word_is_valid() {
        let config = CacheConfig::new(Mapping::DirectMapped, 1, 1, 1, 1).unwrap();
        assert_eq!(config.offset_bits(), 0);
        assert_eq!(config.index_bits(), 0);
        assert_eq!(config.tag_bits(), 32);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(
            CacheConfig::new(Mapping::DirectMapped, 12, 4, 1, 10),
            Err(ConfigError::NotPowerOfTwo { field: "lines", value: 12 })
        ));
        assert!(matches!(
            CacheConfig::new(Mapping::DirectMapped, 16, 0, 1, 10),
            Err(ConfigError::Zero { field: "line_size" })
        ));
        assert!(matches!(
            CacheConfig::new(Mapping::DirectMapped, 1 << 20, 1 << 16, 1, 10),
            Err(ConfigError::AddressSpaceTooWide { .. })
        ));
    }

    #[test]
    fn json_defaults_and_aliases() {
        let config = Config::from_json(r#"{ "mapping": "full", "lines": 8, "cycles": 100 }"#)
            .unwrap();
        assert_eq!(config.mapping, Mapping::FullyAssociative);
        assert_eq!(config.lines, 8);
        assert_eq!(config.line_size, 4);
        assert_eq!(config.cycles, Some(100));
        assert!(config.range_check);

        assert!(matches!(
            Config::from_json(r#"{ "lines": -4 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn command_line_overrides() {
        let mut config = Config::default();
        let mut args = args(&[
            "--fully-associative",
            "--lines",
            "32",
            "-c",
            "500",
            "--memory-latency",
            "100",
            "--no-range-check",
        ]);
        config.override_from_args(&mut args).unwrap();
        assert_eq!(config.mapping, Mapping::FullyAssociative);
        assert_eq!(config.lines, 32);
        assert_eq!(config.cycles, Some(500));
        assert_eq!(config.memory_latency, 100);
        assert!(!config.range_check);
    }

    #[test]
    fn conflicting_mapping_flags() {
        let mut config = Config::default();
        let mut args = args(&["--direct-mapped", "--fully-associative"]);
        assert!(matches!(
            config.override_from_args(&mut args),
            Err(ConfigError::ConflictingMapping)
        ));
    }

    #[test]
    fn non_numeric_option() {
        let mut config = Config::default();
        let mut args = args(&["--line-size", "four"]);
        match config.override_from_args(&mut args) {
            Err(ConfigError::InvalidNumber { option, value }) => {
                assert_eq!(option, "--line-size");
                assert_eq!(value, "four");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
