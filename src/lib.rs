//! Single-level write-through cache simulator with direct-mapped and
//! fully-associative (fill-order LRU) organizations, plus a primitive gate
//! estimate for the modeled hardware.

pub mod addr;
pub mod cache;
pub mod config;
pub mod error;
pub mod gates;
pub mod memory;
pub mod replace;
pub mod sim;
pub mod trace;
pub mod vcd;
pub mod workload;

pub use config::{CacheConfig, Config, Mapping};
pub use error::{ConfigError, Result, SimError};
pub use sim::{ReadLog, Simulation, SimulationResult, SENTINEL_MAX};
pub use trace::{Request, Trace};
