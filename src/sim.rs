use std::io;

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    cache::{Access, Cache},
    config::{CacheConfig, Mapping},
    error::{Result, SimError},
    gates,
    trace::{Kind, Request},
};

/// Cycle count reported when the run hit its cycle budget before finishing.
pub const SENTINEL_MAX: u64 = u64::MAX;

/// Observer notified once per resolved request.
pub trait Probe {
    /// `start` is the cycle at which the request was issued.
    fn observe(
        &mut self,
        start: u64,
        request: &Request,
        access: &Access,
        totals: &RunningTotals,
    ) -> io::Result<()>;
}

impl Probe for () {
    fn observe(&mut self, _: u64, _: &Request, _: &Access, _: &RunningTotals) -> io::Result<()> {
        Ok(())
    }
}

/// Collects the word returned to each request, in trace order; `None` for
/// writes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadLog {
    pub data: Vec<Option<u32>>,
}

impl Probe for ReadLog {
    fn observe(
        &mut self,
        _: u64,
        _: &Request,
        access: &Access,
        _: &RunningTotals,
    ) -> io::Result<()> {
        self.data.push(access.data);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunningTotals {
    pub cycles: u64,
    pub hits: u64,
    pub misses: u64,
    pub processed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    /// [`SENTINEL_MAX`] if the run was aborted.
    pub cycles: u64,
    pub hits: u64,
    pub misses: u64,
    pub gate_count: u64,
}

impl SimulationResult {
    pub fn is_complete(&self) -> bool {
        self.cycles != SENTINEL_MAX
    }
}

/// Summary written as JSON at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunStats {
    pub mapping: Mapping,
    pub lines: u32,
    pub line_size: u32,
    pub cache_latency: u32,
    pub memory_latency: u32,
    pub complete: bool,
    pub cycles: Option<u64>,
    pub hits: u64,
    pub misses: u64,
    pub miss_rate: f64,
    pub gate_count: u64,
    pub skipped_rows: usize,
}

impl RunStats {
    pub fn new(config: &CacheConfig, result: &SimulationResult, skipped_rows: usize) -> Self {
        let total = result.hits + result.misses;
        RunStats {
            mapping: config.mapping(),
            lines: config.lines(),
            line_size: config.line_size(),
            cache_latency: config.cache_latency(),
            memory_latency: config.memory_latency(),
            complete: result.is_complete(),
            cycles: result.is_complete().then_some(result.cycles),
            hits: result.hits,
            misses: result.misses,
            miss_rate: if total == 0 {
                0.0
            } else {
                result.misses as f64 / total as f64
            },
            gate_count: result.gate_count,
            skipped_rows,
        }
    }
}

/// Feeds requests to the cache one at a time and keeps the totals.
#[derive(Debug)]
pub struct Simulation {
    config: CacheConfig,
    pub cache: Cache,
    totals: RunningTotals,
}

impl Simulation {
    pub fn new(config: CacheConfig) -> Self {
        Simulation {
            cache: Cache::new(&config),
            config,
            totals: RunningTotals::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn totals(&self) -> &RunningTotals {
        &self.totals
    }

    /// Rejects the whole trace if any request falls outside the cache's
    /// address space.
    pub fn check_addresses(&self, requests: &[Request]) -> Result<()> {
        if !self.config.range_check() {
            return Ok(());
        }
        let capacity = self.config.capacity_bytes();
        match requests
            .iter()
            .position(|req| req.address as u64 >= capacity)
        {
            Some(position) => Err(SimError::AddressOutOfRange {
                position,
                address: requests[position].address,
                capacity,
            }),
            None => Ok(()),
        }
    }

    /// Resolves one request and folds it into the totals.
    pub fn step(&mut self, request: &Request) -> Access {
        let access = self.cache.access(request);
        self.totals.cycles += access.cycles;
        if access.is_hit() {
            self.totals.hits += 1;
        } else {
            self.totals.misses += 1;
        }
        self.totals.processed += 1;

        match (request.kind, access.data) {
            (Kind::Read, Some(data)) => debug!(
                "R 0x{:08x} -> {data} ({:?}, {} cycles)",
                request.address, access.result, access.cycles
            ),
            _ => debug!(
                "W 0x{:08x} <- {} ({:?}, {} cycles)",
                request.address, request.data, access.result, access.cycles
            ),
        }
        access
    }

    pub fn run(&mut self, requests: &[Request]) -> Result<SimulationResult> {
        self.run_with(requests, &mut ())
    }

    /// Runs `requests` on a cold cache and memory. Each call starts a fresh
    /// run; state left by earlier calls or by [`Simulation::step`] is discarded.
    pub fn run_with(
        &mut self,
        requests: &[Request],
        probe: &mut impl Probe,
    ) -> Result<SimulationResult> {
        self.check_addresses(requests)?;
        self.cache = Cache::new(&self.config);
        self.totals = RunningTotals::default();
        info!(
            "simulating {} requests on a {} cache: {} lines x {} words, latency {}/{}",
            requests.len(),
            self.config.mapping(),
            self.config.lines(),
            self.config.line_size(),
            self.config.cache_latency(),
            self.config.memory_latency(),
        );

        let total = requests.len() as u64;
        let mut aborted = false;
        for request in requests {
            let start = self.totals.cycles;
            let access = self.step(request);
            probe.observe(start, request, &access, &self.totals)?;

            if self.totals.processed == total {
                break;
            }
            if let Some(budget) = self.config.cycle_budget() {
                if self.totals.cycles >= budget {
                    aborted = true;
                    break;
                }
            }
        }

        let result = SimulationResult {
            cycles: if aborted {
                SENTINEL_MAX
            } else {
                self.totals.cycles
            },
            hits: self.totals.hits,
            misses: self.totals.misses,
            gate_count: gates::for_config(&self.config),
        };

        if aborted {
            warn!(
                "cycle budget of {} exhausted after {} of {} requests",
                self.config.cycle_budget().unwrap_or_default(),
                self.totals.processed,
                total
            );
        } else {
            info!(
                "finished: {} cycles, {} hits, {} misses, {} memory words written",
                result.cycles,
                result.hits,
                result.misses,
                self.cache.memory.len()
            );
        }
        Ok(result)
    }
}
