use std::{
    fs,
    io::{self, BufWriter},
    process::ExitCode,
};

use cache_sim::{
    config::{opt_number, Config},
    error::{ConfigError, Result},
    sim::{RunStats, Simulation},
    vcd::Waveform,
    workload,
    CacheConfig, Trace,
};
use log::{error, info, warn};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();

    let trace_path: Option<String> = args.opt_value_from_str("-t").map_err(ConfigError::from)?;
    let trace_path = trace_path.ok_or(ConfigError::Missing("-t <trace.csv>"))?;

    let generator: Option<String> = args.opt_value_from_str("--gen").map_err(ConfigError::from)?;
    if let Some(kind) = generator {
        return generate(&kind, args, &trace_path);
    }

    let inline: Option<String> = args.opt_value_from_str("--config").map_err(ConfigError::from)?;
    let config_path: Option<String> = args.opt_value_from_str("-p").map_err(ConfigError::from)?;
    let mut config = if let Some(json) = inline {
        Config::from_json(&json)?
    } else if let Some(path) = config_path {
        Config::from_path(path)?
    } else {
        Config::default()
    };
    config.override_from_args(&mut args)?;
    let config = CacheConfig::try_from(config)?;

    let stats_path: Option<String> = args.opt_value_from_str("--json").map_err(ConfigError::from)?;
    let wave_path: Option<String> = args.opt_value_from_str("--tf").map_err(ConfigError::from)?;
    warn_unused(args);

    let trace = Trace::open(&trace_path)?;
    info!(
        "loaded {} requests from {trace_path} ({} rows skipped)",
        trace.requests.len(),
        trace.skipped
    );

    let mut sim = Simulation::new(config.clone());
    let result = match wave_path {
        Some(path) => {
            let mut wave = Waveform::new(BufWriter::new(fs::File::create(path)?))?;
            let result = sim.run_with(&trace.requests, &mut wave)?;
            wave.finish(sim.totals().cycles)?;
            result
        }
        None => sim.run(&trace.requests)?,
    };

    if result.is_complete() {
        println!("Total Cycles: {}", result.cycles);
    } else {
        println!(
            "Total Cycles: incomplete ({} of {} requests within the budget)",
            sim.totals().processed,
            trace.requests.len()
        );
    }
    println!("Total Hits: {}", result.hits);
    println!("Total Misses: {}", result.misses);
    println!("Primitive Gate Count: {}", result.gate_count);

    if let Some(path) = stats_path {
        let stats = RunStats::new(&config, &result, trace.skipped);
        let stats_file = fs::File::create(path)?;
        serde_json::to_writer_pretty(stats_file, &stats).map_err(io::Error::from)?;
    }
    Ok(())
}

fn generate(kind: &str, mut args: pico_args::Arguments, path: &str) -> Result<()> {
    let requests = match kind {
        "matmul" => {
            let n: usize = opt_number(&mut args, "--n", "--n")?.unwrap_or(4);
            let base: u32 = opt_number(&mut args, "--base", "--base")?.unwrap_or(0);
            let elems = n
                .checked_mul(n)
                .and_then(|elems| u32::try_from(elems).ok())
                .ok_or(ConfigError::WorkloadTooLarge { n, base })?;
            let a: Vec<u32> = (1..=elems).collect();
            let b: Vec<u32> = a.iter().rev().copied().collect();
            workload::matrix_multiplication(&a, &b, n, base)?.0
        }
        "random" => {
            let count: usize = opt_number(&mut args, "--count", "--count")?.unwrap_or(1000);
            let limit: u32 = opt_number(&mut args, "--limit", "--limit")?.unwrap_or(256);
            let ratio: f64 = opt_number(&mut args, "--write-ratio", "--write-ratio")?.unwrap_or(0.3);
            let seed: u64 = opt_number(&mut args, "--seed", "--seed")?.unwrap_or(0);
            workload::random(count, limit, ratio, seed)
        }
        other => return Err(ConfigError::UnknownGenerator(other.to_string()).into()),
    };
    warn_unused(args);

    Trace::write_csv(BufWriter::new(fs::File::create(path)?), &requests)?;
    info!("wrote {} requests to {path}", requests.len());
    Ok(())
}

fn warn_unused(args: pico_args::Arguments) {
    let rest = args.finish();
    if !rest.is_empty() {
        warn!("ignoring unused arguments: {rest:?}");
    }
}
