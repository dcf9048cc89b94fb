//! Loading request traces from disk and running them.

use std::{fs, io::Write};

use cache_sim::{vcd::Waveform, workload, CacheConfig, Mapping, Simulation, Trace};
use tempfile::tempdir;
use xz2::write::XzEncoder;

const CSV: &str = "Type,Address,Value\n\
                   W,0x0,10\n\
                   R,0x0,\n\
                   W,0x10\n\
                   R,0xnope,\n\
                   R,0x4,\n";

#[test]
fn plain_csv_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    fs::write(&path, CSV).unwrap();

    let trace = Trace::open(&path).unwrap();
    assert_eq!(trace.requests.len(), 3);
    assert_eq!(trace.skipped, 2);

    let config = CacheConfig::new(Mapping::DirectMapped, 2, 4, 1, 10).unwrap();
    let result = Simulation::new(config).run(&trace.requests).unwrap();
    assert_eq!((result.hits, result.misses), (1, 2));
    assert_eq!(result.cycles, 11 + 1 + 11);
}

#[test]
fn xz_compressed_csv_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv.xz");
    let mut enc = XzEncoder::new(fs::File::create(&path).unwrap(), 6);
    enc.write_all(CSV.as_bytes()).unwrap();
    enc.finish().unwrap();

    let trace = Trace::open(&path).unwrap();
    assert_eq!(trace.requests.len(), 3);
    assert_eq!(trace.skipped, 2);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(Trace::open(dir.path().join("absent.csv")).is_err());
}

#[test]
fn generated_trace_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("matmul.csv");
    let (requests, _) =
        workload::matrix_multiplication(&[1, 2, 3, 4], &[4, 5, 6, 7], 2, 0).unwrap();
    Trace::write_csv(fs::File::create(&path).unwrap(), &requests).unwrap();

    let trace = Trace::open(&path).unwrap();
    assert_eq!(trace.requests, requests);

    // Three 2x2 matrices of words fit in 16 lines of 4 words.
    let config = CacheConfig::new(Mapping::FullyAssociative, 16, 4, 1, 10).unwrap();
    let result = Simulation::new(config).run(&trace.requests).unwrap();
    assert!(result.is_complete());
    assert_eq!(result.hits + result.misses, requests.len() as u64);
}

#[test]
fn waveform_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.vcd");
    let config = CacheConfig::new(Mapping::DirectMapped, 2, 4, 1, 10).unwrap();
    let mut sim = Simulation::new(config);

    let mut wave = Waveform::new(fs::File::create(&path).unwrap()).unwrap();
    let requests = Trace::from_reader(CSV.as_bytes()).unwrap().requests;
    sim.run_with(&requests, &mut wave).unwrap();
    wave.finish(sim.totals().cycles).unwrap();

    let vcd = fs::read_to_string(&path).unwrap();
    assert!(vcd.contains("$enddefinitions $end"));
    for stamp in ["#0\n", "#11\n", "#12\n", "#23\n"] {
        assert!(vcd.contains(stamp), "missing timestamp {stamp:?}");
    }
}
