use std::{
    fs,
    io::{self, BufRead, BufReader, Read, Write},
    path::Path,
};

use log::warn;
use xz2::read::XzDecoder;

use crate::error::RequestParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Read,
    Write,
}

/// One memory request. `data` only matters for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub address: u32,
    pub data: u32,
    pub kind: Kind,
}

impl Request {
    pub fn read(address: u32) -> Self {
        Request {
            address,
            data: 0,
            kind: Kind::Read,
        }
    }

    pub fn write(address: u32, data: u32) -> Self {
        Request {
            address,
            data,
            kind: Kind::Write,
        }
    }

    pub fn is_write(&self) -> bool {
        self.kind == Kind::Write
    }

    /// Parses a `Type,AddressHex,Value` row.
    pub fn parse_row(row: &str) -> Result<Request, RequestParseError> {
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        if !(2..=3).contains(&fields.len()) {
            return Err(RequestParseError::FieldCount {
                found: fields.len(),
            });
        }

        let kind = match fields[0] {
            "R" | "r" => Kind::Read,
            "W" | "w" => Kind::Write,
            other => return Err(RequestParseError::UnknownKind(other.to_string())),
        };

        let hex = fields[1]
            .strip_prefix("0x")
            .or_else(|| fields[1].strip_prefix("0X"))
            .unwrap_or(fields[1]);
        let address = u32::from_str_radix(hex, 16)
            .map_err(|_| RequestParseError::BadAddress(fields[1].to_string()))?;

        match kind {
            Kind::Read => Ok(Request::read(address)),
            Kind::Write => {
                let value = fields
                    .get(2)
                    .filter(|v| !v.is_empty())
                    .ok_or(RequestParseError::MissingValue)?;
                let data = value
                    .parse::<u32>()
                    .map_err(|_| RequestParseError::BadValue(value.to_string()))?;
                Ok(Request::write(address, data))
            }
        }
    }
}

/// Requests loaded from a CSV trace.
#[derive(Debug, Default, Clone)]
pub struct Trace {
    pub requests: Vec<Request>,
    /// Rows rejected as malformed.
    pub skipped: usize,
}

impl Trace {
    /// Opens a trace file, decompressing it first if it ends in `.xz`.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Trace> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        if path.extension().is_some_and(|ext| ext == "xz") {
            Trace::parse(BufReader::new(XzDecoder::new(file)))
        } else {
            Trace::parse(BufReader::new(file))
        }
    }

    /// Reads rows after the header line, skipping the ones that do not parse.
    pub fn parse(reader: impl BufRead) -> io::Result<Trace> {
        let mut trace = Trace::default();
        for (idx, line) in reader.lines().enumerate().skip(1) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Request::parse_row(&line) {
                Ok(request) => trace.requests.push(request),
                Err(err) => {
                    warn!("trace line {}: {err}: {line:?}", idx + 1);
                    trace.skipped += 1;
                }
            }
        }
        Ok(trace)
    }

    pub fn from_reader(reader: impl Read) -> io::Result<Trace> {
        Trace::parse(BufReader::new(reader))
    }

    pub fn write_csv(mut out: impl Write, requests: &[Request]) -> io::Result<()> {
        writeln!(out, "Type,Address,Value")?;
        for req in requests {
            match req.kind {
                Kind::Read => writeln!(out, "R,0x{:x},", req.address)?,
                Kind::Write => writeln!(out, "W,0x{:x},{}", req.address, req.data)?,
            }
        }
        out.flush()
    }
}
