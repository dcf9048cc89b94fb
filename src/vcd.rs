//! Value Change Dump output of the request/response signals, one timestamp
//! per resolved request.

use std::io::{self, Write};

use crate::{
    cache::Access,
    sim::{Probe, RunningTotals},
    trace::Request,
};

struct Signal {
    name: &'static str,
    width: u32,
    id: char,
}

const SIGNALS: [Signal; 8] = [
    Signal { name: "we", width: 1, id: '!' },
    Signal { name: "addr", width: 32, id: '"' },
    Signal { name: "wdata", width: 32, id: '#' },
    Signal { name: "rdata", width: 32, id: '$' },
    Signal { name: "hit", width: 1, id: '%' },
    Signal { name: "cycles_per_request", width: 64, id: '&' },
    Signal { name: "total_hits", width: 64, id: '\'' },
    Signal { name: "total_misses", width: 64, id: '(' },
];

pub struct Waveform<W: Write> {
    out: W,
    last_time: Option<u64>,
}

impl<W: Write> Waveform<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "$version {} {} $end", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "$timescale 1ns $end")?;
        writeln!(out, "$scope module cache $end")?;
        for sig in &SIGNALS {
            writeln!(out, "$var wire {} {} {} $end", sig.width, sig.id, sig.name)?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;
        Ok(Waveform {
            out,
            last_time: None,
        })
    }

    fn timestamp(&mut self, time: u64) -> io::Result<()> {
        if self.last_time.map_or(true, |last| time > last) {
            writeln!(self.out, "#{time}")?;
            self.last_time = Some(time);
        }
        Ok(())
    }

    fn change(&mut self, signal: usize, value: u64) -> io::Result<()> {
        let sig = &SIGNALS[signal];
        if sig.width == 1 {
            writeln!(self.out, "{}{}", value & 1, sig.id)
        } else {
            writeln!(self.out, "b{value:b} {}", sig.id)
        }
    }

    /// Marks the end of the run and hands back the writer.
    pub fn finish(mut self, end: u64) -> io::Result<W> {
        self.timestamp(end)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Probe for Waveform<W> {
    fn observe(
        &mut self,
        start: u64,
        request: &Request,
        access: &Access,
        totals: &RunningTotals,
    ) -> io::Result<()> {
        self.timestamp(start)?;
        self.change(0, request.is_write() as u64)?;
        self.change(1, request.address as u64)?;
        if request.is_write() {
            self.change(2, request.data as u64)?;
        }
        if let Some(data) = access.data {
            self.change(3, data as u64)?;
        }
        self.change(4, access.is_hit() as u64)?;
        self.change(5, access.cycles)?;
        self.change(6, totals.hits)?;
        self.change(7, totals.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replace::AccessResult;

    #[test]
    fn writes_header_and_changes() {
        let mut wave = Waveform::new(Vec::new()).unwrap();
        let access = Access {
            result: AccessResult::Miss,
            line: 0,
            cycles: 11,
            data: None,
        };
        let totals = RunningTotals {
            cycles: 11,
            hits: 0,
            misses: 1,
            processed: 1,
        };
        wave.observe(0, &Request::write(0x4, 5), &access, &totals)
            .unwrap();
        let out = String::from_utf8(wave.finish(11).unwrap()).unwrap();

        assert!(out.contains("$timescale 1ns $end"));
        assert!(out.contains("$var wire 32 \" addr $end"));
        assert!(out.contains("#0\n1!\nb100 \"\nb101 #\n0%\nb1011 &\n"));
        assert!(out.ends_with("#11\n"));
    }

    #[test]
    fn repeated_time_is_not_restamped() {
        let mut wave = Waveform::new(Vec::new()).unwrap();
        let access = Access {
            result: AccessResult::Hit,
            line: 0,
            cycles: 0,
            data: Some(1),
        };
        let totals = RunningTotals::default();
        wave.observe(3, &Request::read(0), &access, &totals).unwrap();
        wave.observe(3, &Request::read(0), &access, &totals).unwrap();
        let out = String::from_utf8(wave.finish(3).unwrap()).unwrap();
        assert_eq!(out.matches("#3\n").count(), 1);
    }
}
