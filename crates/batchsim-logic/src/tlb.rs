//! FIFO TLB miss rates over a memory access trace.
//!
//! Traces use the valgrind lackey layout: `I  04000000,3` for an
//! instruction fetch, ` L`/` S`/` M` for data loads, stores and modifies.
//! Lines starting with `==` are tool chatter and are skipped, as are blank
//! lines and lines with fewer than two fields.
//!
//! The page tag is the address text without its last three hex digits
//! (4 KiB pages). Instruction fetches go through one TLB, data accesses
//! through another of the same size. A modify counts as two data accesses
//! but is looked up once.

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::SimError;

/// Lackey trace bundled with the binaries.
pub const SAMPLE_TRACE: &str = include_str!("../data/sample.trace");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlbConfig {
    /// TLB sizes to sweep, in entries.
    pub sizes: Vec<usize>,
}

impl Default for TlbConfig {
    fn default() -> Self {
        Self {
            sizes: vec![4, 8, 16, 32, 64, 128],
        }
    }
}

impl TlbConfig {
    pub fn validate(&self) -> Vec<ConfigError> {
        if self.sizes.is_empty() {
            vec![ConfigError::NoTlbSizes]
        } else {
            Vec::new()
        }
    }
}

/// Bounded FIFO of page tags. A zero-capacity TLB never holds anything.
#[derive(Debug, Clone)]
pub struct FifoTlb {
    capacity: usize,
    entries: VecDeque<String>,
}

impl FifoTlb {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn contains(&self, page: &str) -> bool {
        self.entries.iter().any(|entry| entry == page)
    }

    /// Append `page`, evicting the oldest entry when full.
    pub fn insert(&mut self, page: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(page.to_string());
    }

    /// Look `page` up, inserting it on a miss. Returns true on a hit.
    pub fn access(&mut self, page: &str) -> bool {
        if self.contains(page) {
            true
        } else {
            self.insert(page);
            false
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Instruction,
    Load,
    Store,
    Modify,
}

impl AccessKind {
    fn from_op(op: &str) -> Option<Self> {
        match op {
            "I" => Some(Self::Instruction),
            "L" => Some(Self::Load),
            "S" => Some(Self::Store),
            "M" => Some(Self::Modify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access<'a> {
    pub kind: AccessKind,
    pub page: &'a str,
}

/// Parse one trace line. `None` for chatter, blanks, malformed lines and
/// unknown operations.
pub fn parse_line(line: &str) -> Option<Access<'_>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("==") {
        return None;
    }
    let mut fields = line.split_whitespace();
    let op = fields.next()?;
    let operand = fields.next()?;
    let kind = AccessKind::from_op(op)?;
    let address = operand.split(',').next().unwrap_or(operand);
    Some(Access {
        kind,
        page: page_tag(address),
    })
}

/// Drop the last three characters; shorter addresses give an empty tag.
fn page_tag(address: &str) -> &str {
    let keep = address.chars().count().saturating_sub(3);
    match address.char_indices().nth(keep) {
        Some((end, _)) => &address[..end],
        None => address,
    }
}

/// Hit/miss counts for one TLB size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlbReport {
    pub capacity: usize,
    pub instruction_accesses: u64,
    pub instruction_misses: u64,
    pub data_accesses: u64,
    pub data_misses: u64,
}

impl TlbReport {
    /// Percentage, 0 when there were no fetches.
    pub fn instruction_miss_rate(&self) -> f64 {
        percent(self.instruction_misses, self.instruction_accesses)
    }

    pub fn data_miss_rate(&self) -> f64 {
        percent(self.data_misses, self.data_accesses)
    }
}

fn percent(misses: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        misses as f64 / total as f64 * 100.0
    }
}

impl fmt::Display for TlbReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TLB size: {}, instruction miss rate: {:.5}%, data miss rate: {:.5}%",
            self.capacity,
            self.instruction_miss_rate(),
            self.data_miss_rate()
        )
    }
}

/// Replay `reader` through a pair of TLBs of `capacity` entries.
pub fn simulate_tlb(reader: impl BufRead, capacity: usize) -> Result<TlbReport, SimError> {
    let mut instructions = FifoTlb::new(capacity);
    let mut data = FifoTlb::new(capacity);
    let mut report = TlbReport {
        capacity,
        ..Default::default()
    };

    for line in reader.lines() {
        let line = line?;
        let Some(access) = parse_line(&line) else {
            continue;
        };
        match access.kind {
            AccessKind::Instruction => {
                report.instruction_accesses += 1;
                if !instructions.access(access.page) {
                    report.instruction_misses += 1;
                }
            }
            AccessKind::Load | AccessKind::Store | AccessKind::Modify => {
                report.data_accesses += if access.kind == AccessKind::Modify { 2 } else { 1 };
                if !data.access(access.page) {
                    report.data_misses += 1;
                }
            }
        }
    }

    Ok(report)
}

/// One report per configured size, each a fresh replay of `trace`.
pub fn run_tlb_sweep(trace: &str, config: &TlbConfig) -> Result<Vec<TlbReport>, SimError> {
    SimError::check(config.validate())?;
    config
        .sizes
        .iter()
        .map(|&size| -> Result<TlbReport, SimError> {
            let report = simulate_tlb(trace.as_bytes(), size)?;
            log::debug!(
                "tlb size {size}: {}/{} instruction misses, {}/{} data misses",
                report.instruction_misses,
                report.instruction_accesses,
                report.data_misses,
                report.data_accesses
            );
            Ok(report)
        })
        .collect()
}
