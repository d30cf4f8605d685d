//! Running statistics shared by all worker threads.
//!
//! One [`TrimStats`] is owned per query set (and per purpose) and handed to
//! every batch by reference. All fields are atomics; there is no per-thread
//! accumulation and no merge step.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Upper bound (inclusive) on recorded overlap lengths
pub const MAX_READ_LENGTH: usize = 2048;

/// Bounded histogram of removed overlap lengths
#[derive(Debug)]
pub struct OverlapHistogram {
    buckets: Vec<AtomicU64>,
    overflowed: AtomicBool,
}

/// Min / max / mean / median of an [`OverlapHistogram`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlapSummary {
    pub count: u64,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: usize,
}

impl fmt::Display for OverlapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return f.write_str("no overlaps recorded");
        }
        write!(
            f,
            "min {}, max {}, mean {:.1}, median {} (n={})",
            self.min, self.max, self.mean, self.median, self.count
        )
    }
}

impl OverlapHistogram {
    pub fn new() -> Self {
        Self {
            buckets: (0..=MAX_READ_LENGTH).map(|_| AtomicU64::new(0)).collect(),
            overflowed: AtomicBool::new(false),
        }
    }

    /// Record one overlap length. Returns false (and warns once) if the
    /// length exceeds [`MAX_READ_LENGTH`]; such lengths are not recorded.
    pub fn record(&self, overlap: usize) -> bool {
        match self.buckets.get(overlap) {
            Some(bucket) => {
                bucket.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => {
                if !self.overflowed.swap(true, Ordering::Relaxed) {
                    log::warn!(
                        "Overlap length {} exceeds the maximum read length {}; not recorded in the overlap histogram",
                        overlap,
                        MAX_READ_LENGTH
                    );
                }
                false
            }
        }
    }

    /// Number of recorded overlaps of exactly `overlap` columns
    pub fn count_at(&self, overlap: usize) -> u64 {
        self.buckets
            .get(overlap)
            .map_or(0, |b| b.load(Ordering::Relaxed))
    }

    /// Total recorded overlaps
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).sum()
    }

    pub fn summary(&self) -> OverlapSummary {
        let counts: Vec<u64> = self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return OverlapSummary::default();
        }

        let min = counts.iter().position(|&c| c > 0).unwrap_or(0);
        let max = counts.iter().rposition(|&c| c > 0).unwrap_or(0);
        let weighted: u64 = counts.iter().enumerate().map(|(len, &c)| len as u64 * c).sum();

        // Lower median: first length whose cumulative count reaches half
        let half = total.div_ceil(2);
        let mut cumulative = 0u64;
        let mut median = max;
        for (len, &c) in counts.iter().enumerate() {
            cumulative += c;
            if cumulative >= half {
                median = len;
                break;
            }
        }

        OverlapSummary {
            count: total,
            min,
            max,
            mean: weighted as f64 / total as f64,
            median,
        }
    }
}

impl Default for OverlapHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one query set / alignment purpose
#[derive(Debug, Default)]
pub struct TrimStats {
    /// Reads no query could be assigned to (barcoding)
    unassigned: AtomicU64,
    /// Reads already shorter than the minimum read length before alignment
    pre_short: AtomicU64,
    /// Reads modified by this query set
    modified: AtomicU64,
    pub histogram: OverlapHistogram,
}

impl TrimStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unassigned(&self) {
        self.unassigned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_pre_short(&self) {
        self.pre_short.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a modified read and record its overlap length
    pub fn add_modified(&self, overlap: usize) {
        self.modified.fetch_add(1, Ordering::Relaxed);
        self.histogram.record(overlap);
    }

    pub fn unassigned(&self) -> u64 {
        self.unassigned.load(Ordering::Relaxed)
    }

    pub fn pre_short(&self) -> u64 {
        self.pre_short.load(Ordering::Relaxed)
    }

    pub fn modified(&self) -> u64 {
        self.modified.load(Ordering::Relaxed)
    }
}
