//! Fixed trimming, uncalled-base filter and quality tail trimming applied
//! before any alignment.

use crate::core::utils::count_uncalled;

use super::types::{PairedRead, SeqRead};

/// Pre-processing settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreprocessOpt {
    pub pre_trim_left: usize,
    pub pre_trim_right: usize,
    /// Reads with more `N`s than this are filtered
    pub max_uncalled: usize,
    /// Phred threshold for tail trimming; `None` disables it
    pub qtrim_threshold: Option<u8>,
    /// ASCII offset of quality scores
    pub qtrim_offset: u8,
}

impl PreprocessOpt {
    pub fn is_noop(&self) -> bool {
        self.pre_trim_left == 0 && self.pre_trim_right == 0 && self.qtrim_threshold.is_none()
    }
}

/// Remove a fixed number of bases from both ends
pub fn trim_fixed(read: &mut SeqRead, left: usize, right: usize) {
    let len = read.len();
    read.keep_range(left, len.saturating_sub(right));
}

/// Remove trailing bases whose Phred score is below `threshold`.
///
/// Reads without qualities are left unchanged.
pub fn trim_quality_tail(read: &mut SeqRead, threshold: u8, offset: u8) {
    let Some(qual) = read.qual.as_ref() else {
        return;
    };
    let keep = qual
        .iter()
        .rposition(|&q| q.saturating_sub(offset) >= threshold)
        .map_or(0, |p| p + 1);
    read.keep_range(0, keep);
}

/// Apply fixed trimming and quality trimming to one read; returns false if
/// the read fails the uncalled-base filter
pub fn preprocess_read(read: &mut SeqRead, opt: &PreprocessOpt) -> bool {
    if opt.pre_trim_left > 0 || opt.pre_trim_right > 0 {
        trim_fixed(read, opt.pre_trim_left, opt.pre_trim_right);
    }
    let passes = count_uncalled(&read.seq) <= opt.max_uncalled;
    if let Some(threshold) = opt.qtrim_threshold {
        trim_quality_tail(read, threshold, opt.qtrim_offset);
    }
    passes
}

/// Pre-process every read of a pair; the pair is marked filtered if any
/// mate fails the uncalled-base filter
pub fn preprocess_pair(pair: &mut PairedRead, opt: &PreprocessOpt) {
    let mut passes = preprocess_read(&mut pair.m1, opt);
    if let Some(m2) = pair.m2.as_mut() {
        passes &= preprocess_read(m2, opt);
    }
    pair.filtered = !passes;
}
