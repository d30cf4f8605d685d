//! Paired-end overlap detection.
//!
//! When the insert is shorter than the read length both mates read through
//! into the adapter. Mate 1 is aligned against the reverse complement of
//! mate 2 with all end gaps free; a valid overlap where the reverse-
//! complemented mate 2 starts before mate 1 marks the insert, and both mates
//! are cut to it.
//!
//! ```text
//!   m1       IIIIIIIIIIaaaa
//!   rc(m2) aaaIIIIIIIIII
//!              ^ insert ^
//! ```

use crate::core::alignment::{view_to_source, EndGaps, ScoreMatrix};
use crate::core::utils::reverse_complement;

use super::cycle::AlignmentCycle;
use super::overlap::{evaluate, OverlapParams};
use super::stats::TrimStats;
use super::types::{PairedRead, TrimEnd};

/// Mate-overlap detector with its own statistics
#[derive(Debug)]
pub struct PairOverlap {
    matrix: ScoreMatrix,
    params: OverlapParams,
    stats: TrimStats,
}

impl PairOverlap {
    pub fn new(matrix: ScoreMatrix, error_rate: f64, min_overlap: usize) -> Self {
        Self {
            matrix,
            params: OverlapParams {
                trim_end: TrimEnd::Any,
                error_rate,
                min_overlap: Some(min_overlap),
                strict_region: false,
                extract_umi: false,
                keep_alignment_text: false,
            },
            stats: TrimStats::new(),
        }
    }

    pub fn stats(&self) -> &TrimStats {
        &self.stats
    }

    /// Detect and cut read-through on every non-filtered paired entry.
    /// Returns the number of pairs cut.
    pub fn process(&self, pairs: &mut [PairedRead]) -> usize {
        let mut preload = AlignmentCycle::begin_preload(EndGaps::Any);
        for (i, pair) in pairs.iter().enumerate() {
            if pair.filtered {
                continue;
            }
            if let Some(m2) = &pair.m2 {
                preload.push(i, 0, &pair.m1.seq, &reverse_complement(&m2.seq));
            }
        }

        let mut results = preload.compute(&self.matrix);
        let mut cut = 0;

        for (i, pair) in pairs.iter_mut().enumerate() {
            let Some(res) = results.next_for_read(i) else {
                continue;
            };
            let Some(m2) = pair.m2.as_mut() else {
                continue;
            };

            let aln = &res.alignment;
            let r = evaluate(aln, m2.len(), pair.m1.len(), &self.params, &self.matrix);
            if !r.passes(&self.params) || r.start_pos_query >= r.start_pos_read {
                continue;
            }

            let m1_keep = view_to_source(&aln.read_row, r.end_pos_query);
            let m2_skip = view_to_source(&aln.query_row, r.start_pos_read);
            let m2_keep = m2.len().saturating_sub(m2_skip);

            log::trace!(
                "pair overlap {}: overlap {} m1 {} -> {} m2 {} -> {}",
                pair.m1.id,
                r.overlap_length,
                pair.m1.len(),
                m1_keep,
                m2.len(),
                m2_keep
            );

            pair.m1.keep_range(0, m1_keep);
            m2.keep_range(0, m2_keep);
            self.stats.add_modified(r.overlap_length as usize);
            cut += 1;
        }

        results.finish();
        cut
    }
}
