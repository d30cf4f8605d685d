//! Overlap evaluation: turns a raw alignment into [`AlignResults`] and picks
//! the best valid query per read.

use crate::core::alignment::{encode_base, row_span, AlignedPair, ScoreMatrix, BASE_N, GAP};

use super::query::QuerySet;
use super::types::TrimEnd;

/// Thresholds one query set is evaluated against
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapParams {
    pub trim_end: TrimEnd,
    /// Allowed errors per overlapping column
    pub error_rate: f64,
    /// Minimum overlap; `None` means the full query length
    pub min_overlap: Option<usize>,
    /// Reject alignments whose query hangs off the anchored side
    pub strict_region: bool,
    /// Capture read bases opposite query `N`s
    pub extract_umi: bool,
    /// Keep a text rendering of each alignment for the alignment log
    pub keep_alignment_text: bool,
}

impl OverlapParams {
    pub fn min_overlap_for(&self, query_len: usize) -> usize {
        self.min_overlap.unwrap_or(query_len)
    }
}

/// Everything derived from one (read, query) alignment.
///
/// Positions are alignment-view columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignResults {
    pub score: i32,
    pub mismatches: i32,
    /// Gap columns in the read row within the overlap
    pub gaps_read: i32,
    /// Gap columns in the query row within the overlap
    pub gaps_query: i32,
    pub start_pos_read: i32,
    pub end_pos_read: i32,
    pub start_pos_query: i32,
    pub end_pos_query: i32,
    pub start_pos: i32,
    pub end_pos: i32,
    pub overlap_length: i32,
    pub query_length: i32,
    /// Number of read bases that were handed to the aligner
    pub tail_length: i32,
    pub allowed_errors: f64,
    /// UMI bases captured from query `N` columns
    pub tag: String,
    pub alignment: Option<String>,
}

impl AlignResults {
    pub fn made_errors(&self) -> i32 {
        self.mismatches + self.gaps_read + self.gaps_query
    }

    /// Whether the whole query lies inside the overlap
    pub fn is_full_length(&self) -> bool {
        self.overlap_length == self.query_length
    }

    /// Region checks that do not depend on error counts
    pub fn is_valid_region(&self, trim_end: TrimEnd, strict_region: bool) -> bool {
        if self.overlap_length < 1 {
            return false;
        }
        if strict_region {
            if trim_end.is_right() && self.start_pos_query < self.start_pos_read {
                return false;
            }
            if trim_end.is_left() && self.end_pos_query > self.end_pos_read {
                return false;
            }
        }
        true
    }

    /// Full acceptance test for one candidate
    pub fn passes(&self, params: &OverlapParams) -> bool {
        self.is_valid_region(params.trim_end, params.strict_region)
            && self.made_errors() as f64 <= self.allowed_errors
            && self.overlap_length as usize >= params.min_overlap_for(self.query_length as usize)
    }
}

/// Derive overlap window, error counts and tag from one alignment.
///
/// `tail_length` is the number of read bases aligned (after any tail or
/// colorspace windowing).
pub fn evaluate(
    aln: &AlignedPair,
    query_length: usize,
    tail_length: usize,
    params: &OverlapParams,
    matrix: &ScoreMatrix,
) -> AlignResults {
    let read_span = row_span(&aln.read_row);
    let query_span = row_span(&aln.query_row);

    let start_pos = read_span.start.max(query_span.start);
    let end_pos = read_span.end.min(query_span.end);
    let overlap_length = (end_pos - start_pos).max(0);

    let mut mismatches = 0;
    let mut gaps_read = 0;
    let mut gaps_query = 0;
    let mut tag = String::new();

    if overlap_length > 0 {
        let window = start_pos as usize..end_pos as usize;
        for (&r, &q) in aln.read_row[window.clone()].iter().zip(&aln.query_row[window]) {
            if r == GAP {
                gaps_read += 1;
            } else if q == GAP {
                gaps_query += 1;
            } else {
                let has_n = encode_base(r) == BASE_N || q == b'N';
                if !has_n && !matrix.is_match_ascii(r, q) {
                    mismatches += 1;
                }
                if params.extract_umi && q == b'N' {
                    tag.push(r as char);
                }
            }
        }
    }

    AlignResults {
        score: aln.score,
        mismatches,
        gaps_read,
        gaps_query,
        start_pos_read: read_span.start,
        end_pos_read: read_span.end,
        start_pos_query: query_span.start,
        end_pos_query: query_span.end,
        start_pos,
        end_pos,
        overlap_length,
        query_length: query_length as i32,
        tail_length: tail_length as i32,
        allowed_errors: params.error_rate * overlap_length as f64,
        tag,
        alignment: params.keep_alignment_text.then(|| aln.pretty(matrix)),
    }
}

/// A passing (query, alignment) candidate for one read
#[derive(Debug, Clone)]
pub struct Candidate {
    pub query_idx: usize,
    pub results: AlignResults,
    pub alignment: AlignedPair,
}

/// Best-candidate selection for one read.
///
/// Only a strictly greater score replaces the current best, so among equal
/// scores the first query offered wins. With `keep_all` every candidate is
/// retained for the alignment log; selection is unaffected.
#[derive(Debug, Default)]
pub struct CandidatePool {
    best: Option<usize>,
    candidates: Vec<Candidate>,
    keep_all: bool,
}

impl CandidatePool {
    pub fn new(keep_all: bool) -> Self {
        Self {
            best: None,
            candidates: Vec::new(),
            keep_all,
        }
    }

    /// Offer a candidate that already passed [`AlignResults::passes`]
    pub fn offer(&mut self, candidate: Candidate) {
        let better = match self.best {
            Some(b) => candidate.results.score > self.candidates[b].results.score,
            None => true,
        };

        if self.keep_all {
            self.candidates.push(candidate);
            if better {
                self.best = Some(self.candidates.len() - 1);
            }
        } else if better {
            self.candidates.clear();
            self.candidates.push(candidate);
            self.best = Some(0);
        }
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.map(|b| &self.candidates[b])
    }

    pub fn into_best(mut self) -> Option<Candidate> {
        let best = self.best?;
        Some(self.candidates.swap_remove(best))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate list sorted by score (descending, stable) with the score
    /// gap between the top two entries
    pub fn report(&self, read_id: &str, queries: &QuerySet) -> String {
        let mut order: Vec<&Candidate> = self.candidates.iter().collect();
        order.sort_by(|a, b| b.results.score.cmp(&a.results.score));

        let mut out = format!("{} candidate(s) for read {}", order.len(), read_id);
        if order.len() > 1 {
            let gap = order[0].results.score - order[1].results.score;
            out.push_str(&format!(", score gap to runner-up {gap}"));
        }
        for c in order {
            let r = &c.results;
            out.push_str(&format!(
                "\n  {} score {} overlap {} errors {} (allowed {:.2}) mismatches {} gaps {}/{}",
                queries.get(c.query_idx).id,
                r.score,
                r.overlap_length,
                r.made_errors(),
                r.allowed_errors,
                r.mismatches,
                r.gaps_read,
                r.gaps_query,
            ));
            if let Some(text) = &r.alignment {
                for line in text.lines() {
                    out.push_str("\n    ");
                    out.push_str(line);
                }
            }
        }
        out
    }
}
