//! Detection and removal of one query set across a batch of reads.

use clap::ValueEnum;

use crate::core::alignment::ScoreMatrix;

use super::cycle::AlignmentCycle;
use super::decision::{align_window, apply_removal, cut_action, TagOptions};
use super::overlap::{evaluate, Candidate, CandidatePool, OverlapParams};
use super::query::{QueryKind, QuerySet, RevCompMode};
use super::stats::TrimStats;
use super::types::SeqRead;

/// Which alignments are written to the debug log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AlignLog {
    #[default]
    None,
    /// Every read with at least one passing candidate
    All,
    /// Only alignments that modified a read
    Mod,
}

/// Per-purpose aligner configuration
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_score: i32,
    pub read_n_as_match: bool,
    pub overlap: OverlapParams,
    /// Bases aligned in tail modes; `None` means the query length
    pub tail_length: Option<usize>,
    pub rev_comp: RevCompMode,
    pub colorspace: bool,
    /// Reads shorter than this are counted as pre-filter short
    pub min_read_length: usize,
    /// Detect but do not cut
    pub keep_reads: bool,
    pub tags: TagOptions,
    pub align_log: AlignLog,
}

/// Aligns reads against one query set with its own score matrix and
/// counters.
#[derive(Debug)]
pub struct QueryAligner {
    name: String,
    queries: QuerySet,
    matrix: ScoreMatrix,
    config: AlignerConfig,
    stats: TrimStats,
}

impl QueryAligner {
    pub fn new(name: impl Into<String>, queries: QuerySet, config: AlignerConfig) -> Self {
        let matrix = ScoreMatrix::new(
            config.match_score,
            config.mismatch_score,
            config.gap_score,
            config.read_n_as_match,
        );
        let mut config = config;
        if config.align_log != AlignLog::None {
            config.overlap.keep_alignment_text = true;
        }
        Self {
            name: name.into(),
            queries,
            matrix,
            config,
            stats: TrimStats::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queries(&self) -> &QuerySet {
        &self.queries
    }

    pub fn stats(&self) -> &TrimStats {
        &self.stats
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    fn is_barcoding(&self) -> bool {
        self.queries.kind == QueryKind::Barcode
    }

    /// Align every read against every considered query, then trim each read
    /// with its best valid query.
    ///
    /// Returns the index of the applied query per read (`None` for no match).
    /// Barcode reads without a match count as unassigned.
    pub fn process(&self, reads: &mut [&mut SeqRead]) -> Vec<Option<usize>> {
        self.process_cycle(reads, true)
    }

    /// [`process`](Self::process) for one of several removal cycles over the
    /// same reads. Short reads are counted only when `count_pre_short` is set,
    /// so repeated cycles count each read once.
    pub fn process_cycle(&self, reads: &mut [&mut SeqRead], count_pre_short: bool) -> Vec<Option<usize>> {
        let cfg = &self.config;
        let trim_end = cfg.overlap.trim_end;
        let barcoding = self.is_barcoding();

        let mut preload = AlignmentCycle::begin_preload(trim_end.end_gaps());
        for (i, read) in reads.iter().enumerate() {
            if count_pre_short && !barcoding && read.len() < cfg.min_read_length {
                self.stats.add_pre_short();
            }
            for (qi, query) in self.queries.iter().enumerate() {
                if !cfg.rev_comp.considers(query.rev_comp) {
                    continue;
                }
                let tail = cfg.tail_length.unwrap_or(query.len());
                let window = align_window(read.len(), trim_end, tail, cfg.colorspace);
                preload.push(i, qi, &read.seq[window.range()], &query.seq);
            }
        }

        let mut results = preload.compute(&self.matrix);
        let keep_all = cfg.align_log == AlignLog::All;
        let mut assigned = Vec::with_capacity(reads.len());

        for (i, read) in reads.iter_mut().enumerate() {
            let mut pool = CandidatePool::new(keep_all);
            while let Some(res) = results.next_for_read(i) {
                let query = self.queries.get(res.query_idx);
                let tail = cfg.tail_length.unwrap_or(query.len());
                let window = align_window(read.len(), trim_end, tail, cfg.colorspace);
                let r = evaluate(&res.alignment, query.len(), window.len, &cfg.overlap, &self.matrix);
                if r.passes(&cfg.overlap) {
                    pool.offer(Candidate {
                        query_idx: res.query_idx,
                        results: r,
                        alignment: res.alignment,
                    });
                }
            }

            if keep_all && !pool.is_empty() && log::log_enabled!(log::Level::Debug) {
                log::debug!("[{}] {}", self.name, pool.report(&read.id, &self.queries));
            }

            let Some(best) = pool.into_best() else {
                if barcoding {
                    self.stats.add_unassigned();
                }
                assigned.push(None);
                continue;
            };

            let query = self.queries.get(best.query_idx);
            let tail = cfg.tail_length.unwrap_or(query.len());
            let window = align_window(read.len(), trim_end, tail, cfg.colorspace);
            let action = cut_action(trim_end, &best.results, &best.alignment.read_row, window);

            if cfg.align_log == AlignLog::Mod && !cfg.keep_reads {
                if let Some(text) = &best.results.alignment {
                    log::debug!(
                        "[{}] read {} query {} {:?}\n{}",
                        self.name,
                        read.id,
                        query.id,
                        action,
                        text
                    );
                }
            }

            apply_removal(
                &mut **read,
                query,
                &best.results,
                action,
                &self.stats,
                cfg.tags,
                cfg.keep_reads,
            );
            assigned.push(Some(best.query_idx));
        }

        results.finish();
        assigned
    }

    /// Per-query and per-set statistics as log-ready text
    pub fn report(&self) -> String {
        let s = &self.stats;
        let mut out = format!("{} ({} {}(s)):", self.name, self.queries.len(), self.queries.kind.as_str());
        for q in self.queries.iter() {
            out.push_str(&format!(
                "\n  {:<24} overlap {:>10}  full-length {:>10}",
                q.id,
                q.overlap_removals(),
                q.full_length_removals()
            ));
        }
        if self.is_barcoding() {
            out.push_str(&format!("\n  unassigned reads: {}", s.unassigned()));
        } else {
            out.push_str(&format!("\n  short prior to removal: {}", s.pre_short()));
        }
        out.push_str(&format!("\n  modified reads: {}", s.modified()));
        out.push_str(&format!("\n  overlap lengths: {}", s.histogram.summary()));
        out
    }
}

#[cfg(test)]
#[path = "aligner_test.rs"]
mod aligner_test;
