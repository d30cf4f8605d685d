//! Preload → compute → results cycle for bulk alignment.
//!
//! Each phase is its own type, so phases cannot run out of order:
//!
//! ```text
//! AlignmentCycle::begin_preload(ends) -> Preload   push() every (read, query) pair
//! Preload::compute(matrix)            -> Results   one bulk alignment call
//! Results::next_for_read(i) / next_result()        consume in push order
//! Results::finish()                                every slot consumed exactly once
//! ```
//!
//! Sequences are copied into two contiguous buffers with per-job offsets so
//! the whole batch is one allocation per side.

use crate::core::alignment::{align_batch, AlignedPair, EndGaps, ScoreMatrix};

/// Entry point of a cycle
pub struct AlignmentCycle;

impl AlignmentCycle {
    pub fn begin_preload(ends: EndGaps) -> Preload {
        Preload::with_capacity(ends, 256, 256 * 160)
    }
}

/// One preloaded (read, query) pair
#[derive(Debug, Clone, Copy)]
struct PairJob {
    read_idx: usize,
    query_idx: usize,
    read_offset: usize,
    read_len: usize,
    query_offset: usize,
    query_len: usize,
}

/// PRELOAD phase: collects pairs
#[derive(Debug)]
pub struct Preload {
    ends: EndGaps,
    jobs: Vec<PairJob>,
    read_seqs: Vec<u8>,
    query_seqs: Vec<u8>,
}

impl Preload {
    pub fn with_capacity(ends: EndGaps, job_capacity: usize, seq_capacity: usize) -> Self {
        Self {
            ends,
            jobs: Vec::with_capacity(job_capacity),
            read_seqs: Vec::with_capacity(seq_capacity),
            query_seqs: Vec::with_capacity(seq_capacity / 4),
        }
    }

    /// Queue one pair. Read indices must be non-decreasing.
    pub fn push(&mut self, read_idx: usize, query_idx: usize, read_seq: &[u8], query_seq: &[u8]) {
        if let Some(last) = self.jobs.last() {
            assert!(
                read_idx >= last.read_idx,
                "alignment cycle: read {} pushed after read {}",
                read_idx,
                last.read_idx
            );
        }

        let read_offset = self.read_seqs.len();
        let query_offset = self.query_seqs.len();
        self.read_seqs.extend_from_slice(read_seq);
        self.query_seqs.extend_from_slice(query_seq);

        self.jobs.push(PairJob {
            read_idx,
            query_idx,
            read_offset,
            read_len: read_seq.len(),
            query_offset,
            query_len: query_seq.len(),
        });
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// COMPUTE phase: align every queued pair in one call
    pub fn compute(self, matrix: &ScoreMatrix) -> Results {
        let pairs: Vec<(&[u8], &[u8])> = self
            .jobs
            .iter()
            .map(|j| {
                (
                    &self.read_seqs[j.read_offset..j.read_offset + j.read_len],
                    &self.query_seqs[j.query_offset..j.query_offset + j.query_len],
                )
            })
            .collect();

        let alignments = align_batch(&pairs, self.ends, matrix);
        log::trace!("alignment cycle: computed {} pair(s)", alignments.len());

        Results {
            jobs: self.jobs,
            alignments: alignments.into_iter(),
            cursor: 0,
        }
    }
}

/// One consumed result
#[derive(Debug, Clone)]
pub struct PairResult {
    pub read_idx: usize,
    pub query_idx: usize,
    pub alignment: AlignedPair,
}

/// RESULTS phase: sequential consumption in push order
#[derive(Debug)]
pub struct Results {
    jobs: Vec<PairJob>,
    alignments: std::vec::IntoIter<AlignedPair>,
    cursor: usize,
}

impl Results {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Slots not yet consumed
    pub fn remaining(&self) -> usize {
        self.jobs.len() - self.cursor
    }

    /// Next result regardless of read
    pub fn next_result(&mut self) -> Option<PairResult> {
        let job = *self.jobs.get(self.cursor)?;
        let alignment = self.alignments.next()?;
        self.cursor += 1;
        Some(PairResult {
            read_idx: job.read_idx,
            query_idx: job.query_idx,
            alignment,
        })
    }

    /// Next result if it belongs to `read_idx`.
    ///
    /// Panics if a result of an earlier read was left unconsumed.
    pub fn next_for_read(&mut self, read_idx: usize) -> Option<PairResult> {
        let job = self.jobs.get(self.cursor)?;
        assert!(
            job.read_idx >= read_idx,
            "alignment cycle: result of read {} skipped while consuming read {}",
            job.read_idx,
            read_idx
        );
        if job.read_idx != read_idx {
            return None;
        }
        self.next_result()
    }

    /// End the cycle. Panics if any slot was not consumed.
    pub fn finish(self) {
        assert_eq!(
            self.cursor,
            self.jobs.len(),
            "alignment cycle finished with {} unconsumed result(s)",
            self.jobs.len() - self.cursor
        );
    }
}
