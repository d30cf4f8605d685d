//! Semi-global pairwise alignment of reads against short queries.
//!
//! The recurrence is plain global alignment (Needleman-Wunsch) with a
//! uniform per-column gap score. Which end gaps are free is configurable per
//! sequence end, which turns the global alignment into the "adapter hangs off
//! the edge of the read" model used for trimming:
//!
//! ```text
//!   EndGaps::Any    ....ADAPTER....   every end gap is free
//!   EndGaps::Left   [APT]ER........   query may start before the read,
//!                                     read may continue after the query
//!   EndGaps::Right  ........ADA[PTER] read may start before the query,
//!                                     query may continue after the read
//! ```
//!
//! Bulk alignment is a sequential loop over the pairs reusing the
//! thread-local [`AlignmentWorkspace`](super::workspace::AlignmentWorkspace).
//! Parallelism lives one level up, across read batches.

use super::scoring::{encode_base, ScoreMatrix, GAP};
use super::workspace::with_workspace;

// Traceback codes
const TB_DIAG: u8 = 0;
const TB_UP: u8 = 1; // consume read, gap in query row
const TB_LEFT: u8 = 2; // consume query, gap in read row

/// End-gap configuration for one alignment call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndGaps {
    /// Free end gaps on all four sequence ends
    Any,
    /// Query may overhang the read's left end; read may continue after the
    /// query. Used for LEFT / LEFT_TAIL trimming.
    Left,
    /// Read may start before the query; query may overhang the read's right
    /// end. Used for RIGHT / RIGHT_TAIL trimming.
    Right,
}

/// Per-end flags derived from [`EndGaps`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeEndFlags {
    /// Leading gaps in the read row are free (query starts before the read)
    pub query_before_read: bool,
    /// Leading gaps in the query row are free (read starts before the query)
    pub read_before_query: bool,
    /// Trailing gaps in the read row are free (query ends after the read)
    pub query_after_read: bool,
    /// Trailing gaps in the query row are free (read ends after the query)
    pub read_after_query: bool,
}

impl EndGaps {
    pub fn flags(self) -> FreeEndFlags {
        match self {
            EndGaps::Any => FreeEndFlags {
                query_before_read: true,
                read_before_query: true,
                query_after_read: true,
                read_after_query: true,
            },
            EndGaps::Left => FreeEndFlags {
                query_before_read: true,
                read_before_query: false,
                query_after_read: false,
                read_after_query: true,
            },
            EndGaps::Right => FreeEndFlags {
                query_before_read: false,
                read_before_query: true,
                query_after_read: true,
                read_after_query: false,
            },
        }
    }
}

/// One aligned (read, query) pair.
///
/// Rows are ASCII with `-` for gap columns and have equal length. Leading and
/// trailing end gaps are materialised, so the view coordinates of both rows
/// share the same origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub score: i32,
    pub read_row: Vec<u8>,
    pub query_row: Vec<u8>,
}

impl AlignedPair {
    /// Number of alignment columns
    pub fn len(&self) -> usize {
        self.read_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_row.is_empty()
    }

    /// Three-line text rendering (read, match markers, query) for logging
    pub fn pretty(&self, matrix: &ScoreMatrix) -> String {
        let mut markers = String::with_capacity(self.len());
        for (&r, &q) in self.read_row.iter().zip(&self.query_row) {
            markers.push(if r == GAP || q == GAP {
                ' '
            } else if matrix.is_match_ascii(r, q) {
                '|'
            } else {
                'x'
            });
        }
        format!(
            "read  {}\n      {}\nquery {}",
            String::from_utf8_lossy(&self.read_row),
            markers,
            String::from_utf8_lossy(&self.query_row)
        )
    }
}

/// Align one read against one query under the given end-gap configuration.
///
/// Tie-breaking is deterministic: within a cell a diagonal step beats a gap
/// in the query row, which beats a gap in the read row; among end cells the
/// bottom-right corner wins, then the last column (largest read prefix
/// first), then the last row (largest query prefix first).
pub fn align_pair(read: &[u8], query: &[u8], ends: EndGaps, matrix: &ScoreMatrix) -> AlignedPair {
    with_workspace(|ws| {
        ws.clear();
        ws.encoded_read.extend(read.iter().map(|&b| encode_base(b)));
        ws.encoded_query.extend(query.iter().map(|&b| encode_base(b)));

        let n = read.len();
        let m = query.len();
        let width = m + 1;
        ws.prepare(n, m);

        let flags = ends.flags();
        let gap = matrix.gap();
        let h = &mut ws.h_matrix;
        let tb = &mut ws.tb_matrix;

        // Boundary conditions
        h[0] = 0;
        tb[0] = TB_DIAG;
        for i in 1..=n {
            h[i * width] = if flags.read_before_query { 0 } else { gap * i as i32 };
            tb[i * width] = TB_UP;
        }
        for j in 1..=m {
            h[j] = if flags.query_before_read { 0 } else { gap * j as i32 };
            tb[j] = TB_LEFT;
        }

        for i in 1..=n {
            let rc = ws.encoded_read[i - 1];
            let row = i * width;
            let prev = (i - 1) * width;
            for j in 1..=m {
                let diag = h[prev + j - 1] + matrix.score(rc, ws.encoded_query[j - 1]);
                let up = h[prev + j] + gap;
                let left = h[row + j - 1] + gap;

                let (best, code) = if diag >= up && diag >= left {
                    (diag, TB_DIAG)
                } else if up >= left {
                    (up, TB_UP)
                } else {
                    (left, TB_LEFT)
                };
                h[row + j] = best;
                tb[row + j] = code;
            }
        }

        // Pick the end cell
        let mut end_i = n;
        let mut end_j = m;
        let mut score = h[n * width + m];
        if flags.read_after_query {
            for i in (0..n).rev() {
                let s = h[i * width + m];
                if s > score {
                    score = s;
                    end_i = i;
                    end_j = m;
                }
            }
        }
        if flags.query_after_read {
            for j in (0..m).rev() {
                let s = h[n * width + j];
                if s > score {
                    score = s;
                    end_i = n;
                    end_j = j;
                }
            }
        }

        // Traceback, built reversed
        let cols = n + m;
        let mut read_row = Vec::with_capacity(cols);
        let mut query_row = Vec::with_capacity(cols);

        // Free trailing gaps
        for k in (end_i..n).rev() {
            read_row.push(read[k]);
            query_row.push(GAP);
        }
        for k in (end_j..m).rev() {
            read_row.push(GAP);
            query_row.push(query[k]);
        }

        let (mut i, mut j) = (end_i, end_j);
        while i > 0 || j > 0 {
            let code = if i == 0 {
                TB_LEFT
            } else if j == 0 {
                TB_UP
            } else {
                tb[i * width + j]
            };
            match code {
                TB_DIAG => {
                    i -= 1;
                    j -= 1;
                    read_row.push(read[i]);
                    query_row.push(query[j]);
                }
                TB_UP => {
                    i -= 1;
                    read_row.push(read[i]);
                    query_row.push(GAP);
                }
                _ => {
                    j -= 1;
                    read_row.push(GAP);
                    query_row.push(query[j]);
                }
            }
        }

        read_row.reverse();
        query_row.reverse();

        AlignedPair {
            score,
            read_row,
            query_row,
        }
    })
}

/// Align every (read, query) pair of a batch with one shared configuration.
///
/// Results are returned in input order.
pub fn align_batch(pairs: &[(&[u8], &[u8])], ends: EndGaps, matrix: &ScoreMatrix) -> Vec<AlignedPair> {
    let mut out = Vec::with_capacity(pairs.len());
    for &(read, query) in pairs {
        out.push(align_pair(read, query, ends, matrix));
    }
    out
}

#[cfg(test)]
#[path = "semi_global_test.rs"]
mod semi_global_test;
