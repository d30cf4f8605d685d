//! Translation between alignment-view coordinates and sequence coordinates.
//!
//! An aligned row is the source sequence with gap columns (`-`) inserted.
//! "View" positions index columns of the row; "source" positions index
//! residues of the ungapped sequence. Every cut position on a read is
//! computed in view space by the overlap evaluator and must go through
//! [`view_to_source`] before it touches the read.

use super::scoring::GAP;

/// Half-open view-space span `[start, end)` covered by a row's residues.
///
/// `start` is the number of leading gap columns, `end` the view position just
/// past the last residue. A row without residues has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowSpan {
    pub start: i32,
    pub end: i32,
}

impl RowSpan {
    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Compute the view-space span of a gapped row
pub fn row_span(row: &[u8]) -> RowSpan {
    match row.iter().position(|&c| c != GAP) {
        Some(first) => {
            // A residue exists, so rposition cannot fail
            let last = row.iter().rposition(|&c| c != GAP).unwrap_or(first);
            RowSpan {
                start: first as i32,
                end: last as i32 + 1,
            }
        }
        None => RowSpan {
            start: row.len() as i32,
            end: row.len() as i32,
        },
    }
}

/// Number of residues of `row` strictly before view column `view_pos`.
///
/// This is the source position of the residue at or after `view_pos`, i.e.
/// leading gaps and internal gaps before `view_pos` are subtracted. View
/// positions outside the row are clamped.
pub fn view_to_source(row: &[u8], view_pos: i32) -> usize {
    let end = view_pos.clamp(0, row.len() as i32) as usize;
    row[..end].iter().filter(|&&c| c != GAP).count()
}

/// View column holding residue `source_pos` of `row`.
///
/// `source_pos == residue count` maps to the column just past the last
/// residue. Returns `None` for positions beyond that.
pub fn source_to_view(row: &[u8], source_pos: usize) -> Option<i32> {
    let mut seen = 0usize;
    for (col, &c) in row.iter().enumerate() {
        if c == GAP {
            continue;
        }
        if seen == source_pos {
            return Some(col as i32);
        }
        seen += 1;
    }
    if seen == source_pos {
        // One past the last residue
        let span = row_span(row);
        Some(if seen == 0 { 0 } else { span.end })
    } else {
        None
    }
}

/// Strip gap columns from a row, recovering the source sequence
pub fn ungapped(row: &[u8]) -> Vec<u8> {
    row.iter().copied().filter(|&c| c != GAP).collect()
}
