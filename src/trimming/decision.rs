//! Cut decisions: from a validated alignment to a concrete trim of the read.
//!
//! The aligner only ever sees a window of the read (tail modes and the
//! colorspace primer skip it). Cut positions are computed inside that window
//! and shifted back by the window offset, so every trim end uses the same
//! view → source translation.

use crate::core::alignment::view_to_source;

use super::overlap::AlignResults;
use super::query::Query;
use super::stats::TrimStats;
use super::types::{SeqRead, TrimEnd};

/// Leading primer characters of a colorspace read that are never aligned
pub const COLORSPACE_PREFIX: usize = 2;

/// Part of a read handed to the aligner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignWindow {
    pub offset: usize,
    pub len: usize,
}

impl AlignWindow {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Window of a `read_len` read aligned under `trim_end`.
///
/// Tail modes restrict the window to the leading (LEFT_TAIL) or trailing
/// (RIGHT_TAIL) `tail_length` bases.
pub fn align_window(read_len: usize, trim_end: TrimEnd, tail_length: usize, colorspace: bool) -> AlignWindow {
    let skip = if colorspace {
        COLORSPACE_PREFIX.min(read_len)
    } else {
        0
    };
    let body = read_len - skip;

    match trim_end {
        TrimEnd::LeftTail => AlignWindow {
            offset: skip,
            len: tail_length.min(body),
        },
        TrimEnd::RightTail => {
            let len = tail_length.min(body);
            AlignWindow {
                offset: skip + body - len,
                len,
            }
        }
        _ => AlignWindow {
            offset: skip,
            len: body,
        },
    }
}

/// What ANY resolves to for one alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyResolution {
    /// Query span covers the read span: nothing is left
    Consumed,
    Left,
    Right,
}

/// Resolve ANY from the overhangs on both sides.
///
/// Left overhang `start_q - start_r` greater than or equal to the right
/// overhang `end_r - end_q` resolves to RIGHT.
pub fn resolve_any(r: &AlignResults) -> AnyResolution {
    if r.start_pos_query <= r.start_pos_read && r.end_pos_query >= r.end_pos_read {
        AnyResolution::Consumed
    } else if r.start_pos_query - r.start_pos_read >= r.end_pos_read - r.end_pos_query {
        AnyResolution::Right
    } else {
        AnyResolution::Left
    }
}

/// Concrete cut on the full read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAction {
    /// Remove `[0, pos)`, keep the suffix
    KeepSuffix(usize),
    /// Remove `[pos, len)`, keep the prefix
    KeepPrefix(usize),
    /// Remove everything
    RemoveAll,
}

impl CutAction {
    pub fn apply(self, read: &mut SeqRead) {
        let len = read.len();
        match self {
            CutAction::KeepSuffix(pos) => read.keep_range(pos, len),
            CutAction::KeepPrefix(pos) => read.keep_range(0, pos),
            CutAction::RemoveAll => read.keep_range(0, 0),
        }
    }
}

/// Cut for an alignment of the window `window` with read row `read_row`
pub fn cut_action(trim_end: TrimEnd, r: &AlignResults, read_row: &[u8], window: AlignWindow) -> CutAction {
    let left_cut = || (window.offset + view_to_source(read_row, r.end_pos)).min(window.range().end);
    let right_cut = || window.offset + view_to_source(read_row, r.start_pos);

    match trim_end {
        TrimEnd::Left | TrimEnd::LeftTail => CutAction::KeepSuffix(left_cut()),
        TrimEnd::Right | TrimEnd::RightTail => CutAction::KeepPrefix(right_cut()),
        TrimEnd::Any => match resolve_any(r) {
            AnyResolution::Consumed => CutAction::RemoveAll,
            AnyResolution::Left => CutAction::KeepSuffix(left_cut()),
            AnyResolution::Right => CutAction::KeepPrefix(right_cut()),
        },
    }
}

/// Id tagging switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagOptions {
    /// Append `_removed_<queryId>` on removal
    pub removal_tags: bool,
    /// Append `_<UMI>` when a tag was captured
    pub umi_tags: bool,
}

/// Separator between a read id and any appended tag
pub const TAG_SEPARATOR: &str = "_";

/// Apply a removal to the read and record it.
///
/// With `keep_read` the match is counted on the query but the read sequence,
/// the modified counter and the histogram are left alone. A captured UMI is
/// always stored on the read; it goes into the id only with `umi_tags`.
pub fn apply_removal(
    read: &mut SeqRead,
    query: &Query,
    r: &AlignResults,
    action: CutAction,
    stats: &TrimStats,
    tags: TagOptions,
    keep_read: bool,
) {
    query.record_removal(r.is_full_length());

    if !keep_read {
        action.apply(read);
        stats.add_modified(r.overlap_length.max(0) as usize);

        if tags.removal_tags {
            read.append_to_id(TAG_SEPARATOR, &format!("removed_{}", query.id));
        }
        if query.rev_comp {
            read.rm_adapter_rc = true;
        } else {
            read.rm_adapter = true;
        }
    }

    if !r.tag.is_empty() {
        if tags.umi_tags {
            read.append_to_id(TAG_SEPARATOR, &r.tag);
        }
        read.umi = Some(r.tag.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(start_r: i32, end_r: i32, start_q: i32, end_q: i32) -> AlignResults {
        let start_pos = start_r.max(start_q);
        let end_pos = end_r.min(end_q);
        AlignResults {
            start_pos_read: start_r,
            end_pos_read: end_r,
            start_pos_query: start_q,
            end_pos_query: end_q,
            start_pos,
            end_pos,
            overlap_length: end_pos - start_pos,
            query_length: end_q - start_q,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_any() {
        // Query covers the read
        assert_eq!(resolve_any(&results(2, 6, 0, 8)), AnyResolution::Consumed);
        // Query hangs off the right end: left overhang larger
        assert_eq!(resolve_any(&results(0, 12, 8, 16)), AnyResolution::Right);
        // Query hangs off the left end
        assert_eq!(resolve_any(&results(3, 15, 0, 8)), AnyResolution::Left);
        // Equal overhangs
        assert_eq!(resolve_any(&results(0, 12, 4, 8)), AnyResolution::Right);
        assert_eq!(resolve_any(&results(0, 12, 3, 8)), AnyResolution::Left);
    }

    #[test]
    fn test_resolve_any_is_deterministic_in_overhangs() {
        for left in -5..5 {
            for right in -5..5 {
                let r = results(5, 20, 5 + left, 20 - right);
                let expected = if left <= 0 && right <= 0 {
                    AnyResolution::Consumed
                } else if left >= right {
                    AnyResolution::Right
                } else {
                    AnyResolution::Left
                };
                assert_eq!(resolve_any(&r), expected, "left {left} right {right}");
            }
        }
    }

    #[test]
    fn test_windows() {
        let w = align_window(20, TrimEnd::Right, 8, false);
        assert_eq!((w.offset, w.len), (0, 20));
        let w = align_window(20, TrimEnd::RightTail, 8, false);
        assert_eq!((w.offset, w.len), (12, 8));
        let w = align_window(20, TrimEnd::LeftTail, 8, true);
        assert_eq!((w.offset, w.len), (2, 8));
        let w = align_window(5, TrimEnd::RightTail, 8, false);
        assert_eq!((w.offset, w.len), (0, 5));
        let w = align_window(1, TrimEnd::Left, 8, true);
        assert_eq!((w.offset, w.len), (1, 0));
    }

    #[test]
    fn test_right_cut_keeps_prefix() {
        let row = b"TTTTTTTTACGT----";
        let r = results(0, 12, 8, 16);
        let w = align_window(12, TrimEnd::Right, 8, false);
        assert_eq!(cut_action(TrimEnd::Right, &r, row, w), CutAction::KeepPrefix(8));
    }

    #[test]
    fn test_right_tail_cut_uses_full_read_coordinates() {
        // 20 bases, adapter in the last 4; aligner saw only the last 8
        let row = b"TTTTACGT----";
        let r = results(0, 8, 4, 12);
        let w = align_window(20, TrimEnd::RightTail, 8, false);
        assert_eq!(cut_action(TrimEnd::RightTail, &r, row, w), CutAction::KeepPrefix(16));
    }

    #[test]
    fn test_left_cut_translates_leading_gaps() {
        let row = b"---ACGTATTTTTTT";
        let r = results(3, 15, 0, 8);
        let w = align_window(12, TrimEnd::Left, 8, false);
        assert_eq!(cut_action(TrimEnd::Left, &r, row, w), CutAction::KeepSuffix(5));
    }

    #[test]
    fn test_left_cut_skips_internal_read_gaps() {
        // Read row has an internal gap inside the overlap
        let row = b"AC-GTTTT";
        let r = results(0, 8, 0, 4);
        let w = align_window(7, TrimEnd::Left, 4, false);
        assert_eq!(cut_action(TrimEnd::Left, &r, row, w), CutAction::KeepSuffix(3));
    }

    #[test]
    fn test_colorspace_shifts_cut() {
        let row = b"---ACGTATTTTTTT";
        let r = results(3, 15, 0, 8);
        let w = align_window(14, TrimEnd::Left, 8, true);
        assert_eq!(cut_action(TrimEnd::Left, &r, row, w), CutAction::KeepSuffix(7));

        let row = b"TTTTTTTTACGT----";
        let r = results(0, 12, 8, 16);
        let w = align_window(14, TrimEnd::Right, 8, true);
        assert_eq!(cut_action(TrimEnd::Right, &r, row, w), CutAction::KeepPrefix(10));
    }

    #[test]
    fn test_any_consumed_removes_everything() {
        let row = b"--ACGT--";
        let r = results(2, 6, 0, 8);
        let w = align_window(4, TrimEnd::Any, 8, false);
        let action = cut_action(TrimEnd::Any, &r, row, w);
        assert_eq!(action, CutAction::RemoveAll);
        let mut read = SeqRead::new("r", b"ACGT".to_vec(), Some(b"IIII".to_vec()));
        action.apply(&mut read);
        assert!(read.is_empty());
        assert_eq!(read.qual.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_apply_removal_updates_counters_and_tags() {
        let query = Query::new("ad1", b"ACGTACGT".to_vec(), false);
        let stats = TrimStats::new();
        let mut read = SeqRead::new("r1", b"TTTTTTTTACGT".to_vec(), None);
        let mut r = results(0, 12, 8, 16);
        r.query_length = 8;
        r.tag = "GG".to_string();
        let tags = TagOptions {
            removal_tags: true,
            umi_tags: true,
        };

        apply_removal(&mut read, &query, &r, CutAction::KeepPrefix(8), &stats, tags, false);
        assert_eq!(read.seq, b"TTTTTTTT");
        assert_eq!(read.id, "r1_removed_ad1_GG");
        assert_eq!(read.umi.as_deref(), Some("GG"));
        assert!(read.rm_adapter && !read.rm_adapter_rc);
        assert_eq!(query.overlap_removals(), 1);
        assert_eq!(query.full_length_removals(), 0);
        assert_eq!(stats.modified(), 1);
        assert_eq!(stats.histogram.count_at(4), 1);
    }

    #[test]
    fn test_apply_removal_keep_read() {
        let query = Query::new("bc", b"ACGT".to_vec(), false);
        let stats = TrimStats::new();
        let mut read = SeqRead::new("r1", b"ACGTTTTT".to_vec(), None);
        let r = results(0, 8, 0, 4);

        apply_removal(&mut read, &query, &r, CutAction::KeepSuffix(4), &stats, TagOptions::default(), true);
        assert_eq!(read.seq, b"ACGTTTTT");
        assert_eq!(read.id, "r1");
        assert_eq!(query.full_length_removals(), 1);
        assert_eq!(stats.modified(), 0);
        assert_eq!(stats.histogram.total(), 0);
    }
}
