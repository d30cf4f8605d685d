//! Read, pair and trim-end types shared by every trimming stage.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::core::alignment::EndGaps;

/// Which side of the read is anchored and which side gets cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrimEnd {
    /// Align anywhere; resolved to LEFT or RIGHT per alignment
    Any,
    /// Remove the query and everything before it (keep the suffix)
    Left,
    /// Remove the query and everything after it (keep the prefix)
    Right,
    /// LEFT, aligning only the leading `tail_length` bases
    LeftTail,
    /// RIGHT, aligning only the trailing `tail_length` bases
    RightTail,
}

impl TrimEnd {
    /// End-gap configuration the aligner runs with for this mode
    pub fn end_gaps(self) -> EndGaps {
        match self {
            TrimEnd::Any => EndGaps::Any,
            TrimEnd::Left | TrimEnd::LeftTail => EndGaps::Left,
            TrimEnd::Right | TrimEnd::RightTail => EndGaps::Right,
        }
    }

    pub fn is_tail(self) -> bool {
        matches!(self, TrimEnd::LeftTail | TrimEnd::RightTail)
    }

    pub fn is_left(self) -> bool {
        matches!(self, TrimEnd::Left | TrimEnd::LeftTail)
    }

    pub fn is_right(self) -> bool {
        matches!(self, TrimEnd::Right | TrimEnd::RightTail)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrimEnd::Any => "ANY",
            TrimEnd::Left => "LEFT",
            TrimEnd::Right => "RIGHT",
            TrimEnd::LeftTail => "LEFT_TAIL",
            TrimEnd::RightTail => "RIGHT_TAIL",
        }
    }
}

impl fmt::Display for TrimEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrimEnd {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ANY" => Ok(TrimEnd::Any),
            "LEFT" => Ok(TrimEnd::Left),
            "RIGHT" => Ok(TrimEnd::Right),
            "LEFT_TAIL" => Ok(TrimEnd::LeftTail),
            "RIGHT_TAIL" => Ok(TrimEnd::RightTail),
            _ => Err(format!("Invalid trim end: {s}")),
        }
    }
}

/// A single sequencing read.
///
/// Created by the input stage, mutated in place by the trimming stages and
/// consumed by the output stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeqRead {
    pub id: String,
    pub seq: Vec<u8>,
    /// Present iff the input format carries qualities
    pub qual: Option<Vec<u8>>,
    /// UMI captured from query `N` positions
    pub umi: Option<String>,
    /// A forward adapter was removed
    pub rm_adapter: bool,
    /// A reverse-complement adapter was removed
    pub rm_adapter_rc: bool,
}

impl SeqRead {
    pub fn new(id: impl Into<String>, seq: impl Into<Vec<u8>>, qual: Option<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
            qual,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Keep only `seq[start..end]` (and the matching qualities). Bounds are
    /// clamped to the read.
    pub fn keep_range(&mut self, start: usize, end: usize) {
        let len = self.seq.len();
        let end = end.min(len);
        let start = start.min(end);
        self.seq.truncate(end);
        self.seq.drain(..start);
        if let Some(q) = self.qual.as_mut() {
            q.truncate(end);
            q.drain(..start.min(q.len()));
        }
    }

    /// Append `<separator><tag>` to the read id
    pub fn append_to_id(&mut self, separator: &str, tag: &str) {
        self.id.push_str(separator);
        self.id.push_str(tag);
    }
}

/// Up to three reads processed together plus their barcode assignments.
///
/// Barcode ids are 0 for unassigned, otherwise index + 1 into the barcode
/// query list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PairedRead {
    pub m1: SeqRead,
    pub m2: Option<SeqRead>,
    /// Separate barcode read, if barcodes come in their own stream
    pub barcode: Option<SeqRead>,
    pub barcode_id: usize,
    pub barcode_id2: usize,
    /// Set by the pre-processing stage when the pair fails the uncalled-base filter
    pub filtered: bool,
}

impl PairedRead {
    pub fn single(m1: SeqRead) -> Self {
        Self {
            m1,
            ..Default::default()
        }
    }

    pub fn paired(m1: SeqRead, m2: SeqRead) -> Self {
        Self {
            m1,
            m2: Some(m2),
            ..Default::default()
        }
    }

    pub fn is_paired(&self) -> bool {
        self.m2.is_some()
    }

    /// Append the barcode UMIs to the id of every written mate.
    ///
    /// The UMI of the barcode read (mate 1 for in-read barcodes) comes first,
    /// followed by the UMI of a mate-2 barcode. Returns false when no UMI was
    /// captured.
    pub fn tag_barcode_umi(&mut self, separator: &str) -> bool {
        let first = match &self.barcode {
            Some(bc) => bc.umi.as_deref(),
            None => self.m1.umi.as_deref(),
        };
        let second = self.m2.as_ref().and_then(|m2| m2.umi.as_deref());
        let umi = match (first, second) {
            (Some(a), Some(b)) => format!("{a}{separator}{b}"),
            (Some(a), None) | (None, Some(a)) => a.to_string(),
            (None, None) => return false,
        };

        for mate in std::iter::once(&mut self.m1).chain(self.m2.as_mut()) {
            mate.append_to_id(separator, &umi);
            mate.umi = Some(umi.clone());
        }
        true
    }
}
