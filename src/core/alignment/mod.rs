//! Alignment kernels: score model, semi-global DP and coordinate helpers.
//!
//! These modules know nothing about reads, adapters or trimming policy; they
//! align byte sequences and report gapped rows.

pub mod coordinates;
pub mod scoring;
pub mod semi_global;
pub mod workspace; // Thread-local DP buffers reused across pairs

pub use coordinates::{row_span, view_to_source, RowSpan};
pub use scoring::{encode_base, ScoreMatrix, BASE_N, GAP};
pub use semi_global::{align_batch, align_pair, AlignedPair, EndGaps};
