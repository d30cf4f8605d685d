//! Adapter and barcode trimming on top of the semi-global aligner.
//!
//! ```text
//! QuerySet ─┐
//!           ├─ QueryAligner::process ── cycle (preload → compute → results)
//! reads ────┘        │                        │
//!                    │                 overlap::evaluate ── CandidatePool
//!                    │                        │
//!                    └──────────── decision::cut_action / apply_removal ── TrimStats
//! ```

pub mod aligner;
pub mod cycle;
pub mod decision;
pub mod overlap;
pub mod pair_overlap;
pub mod preprocess;
pub mod query;
pub mod stats;
pub mod types;

pub use aligner::{AlignLog, AlignerConfig, QueryAligner};
pub use overlap::{AlignResults, OverlapParams};
pub use query::{AdapterPreset, Query, QueryKind, QuerySet, RevCompMode};
pub use stats::{TrimStats, MAX_READ_LENGTH};
pub use types::{PairedRead, SeqRead, TrimEnd};
