// src/defaults.rs

// Adapter Scoring
pub const ADAPTER_MATCH: i32 = 1;
pub const ADAPTER_MISMATCH: i32 = -1;
pub const ADAPTER_GAP: i32 = -6;
pub const ADAPTER_ERROR_RATE: f64 = 0.1;
pub const ADAPTER_MIN_OVERLAP: usize = 3;
pub const ADAPTER_TRIM_END: &str = "RIGHT";
pub const ADAPTER_CYCLES: usize = 1;
pub const PAIR_OVERLAP_MIN: usize = 40;

// Barcode Scoring
pub const BARCODE_MATCH: i32 = 1;
pub const BARCODE_MISMATCH: i32 = -1;
pub const BARCODE_GAP: i32 = -9;
pub const BARCODE_ERROR_RATE: f64 = 0.0;
pub const BARCODE_TRIM_END: &str = "LEFT";

// Filtering
pub const MIN_READ_LENGTH: usize = 18;
pub const MAX_UNCALLED: usize = 0;
pub const QTRIM_OFFSET: u8 = 33;

// Processing
pub const BATCH_SIZE: usize = 65_536;
pub const TARGET: &str = "trimmed";

// Other Constants
pub const VERBOSITY: i32 = 3;
