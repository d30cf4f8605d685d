pub mod core; // Alignment kernels, sequence I/O and utilities
pub mod defaults;
pub mod pipelines; // Batch reading, parallel trimming stages, output
pub mod trim_opt;
pub mod trimming; // Query sets, overlap evaluation, cut decisions, statistics
