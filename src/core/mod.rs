//! Core reusable components: alignment kernels, sequence I/O and utilities.
//!
//! Nothing in here depends on the trimming policy in `crate::trimming`.

pub mod alignment;
pub mod io;
pub mod utils;
