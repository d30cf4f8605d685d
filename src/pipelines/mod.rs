//! Batch pipeline: reading, parallel trimming stages and ordered output.

pub mod driver;
pub mod orchestration;
pub mod stages;

pub use driver::{RunSummary, run};
pub use stages::TrimStages;
