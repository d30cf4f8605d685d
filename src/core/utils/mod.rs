#[allow(clippy::module_inception)]
pub mod utils;

pub use utils::*;
