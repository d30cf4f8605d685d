use rayon::prelude::*;

use super::stages::TrimStages;
use crate::trimming::types::PairedRead;

/// Sub-batch size for parallel processing
///
/// Each sub-batch runs one preload/compute/results cycle per stage, so it
/// should hold enough reads to amortise the per-cycle bookkeeping.
#[cfg(target_arch = "aarch64")]
pub const SUB_BATCH_SIZE: usize = 1024;

#[cfg(not(target_arch = "aarch64"))]
pub const SUB_BATCH_SIZE: usize = 512;

/// Process a batch using parallel sub-batches
///
/// Reads stay in their slots, so the batch keeps input order.
pub fn process_batch_parallel_subbatch(stages: &TrimStages, batch: &mut [PairedRead]) {
    let batch_size = batch.len();
    if batch_size == 0 {
        return;
    }

    // For small batches, use a single sub-batch (no overhead)
    if batch_size <= SUB_BATCH_SIZE {
        stages.process_sub_batch(batch);
        return;
    }

    log::debug!(
        "PARALLEL_SUBBATCH: Processing {batch_size} entries in {} sub-batches of ~{SUB_BATCH_SIZE}",
        batch_size.div_ceil(SUB_BATCH_SIZE)
    );

    batch
        .par_chunks_mut(SUB_BATCH_SIZE)
        .for_each(|sub_batch| stages.process_sub_batch(sub_batch));
}
