//! Thread-local workspace for reusable allocations
//!
//! The semi-global DP needs a score matrix and a traceback matrix of
//! `(read_len + 1) * (query_len + 1)` cells per pair. A bulk alignment call
//! runs thousands of small pairs back to back on the same worker thread, so
//! the buffers live in a per-thread workspace and are only grown, never freed.

use std::cell::RefCell;

/// Expected read length for pre-allocation
const MAX_READ_LEN: usize = 512;

/// Expected query (adapter/barcode) length for pre-allocation
const MAX_QUERY_LEN: usize = 64;

thread_local! {
    static WORKSPACE: RefCell<AlignmentWorkspace> = RefCell::new(AlignmentWorkspace::new());
}

/// Reusable buffers for the semi-global DP
pub struct AlignmentWorkspace {
    /// Encoded read (0..=4)
    pub encoded_read: Vec<u8>,
    /// Encoded query (0..=4)
    pub encoded_query: Vec<u8>,
    /// Score matrix, row-major, (read_len + 1) x (query_len + 1)
    pub h_matrix: Vec<i32>,
    /// Traceback matrix, same shape as `h_matrix`
    pub tb_matrix: Vec<u8>,
}

impl AlignmentWorkspace {
    pub fn new() -> Self {
        let cells = (MAX_READ_LEN + 1) * (MAX_QUERY_LEN + 1);
        Self {
            encoded_read: Vec::with_capacity(MAX_READ_LEN),
            encoded_query: Vec::with_capacity(MAX_QUERY_LEN),
            h_matrix: Vec::with_capacity(cells),
            tb_matrix: Vec::with_capacity(cells),
        }
    }

    /// Size the DP matrices for a pair. Contents are unspecified afterwards;
    /// the kernel writes every cell before reading it.
    #[inline]
    pub fn prepare(&mut self, read_len: usize, query_len: usize) {
        let cells = (read_len + 1) * (query_len + 1);
        if self.h_matrix.len() < cells {
            self.h_matrix.resize(cells, 0);
            self.tb_matrix.resize(cells, 0);
        }
    }

    /// Clear the encoded sequence buffers (keeps capacity)
    pub fn clear(&mut self) {
        self.encoded_read.clear();
        self.encoded_query.clear();
    }
}

impl Default for AlignmentWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a closure with the thread-local workspace
pub fn with_workspace<F, R>(f: F) -> R
where
    F: FnOnce(&mut AlignmentWorkspace) -> R,
{
    WORKSPACE.with(|ws| f(&mut ws.borrow_mut()))
}
