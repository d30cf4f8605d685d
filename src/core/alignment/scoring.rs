//! 5x5 substitution scores for the {A,C,G,T,N} alphabet.
//!
//! One matrix is built per query set (adapters and barcodes carry their own
//! match/mismatch/gap parameters) and shared read-only by every alignment of
//! that set. Building it per read would be pure overhead.

/// Number of symbols in the alignment alphabet (A, C, G, T, N)
pub const ALPHABET_SIZE: usize = 5;

/// Encoded value of the ambiguous base
pub const BASE_N: u8 = 4;

/// Gap symbol used in aligned rows
pub const GAP: u8 = b'-';

/// Encode an ASCII base as 0=A, 1=C, 2=G, 3=T, 4=N (anything else maps to N)
#[inline(always)]
pub const fn encode_base(b: u8) -> u8 {
    match b {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => BASE_N,
    }
}

/// Substitution matrix plus a uniform per-column gap score.
///
/// Rows are indexed by the read symbol, columns by the query symbol:
/// `mat[read * 5 + query]`. A query `N` always scores as a match. A read `N`
/// scores as a match only when `read_n_as_match` was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMatrix {
    mat: [i32; ALPHABET_SIZE * ALPHABET_SIZE],
    match_score: i32,
    mismatch_score: i32,
    gap_score: i32,
    read_n_as_match: bool,
}

impl ScoreMatrix {
    /// Build the matrix. Scores are signed: e.g. match 1, mismatch -1, gap -6.
    pub fn new(match_score: i32, mismatch_score: i32, gap_score: i32, read_n_as_match: bool) -> Self {
        let mut mat = [0i32; ALPHABET_SIZE * ALPHABET_SIZE];
        let n = BASE_N as usize;

        for i in 0..ALPHABET_SIZE {
            for j in 0..ALPHABET_SIZE {
                let is_match = i == j || j == n || (read_n_as_match && i == n);
                mat[i * ALPHABET_SIZE + j] = if is_match {
                    match_score
                } else {
                    mismatch_score
                };
            }
        }

        Self {
            mat,
            match_score,
            mismatch_score,
            gap_score,
            read_n_as_match,
        }
    }

    /// Score of an encoded (read, query) symbol pair
    #[inline(always)]
    pub fn score(&self, read_code: u8, query_code: u8) -> i32 {
        self.mat[read_code.min(BASE_N) as usize * ALPHABET_SIZE + query_code.min(BASE_N) as usize]
    }

    /// Score of an ASCII (read, query) base pair
    #[inline(always)]
    pub fn score_ascii(&self, read_base: u8, query_base: u8) -> i32 {
        self.score(encode_base(read_base), encode_base(query_base))
    }

    /// Whether an ASCII (read, query) pair counts as a match under this matrix.
    ///
    /// Mismatch counting in the overlap window uses this so that errors agree
    /// with the scoring rule for `N`.
    #[inline(always)]
    pub fn is_match_ascii(&self, read_base: u8, query_base: u8) -> bool {
        let r = encode_base(read_base) as usize;
        let q = encode_base(query_base) as usize;
        let n = BASE_N as usize;
        r == q || q == n || (self.read_n_as_match && r == n)
    }

    pub fn gap(&self) -> i32 {
        self.gap_score
    }

    pub fn match_score(&self) -> i32 {
        self.match_score
    }

    pub fn mismatch_score(&self) -> i32 {
        self.mismatch_score
    }

    pub fn read_n_as_match(&self) -> bool {
        self.read_n_as_match
    }
}
