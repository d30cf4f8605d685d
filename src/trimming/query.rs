//! Adapter and barcode query records.
//!
//! A query set is loaded once before any batch is processed. Sequences are
//! immutable afterwards; only the two per-query removal counters change, and
//! they are atomics because every worker thread updates them.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use bio::io::fasta;
use clap::ValueEnum;

use crate::core::utils::reverse_complement;

/// Suffix appended to the id of generated reverse-complement queries
pub const RC_SUFFIX: &str = "_rc";

/// What a query set is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Adapter,
    Barcode,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Adapter => "adapter",
            QueryKind::Barcode => "barcode",
        }
    }
}

/// Reverse-complement handling for adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RevCompMode {
    /// Forward adapters only
    #[default]
    Off,
    /// Forward and reverse-complement adapters
    On,
    /// Reverse-complement adapters only
    Only,
}

impl RevCompMode {
    /// Whether a query with the given rc flag takes part in alignment
    pub fn considers(self, is_rev_comp: bool) -> bool {
        match self {
            RevCompMode::Off => !is_rev_comp,
            RevCompMode::On => true,
            RevCompMode::Only => is_rev_comp,
        }
    }
}

/// Built-in adapter sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdapterPreset {
    /// Illumina TruSeq
    Truseq,
    /// Illumina small RNA 3' adapter
    SmallRna,
    /// Ribosome profiling 3' adapter
    Ribo,
    /// Illumina Nextera
    Nextera,
}

impl AdapterPreset {
    /// (mate-1 adapters, mate-2 adapters) as (id, sequence)
    pub fn sequences(self) -> (Vec<(&'static str, &'static str)>, Vec<(&'static str, &'static str)>) {
        match self {
            AdapterPreset::Truseq => (
                vec![("TruSeq", "AGATCGGAAGAGCACACGTCTGAACTCCAGTCA")],
                vec![("TruSeq", "AGATCGGAAGAGCGTCGTGTAGGGAAAGAGTGT")],
            ),
            AdapterPreset::SmallRna => (vec![("SmallRNA", "TGGAATTCTCGGGTGCCAAGG")], Vec::new()),
            AdapterPreset::Ribo => (vec![("Ribo", "CTGTAGGCACCATCAAT")], Vec::new()),
            AdapterPreset::Nextera => (
                vec![("Nextera", "CTGTCTCTTATACACATCT")],
                vec![("Nextera", "CTGTCTCTTATACACATCT")],
            ),
        }
    }
}

/// One adapter or barcode
#[derive(Debug)]
pub struct Query {
    pub id: String,
    pub seq: Vec<u8>,
    /// This query is the reverse complement of another query in the set
    pub rev_comp: bool,
    removed_overlap: AtomicU64,
    removed_full: AtomicU64,
}

impl Query {
    pub fn new(id: impl Into<String>, seq: impl Into<Vec<u8>>, rev_comp: bool) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
            rev_comp,
            removed_overlap: AtomicU64::new(0),
            removed_full: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Count one removal; `full_length` when the whole query overlapped
    pub fn record_removal(&self, full_length: bool) {
        self.removed_overlap.fetch_add(1, Ordering::Relaxed);
        if full_length {
            self.removed_full.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Removals via any overlap (partial or full)
    pub fn overlap_removals(&self) -> u64 {
        self.removed_overlap.load(Ordering::Relaxed)
    }

    /// Removals where the overlap covered the full query length
    pub fn full_length_removals(&self) -> u64 {
        self.removed_full.load(Ordering::Relaxed)
    }
}

/// Immutable list of queries of one kind
#[derive(Debug)]
pub struct QuerySet {
    pub kind: QueryKind,
    queries: Vec<Query>,
}

impl QuerySet {
    /// Build from (id, sequence) records. Sequences are upper-cased; empty
    /// sequences and duplicate ids are rejected.
    pub fn from_records<I, S>(kind: QueryKind, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut queries = Vec::new();
        let mut seen = HashSet::new();

        for (id, seq) in records {
            let id: String = id.into();
            if seq.is_empty() {
                bail!("{} '{}' has an empty sequence", kind.as_str(), id);
            }
            if !seen.insert(id.clone()) {
                bail!("duplicate {} id '{}'", kind.as_str(), id);
            }
            queries.push(Query::new(id, seq.to_ascii_uppercase(), false));
        }

        if queries.is_empty() {
            bail!("no {} sequences given", kind.as_str());
        }

        Ok(Self { kind, queries })
    }

    /// Load queries from a FASTA file
    pub fn from_fasta(kind: QueryKind, path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Error opening {} file {}", kind.as_str(), path.display()))?;
        let reader = fasta::Reader::new(BufReader::new(file));

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record
                .with_context(|| format!("Error parsing {} file {}", kind.as_str(), path.display()))?;
            records.push((record.id().to_string(), record.seq().to_vec()));
        }

        let set = Self::from_records(kind, records)
            .with_context(|| format!("Invalid {} file {}", kind.as_str(), path.display()))?;
        log::info!(
            "Loaded {} {} sequence(s) from {}",
            set.len(),
            kind.as_str(),
            path.display()
        );
        Ok(set)
    }

    /// Load the mate-1 or mate-2 adapters of a preset
    pub fn from_preset(preset: AdapterPreset, mate2: bool) -> Result<Option<Self>> {
        let (m1, m2) = preset.sequences();
        let records = if mate2 { m2 } else { m1 };
        if records.is_empty() {
            return Ok(None);
        }
        let set = Self::from_records(
            QueryKind::Adapter,
            records
                .into_iter()
                .map(|(id, seq)| (id.to_string(), seq.as_bytes().to_vec())),
        )?;
        Ok(Some(set))
    }

    /// Append a reverse-complement variant (`<id>_rc`) for every forward query
    pub fn with_reverse_complements(mut self) -> Self {
        let rc: Vec<Query> = self
            .queries
            .iter()
            .filter(|q| !q.rev_comp)
            .map(|q| Query::new(format!("{}{}", q.id, RC_SUFFIX), reverse_complement(&q.seq), true))
            .collect();
        self.queries.extend(rc);
        self
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Query {
        &self.queries[idx]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_fasta() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">B1 first barcode").unwrap();
        writeln!(file, "aaaa").unwrap();
        writeln!(file, ">B2").unwrap();
        writeln!(file, "TTTT").unwrap();
        file.flush().unwrap();

        let set = QuerySet::from_fasta(QueryKind::Barcode, file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).id, "B1");
        assert_eq!(set.get(0).seq, b"AAAA");
        assert_eq!(set.get(1).id, "B2");
        assert!(!set.get(1).rev_comp);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let records = vec![("a", b"ACGT".to_vec()), ("a", b"TTTT".to_vec())];
        assert!(QuerySet::from_records(QueryKind::Adapter, records).is_err());
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let records = vec![("a", Vec::new())];
        assert!(QuerySet::from_records(QueryKind::Adapter, records).is_err());
        let none: Vec<(&str, Vec<u8>)> = Vec::new();
        assert!(QuerySet::from_records(QueryKind::Adapter, none).is_err());
    }

    #[test]
    fn test_reverse_complement_variants() {
        let records = vec![("ad1", b"AACG".to_vec()), ("ad2", b"GGGT".to_vec())];
        let set = QuerySet::from_records(QueryKind::Adapter, records)
            .unwrap()
            .with_reverse_complements();
        assert_eq!(set.len(), 4);
        assert_eq!(set.get(2).id, "ad1_rc");
        assert_eq!(set.get(2).seq, b"CGTT");
        assert!(set.get(2).rev_comp);
        assert_eq!(set.get(3).seq, b"ACCC");
    }

    #[test]
    fn test_rev_comp_mode_filter() {
        assert!(RevCompMode::Off.considers(false));
        assert!(!RevCompMode::Off.considers(true));
        assert!(RevCompMode::On.considers(true) && RevCompMode::On.considers(false));
        assert!(RevCompMode::Only.considers(true));
        assert!(!RevCompMode::Only.considers(false));
    }

    #[test]
    fn test_presets() {
        let m1 = QuerySet::from_preset(AdapterPreset::Truseq, false).unwrap().unwrap();
        assert_eq!(m1.get(0).seq, b"AGATCGGAAGAGCACACGTCTGAACTCCAGTCA");
        assert!(QuerySet::from_preset(AdapterPreset::SmallRna, true).unwrap().is_none());
    }

    #[test]
    fn test_removal_counters() {
        let q = Query::new("q", b"ACGT".to_vec(), false);
        q.record_removal(false);
        q.record_removal(true);
        assert_eq!(q.overlap_removals(), 2);
        assert_eq!(q.full_length_removals(), 1);
    }

    #[test]
    fn test_counters_under_threads() {
        let q = Query::new("q", b"ACGT".to_vec(), false);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for i in 0..1000 {
                        q.record_removal(i % 2 == 0);
                    }
                });
            }
        });
        assert_eq!(q.overlap_removals(), 4000);
        assert_eq!(q.full_length_removals(), 2000);
    }
}
