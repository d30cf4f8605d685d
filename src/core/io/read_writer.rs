// Output module
//
// Applies the post-trimming length filter and fans reads out to per-barcode,
// per-mate FASTA/FASTQ files:
//
//   <target>[_barcode_<id>[-<id2>]|_barcode_unassigned][_<mate>[_single]].<ext>[.gz]
//
// Files are opened on first use and written in input order.

use anyhow::{Context, Result, anyhow};
use bio::io::{fasta, fastq};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use super::seq_reader::SeqFormat;
use crate::trimming::types::{PairedRead, SeqRead};

/// Fate of one entry after the length filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Written whole (read, or both mates)
    Good,
    /// Only mate 1 is long enough
    SingleM1,
    /// Only mate 2 is long enough
    SingleM2,
    /// Nothing long enough
    Short,
}

/// Classify an entry by the length of its mates
pub fn classify(pair: &PairedRead, min_read_length: usize) -> Disposition {
    let long1 = pair.m1.len() >= min_read_length;
    match &pair.m2 {
        None if long1 => Disposition::Good,
        None => Disposition::Short,
        Some(m2) => match (long1, m2.len() >= min_read_length) {
            (true, true) => Disposition::Good,
            (true, false) => Disposition::SingleM1,
            (false, true) => Disposition::SingleM2,
            (false, false) => Disposition::Short,
        },
    }
}

/// Entry counts by fate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub total: u64,
    pub filtered_uncalled: u64,
    pub good: u64,
    pub short: u64,
    /// Single mates written to `_single` files
    pub single: u64,
    /// Single mates dropped without `--single-reads`
    pub single_dropped: u64,
    /// Entries without barcode, dropped without `--barcode-unassigned`
    pub unassigned_dropped: u64,
}

/// Output settings
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub target: PathBuf,
    pub format: SeqFormat,
    pub zip: bool,
    pub paired: bool,
    pub single_reads: bool,
    pub min_read_length: usize,
    pub barcode_unassigned: bool,
}

enum RecordWriter {
    Fasta(fasta::Writer<Box<dyn Write>>),
    Fastq(fastq::Writer<Box<dyn Write>>),
}

impl RecordWriter {
    fn write(&mut self, read: &SeqRead) -> Result<()> {
        match self {
            RecordWriter::Fasta(w) => w.write(&read.id, None, &read.seq)?,
            RecordWriter::Fastq(w) => {
                let qual = read
                    .qual
                    .as_deref()
                    .ok_or_else(|| anyhow!("Read {} has no qualities for FASTQ output", read.id))?;
                w.write(&read.id, None, &read.seq, qual)?
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            RecordWriter::Fasta(w) => w.flush()?,
            RecordWriter::Fastq(w) => w.flush()?,
        }
        Ok(())
    }
}

/// Fan-out writer for trimmed reads
pub struct ReadWriter {
    opts: OutputOptions,
    /// Barcode ids by index; `None` without barcoding
    barcodes: Option<Vec<String>>,
    barcodes2: Option<Vec<String>>,
    files: HashMap<PathBuf, RecordWriter>,
    counts: WriteCounts,
}

impl ReadWriter {
    pub fn new(
        opts: OutputOptions,
        barcodes: Option<Vec<String>>,
        barcodes2: Option<Vec<String>>,
    ) -> Result<Self> {
        let mut writer = Self {
            opts,
            barcodes,
            barcodes2,
            files: HashMap::new(),
            counts: WriteCounts::default(),
        };
        // Without barcoding the main outputs exist even for empty input
        if writer.barcodes.is_none() {
            writer.open_file("", if writer.opts.paired { Some(1) } else { None }, false)?;
            if writer.opts.paired {
                writer.open_file("", Some(2), false)?;
            }
        }
        Ok(writer)
    }

    pub fn counts(&self) -> WriteCounts {
        self.counts
    }

    /// Path of the output file for a barcode part, mate and single flag
    pub fn output_path(&self, barcode_part: &str, mate: Option<u8>, single: bool) -> PathBuf {
        let mut name = self.opts.target.as_os_str().to_os_string();
        name.push(barcode_part);
        if let Some(mate) = mate {
            name.push(format!("_{}", mate));
        }
        if single {
            name.push("_single");
        }
        name.push(".");
        name.push(self.opts.format.extension());
        if self.opts.zip {
            name.push(".gz");
        }
        PathBuf::from(name)
    }

    fn open_file(&mut self, barcode_part: &str, mate: Option<u8>, single: bool) -> Result<&mut RecordWriter> {
        let path = self.output_path(barcode_part, mate, single);
        if !self.files.contains_key(&path) {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let sink: Box<dyn Write> = if self.opts.zip {
                Box::new(GzEncoder::new(file, Compression::default()))
            } else {
                Box::new(file)
            };
            let writer = match self.opts.format {
                SeqFormat::Fasta => RecordWriter::Fasta(fasta::Writer::new(sink)),
                SeqFormat::Fastq => RecordWriter::Fastq(fastq::Writer::new(sink)),
            };
            log::debug!("Writing {}", path.display());
            self.files.insert(path.clone(), writer);
        }
        self.files
            .get_mut(&path)
            .ok_or_else(|| anyhow!("Output file {} not open", path.display()))
    }

    /// Barcode part of the file name; `None` if the entry is dropped as unassigned
    fn barcode_part(&self, pair: &PairedRead) -> Option<String> {
        let Some(names) = &self.barcodes else {
            return Some(String::new());
        };
        fn name(names: &[String], id: usize) -> Option<String> {
            id.checked_sub(1).and_then(|i| names.get(i)).cloned()
        }

        let first = name(names, pair.barcode_id);
        let second = match &self.barcodes2 {
            Some(names2) => name(names2, pair.barcode_id2).map(Some),
            None => Some(None),
        };
        match (first, second) {
            (Some(a), Some(Some(b))) => Some(format!("_barcode_{}-{}", a, b)),
            (Some(a), Some(None)) => Some(format!("_barcode_{}", a)),
            _ if self.opts.barcode_unassigned => Some("_barcode_unassigned".to_string()),
            _ => None,
        }
    }

    fn write_mate(&mut self, part: &str, mate: u8, single: bool, read: &SeqRead) -> Result<()> {
        let mate = if self.opts.paired { Some(mate) } else { None };
        let path = self.output_path(part, mate, single);
        self.open_file(part, mate, single)?
            .write(read)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Filter and write one batch in order
    pub fn write_batch(&mut self, batch: &[PairedRead]) -> Result<()> {
        for pair in batch {
            self.counts.total += 1;
            if pair.filtered {
                self.counts.filtered_uncalled += 1;
                continue;
            }

            match classify(pair, self.opts.min_read_length) {
                Disposition::Short => {
                    self.counts.short += 1;
                    continue;
                }
                Disposition::SingleM1 | Disposition::SingleM2 if !self.opts.single_reads => {
                    self.counts.single_dropped += 1;
                    continue;
                }
                _ => {}
            }

            let Some(part) = self.barcode_part(pair) else {
                self.counts.unassigned_dropped += 1;
                continue;
            };

            match (classify(pair, self.opts.min_read_length), &pair.m2) {
                (Disposition::Good, Some(m2)) => {
                    self.write_mate(&part, 1, false, &pair.m1)?;
                    self.write_mate(&part, 2, false, m2)?;
                    self.counts.good += 1;
                }
                (Disposition::Good, None) => {
                    self.write_mate(&part, 1, false, &pair.m1)?;
                    self.counts.good += 1;
                }
                (Disposition::SingleM1, _) => {
                    self.write_mate(&part, 1, true, &pair.m1)?;
                    self.counts.single += 1;
                }
                (Disposition::SingleM2, Some(m2)) => {
                    self.write_mate(&part, 2, true, m2)?;
                    self.counts.single += 1;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Flush and close every output file
    pub fn finish(mut self) -> Result<WriteCounts> {
        for (path, writer) in self.files.iter_mut() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", path.display()))?;
        }
        let counts = self.counts;
        // Dropping the encoders writes the gzip trailers
        self.files.clear();
        Ok(counts)
    }
}
