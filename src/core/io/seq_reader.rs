// Sequence reader module using bio::io::{fasta, fastq}
//
// Wraps the bio record readers with:
// - gzip / BGZF detection by extension and magic bytes
// - parallel BGZF decompression through noodles-bgzf
// - FASTA / FASTQ detection from the first record marker
// - batch reading into owned SeqRead values
//
// `-` reads from stdin; compressed stdin is detected from the magic bytes.

use anyhow::{Context, Result, anyhow, bail};
use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use crate::trimming::types::{PairedRead, SeqRead};

const BUFFER_SIZE: usize = 4 * 1024 * 1024;

type Input = BufReader<Box<dyn Read + Send>>;

/// Record format of an input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqFormat {
    Fasta,
    Fastq,
}

impl SeqFormat {
    /// Output file extension
    pub fn extension(self) -> &'static str {
        match self {
            SeqFormat::Fasta => "fasta",
            SeqFormat::Fastq => "fastq",
        }
    }
}

enum Records {
    Fasta(fasta::Records<Input>),
    Fastq(fastq::Records<Input>),
}

/// FASTA/FASTQ reader with automatic compression and format detection
pub struct SeqReader {
    path: PathBuf,
    format: SeqFormat,
    records: Records,
}

/// Detect if a gzipped header is BGZF by its 'BC' extra subfield
fn is_bgzip_header(header: &[u8]) -> bool {
    // gzip magic, FEXTRA flag, 'BC' subfield at byte 12
    header.len() >= 18
        && header[0] == 0x1f
        && header[1] == 0x8b
        && header[3] & 0x04 != 0
        && header[12] == b'B'
        && header[13] == b'C'
}

fn is_gzip_header(header: &[u8]) -> bool {
    header.len() >= 2 && header[0] == 0x1f && header[1] == 0x8b
}

fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut header = vec![0u8; 18];
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    header.truncate(filled);
    Ok(header)
}

/// Open a path as a decompressed byte stream
fn open_stream(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    if path.as_os_str() == "-" {
        let mut stdin = BufReader::with_capacity(BUFFER_SIZE, io::stdin());
        let header = stdin.fill_buf()?;
        if is_gzip_header(header) {
            log::debug!("Detected gzip on stdin");
            return Ok(Box::new(MultiGzDecoder::new(stdin)));
        }
        return Ok(Box::new(stdin));
    }

    let header = read_header(path)?;
    let file = File::open(path)?;
    let by_extension = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("gz" | "bgz")
    );

    if is_bgzip_header(&header) {
        log::debug!("{}: BGZF format, using parallel decompression", path.display());
        Ok(Box::new(bgzf::MultithreadedReader::new(file)))
    } else if is_gzip_header(&header) {
        log::debug!("{}: gzip format, using single-threaded decompression", path.display());
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        if by_extension {
            log::warn!("{}: compressed extension but no gzip header", path.display());
        }
        Ok(Box::new(file))
    }
}

/// Peek the first non-whitespace byte of a buffered stream
fn sniff_format(input: &mut Input) -> io::Result<Option<u8>> {
    loop {
        let buf = input.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let first = buf[pos];
                input.consume(pos);
                return Ok(Some(first));
            }
            None => {
                let len = buf.len();
                input.consume(len);
            }
        }
    }
}

impl SeqReader {
    /// Open a FASTA or FASTQ file, plain, gzip or BGZF compressed
    ///
    /// An empty input opens as FASTQ and yields no reads.
    pub fn open(path: &Path) -> Result<Self> {
        let stream =
            open_stream(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut input = BufReader::with_capacity(BUFFER_SIZE, stream);

        let first = sniff_format(&mut input)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let format = match first {
            Some(b'>') => SeqFormat::Fasta,
            Some(b'@') | None => SeqFormat::Fastq,
            Some(other) => bail!(
                "{}: unrecognised sequence format (starts with '{}')",
                path.display(),
                other.escape_ascii()
            ),
        };

        let records = match format {
            SeqFormat::Fasta => Records::Fasta(fasta::Reader::from_bufread(input).records()),
            SeqFormat::Fastq => Records::Fastq(fastq::Reader::from_bufread(input).records()),
        };

        log::debug!("{}: {:?} input", path.display(), format);
        Ok(Self {
            path: path.to_path_buf(),
            format,
            records,
        })
    }

    pub fn format(&self) -> SeqFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_read(&mut self) -> Result<Option<SeqRead>> {
        let read = match &mut self.records {
            Records::Fasta(records) => match records.next() {
                Some(record) => {
                    let record = record.with_context(|| {
                        format!("Malformed FASTA record in {}", self.path.display())
                    })?;
                    Some(SeqRead::new(record.id(), record.seq().to_vec(), None))
                }
                None => None,
            },
            Records::Fastq(records) => match records.next() {
                Some(record) => {
                    let record = record.with_context(|| {
                        format!("Malformed FASTQ record in {}", self.path.display())
                    })?;
                    Some(SeqRead::new(
                        record.id(),
                        record.seq().to_vec(),
                        Some(record.qual().to_vec()),
                    ))
                }
                None => None,
            },
        };
        Ok(read)
    }

    /// Read up to `batch_size` reads; an empty batch means EOF
    pub fn read_batch(&mut self, batch_size: usize) -> Result<Vec<SeqRead>> {
        let mut batch = Vec::new();
        while batch.len() < batch_size {
            match self.next_read()? {
                Some(read) => batch.push(read),
                None => break,
            }
        }
        Ok(batch)
    }
}

// =============================================================================
// DOUBLE-BUFFERED PAIRED READER
// =============================================================================
//
// A background thread reads the mate-1, mate-2 and barcode streams in lock
// step and hands finished batches over a bounded channel. With capacity 1
// one batch is in flight while the previous one is being trimmed.

/// Result of reading one batch of entries
pub type PairedBatchResult = Result<Vec<PairedRead>>;

/// Input streams of one run
pub struct InputStreams {
    pub reads: SeqReader,
    pub reads2: Option<SeqReader>,
    pub barcode_reads: Option<SeqReader>,
}

impl InputStreams {
    pub fn open(reads: &Path, reads2: Option<&Path>, barcode_reads: Option<&Path>) -> Result<Self> {
        Ok(Self {
            reads: SeqReader::open(reads)?,
            reads2: reads2.map(SeqReader::open).transpose()?,
            barcode_reads: barcode_reads.map(SeqReader::open).transpose()?,
        })
    }

    /// Format of the primary stream
    pub fn format(&self) -> SeqFormat {
        self.reads.format()
    }

    /// Read the next batch of entries in lock step
    pub fn read_batch(&mut self, batch_size: usize) -> PairedBatchResult {
        let reads = self.reads.read_batch(batch_size)?;
        let n = reads.len();

        let mates2 = match self.reads2.as_mut() {
            Some(reader) => {
                let batch = reader.read_batch(batch_size)?;
                check_lengths(&self.reads, reader, n, batch.len())?;
                Some(batch)
            }
            None => None,
        };
        let barcodes = match self.barcode_reads.as_mut() {
            Some(reader) => {
                let batch = reader.read_batch(batch_size)?;
                check_lengths(&self.reads, reader, n, batch.len())?;
                Some(batch)
            }
            None => None,
        };

        let mut mates2 = mates2.map(Vec::into_iter);
        let mut barcodes = barcodes.map(Vec::into_iter);
        Ok(reads
            .into_iter()
            .map(|m1| PairedRead {
                m2: mates2.as_mut().and_then(Iterator::next),
                barcode: barcodes.as_mut().and_then(Iterator::next),
                ..PairedRead::single(m1)
            })
            .collect())
    }
}

fn check_lengths(primary: &SeqReader, other: &SeqReader, n: usize, m: usize) -> Result<()> {
    if n != m {
        bail!(
            "{} and {} have different numbers of reads",
            primary.path().display(),
            other.path().display()
        );
    }
    Ok(())
}

/// Double-buffered reader for single, paired and barcode-read input
pub struct PairedBatchReader {
    receiver: Option<Receiver<PairedBatchResult>>,
    reader_thread: Option<JoinHandle<()>>,
    format: SeqFormat,
}

impl PairedBatchReader {
    /// Open all streams and start reading the first batch in the background
    pub fn new(streams: InputStreams, batch_size: usize) -> Self {
        let format = streams.format();
        let (sender, receiver): (SyncSender<PairedBatchResult>, Receiver<PairedBatchResult>) =
            mpsc::sync_channel(1);

        let reader_thread = thread::spawn(move || {
            Self::reader_loop(streams, batch_size, sender);
        });

        Self {
            receiver: Some(receiver),
            reader_thread: Some(reader_thread),
            format,
        }
    }

    pub fn format(&self) -> SeqFormat {
        self.format
    }

    fn reader_loop(mut streams: InputStreams, batch_size: usize, sender: SyncSender<PairedBatchResult>) {
        loop {
            let batch = streams.read_batch(batch_size);
            let done = !matches!(&batch, Ok(b) if !b.is_empty());
            // Receiver dropped
            if sender.send(batch).is_err() || done {
                return;
            }
        }
    }

    /// Receive the next pre-read batch; `Ok(None)` at EOF
    pub fn next_batch(&self) -> Result<Option<Vec<PairedRead>>> {
        let receiver = self
            .receiver
            .as_ref()
            .ok_or_else(|| anyhow!("Reader already closed"))?;
        match receiver.recv() {
            Ok(Ok(batch)) if batch.is_empty() => Ok(None),
            Ok(Ok(batch)) => Ok(Some(batch)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow!("Reader thread disconnected")),
        }
    }
}

impl Drop for PairedBatchReader {
    fn drop(&mut self) {
        // Unblock a pending send before joining
        self.receiver.take();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }
}
