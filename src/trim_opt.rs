use clap::Args;
use std::path::PathBuf;

use crate::defaults;
use crate::trimming::aligner::{AlignLog, AlignerConfig};
use crate::trimming::decision::TagOptions;
use crate::trimming::overlap::OverlapParams;
use crate::trimming::preprocess::PreprocessOpt;
use crate::trimming::query::{AdapterPreset, RevCompMode};
use crate::trimming::types::TrimEnd;

// src/trim_opt.rs
//
// Trimming options: a plain struct with documented defaults, folded from the
// command line and handed to the pipeline.

/// Where mate-1 adapters come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdapterSource {
    #[default]
    None,
    File(PathBuf),
    Preset(AdapterPreset),
    /// Single adapter given on the command line
    Sequence(Vec<u8>),
}

/// Scoring and overlap settings of one query set
#[derive(Debug, Clone, PartialEq)]
pub struct QueryScoring {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_score: i32,
    pub error_rate: f64,
    /// `None` means the query length
    pub min_overlap: Option<usize>,
    pub trim_end: TrimEnd,
    /// `None` means the query length
    pub tail_length: Option<usize>,
}

/// Trimming options
#[derive(Debug, Clone)]
pub struct TrimOpt {
    // Input
    pub reads: PathBuf,
    pub reads2: Option<PathBuf>,
    pub barcode_reads: Option<PathBuf>,

    // Output
    pub target: PathBuf,
    pub single_reads: bool,
    pub zip_output: bool,

    // Pre-processing and filtering
    pub preprocess: PreprocessOpt,
    pub min_read_length: usize,

    // Adapters
    pub adapters: AdapterSource,
    pub adapters2: Option<PathBuf>,
    pub adapter: QueryScoring,
    pub adapter_revcomp: RevCompMode,
    pub adapter_relaxed: bool,
    pub adapter_cycles: usize,
    pub pair_overlap: bool,
    pub pair_overlap_min: usize,

    // Barcodes
    pub barcodes: Option<PathBuf>,
    pub barcodes2: Option<PathBuf>,
    pub barcode: QueryScoring,
    pub barcode_keep: bool,
    pub barcode_unassigned: bool,

    // Alignment and tagging
    pub read_n_as_match: bool,
    pub colorspace: bool,
    pub tags: TagOptions,
    pub align_log: AlignLog,

    // Processing
    pub n_threads: usize,
    pub batch_size: usize,
    pub verbosity: i32,
}

impl Default for TrimOpt {
    fn default() -> Self {
        TrimOpt {
            reads: PathBuf::new(),
            reads2: None,
            barcode_reads: None,

            target: PathBuf::from(defaults::TARGET),
            single_reads: false,
            zip_output: false,

            preprocess: PreprocessOpt {
                pre_trim_left: 0,
                pre_trim_right: 0,
                max_uncalled: defaults::MAX_UNCALLED,
                qtrim_threshold: None,
                qtrim_offset: defaults::QTRIM_OFFSET,
            },
            min_read_length: defaults::MIN_READ_LENGTH,

            adapters: AdapterSource::None,
            adapters2: None,
            adapter: QueryScoring {
                match_score: defaults::ADAPTER_MATCH,
                mismatch_score: defaults::ADAPTER_MISMATCH,
                gap_score: defaults::ADAPTER_GAP,
                error_rate: defaults::ADAPTER_ERROR_RATE,
                min_overlap: Some(defaults::ADAPTER_MIN_OVERLAP),
                trim_end: TrimEnd::Right,
                tail_length: None,
            },
            adapter_revcomp: RevCompMode::Off,
            adapter_relaxed: false,
            adapter_cycles: defaults::ADAPTER_CYCLES,
            pair_overlap: false,
            pair_overlap_min: defaults::PAIR_OVERLAP_MIN,

            barcodes: None,
            barcodes2: None,
            barcode: QueryScoring {
                match_score: defaults::BARCODE_MATCH,
                mismatch_score: defaults::BARCODE_MISMATCH,
                gap_score: defaults::BARCODE_GAP,
                error_rate: defaults::BARCODE_ERROR_RATE,
                min_overlap: None,
                trim_end: TrimEnd::Left,
                tail_length: None,
            },
            barcode_keep: false,
            barcode_unassigned: false,

            read_n_as_match: false,
            colorspace: false,
            tags: TagOptions::default(),
            align_log: AlignLog::None,

            n_threads: 1,
            batch_size: defaults::BATCH_SIZE,
            verbosity: defaults::VERBOSITY,
        }
    }
}

impl TrimOpt {
    pub fn is_paired(&self) -> bool {
        self.reads2.is_some()
    }

    pub fn has_adapters(&self) -> bool {
        self.adapters != AdapterSource::None
    }

    pub fn has_barcodes(&self) -> bool {
        self.barcodes.is_some()
    }

    // ========================================================================
    // PURPOSE-SPECIFIC ALIGNER CONFIGURATION
    // ========================================================================

    fn aligner_config(&self, scoring: &QueryScoring, strict_region: bool, extract_umi: bool) -> AlignerConfig {
        AlignerConfig {
            match_score: scoring.match_score,
            mismatch_score: scoring.mismatch_score,
            gap_score: scoring.gap_score,
            read_n_as_match: self.read_n_as_match,
            overlap: OverlapParams {
                trim_end: scoring.trim_end,
                error_rate: scoring.error_rate,
                min_overlap: scoring.min_overlap,
                strict_region,
                extract_umi,
                keep_alignment_text: self.align_log != AlignLog::None,
            },
            tail_length: scoring.tail_length,
            rev_comp: RevCompMode::Off,
            colorspace: self.colorspace,
            min_read_length: self.min_read_length,
            keep_reads: false,
            tags: self.tags,
            align_log: self.align_log,
        }
    }

    /// Configuration of the adapter aligners
    pub fn adapter_config(&self) -> AlignerConfig {
        let mut cfg = self.aligner_config(&self.adapter, !self.adapter_relaxed, self.tags.umi_tags);
        cfg.rev_comp = self.adapter_revcomp;
        cfg
    }

    /// Configuration of the barcode aligners
    pub fn barcode_config(&self) -> AlignerConfig {
        let mut cfg = self.aligner_config(&self.barcode, true, self.tags.umi_tags);
        cfg.keep_reads = self.barcode_keep;
        // Barcode UMIs are written to the ids of the whole pair
        cfg.tags.umi_tags = false;
        cfg
    }

    /// Validate parameters for consistency
    /// Returns Ok(()) if valid, or Err with description of issues
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, s) in [("adapter", &self.adapter), ("barcode", &self.barcode)] {
            if s.match_score < 1 {
                errors.push(format!("{name} match score must be >= 1, got {}", s.match_score));
            }
            if s.mismatch_score > 0 {
                errors.push(format!(
                    "{name} mismatch score must be <= 0, got {}",
                    s.mismatch_score
                ));
            }
            if s.gap_score > 0 {
                errors.push(format!("{name} gap score must be <= 0, got {}", s.gap_score));
            }
            if !(0.0..=10.0).contains(&s.error_rate) {
                errors.push(format!(
                    "{name} error rate must be in [0, 10], got {}",
                    s.error_rate
                ));
            }
            if s.min_overlap == Some(0) {
                errors.push(format!("{name} min overlap must be >= 1"));
            }
            if s.tail_length == Some(0) {
                errors.push(format!("{name} tail length must be >= 1"));
            }
        }

        if self.adapter_cycles < 1 {
            errors.push(format!("adapter cycles must be >= 1, got {}", self.adapter_cycles));
        }
        if self.pair_overlap && !self.is_paired() {
            errors.push("pair overlap detection requires paired reads".to_string());
        }
        if self.pair_overlap_min < 1 {
            errors.push("pair overlap min must be >= 1".to_string());
        }
        if self.adapters2.is_some() && !self.is_paired() {
            errors.push("mate-2 adapters require paired reads".to_string());
        }
        if self.barcodes2.is_some() && !self.is_paired() {
            errors.push("mate-2 barcodes require paired reads".to_string());
        }
        if self.barcode_reads.is_some() && self.barcodes.is_none() {
            errors.push("barcode reads given without barcodes".to_string());
        }
        if self.batch_size < 1 {
            errors.push(format!("batch size must be >= 1, got {}", self.batch_size));
        }
        if !self.has_adapters() && !self.has_barcodes() && !self.pair_overlap && self.preprocess.is_noop() {
            log::debug!("No trimming stage configured; reads are only filtered");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Parse a literal query sequence (IUPAC ACGTN, case-insensitive)
    pub fn parse_query_seq(s: &str) -> Result<Vec<u8>, String> {
        if s.is_empty() {
            return Err("Adapter sequence must not be empty".to_string());
        }
        let seq = s.as_bytes().to_ascii_uppercase();
        if let Some(bad) = seq.iter().find(|b| !matches!(b, b'A' | b'C' | b'G' | b'T' | b'N')) {
            return Err(format!("Invalid base '{}' in sequence: {}", *bad as char, s));
        }
        Ok(seq)
    }

    /// Parse a pre-trim value "INT" (left only) or "INT,INT" (left,right)
    pub fn parse_pre_trim(s: &str) -> Result<(usize, usize), String> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.len() {
            1 => {
                let left = parts[0]
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid pre-trim value: {}", s))?;
                Ok((left, 0))
            }
            2 => {
                let left = parts[0]
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid left pre-trim: {}", parts[0]))?;
                let right = parts[1]
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid right pre-trim: {}", parts[1]))?;
                Ok((left, right))
            }
            _ => Err(format!("Pre-trim must be INT or INT,INT: {}", s)),
        }
    }

    /// Fold command-line values into options
    pub fn from_cli(cli: &TrimCliOptions) -> Result<Self, String> {
        let mut opt = TrimOpt::default();

        if cli.reads.is_empty() || cli.reads.len() > 2 {
            return Err(format!(
                "Expected 1 or 2 read files (paired-end), got {}",
                cli.reads.len()
            ));
        }
        opt.reads = cli.reads[0].clone();
        opt.reads2 = cli.reads.get(1).cloned();
        opt.barcode_reads = cli.barcode_reads.clone();

        opt.target = cli.target.clone();
        opt.single_reads = cli.single_reads;
        opt.zip_output = cli.zip_output;

        if let Some(value) = &cli.pre_trim {
            let (left, right) = Self::parse_pre_trim(value)?;
            opt.preprocess.pre_trim_left = left;
            opt.preprocess.pre_trim_right = right;
        }
        opt.preprocess.max_uncalled = cli.max_uncalled;
        opt.preprocess.qtrim_threshold = cli.qtrim_threshold;
        opt.preprocess.qtrim_offset = cli.qtrim_offset;
        opt.min_read_length = cli.min_read_length;

        let sources = [
            cli.adapters.is_some(),
            cli.adapter_preset.is_some(),
            cli.adapter_seq.is_some(),
        ];
        if sources.iter().filter(|&&s| s).count() > 1 {
            return Err("Use only one of --adapters, --adapter-preset and --adapter-seq".to_string());
        }
        opt.adapters = if let Some(path) = &cli.adapters {
            AdapterSource::File(path.clone())
        } else if let Some(preset) = cli.adapter_preset {
            AdapterSource::Preset(preset)
        } else if let Some(seq) = &cli.adapter_seq {
            AdapterSource::Sequence(Self::parse_query_seq(seq)?)
        } else {
            AdapterSource::None
        };
        opt.adapters2 = cli.adapters2.clone();

        opt.adapter = QueryScoring {
            match_score: cli.adapter_match,
            mismatch_score: cli.adapter_mismatch,
            gap_score: cli.adapter_gap,
            error_rate: cli.adapter_error_rate,
            min_overlap: Some(cli.adapter_min_overlap),
            trim_end: cli.adapter_trim_end,
            tail_length: cli.adapter_tail_length,
        };
        opt.adapter_revcomp = cli.adapter_revcomp;
        opt.adapter_relaxed = cli.adapter_relaxed;
        opt.adapter_cycles = cli.adapter_cycles;
        opt.pair_overlap = cli.adapter_pair_overlap;
        opt.pair_overlap_min = cli.pair_overlap_min;

        opt.barcodes = cli.barcodes.clone();
        opt.barcodes2 = cli.barcodes2.clone();
        opt.barcode = QueryScoring {
            match_score: cli.barcode_match,
            mismatch_score: cli.barcode_mismatch,
            gap_score: cli.barcode_gap,
            error_rate: cli.barcode_error_rate,
            min_overlap: cli.barcode_min_overlap,
            trim_end: cli.barcode_trim_end,
            tail_length: cli.barcode_tail_length,
        };
        opt.barcode_keep = cli.barcode_keep;
        opt.barcode_unassigned = cli.barcode_unassigned;

        opt.read_n_as_match = cli.read_n_as_match;
        opt.colorspace = cli.colorspace;
        opt.tags = TagOptions {
            removal_tags: cli.removal_tags,
            umi_tags: cli.umi_tags,
        };
        opt.align_log = cli.align_log;

        opt.n_threads = cli.threads.unwrap_or_else(num_cpus::get).max(1);
        opt.batch_size = cli.batch_size;
        opt.verbosity = cli.verbosity as i32;

        Ok(opt)
    }
}

#[derive(Debug, Clone, Args)]
pub struct TrimCliOptions {
    /// Input FASTA/FASTQ file(s) - one for single-end, two for paired-end ('-' for stdin)
    #[arg(value_name = "READS", required = true)]
    pub reads: Vec<PathBuf>,

    /// Separate barcode reads (FASTA/FASTQ)
    #[arg(long, value_name = "FILE")]
    pub barcode_reads: Option<PathBuf>,

    // ===== Output Options =====
    /// Prefix for output files
    #[arg(short = 'o', long, value_name = "PREFIX", default_value = defaults::TARGET)]
    pub target: PathBuf,

    /// Write single reads of pairs whose mate became too short
    #[arg(long)]
    pub single_reads: bool,

    /// Compress output files with gzip
    #[arg(short = 'z', long)]
    pub zip_output: bool,

    // ===== Filtering Options =====
    /// Remove INT leading bases, or INT,INT leading and trailing bases, before trimming
    #[arg(long, value_name = "INT[,INT]")]
    pub pre_trim: Option<String>,

    /// Discard reads with more than INT uncalled bases
    #[arg(short = 'u', long, value_name = "INT", default_value_t = defaults::MAX_UNCALLED)]
    pub max_uncalled: usize,

    /// Trim trailing bases below this Phred quality before adapter removal
    #[arg(short = 'q', long, value_name = "INT")]
    pub qtrim_threshold: Option<u8>,

    /// ASCII offset of quality scores
    #[arg(long, value_name = "INT", default_value_t = defaults::QTRIM_OFFSET)]
    pub qtrim_offset: u8,

    /// Minimum read length to remain after trimming
    #[arg(short = 'm', long, value_name = "INT", default_value_t = defaults::MIN_READ_LENGTH)]
    pub min_read_length: usize,

    // ===== Adapter Options =====
    /// FASTA file with adapters to remove
    #[arg(short = 'a', long, value_name = "FILE")]
    pub adapters: Option<PathBuf>,

    /// FASTA file with adapters for mate 2 (default: same as mate 1)
    #[arg(long, value_name = "FILE")]
    pub adapters2: Option<PathBuf>,

    /// Built-in adapter set
    #[arg(long, value_name = "PRESET")]
    pub adapter_preset: Option<AdapterPreset>,

    /// Single adapter sequence
    #[arg(long, value_name = "SEQ")]
    pub adapter_seq: Option<String>,

    /// Where adapters are trimmed
    #[arg(long, value_name = "END", default_value = defaults::ADAPTER_TRIM_END, ignore_case = true)]
    pub adapter_trim_end: TrimEnd,

    /// Bases aligned in tail modes (default: adapter length)
    #[arg(long, value_name = "INT")]
    pub adapter_tail_length: Option<usize>,

    /// Also (on) or only (only) remove reverse-complement adapters
    #[arg(long, value_name = "MODE", default_value = "off")]
    pub adapter_revcomp: RevCompMode,

    /// Allow adapters to hang off the anchored read end
    #[arg(long)]
    pub adapter_relaxed: bool,

    /// Number of adapter removal passes
    #[arg(long, value_name = "INT", default_value_t = defaults::ADAPTER_CYCLES)]
    pub adapter_cycles: usize,

    /// Cut read-through of short inserts detected from mate overlap
    #[arg(long)]
    pub adapter_pair_overlap: bool,

    /// Minimum mate overlap for read-through detection
    #[arg(long, value_name = "INT", default_value_t = defaults::PAIR_OVERLAP_MIN)]
    pub pair_overlap_min: usize,

    /// Minimum adapter overlap
    #[arg(long, value_name = "INT", default_value_t = defaults::ADAPTER_MIN_OVERLAP)]
    pub adapter_min_overlap: usize,

    /// Allowed adapter errors per overlapping base
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::ADAPTER_ERROR_RATE)]
    pub adapter_error_rate: f64,

    /// Adapter match score
    #[arg(long, value_name = "INT", default_value_t = defaults::ADAPTER_MATCH)]
    pub adapter_match: i32,

    /// Adapter mismatch score
    #[arg(long, value_name = "INT", default_value_t = defaults::ADAPTER_MISMATCH, allow_hyphen_values = true)]
    pub adapter_mismatch: i32,

    /// Adapter gap score
    #[arg(long, value_name = "INT", default_value_t = defaults::ADAPTER_GAP, allow_hyphen_values = true)]
    pub adapter_gap: i32,

    // ===== Barcode Options =====
    /// FASTA file with barcodes for demultiplexing
    #[arg(short = 'b', long, value_name = "FILE")]
    pub barcodes: Option<PathBuf>,

    /// FASTA file with barcodes for mate 2
    #[arg(long, value_name = "FILE")]
    pub barcodes2: Option<PathBuf>,

    /// Where barcodes are trimmed
    #[arg(long, value_name = "END", default_value = defaults::BARCODE_TRIM_END, ignore_case = true)]
    pub barcode_trim_end: TrimEnd,

    /// Bases aligned in tail modes (default: barcode length)
    #[arg(long, value_name = "INT")]
    pub barcode_tail_length: Option<usize>,

    /// Minimum barcode overlap (default: barcode length)
    #[arg(long, value_name = "INT")]
    pub barcode_min_overlap: Option<usize>,

    /// Allowed barcode errors per overlapping base
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::BARCODE_ERROR_RATE)]
    pub barcode_error_rate: f64,

    /// Barcode match score
    #[arg(long, value_name = "INT", default_value_t = defaults::BARCODE_MATCH)]
    pub barcode_match: i32,

    /// Barcode mismatch score
    #[arg(long, value_name = "INT", default_value_t = defaults::BARCODE_MISMATCH, allow_hyphen_values = true)]
    pub barcode_mismatch: i32,

    /// Barcode gap score
    #[arg(long, value_name = "INT", default_value_t = defaults::BARCODE_GAP, allow_hyphen_values = true)]
    pub barcode_gap: i32,

    /// Assign barcodes without removing them
    #[arg(long)]
    pub barcode_keep: bool,

    /// Write reads without a barcode to their own file
    #[arg(long)]
    pub barcode_unassigned: bool,

    // ===== Alignment Options =====
    /// Score uncalled read bases as matches
    #[arg(long)]
    pub read_n_as_match: bool,

    /// Reads are colorspace with a 2-character primer prefix
    #[arg(long)]
    pub colorspace: bool,

    /// Tag read ids with the removed query id
    #[arg(long)]
    pub removal_tags: bool,

    /// Tag read ids with bases aligned to query Ns
    #[arg(long)]
    pub umi_tags: bool,

    /// Log alignments at debug level
    #[arg(long, value_name = "MODE", default_value = "none")]
    pub align_log: AlignLog,

    // ===== Processing Options =====
    /// Number of threads (default: all available cores)
    #[arg(short = 'n', long, value_name = "INT")]
    pub threads: Option<usize>,

    /// Reads (or pairs) per input batch
    #[arg(long, value_name = "INT", default_value_t = defaults::BATCH_SIZE)]
    pub batch_size: usize,

    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = 3)]
    pub verbosity: u8,
}
