// Run driver
//
// Reader thread → parallel trimming → ordered fan-out writing:
// - Stage 0: the double-buffered reader prepares the next batch
// - Stage 1: trimming stages over rayon sub-batches
// - Stage 2: post-filter and per-barcode/per-mate output

use anyhow::{Context, Result};
use std::fmt;

use super::orchestration::process_batch_parallel_subbatch;
use super::stages::TrimStages;
use crate::core::io::read_writer::{OutputOptions, ReadWriter, WriteCounts};
use crate::core::io::seq_reader::{InputStreams, PairedBatchReader, SeqFormat};
use crate::core::utils::{cputime, realtime};
use crate::trim_opt::TrimOpt;

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub counts: WriteCounts,
    pub paired: bool,
    /// Per query set and pair-overlap reports
    pub stage_reports: Vec<String>,
    pub cpu_secs: f64,
    pub real_secs: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = if self.paired { "pairs" } else { "reads" };
        let c = &self.counts;
        writeln!(f, "Processed {} {} in {:.3} CPU sec, {:.3} real sec", c.total, unit, self.cpu_secs, self.real_secs)?;
        writeln!(f, "  filtered (uncalled bases): {}", c.filtered_uncalled)?;
        writeln!(f, "  short after trimming:      {}", c.short)?;
        if self.paired {
            writeln!(f, "  single reads written:      {}", c.single)?;
            writeln!(f, "  single reads dropped:      {}", c.single_dropped)?;
        }
        if c.unassigned_dropped > 0 {
            writeln!(f, "  unassigned dropped:        {}", c.unassigned_dropped)?;
        }
        write!(f, "  written:                   {}", c.good)?;
        for report in &self.stage_reports {
            write!(f, "\n{}", report)?;
        }
        Ok(())
    }
}

/// Trim and demultiplex all input according to `opt`
pub fn run(opt: &TrimOpt) -> Result<RunSummary> {
    let start_real = realtime();
    let start_cpu = cputime();

    let stages = TrimStages::from_opt(opt)?;
    let streams = InputStreams::open(&opt.reads, opt.reads2.as_deref(), opt.barcode_reads.as_deref())?;
    let reader = PairedBatchReader::new(streams, opt.batch_size);

    let format = reader.format();
    if format == SeqFormat::Fasta && opt.preprocess.qtrim_threshold.is_some() {
        log::warn!("Quality trimming has no effect on FASTA input");
    }

    let (barcodes, barcodes2) = stages.barcode_names();
    let mut writer = ReadWriter::new(
        OutputOptions {
            target: opt.target.clone(),
            format,
            zip: opt.zip_output,
            paired: opt.is_paired(),
            single_reads: opt.single_reads,
            min_read_length: opt.min_read_length,
            barcode_unassigned: opt.barcode_unassigned,
        },
        barcodes,
        barcodes2,
    )?;

    let mut n_batches = 0usize;
    while let Some(mut batch) = reader
        .next_batch()
        .with_context(|| format!("Error reading {}", opt.reads.display()))?
    {
        let batch_cpu = cputime();
        let batch_real = realtime();
        let batch_bp: usize = batch
            .iter()
            .map(|p| p.m1.len() + p.m2.as_ref().map_or(0, |m| m.len()))
            .sum();

        process_batch_parallel_subbatch(&stages, &mut batch);
        writer.write_batch(&batch)?;

        n_batches += 1;
        log::info!(
            "Processed {} entries ({} bp) in {:.3} CPU sec, {:.3} real sec",
            batch.len(),
            batch_bp,
            cputime() - batch_cpu,
            realtime() - batch_real
        );
    }
    log::debug!("Read {} batch(es)", n_batches);

    let counts = writer.finish()?;
    Ok(RunSummary {
        counts,
        paired: opt.is_paired(),
        stage_reports: stages.reports(),
        cpu_secs: cputime() - start_cpu,
        real_secs: realtime() - start_real,
    })
}
