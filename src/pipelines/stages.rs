//! Trimming stages built once per run from `TrimOpt`.
//!
//! Each sub-batch runs the stages in a fixed order:
//! pre-processing → barcodes (mate 1 or barcode read) → barcodes2 (mate 2)
//! → pair overlap → adapter removal cycles.

use anyhow::Result;

use crate::core::alignment::ScoreMatrix;
use crate::trim_opt::{AdapterSource, TrimOpt};
use crate::trimming::aligner::QueryAligner;
use crate::trimming::decision::TAG_SEPARATOR;
use crate::trimming::pair_overlap::PairOverlap;
use crate::trimming::preprocess::{PreprocessOpt, preprocess_pair};
use crate::trimming::query::{QueryKind, QuerySet, RevCompMode};
use crate::trimming::types::{PairedRead, SeqRead};

/// All configured stages of one run
#[derive(Debug)]
pub struct TrimStages {
    preprocess: PreprocessOpt,
    barcodes: Option<QueryAligner>,
    barcodes2: Option<QueryAligner>,
    pair_overlap: Option<PairOverlap>,
    adapters: Option<QueryAligner>,
    /// Mate-2 adapters; mate 2 falls back to `adapters` when unset
    adapters2: Option<QueryAligner>,
    adapter_cycles: usize,
    umi_tags: bool,
}

fn adapter_set(source: &AdapterSource) -> Result<Option<QuerySet>> {
    match source {
        AdapterSource::None => Ok(None),
        AdapterSource::File(path) => QuerySet::from_fasta(QueryKind::Adapter, path).map(Some),
        AdapterSource::Preset(preset) => QuerySet::from_preset(*preset, false),
        AdapterSource::Sequence(seq) => {
            QuerySet::from_records(QueryKind::Adapter, [("adapter", seq.clone())]).map(Some)
        }
    }
}

impl TrimStages {
    /// Load query sets and build one aligner per purpose
    pub fn from_opt(opt: &TrimOpt) -> Result<Self> {
        let with_rc = |set: QuerySet| match opt.adapter_revcomp {
            RevCompMode::Off => set,
            RevCompMode::On | RevCompMode::Only => set.with_reverse_complements(),
        };

        let barcodes = match &opt.barcodes {
            Some(path) => Some(QueryAligner::new(
                "barcodes",
                QuerySet::from_fasta(QueryKind::Barcode, path)?,
                opt.barcode_config(),
            )),
            None => None,
        };
        let barcodes2 = match &opt.barcodes2 {
            Some(path) => Some(QueryAligner::new(
                "barcodes2",
                QuerySet::from_fasta(QueryKind::Barcode, path)?,
                opt.barcode_config(),
            )),
            None => None,
        };

        let adapters = adapter_set(&opt.adapters)?
            .map(|set| QueryAligner::new("adapters", with_rc(set), opt.adapter_config()));

        let adapters2_set = match (&opt.adapters2, &opt.adapters) {
            (Some(path), _) => Some(QuerySet::from_fasta(QueryKind::Adapter, path)?),
            (None, AdapterSource::Preset(preset)) if opt.is_paired() => {
                QuerySet::from_preset(*preset, true)?
            }
            _ => None,
        };
        let adapters2 =
            adapters2_set.map(|set| QueryAligner::new("adapters2", with_rc(set), opt.adapter_config()));

        let pair_overlap = opt.pair_overlap.then(|| {
            PairOverlap::new(
                ScoreMatrix::new(
                    opt.adapter.match_score,
                    opt.adapter.mismatch_score,
                    opt.adapter.gap_score,
                    opt.read_n_as_match,
                ),
                opt.adapter.error_rate,
                opt.pair_overlap_min,
            )
        });

        Ok(Self {
            preprocess: opt.preprocess.clone(),
            barcodes,
            barcodes2,
            pair_overlap,
            adapters,
            adapters2,
            adapter_cycles: opt.adapter_cycles,
            umi_tags: opt.tags.umi_tags,
        })
    }

    pub fn barcodes(&self) -> Option<&QueryAligner> {
        self.barcodes.as_ref()
    }

    pub fn barcodes2(&self) -> Option<&QueryAligner> {
        self.barcodes2.as_ref()
    }

    pub fn adapters(&self) -> Option<&QueryAligner> {
        self.adapters.as_ref()
    }

    pub fn adapters2(&self) -> Option<&QueryAligner> {
        self.adapters2.as_ref()
    }

    pub fn pair_overlap(&self) -> Option<&PairOverlap> {
        self.pair_overlap.as_ref()
    }

    /// Barcode ids in assignment order, for output naming
    pub fn barcode_names(&self) -> (Option<Vec<String>>, Option<Vec<String>>) {
        let names = |a: &QueryAligner| -> Vec<String> { a.queries().iter().map(|q| q.id.clone()).collect() };
        (self.barcodes.as_ref().map(names), self.barcodes2.as_ref().map(names))
    }

    /// Per-stage reports for the run summary
    pub fn reports(&self) -> Vec<String> {
        let mut out: Vec<String> = [&self.barcodes, &self.barcodes2, &self.adapters, &self.adapters2]
            .into_iter()
            .flatten()
            .map(QueryAligner::report)
            .collect();
        if let Some(po) = &self.pair_overlap {
            out.push(format!(
                "pair overlap:\n  modified pairs: {}\n  overlap lengths: {}",
                po.stats().modified(),
                po.stats().histogram.summary()
            ));
        }
        out
    }

    /// Run every stage over one sub-batch in place
    pub fn process_sub_batch(&self, pairs: &mut [PairedRead]) {
        for pair in pairs.iter_mut() {
            preprocess_pair(pair, &self.preprocess);
        }

        if let Some(aligner) = &self.barcodes {
            let (idx, assigned) = {
                let (idx, mut reads): (Vec<usize>, Vec<&mut SeqRead>) = pairs
                    .iter_mut()
                    .enumerate()
                    .filter(|(_, p)| !p.filtered)
                    .map(|(i, p)| (i, p.barcode.as_mut().unwrap_or(&mut p.m1)))
                    .unzip();
                (idx, aligner.process(&mut reads))
            };
            for (i, a) in idx.into_iter().zip(assigned) {
                pairs[i].barcode_id = a.map_or(0, |q| q + 1);
            }
        }

        if let Some(aligner) = &self.barcodes2 {
            let (idx, assigned) = {
                let (idx, mut reads): (Vec<usize>, Vec<&mut SeqRead>) = pairs
                    .iter_mut()
                    .enumerate()
                    .filter(|(_, p)| !p.filtered)
                    .filter_map(|(i, p)| p.m2.as_mut().map(|m2| (i, m2)))
                    .unzip();
                (idx, aligner.process(&mut reads))
            };
            for (i, a) in idx.into_iter().zip(assigned) {
                pairs[i].barcode_id2 = a.map_or(0, |q| q + 1);
            }
        }

        if self.umi_tags && (self.barcodes.is_some() || self.barcodes2.is_some()) {
            for pair in pairs.iter_mut().filter(|p| !p.filtered) {
                pair.tag_barcode_umi(TAG_SEPARATOR);
            }
        }

        if let Some(po) = &self.pair_overlap {
            po.process(pairs);
        }

        if let Some(aligner) = &self.adapters {
            let aligner2 = self.adapters2.as_ref().unwrap_or(aligner);
            for cycle in 0..self.adapter_cycles {
                let mut m1: Vec<&mut SeqRead> = pairs
                    .iter_mut()
                    .filter(|p| !p.filtered)
                    .map(|p| &mut p.m1)
                    .collect();
                aligner.process_cycle(&mut m1, cycle == 0);

                let mut m2: Vec<&mut SeqRead> = pairs
                    .iter_mut()
                    .filter(|p| !p.filtered)
                    .filter_map(|p| p.m2.as_mut())
                    .collect();
                if !m2.is_empty() {
                    aligner2.process_cycle(&mut m2, cycle == 0);
                }
            }
        } else if let Some(aligner2) = &self.adapters2 {
            for cycle in 0..self.adapter_cycles {
                let mut m2: Vec<&mut SeqRead> = pairs
                    .iter_mut()
                    .filter(|p| !p.filtered)
                    .filter_map(|p| p.m2.as_mut())
                    .collect();
                aligner2.process_cycle(&mut m2, cycle == 0);
            }
        }
    }
}
