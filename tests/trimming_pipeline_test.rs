// tests/trimming_pipeline_test.rs
//
// End-to-end tests: input files → pipelines::run → output files.

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use ferrous_bar::core::utils::reverse_complement;
use ferrous_bar::pipelines;
use ferrous_bar::trim_opt::{AdapterSource, TrimOpt};

const ADAPTER: &[u8] = b"AGATCGGAAGAGC";

// Helper function to create a FASTQ file with all-'I' qualities
fn create_fastq_file(dir: &Path, name: &str, reads: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, fastq_text(reads)).unwrap();
    path
}

fn fastq_text(reads: &[(&str, Vec<u8>)]) -> String {
    reads
        .iter()
        .map(|(id, seq)| {
            format!(
                "@{}\n{}\n+\n{}\n",
                id,
                String::from_utf8_lossy(seq),
                "I".repeat(seq.len())
            )
        })
        .collect()
}

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn read_gz(path: &Path) -> String {
    let mut out = String::new();
    MultiGzDecoder::new(fs::File::open(path).unwrap())
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn test_single_end_adapter_removal() {
    let dir = TempDir::new().unwrap();
    let body1 = b"GATTACAGATTACAGATTACA".to_vec();
    let body2 = b"CCGGTTAACCGGTTAA".to_vec();
    let body3 = b"TTTTTTTTTTGGGGGGGGGG".to_vec();
    let reads = create_fastq_file(
        dir.path(),
        "reads.fq",
        &[
            ("r1", concat(&[&body1[..], ADAPTER])),
            ("r2", concat(&[&body2[..], ADAPTER])),
            ("r3", body3.clone()),
        ],
    );

    let opt = TrimOpt {
        reads,
        target: dir.path().join("out"),
        adapters: AdapterSource::Sequence(ADAPTER.to_vec()),
        ..Default::default()
    };
    let summary = pipelines::run(&opt).unwrap();

    assert_eq!(summary.counts.total, 3);
    assert_eq!(summary.counts.good, 2);
    assert_eq!(summary.counts.short, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("out.fastq")).unwrap(),
        fastq_text(&[("r1", body1), ("r3", body3)])
    );
    assert!(summary.stage_reports[0].contains("modified reads: 2"));
}

#[test]
fn test_barcode_demultiplexing() {
    let dir = TempDir::new().unwrap();
    let body = b"GATTACAGATTACAGATTAC".to_vec();
    let barcodes = dir.path().join("barcodes.fa");
    fs::write(&barcodes, ">BC1\nACGTAC\n>BC2\nTTGGCC\n").unwrap();
    let reads = create_fastq_file(
        dir.path(),
        "reads.fq",
        &[
            ("a", concat(&[&b"ACGTAC"[..], &body[..]])),
            ("b", concat(&[&b"TTGGCC"[..], &body[..]])),
            ("c", concat(&[&b"GGGGGG"[..], &body[..]])),
        ],
    );

    let opt = TrimOpt {
        reads,
        target: dir.path().join("out"),
        barcodes: Some(barcodes),
        barcode_unassigned: true,
        ..Default::default()
    };
    let summary = pipelines::run(&opt).unwrap();
    assert_eq!(summary.counts.good, 3);

    let out = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(out("out_barcode_BC1.fastq"), fastq_text(&[("a", body.clone())]));
    assert_eq!(out("out_barcode_BC2.fastq"), fastq_text(&[("b", body.clone())]));
    assert_eq!(
        out("out_barcode_unassigned.fastq"),
        fastq_text(&[("c", concat(&[&b"GGGGGG"[..], &body[..]]))])
    );
    assert!(summary.stage_reports[0].contains("unassigned reads: 1"));
}

#[test]
fn test_paired_overlap_with_gzip_in_and_out() {
    let dir = TempDir::new().unwrap();
    let insert = b"GATTACAGATCCTTGGAACC".to_vec();
    let m1 = concat(&[&insert[..], &b"AGATCGGAAG"[..]]);
    let m2 = concat(&[&reverse_complement(&insert)[..], &b"CTGTCTCTTA"[..]]);

    let write_gz = |name: &str, reads: &[(&str, Vec<u8>)]| {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(fastq_text(reads).as_bytes()).unwrap();
        let path = dir.path().join(name);
        fs::write(&path, enc.finish().unwrap()).unwrap();
        path
    };
    let r1 = write_gz("r1.fq.gz", &[("p1", m1)]);
    let r2 = write_gz("r2.fq.gz", &[("p1", m2)]);

    let opt = TrimOpt {
        reads: r1,
        reads2: Some(r2),
        target: dir.path().join("out"),
        pair_overlap: true,
        pair_overlap_min: 10,
        zip_output: true,
        ..Default::default()
    };
    let summary = pipelines::run(&opt).unwrap();
    assert_eq!(summary.counts.good, 1);

    assert_eq!(
        read_gz(&dir.path().join("out_1.fastq.gz")),
        fastq_text(&[("p1", insert.clone())])
    );
    assert_eq!(
        read_gz(&dir.path().join("out_2.fastq.gz")),
        fastq_text(&[("p1", reverse_complement(&insert))])
    );
}

#[test]
fn test_fasta_in_fasta_out() {
    let dir = TempDir::new().unwrap();
    let reads = dir.path().join("reads.fa");
    fs::write(&reads, ">r1\nGATTACAGATTACAGATTACAAGATCGGAAGAGC\n").unwrap();

    let opt = TrimOpt {
        reads,
        target: dir.path().join("out"),
        adapters: AdapterSource::Sequence(ADAPTER.to_vec()),
        ..Default::default()
    };
    pipelines::run(&opt).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("out.fasta")).unwrap(),
        ">r1\nGATTACAGATTACAGATTACA\n"
    );
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let opt = TrimOpt {
        reads: dir.path().join("missing.fq"),
        target: dir.path().join("out"),
        ..Default::default()
    };
    let err = pipelines::run(&opt).unwrap_err();
    assert!(format!("{:#}", err).contains("missing.fq"));
}

#[test]
fn test_cli_runs_and_rejects_invalid_options() {
    let dir = TempDir::new().unwrap();
    let reads = create_fastq_file(
        dir.path(),
        "reads.fq",
        &[("r1", concat(&[&b"GATTACAGATTACAGATTACA"[..], ADAPTER]))],
    );
    let target = dir.path().join("cli");

    let status = Command::new(env!("CARGO_BIN_EXE_ferrous-bar"))
        .arg(&reads)
        .arg("-o")
        .arg(&target)
        .args(["--adapter-seq", "AGATCGGAAGAGC", "-n", "1", "-v", "1"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("cli.fastq").exists());

    let status = Command::new(env!("CARGO_BIN_EXE_ferrous-bar"))
        .arg(&reads)
        .arg("-o")
        .arg(&target)
        .args(["--adapter-cycles", "0", "-v", "1"])
        .status()
        .unwrap();
    assert!(!status.success());
}
