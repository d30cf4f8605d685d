use super::*;
use crate::trimming::query::Query;
use crate::trimming::types::TrimEnd;

fn adapter_config(trim_end: TrimEnd) -> AlignerConfig {
    AlignerConfig {
        match_score: 1,
        mismatch_score: -1,
        gap_score: -6,
        read_n_as_match: false,
        overlap: OverlapParams {
            trim_end,
            error_rate: 0.1,
            min_overlap: Some(3),
            strict_region: true,
            extract_umi: false,
            keep_alignment_text: false,
        },
        tail_length: None,
        rev_comp: RevCompMode::Off,
        colorspace: false,
        min_read_length: 18,
        keep_reads: false,
        tags: TagOptions::default(),
        align_log: AlignLog::None,
    }
}

fn barcode_config() -> AlignerConfig {
    let mut cfg = adapter_config(TrimEnd::Left);
    cfg.gap_score = -9;
    cfg.overlap.error_rate = 0.0;
    cfg.overlap.min_overlap = None;
    cfg
}

fn set(kind: QueryKind, records: &[(&str, &str)]) -> QuerySet {
    QuerySet::from_records(
        kind,
        records.iter().map(|(id, s)| (id.to_string(), s.as_bytes().to_vec())),
    )
    .unwrap()
}

fn run(aligner: &QueryAligner, reads: &mut [SeqRead]) -> Vec<Option<usize>> {
    let mut refs: Vec<&mut SeqRead> = reads.iter_mut().collect();
    aligner.process(&mut refs)
}

fn query(aligner: &QueryAligner, idx: usize) -> &Query {
    aligner.queries().get(idx)
}

#[test]
fn test_right_mode_full_length_adapter() {
    let mut cfg = adapter_config(TrimEnd::Right);
    cfg.overlap.error_rate = 3.0;
    let aligner = QueryAligner::new("adapters", set(QueryKind::Adapter, &[("a1", "ACGTACGT")]), cfg);

    let mut reads = vec![SeqRead::new("r1", b"ACGTACGTACGT".to_vec(), None)];
    let assigned = run(&aligner, &mut reads);

    assert_eq!(assigned, vec![Some(0)]);
    assert_eq!(reads[0].seq, b"ACGT");
    assert!(reads[0].rm_adapter);
    assert_eq!(query(&aligner, 0).overlap_removals(), 1);
    assert_eq!(query(&aligner, 0).full_length_removals(), 1);
    assert_eq!(aligner.stats().modified(), 1);
    assert_eq!(aligner.stats().histogram.count_at(8), 1);
}

#[test]
fn test_left_mode_keeps_suffix() {
    let mut cfg = adapter_config(TrimEnd::Left);
    cfg.overlap.error_rate = 3.0;
    let aligner = QueryAligner::new("adapters", set(QueryKind::Adapter, &[("a1", "ACGTACGT")]), cfg);

    let mut reads = vec![SeqRead::new("r1", b"ACGTACGTACGT".to_vec(), Some(b"ABCDEFGHIJKL".to_vec()))];
    run(&aligner, &mut reads);
    assert_eq!(reads[0].seq, b"ACGT");
    assert_eq!(reads[0].qual.as_deref(), Some(&b"IJKL"[..]));
    assert_eq!(query(&aligner, 0).full_length_removals(), 1);
}

#[test]
fn test_partial_adapter_at_read_end() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "ACGTACGT")]),
        adapter_config(TrimEnd::Right),
    );
    let mut reads = vec![SeqRead::new("r1", b"TTTTTTTTACGT".to_vec(), None)];
    run(&aligner, &mut reads);
    assert_eq!(reads[0].seq, b"TTTTTTTT");
    assert_eq!(query(&aligner, 0).overlap_removals(), 1);
    assert_eq!(query(&aligner, 0).full_length_removals(), 0);
    assert_eq!(aligner.stats().histogram.count_at(4), 1);
}

#[test]
fn test_short_read_counted_but_still_aligned() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "ACGTACGT")]),
        adapter_config(TrimEnd::Right),
    );
    let mut reads = vec![
        SeqRead::new("short", b"TTTTTTTTACGT".to_vec(), None),
        SeqRead::new("long", b"GGGGGGGGGGGGGGGGGGGGACGTACGT".to_vec(), None),
    ];
    run(&aligner, &mut reads);
    assert_eq!(aligner.stats().pre_short(), 1);
    assert_eq!(reads[0].seq, b"TTTTTTTT");
    assert_eq!(reads[1].seq, b"GGGGGGGGGGGGGGGGGGGG");
    assert_eq!(aligner.stats().modified(), 2);
}

#[test]
fn test_barcode_assignment_uses_matching_query() {
    let aligner = QueryAligner::new(
        "barcodes",
        set(QueryKind::Barcode, &[("B1", "AAAA"), ("B2", "TTTT")]),
        barcode_config(),
    );
    let mut reads = vec![
        SeqRead::new("r1", b"TTTTGCGCGCGC".to_vec(), None),
        SeqRead::new("r2", b"GCGCGCGCGCGC".to_vec(), None),
        SeqRead::new("r3", b"AAAAGCGC".to_vec(), None),
    ];
    let assigned = run(&aligner, &mut reads);

    assert_eq!(assigned, vec![Some(1), None, Some(0)]);
    assert_eq!(reads[0].seq, b"GCGCGCGC");
    assert_eq!(reads[1].seq, b"GCGCGCGCGCGC");
    assert_eq!(reads[2].seq, b"GCGC");
    assert_eq!(aligner.stats().unassigned(), 1);
    // Barcoding does not apply the short-read pre-filter statistic
    assert_eq!(aligner.stats().pre_short(), 0);
    assert_eq!(query(&aligner, 1).full_length_removals(), 1);
}

#[test]
fn test_barcode_with_one_error_rejected_at_zero_error_rate() {
    let aligner = QueryAligner::new(
        "barcodes",
        set(QueryKind::Barcode, &[("B1", "ACGT")]),
        barcode_config(),
    );
    let mut reads = vec![SeqRead::new("r1", b"ACGAGGGGGG".to_vec(), None)];
    let assigned = run(&aligner, &mut reads);
    assert_eq!(assigned, vec![None]);
    assert_eq!(reads[0].seq, b"ACGAGGGGGG");
}

#[test]
fn test_barcode_keep_reads() {
    let mut cfg = barcode_config();
    cfg.keep_reads = true;
    let aligner = QueryAligner::new("barcodes", set(QueryKind::Barcode, &[("B1", "ACGT")]), cfg);
    let mut reads = vec![SeqRead::new("r1", b"ACGTTTTT".to_vec(), None)];
    let assigned = run(&aligner, &mut reads);
    assert_eq!(assigned, vec![Some(0)]);
    assert_eq!(reads[0].seq, b"ACGTTTTT");
    assert_eq!(aligner.stats().modified(), 0);
    assert_eq!(query(&aligner, 0).overlap_removals(), 1);
}

#[test]
fn test_rev_comp_only_ignores_forward_match() {
    let adapters = || set(QueryKind::Adapter, &[("ad", "AGATCGGAAGAGC")]).with_reverse_complements();
    let forward_read = b"CCCCCCCCCCAGATCGGAAGAGC".to_vec();
    let rc_read = b"CCCCCCCCCCGCTCTTCCGATCT".to_vec();

    let mut cfg = adapter_config(TrimEnd::Right);
    cfg.rev_comp = RevCompMode::Only;
    let aligner = QueryAligner::new("adapters", adapters(), cfg);
    let mut reads = vec![
        SeqRead::new("fwd", forward_read.clone(), None),
        SeqRead::new("rc", rc_read.clone(), None),
    ];
    let assigned = run(&aligner, &mut reads);
    assert_eq!(assigned, vec![None, Some(1)]);
    assert_eq!(reads[0].seq, forward_read);
    assert_eq!(reads[1].seq, b"CCCCCCCCCC");
    assert!(reads[1].rm_adapter_rc && !reads[1].rm_adapter);
    assert_eq!(query(&aligner, 0).overlap_removals(), 0);

    let mut cfg = adapter_config(TrimEnd::Right);
    cfg.rev_comp = RevCompMode::On;
    let aligner = QueryAligner::new("adapters", adapters(), cfg);
    let mut reads = vec![SeqRead::new("fwd", forward_read, None)];
    assert_eq!(run(&aligner, &mut reads), vec![Some(0)]);
    assert!(reads[0].rm_adapter);
}

#[test]
fn test_no_match_leaves_read_untouched() {
    let mut cfg = adapter_config(TrimEnd::Right);
    cfg.tags = TagOptions {
        removal_tags: true,
        umi_tags: true,
    };
    let aligner = QueryAligner::new("adapters", set(QueryKind::Adapter, &[("a1", "ACGTACGT")]), cfg);
    let original = SeqRead::new("r1", b"GGGGGGGGGGGGGGGGGGGG".to_vec(), Some(b"IIIIIIIIIIIIIIIIIIII".to_vec()));
    let mut reads = vec![original.clone()];
    assert_eq!(run(&aligner, &mut reads), vec![None]);
    assert_eq!(reads[0], original);
    assert_eq!(aligner.stats().modified(), 0);
}

#[test]
fn test_equal_scores_first_query_wins() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("first", "ACGTACGT"), ("second", "ACGTACGT")]),
        adapter_config(TrimEnd::Right),
    );
    let mut reads = vec![SeqRead::new("r1", b"GGGGGGGGGGACGTACGT".to_vec(), None)];
    assert_eq!(run(&aligner, &mut reads), vec![Some(0)]);
    assert_eq!(query(&aligner, 1).overlap_removals(), 0);
}

#[test]
fn test_right_tail_aligns_only_trailing_bases() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "ACGTACGT")]),
        adapter_config(TrimEnd::RightTail),
    );
    let mut reads = vec![SeqRead::new("r1", b"CCCCCCCCCCCCACGTACGT".to_vec(), None)];
    run(&aligner, &mut reads);
    assert_eq!(reads[0].seq, b"CCCCCCCCCCCC");
}

#[test]
fn test_removal_and_umi_tags() {
    let mut cfg = barcode_config();
    cfg.overlap.extract_umi = true;
    cfg.tags = TagOptions {
        removal_tags: true,
        umi_tags: true,
    };
    let aligner = QueryAligner::new("barcodes", set(QueryKind::Barcode, &[("BC1", "NNNNACGT")]), cfg);
    let mut reads = vec![SeqRead::new("r1", b"GATCACGTTTTTTT".to_vec(), None)];
    assert_eq!(run(&aligner, &mut reads), vec![Some(0)]);
    assert_eq!(reads[0].seq, b"TTTTTT");
    assert_eq!(reads[0].id, "r1_removed_BC1_GATC");
    assert_eq!(reads[0].umi.as_deref(), Some("GATC"));
}

#[test]
fn test_histogram_sum_equals_modified() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "AGATCGGAAGAGC")]),
        adapter_config(TrimEnd::Right),
    );
    let mut reads: Vec<SeqRead> = (0..13)
        .map(|k| {
            let mut seq = b"TTGCCATTGCCATTGCCA".to_vec();
            seq.extend_from_slice(&b"AGATCGGAAGAGC"[..k]);
            SeqRead::new(format!("r{k}"), seq, None)
        })
        .collect();
    run(&aligner, &mut reads);
    assert!(aligner.stats().modified() > 0);
    assert_eq!(aligner.stats().histogram.total(), aligner.stats().modified());
}

#[test]
fn test_report_lists_queries() {
    let aligner = QueryAligner::new(
        "barcodes",
        set(QueryKind::Barcode, &[("B1", "AAAA"), ("B2", "TTTT")]),
        barcode_config(),
    );
    let report = aligner.report();
    assert!(report.starts_with("barcodes (2 barcode(s)):"));
    assert!(report.contains("B1"));
    assert!(report.contains("unassigned reads: 0"));
}

#[test]
fn test_left_tail_aligns_only_leading_bases() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "ACGTACGT")]),
        adapter_config(TrimEnd::LeftTail),
    );
    let mut reads = vec![
        SeqRead::new("in_tail", b"TACGTGGGGGGGGGGG".to_vec(), None),
        SeqRead::new("past_tail", b"GGGGGGGGTACGTGGG".to_vec(), None),
    ];
    let assigned = run(&aligner, &mut reads);

    assert_eq!(assigned, vec![Some(0), None]);
    assert_eq!(reads[0].seq, b"GGGGGGGGGGG");
    assert_eq!(reads[1].seq, b"GGGGGGGGTACGTGGG");
    assert_eq!(aligner.stats().histogram.count_at(5), 1);
}

#[test]
fn test_any_resolves_from_overhangs() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "ACGTACGT")]),
        adapter_config(TrimEnd::Any),
    );
    let mut reads = vec![
        // Adapter at the end: trimmed like RIGHT
        SeqRead::new("right", b"TTTTTTTTTTACGTACGT".to_vec(), None),
        // Adapter at the start: trimmed like LEFT
        SeqRead::new("left", b"ACGTACGTGGGGGGGGGG".to_vec(), None),
        // Read lies inside the adapter: nothing is left
        SeqRead::new("inside", b"CGTACG".to_vec(), Some(b"IIIIII".to_vec())),
    ];
    let assigned = run(&aligner, &mut reads);

    assert_eq!(assigned, vec![Some(0), Some(0), Some(0)]);
    assert_eq!(reads[0].seq, b"TTTTTTTTTT");
    assert_eq!(reads[1].seq, b"GGGGGGGGGG");
    assert!(reads[2].is_empty());
    assert_eq!(reads[2].qual.as_deref(), Some(&b""[..]));
    assert_eq!(query(&aligner, 0).full_length_removals(), 2);
    assert_eq!(aligner.stats().histogram.count_at(6), 1);
}

#[test]
fn test_colorspace_skips_primer() {
    let mut cfg = adapter_config(TrimEnd::Right);
    cfg.colorspace = true;
    let aligner = QueryAligner::new("adapters", set(QueryKind::Adapter, &[("a1", "ACGTACGT")]), cfg);
    let mut reads = vec![SeqRead::new(
        "r1",
        b"GACCCCCCCCCCACGTACGT".to_vec(),
        Some(b"ABCDEFGHIJKLMNOPQRST".to_vec()),
    )];
    run(&aligner, &mut reads);
    assert_eq!(reads[0].seq, b"GACCCCCCCCCC");
    assert_eq!(reads[0].qual.as_deref(), Some(&b"ABCDEFGHIJKL"[..]));

    let mut cfg = adapter_config(TrimEnd::Left);
    cfg.colorspace = true;
    let aligner = QueryAligner::new("adapters", set(QueryKind::Adapter, &[("a1", "ACGTACGT")]), cfg);
    let mut reads = vec![SeqRead::new("r2", b"TTACGTACGTGGGGGGGG".to_vec(), None)];
    run(&aligner, &mut reads);
    assert_eq!(reads[0].seq, b"GGGGGGGG");
}

#[test]
fn test_repeated_cycles_count_short_reads_once() {
    let aligner = QueryAligner::new(
        "adapters",
        set(QueryKind::Adapter, &[("a1", "AGATCGGAAGAGC")]),
        adapter_config(TrimEnd::Right),
    );
    let mut reads = vec![
        SeqRead::new("short", b"TTTTTTTTTT".to_vec(), None),
        SeqRead::new(
            "twice",
            b"CCCCCCCCCCCCCCCCCCCCAGATCGGAAGAGCAGATCGGAAGAGC".to_vec(),
            None,
        ),
    ];
    let mut refs: Vec<&mut SeqRead> = reads.iter_mut().collect();
    aligner.process_cycle(&mut refs, true);
    aligner.process_cycle(&mut refs, false);

    assert_eq!(aligner.stats().pre_short(), 1);
    assert_eq!(reads[1].seq, b"CCCCCCCCCCCCCCCCCCCC");
    assert_eq!(aligner.stats().modified(), 2);
    assert_eq!(query(&aligner, 0).full_length_removals(), 2);
}

#[test]
fn test_read_n_does_not_count_as_error() {
    let mut cfg = barcode_config();
    cfg.read_n_as_match = false;
    let aligner = QueryAligner::new("barcodes", set(QueryKind::Barcode, &[("B1", "ACGTACGT")]), cfg);
    let mut reads = vec![SeqRead::new("r1", b"ACGTNCGTTTTTTT".to_vec(), None)];
    assert_eq!(run(&aligner, &mut reads), vec![Some(0)]);
    assert_eq!(reads[0].seq, b"TTTTTT");
}
