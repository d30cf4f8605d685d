pub mod read_writer; // Post-filter and per-barcode/per-mate output fan-out
pub mod seq_reader; // FASTA/FASTQ reader using bio::io (plain, gzip, BGZF)
