use std::{fs, io, path::Path};

use hex_literal::hex;
use rust_htslib::bam::{self, Read};
use sha2::{Digest, Sha256};

use leftalign::{
    io::{bam as leftalign_bam, json, tsv},
    leftalign::LeftAlignConfig,
    realign_all, RealignmentJob, RecordStatus, RunSummary,
};

const TEST_DATA_DIR: &str = "./tests/data/";
const SCENARIO_FILE: &str = "scenarios.tsv";
const SAM_FILE: &str = "reads.sam";
const REFERENCE_FILE: &str = "reference.fa";

fn sha256_file_digest<P: AsRef<Path>>(path: P) -> Vec<u8> {
    let mut file = fs::File::open(&path)
        .unwrap_or_else(|_| panic!("Failed to open file: {}", path.as_ref().display()));
    let mut hasher = Sha256::new();
    _ = io::copy(&mut file, &mut hasher)
        .unwrap_or_else(|_| panic!("Failed to read from file: {}", path.as_ref().display()));
    hasher.finalize().to_vec()
}

#[test]
/// Check the input files used for integration tests.
/// If this test fails, it means one or more of the input files have changed.
/// This is a problem if tests are not updated to reflect the new input files.
fn check_input_files() {
    let path = Path::new(TEST_DATA_DIR).join(SCENARIO_FILE);
    let expect = hex!("3a82657eacd7c04de9aad8e1682402ee004a9962bdb3ec4fe82f335928bab4af");
    assert_eq!(sha256_file_digest(path)[..], expect[..]);

    let path = Path::new(TEST_DATA_DIR).join(SAM_FILE);
    let expect = hex!("10934d16a28c9ff1b6ee3e0c0b679dbbaac77229331ade33bf729754e073c6ae");
    assert_eq!(sha256_file_digest(path)[..], expect[..]);

    let path = Path::new(TEST_DATA_DIR).join(REFERENCE_FILE);
    let expect = hex!("4f89b0cd304c345c4c046c5044a4c6a829365beab954712e00c59fbca18a3eb4");
    assert_eq!(sha256_file_digest(path)[..], expect[..]);
}

#[test]
fn run_batch() {
    let records = tsv::read_alignments(&format!("{TEST_DATA_DIR}/{SCENARIO_FILE}")).unwrap();
    let mut jobs: Vec<RealignmentJob> = records.into_iter().map(RealignmentJob::new).collect();

    let summary = realign_all(&mut jobs, &LeftAlignConfig::default(), 2);

    assert_eq!(
        RunSummary {
            total: 7,
            unchanged: 1,
            realigned: 5,
            exhausted: 0,
            failed: 1,
            skipped: 0,
        },
        summary
    );

    let realigned: Vec<_> = jobs
        .iter()
        .map(|job| {
            let record = job.to_record();
            (record.name, record.cigar, record.offset, record.status)
        })
        .collect();
    let expected = [
        ("leftmost", "2M1D5M", 0, RecordStatus::Unchanged),
        ("homopolymer", "1M1D4M", 0, RecordStatus::Realigned),
        ("split_homopolymer", "2M2D5M", 0, RecordStatus::Realigned),
        ("tandem", "1M4D3M", 0, RecordStatus::Realigned),
        ("leading", "4M", 2, RecordStatus::Realigned),
        ("window", "1M1D4M", 3, RecordStatus::Realigned),
        ("malformed", "2M1Q3M", 0, RecordStatus::Failed),
    ];
    for (got, (name, cigar, offset, status)) in realigned.iter().zip(expected) {
        assert_eq!(name, got.0);
        assert_eq!(cigar, got.1, "{name}");
        assert_eq!(offset, got.2, "{name}");
        assert_eq!(status, got.3, "{name}");
    }
}

#[test]
fn batch_output_files() {
    let records = tsv::read_alignments(&format!("{TEST_DATA_DIR}/{SCENARIO_FILE}")).unwrap();
    let mut jobs: Vec<RealignmentJob> = records.into_iter().map(RealignmentJob::new).collect();
    let summary = realign_all(&mut jobs, &LeftAlignConfig::default(), 100);

    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("realigned.tsv");
    let summary_path = dir.path().join("summary.json");

    let records: Vec<_> = jobs.iter().map(RealignmentJob::to_record).collect();
    tsv::write_realignments(&records, fs::File::create(&out_path).unwrap()).unwrap();
    json::write_json_to(&summary, summary_path.to_str()).unwrap();

    let written = fs::read_to_string(&out_path).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(7, lines.len());
    assert_eq!("homopolymer\t1M1D4M\t0\trealigned", lines[1]);
    assert_eq!("leading\t4M\t2\trealigned", lines[4]);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(7, summary["total"]);
    assert_eq!(5, summary["realigned"]);
}

#[test]
fn realigned_output_is_stable() {
    let records = tsv::read_alignments(&format!("{TEST_DATA_DIR}/{SCENARIO_FILE}")).unwrap();
    let mut jobs: Vec<RealignmentJob> = records.into_iter().map(RealignmentJob::new).collect();
    realign_all(&mut jobs, &LeftAlignConfig::default(), 3);

    let mut second: Vec<RealignmentJob> = jobs
        .iter()
        .filter(|job| job.status() != RecordStatus::Failed)
        .map(|job| {
            let record = job.to_record();
            let mut alignment = job.alignment.clone();
            alignment.cigar = record.cigar;
            alignment.offset = record.offset;
            RealignmentJob::new(alignment)
        })
        .collect();
    let summary = realign_all(&mut second, &LeftAlignConfig::default(), 3);

    assert_eq!(6, summary.total);
    assert_eq!(6, summary.unchanged);
}

#[test]
fn run_bam() {
    // work on a copy of the reference so the FASTA index is created outside the source tree
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join(REFERENCE_FILE);
    fs::copy(Path::new(TEST_DATA_DIR).join(REFERENCE_FILE), &reference).unwrap();
    let output = dir.path().join("realigned.bam");

    let summary = leftalign_bam::realign_bam(
        &format!("{TEST_DATA_DIR}/{SAM_FILE}"),
        reference.to_str().unwrap(),
        output.to_str().unwrap(),
        &LeftAlignConfig::default(),
        3,
    )
    .unwrap();

    assert_eq!(
        RunSummary {
            total: 4,
            unchanged: 1,
            realigned: 2,
            exhausted: 0,
            failed: 0,
            skipped: 1,
        },
        summary
    );

    let mut reader = bam::Reader::from_path(&output).unwrap();
    let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(4, records.len());

    let by_name = |name: &[u8]| {
        records
            .iter()
            .find(|r| r.qname() == name)
            .unwrap_or_else(|| panic!("missing {}", String::from_utf8_lossy(name)))
    };
    let read1 = by_name(b"read1");
    assert_eq!("1M1D4M", read1.cigar().to_string());
    assert_eq!(3, read1.pos());

    let read2 = by_name(b"read2");
    assert_eq!("4M", read2.cigar().to_string());
    assert_eq!(3, read2.pos());
    assert_eq!(b"CAGT".to_vec(), read2.seq().as_bytes());

    assert!(by_name(b"read3").is_unmapped());
    assert_eq!("1M1D4M", by_name(b"read4").cigar().to_string());
}
