//! # Tab separated alignment records
//!
//! Input rows hold `reference query cigar offset`, optionally preceded by a record name.
//! Rows without a name are named after their line number. Lines starting with `#` are skipped.
//! Output rows hold `name cigar offset status`.
use std::io::Write;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};

use crate::RecordStatus;

/// One alignment to realign. `offset` is the 0-based position in `reference` where the
/// alignment described by `cigar` starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlignmentRecord {
    pub name: String,
    pub reference: String,
    pub query: String,
    pub cigar: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealignmentRecord {
    pub name: String,
    pub cigar: String,
    pub offset: usize,
    pub status: RecordStatus,
}

/// Read all alignment records from the tab separated file at `path`.
pub fn read_alignments(path: &str) -> Result<Vec<AlignmentRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Could not read alignment file {path}"))?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read record in {path}"))?;
        let record = match row.len() {
            4 => {
                let (reference, query, cigar, offset): (String, String, String, usize) = row
                    .deserialize(None)
                    .with_context(|| format!("Failed to deserialize record {} in {path}", idx + 1))?;
                AlignmentRecord {
                    name: format!("record_{}", idx + 1),
                    reference,
                    query,
                    cigar,
                    offset,
                }
            }
            5 => row
                .deserialize(None)
                .with_context(|| format!("Failed to deserialize record {} in {path}", idx + 1))?,
            n => bail!("Record {} in {path} has {n} columns, expected 4 or 5", idx + 1),
        };
        records.push(record);
    }

    info!("Read {} alignments from {path}", records.len());
    Ok(records)
}

/// Write `records` to `writer` as tab separated rows without a header.
pub fn write_realignments<W: Write>(records: &[RealignmentRecord], writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(writer);
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Could not write record {}", record.name))?;
    }
    writer.flush().context("Could not flush realigned records")?;
    Ok(())
}
