//! # Realigning reads in SAM/BAM files
//!
//! Records are read in chunks. The reference sequence of every contig touched by a chunk is
//! fetched from an indexed FASTA file, then the records of the chunk are realigned in parallel
//! and written to a BAM file in their original order. Records whose CIGAR changes get the new
//! CIGAR and alignment start, everything else is written back untouched.
use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use log::{debug, info, trace};
use rayon::prelude::*;
use rust_htslib::{
    bam::{
        self,
        record::{Cigar, CigarString},
        HeaderView, Read, Record,
    },
    faidx,
};

use crate::{
    leftalign::{self, LeftAlignConfig, Realignment},
    utils::cigar::{join_cigar, parse_cigar, reference_span},
    RecordStatus, RunSummary,
};

/// Contig sequences fetched from an indexed FASTA file, keyed by target id.
pub struct ReferenceGenome {
    fasta: faidx::Reader,
    contigs: HashMap<i32, Vec<u8>>,
}

impl ReferenceGenome {
    /// Open the FASTA file at `path`. The index is built next to it if it does not exist.
    pub fn from_path(path: &str) -> Result<Self> {
        let fasta = faidx::Reader::from_path(path)
            .with_context(|| format!("Could not open reference file {path}"))?;
        Ok(Self {
            fasta,
            contigs: HashMap::new(),
        })
    }

    /// Make sure exactly the contigs in `tids` are loaded.
    pub fn load(&mut self, header: &HeaderView, tids: &HashSet<i32>) -> Result<()> {
        self.contigs.retain(|tid, _| tids.contains(tid));
        for &tid in tids {
            if self.contigs.contains_key(&tid) {
                continue;
            }
            let sequence = self.fetch_contig(header, tid)?;
            self.contigs.insert(tid, sequence);
        }
        Ok(())
    }

    pub fn contigs(&self) -> &HashMap<i32, Vec<u8>> {
        &self.contigs
    }

    fn fetch_contig(&self, header: &HeaderView, tid: i32) -> Result<Vec<u8>> {
        let utid = u32::try_from(tid).with_context(|| format!("Invalid target id {tid}"))?;
        let name = std::str::from_utf8(header.tid2name(utid))
            .with_context(|| format!("Contig name for target {tid} is not valid UTF-8"))?;
        let len = header
            .target_len(utid)
            .with_context(|| format!("No length for contig {name} in alignment header"))?;
        if len == 0 {
            return Ok(Vec::new());
        }

        debug!("Fetching reference sequence for {name} ({len}bp)");
        let sequence = self
            .fasta
            .fetch_seq_string(name, 0, len as usize - 1)
            .with_context(|| format!("Could not fetch {name} from reference"))?;
        Ok(sequence.into_bytes().to_ascii_uppercase())
    }
}

/// Realign all records in the SAM/BAM file at `alignment` against the FASTA file at
/// `reference` and write them to the BAM file at `output`.
pub fn realign_bam(
    alignment: &str,
    reference: &str,
    output: &str,
    config: &LeftAlignConfig,
    chunksize: usize,
) -> Result<RunSummary> {
    let mut reader = bam::Reader::from_path(alignment)
        .with_context(|| format!("Could not open alignment file {alignment}"))?;
    let header_view = reader.header().clone();
    let header = bam::Header::from_template(&header_view);
    let mut writer = bam::Writer::from_path(output, &header, bam::Format::Bam)
        .with_context(|| format!("Could not create output file {output}"))?;
    let mut genome = ReferenceGenome::from_path(reference)?;

    let chunksize = chunksize.max(1);
    let mut summary = RunSummary::default();
    let mut chunk: Vec<Record> = Vec::with_capacity(chunksize);
    for result in reader.records() {
        let record = result.with_context(|| format!("Encountered faulty record in {alignment}"))?;
        chunk.push(record);
        if chunk.len() == chunksize {
            summary.merge(&realign_chunk(&mut chunk, &header_view, &mut genome, config)?);
            write_records(&mut writer, &chunk, output)?;
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        summary.merge(&realign_chunk(&mut chunk, &header_view, &mut genome, config)?);
        write_records(&mut writer, &chunk, output)?;
    }

    info!(
        "Realigned {} of {} records from {alignment}",
        summary.realigned, summary.total
    );
    Ok(summary)
}

fn write_records(writer: &mut bam::Writer, records: &[Record], output: &str) -> Result<()> {
    for record in records {
        writer
            .write(record)
            .with_context(|| format!("Could not write record to {output}"))?;
    }
    Ok(())
}

/// Load the contigs `records` align to and realign the records in parallel.
fn realign_chunk(
    records: &mut [Record],
    header: &HeaderView,
    genome: &mut ReferenceGenome,
    config: &LeftAlignConfig,
) -> Result<RunSummary> {
    let tids: HashSet<i32> = records
        .iter()
        .filter(|record| !record.is_unmapped() && record.tid() >= 0)
        .map(|record| record.tid())
        .collect();
    genome.load(header, &tids)?;
    let contigs = genome.contigs();

    let per_task = records.len() / rayon::current_num_threads() + 1;
    let summary = records
        .par_chunks_mut(per_task)
        .map(|records| {
            let tidx = rayon::current_thread_index().unwrap_or(0);
            trace!("Launching thread {tidx}");
            let mut summary = RunSummary::default();
            for record in records {
                summary.add(realign_record(record, contigs, config));
            }
            trace!("Finished on thread {tidx}");
            summary
        })
        .reduce(RunSummary::default, |mut total, part| {
            total.merge(&part);
            total
        });

    Ok(summary)
}

/// Realign a single record in place. Unmapped and spliced records are skipped. A record that
/// cannot be realigned is logged and left untouched.
pub fn realign_record(
    record: &mut Record,
    contigs: &HashMap<i32, Vec<u8>>,
    config: &LeftAlignConfig,
) -> RecordStatus {
    let qname = String::from_utf8_lossy(record.qname()).into_owned();
    if record.is_unmapped() {
        return RecordStatus::Skipped;
    }

    let ops: Vec<Cigar> = record.cigar().iter().cloned().collect();
    if ops.is_empty() {
        debug!("Record {qname} has no CIGAR, skipping");
        return RecordStatus::Skipped;
    }
    if ops.iter().any(|op| matches!(op, Cigar::RefSkip(_))) {
        debug!("Record {qname} is spliced, skipping");
        return RecordStatus::Skipped;
    }
    let Ok(offset) = usize::try_from(record.pos()) else {
        debug!("Record {qname} has no alignment start, skipping");
        return RecordStatus::Skipped;
    };
    let Some(contig) = contigs.get(&record.tid()) else {
        debug!("No reference sequence for record {qname}, skipping");
        return RecordStatus::Failed;
    };

    let query = record.seq().as_bytes();
    let cigar = join_cigar(&ops);
    let realignment =
        match leftalign::stably_left_align(&query, &cigar, contig, offset, config) {
            Ok(realignment) => realignment,
            Err(e) => {
                debug!("Could not realign {qname}, skipping: {e:?}");
                return RecordStatus::Failed;
            }
        };

    if realignment.changed {
        if let Err(e) = update_record(record, &realignment) {
            debug!("Could not update {qname}, skipping: {e:?}");
            return RecordStatus::Failed;
        }
        trace!("{qname}: {cigar} -> {}", realignment.cigar);
    }
    RecordStatus::from(&realignment)
}

/// Tags describing the alignment itself, which no longer hold once the CIGAR changes.
const STALE_TAGS: [&[u8]; 2] = [b"MD", b"NM"];

fn update_record(record: &mut Record, realignment: &Realignment) -> Result<()> {
    let ops = parse_cigar(&realignment.cigar)?;
    let pos = i64::try_from(realignment.offset)
        .with_context(|| format!("Alignment start {} is out of range", realignment.offset))?;
    let end = pos + reference_span(&ops) as i64;
    let cigar = CigarString(ops);

    let qname = record.qname().to_owned();
    let seq = record.seq().as_bytes();
    let qual = record.qual().to_owned();
    record.set(&qname, Some(&cigar), &seq, &qual);
    record.set_pos(pos);
    record.set_bin(reg2bin(pos, end));

    for tag in STALE_TAGS {
        if record.remove_aux(tag).is_ok() {
            debug!(
                "Removed stale {} tag from {}",
                String::from_utf8_lossy(tag),
                String::from_utf8_lossy(&qname)
            );
        }
    }
    Ok(())
}

/// BAI bin of the 0-based, half-open interval `[beg, end)`. An empty interval gets the bin of
/// its first base.
fn reg2bin(beg: i64, end: i64) -> u16 {
    let end = end.max(beg + 1) - 1;
    let bin = if beg >> 14 == end >> 14 {
        ((1 << 15) - 1) / 7 + (beg >> 14)
    } else if beg >> 17 == end >> 17 {
        ((1 << 12) - 1) / 7 + (beg >> 17)
    } else if beg >> 20 == end >> 20 {
        ((1 << 9) - 1) / 7 + (beg >> 20)
    } else if beg >> 23 == end >> 23 {
        ((1 << 6) - 1) / 7 + (beg >> 23)
    } else if beg >> 26 == end >> 26 {
        ((1 << 3) - 1) / 7 + (beg >> 26)
    } else {
        0
    };
    // positions past 2^29 only occur with CSI indices, where the bin is ignored
    u16::try_from(bin).unwrap_or(0)
}
