//! # Structs to represent indels in an alignment
//!
//! [`Indel`] is a single insertion or deletion read off a CIGAR, positioned both on the
//! reference and on the query. [`extract_indels`] walks a CIGAR against the two sequences
//! and collects the indels together with the soft clipped ends of the query.
use std::fmt;

use anyhow::Result;
use rust_htslib::bam::record::Cigar;

use crate::{
    error::LeftAlignError,
    utils::{self, cigar},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndelKind {
    Insertion,
    Deletion,
}

/// `Indel` represents one insertion or deletion.
/// `position` is the 0-based offset into the reference window at which the indel occurs,
/// `read_position` the 0-based offset into the query. `sequence` holds the inserted bases
/// (taken from the query) or the deleted bases (taken from the reference), so its length
/// always equals `length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indel {
    pub kind: IndelKind,
    pub length: usize,
    pub position: usize,
    pub read_position: usize,
    pub sequence: Vec<u8>,
}

impl Indel {
    pub fn new(
        kind: IndelKind,
        position: usize,
        read_position: usize,
        sequence: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            length: sequence.len(),
            position,
            read_position,
            sequence,
        }
    }
    pub fn is_insertion(&self) -> bool {
        matches!(self.kind, IndelKind::Insertion)
    }
    pub fn is_homopolymer(&self) -> bool {
        utils::is_homopolymer(&self.sequence)
    }
    /// First reference position after the indel. Insertions do not consume reference bases.
    pub fn ref_end(&self) -> usize {
        match self.kind {
            IndelKind::Insertion => self.position,
            IndelKind::Deletion => self.position + self.length,
        }
    }
    /// First query position after the indel. Deletions do not consume query bases.
    pub fn read_end(&self) -> usize {
        match self.kind {
            IndelKind::Insertion => self.read_position + self.length,
            IndelKind::Deletion => self.read_position,
        }
    }
    /// The CIGAR operation for this indel.
    pub fn as_cigar(&self) -> Cigar {
        match self.kind {
            IndelKind::Insertion => Cigar::Ins(self.length as u32),
            IndelKind::Deletion => Cigar::Del(self.length as u32),
        }
    }
}

impl fmt::Display for Indel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}:{}:{}",
            self.length,
            if self.is_insertion() { 'I' } else { 'D' },
            self.position,
            self.read_position,
            String::from_utf8_lossy(&self.sequence)
        )
    }
}

/// Everything [`extract_indels`] reads off one CIGAR.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedIndels {
    pub indels: Vec<Indel>,
    pub soft_begin: Vec<u8>,
    pub soft_end: Vec<u8>,
    /// Hard clipped bases before and after the alignment. They take no part in realignment.
    pub hard_begin: u32,
    pub hard_end: u32,
    /// Number of reference bases the CIGAR spans.
    pub aligned_length: usize,
}

/// Walk `cigar` over `query` and the reference window `reference`, collecting every insertion
/// and deletion in CIGAR order together with the soft clipped prefix and suffix of the query.
pub fn extract_indels(cigar: &[Cigar], query: &[u8], reference: &[u8]) -> Result<ExtractedIndels> {
    let too_short = |sequence: &'static str| LeftAlignError::SequenceTooShort {
        cigar: cigar::join_cigar(cigar),
        sequence,
    };

    let mut extracted = ExtractedIndels::default();
    let mut sp = 0; // reference position
    let mut rp = 0; // read position

    for op in cigar {
        let len = op.len() as usize;
        match op {
            Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => {
                sp += len;
                rp += len;
            }
            Cigar::Del(_) => {
                let deleted = utils::window(reference, sp, len);
                if deleted.len() < len {
                    return Err(too_short("reference").into());
                }
                extracted
                    .indels
                    .push(Indel::new(IndelKind::Deletion, sp, rp, deleted.to_vec()));
                sp += len;
            }
            Cigar::Ins(_) => {
                let inserted = utils::window(query, rp, len);
                if inserted.len() < len {
                    return Err(too_short("query").into());
                }
                extracted
                    .indels
                    .push(Indel::new(IndelKind::Insertion, sp, rp, inserted.to_vec()));
                rp += len;
            }
            Cigar::SoftClip(_) => {
                if len > query.len() {
                    return Err(too_short("query").into());
                }
                if rp == 0 {
                    extracted.soft_begin = query[..len].to_vec();
                } else {
                    extracted.soft_end = query[query.len() - len..].to_vec();
                }
                rp += len;
            }
            Cigar::RefSkip(_) => sp += len,
            Cigar::HardClip(_) if rp == 0 && sp == 0 => extracted.hard_begin += len as u32,
            Cigar::HardClip(_) => extracted.hard_end += len as u32,
            Cigar::Pad(_) => {}
        }
    }
    if sp > reference.len() {
        return Err(too_short("reference").into());
    }
    if rp > query.len() {
        return Err(too_short("query").into());
    }
    extracted.aligned_length = sp;

    Ok(extracted)
}
