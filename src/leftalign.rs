//! # Left-aligning indels
//!
//! Attempts to left-realign all the indels represented by an alignment CIGAR. Indels are shifted
//! as far left as they can go without introducing mismatches, neighbouring indels of the same
//! kind are brought together and merged, and deletions at the edges of the read are trimmed to
//! their most parsimonious size.
//!
//! One call to [`left_align`] performs a single pass. Merging indels can open up new shifts, so
//! [`stably_left_align`] repeats passes until the CIGAR stops changing or the iteration budget
//! runs out.
pub mod boundary;
pub mod parsimony;
pub mod reconstruct;
pub mod shift;

use anyhow::Result;
use log::{debug, trace, warn};
use rust_htslib::bam::record::Cigar;

use crate::{
    error::LeftAlignError,
    indel,
    utils::{
        self,
        cigar::{join_cigar, parse_cigar},
    },
};

/// Default number of extra passes [`stably_left_align`] may take to reach a stable CIGAR.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeftAlignConfig {
    pub max_iterations: usize,
}

impl Default for LeftAlignConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The last pass left the CIGAR unchanged.
    Stable,
    /// The iteration budget ran out while the CIGAR was still changing.
    Exhausted,
}

/// Outcome of [`stably_left_align`]. `cigar` and `offset` hold the last computed alignment, which
/// is only guaranteed to be canonical if `status` is [`Convergence::Stable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Realignment {
    pub cigar: String,
    pub offset: usize,
    pub changed: bool,
    pub status: Convergence,
    /// Number of passes that were run, including the first one.
    pub passes: usize,
}

impl Realignment {
    pub fn is_stable(&self) -> bool {
        matches!(self.status, Convergence::Stable)
    }
    /// Turn an exhausted realignment into a [`LeftAlignError::ExhaustedIterations`] error.
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            Convergence::Stable => Ok(self),
            Convergence::Exhausted => Err(LeftAlignError::ExhaustedIterations {
                iterations: self.passes,
            }
            .into()),
        }
    }
}

/// Run one left-alignment pass over `cigar`, the alignment of `query` against `reference`
/// starting at `offset`. `cigar` and `offset` are updated in place.
/// Returns `true` if the pass changed the CIGAR.
pub fn left_align(
    query: &[u8],
    cigar: &mut String,
    reference: &[u8],
    offset: &mut usize,
) -> Result<bool> {
    let window = reference
        .get(*offset..)
        .ok_or_else(|| LeftAlignError::SequenceTooShort {
            cigar: cigar.clone(),
            sequence: "reference",
        })?;

    let ops = parse_cigar(cigar)?;
    let mut extracted = indel::extract_indels(&ops, query, window)?;
    if extracted.indels.is_empty() {
        trace!("no indels in {cigar}");
        return Ok(false);
    }

    shift::left_shift_indels(&mut extracted.indels, query, window);
    parsimony::bridge_neighbouring_indels(&mut extracted.indels, query, window);
    let trimmed = boundary::trim_boundary_deletions(&mut extracted, query, window);
    let reconstruction = reconstruct::reconstruct_cigar(&extracted)?;

    let realigned = join_cigar(&reconstruction.cigar);
    *offset += trimmed + reconstruction.offset_shift;
    trace!("{cigar} -> {realigned} (offset {offset})");

    if realigned == *cigar {
        Ok(false)
    } else {
        *cigar = realigned;
        Ok(true)
    }
}

/// Left-align `cigar` repeatedly until a pass no longer changes it, or until
/// `config.max_iterations` additional passes have been run.
pub fn stably_left_align(
    query: &[u8],
    cigar: &str,
    reference: &[u8],
    offset: usize,
    config: &LeftAlignConfig,
) -> Result<Realignment> {
    let mut realigned = cigar.to_owned();
    let mut new_offset = offset;
    let mut passes = 1;

    if !left_align(query, &mut realigned, reference, &mut new_offset)? {
        trace!("did not realign {cigar}");
        return Ok(Realignment {
            changed: new_offset != offset,
            cigar: realigned,
            offset: new_offset,
            status: Convergence::Stable,
            passes,
        });
    }

    let mut remaining = config.max_iterations;
    let status = loop {
        if remaining == 0 {
            warn!("{cigar} did not stabilize after {passes} passes, last result {realigned}");
            break Convergence::Exhausted;
        }
        remaining -= 1;
        passes += 1;
        debug!("realigning {realigned}, pass {passes}");
        if !left_align(query, &mut realigned, reference, &mut new_offset)? {
            break Convergence::Stable;
        }
    };

    Ok(Realignment {
        changed: realigned != cigar || new_offset != offset,
        cigar: realigned,
        offset: new_offset,
        status,
        passes,
    })
}

/// Count the positions inside match operations where `query` and `reference` differ.
/// `reference` must start at the first aligned reference base.
pub fn count_mismatches(query: &[u8], cigar: &str, reference: &[u8]) -> Result<usize> {
    let ops = parse_cigar(cigar)?;
    let too_short = |sequence: &'static str| LeftAlignError::SequenceTooShort {
        cigar: cigar.to_owned(),
        sequence,
    };

    let mut mismatches = 0;
    let mut sp = 0;
    let mut rp = 0;
    for op in &ops {
        let len = op.len() as usize;
        match op {
            Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => {
                let ref_bases = utils::window(reference, sp, len);
                let read_bases = utils::window(query, rp, len);
                if ref_bases.len() < len {
                    return Err(too_short("reference").into());
                }
                if read_bases.len() < len {
                    return Err(too_short("query").into());
                }
                mismatches += ref_bases
                    .iter()
                    .zip(read_bases)
                    .filter(|(r, q)| r != q)
                    .count();
                sp += len;
                rp += len;
            }
            Cigar::Del(_) | Cigar::RefSkip(_) => sp += len,
            Cigar::Ins(_) | Cigar::SoftClip(_) => rp += len,
            Cigar::HardClip(_) | Cigar::Pad(_) => {}
        }
    }

    Ok(mismatches)
}
