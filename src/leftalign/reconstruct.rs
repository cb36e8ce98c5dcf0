//! # Folding realigned indels back into a CIGAR
use anyhow::Result;
use log::trace;
use rust_htslib::bam::record::Cigar;

use crate::{
    error::LeftAlignError,
    indel::{ExtractedIndels, IndelKind},
    utils::cigar::push_fused,
};

/// A CIGAR rebuilt from realigned indels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub cigar: Vec<Cigar>,
    /// Reference bases dropped from the start of the alignment together with a floating
    /// deletion. The caller adds this to its offset.
    pub offset_shift: usize,
}

/// Rebuild the CIGAR for `extracted`. Matches fill the gaps between indels, indels at the same
/// position and of the same kind are fused, and indels that float at the very start of the
/// alignment are dropped (deletions) or turned into soft clips (insertions).
///
/// Fails with [`LeftAlignError::ImpossibleAlignment`] if an indel starts left of the right edge
/// of the indel before it.
pub fn reconstruct_cigar(extracted: &ExtractedIndels) -> Result<Reconstruction> {
    let mut cigar = Vec::new();
    let mut offset_shift = 0;
    let mut aligned_length = extracted.aligned_length;
    let mut lastend = 0;
    let mut emitted = false;

    push_fused(&mut cigar, Cigar::HardClip(extracted.hard_begin));
    push_fused(&mut cigar, Cigar::SoftClip(extracted.soft_begin.len() as u32));

    let indels: Vec<_> = extracted.indels.iter().filter(|i| i.length > 0).collect();
    for (idx, indel) in indels.iter().enumerate() {
        let position = indel.position.checked_sub(offset_shift).ok_or(
            LeftAlignError::ImpossibleAlignment {
                position: indel.position,
                lastend: offset_shift,
            },
        )?;
        let is_final = idx + 1 == indels.len();

        if !emitted {
            if position == 0 {
                // floating indel at the start of the alignment
                trace!("dropping floating {indel}");
                match indel.kind {
                    IndelKind::Insertion => {
                        push_fused(&mut cigar, Cigar::SoftClip(indel.length as u32))
                    }
                    IndelKind::Deletion => {
                        offset_shift += indel.length;
                        aligned_length = aligned_length.saturating_sub(indel.length);
                    }
                }
                continue;
            }
            push_fused(&mut cigar, Cigar::Match(position as u32));
            push_fused(&mut cigar, indel.as_cigar());
            emitted = true;
            lastend = position + ref_len(indel.kind, indel.length);
            continue;
        }

        if position < lastend {
            return Err(LeftAlignError::ImpossibleAlignment { position, lastend }.into());
        }
        push_fused(&mut cigar, Cigar::Match((position - lastend) as u32));
        if is_final && indel.is_insertion() && position == aligned_length {
            // insertion hanging off the end of the alignment
            push_fused(&mut cigar, Cigar::SoftClip(indel.length as u32));
        } else {
            push_fused(&mut cigar, indel.as_cigar());
        }
        lastend = position + ref_len(indel.kind, indel.length);
    }

    if lastend < aligned_length {
        push_fused(&mut cigar, Cigar::Match((aligned_length - lastend) as u32));
    }
    push_fused(&mut cigar, Cigar::SoftClip(extracted.soft_end.len() as u32));
    push_fused(&mut cigar, Cigar::HardClip(extracted.hard_end));

    Ok(Reconstruction {
        cigar,
        offset_shift,
    })
}

fn ref_len(kind: IndelKind, length: usize) -> usize {
    match kind {
        IndelKind::Insertion => 0,
        IndelKind::Deletion => length,
    }
}
