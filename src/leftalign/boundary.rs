//! # Trimming deletions at the edges of the read
//!
//! A deletion close to the start or end of a read can be explained by a shorter deletion when the
//! flanking read sequence also matches the reference a few bases further in. We take the
//! parsimonious explanation, e.g.
//!
//! ```text
//! AGAAAGAAAGAAAAAGAAAAAGAACCAAGAAGAAAA
//! AGAAAG------AAAGAAAAAGAACCAAGAAGAAAA
//!
//!     has no information which distinguishes it from:
//!
//! AGAAAGAAAAAGAAAAAGAACCAAGAAGAAAA
//! AGAAAG--AAAGAAAAAGAACCAAGAAGAAAA
//! ```
//!
//! Only deletions are trimmed. Soft clipped bases next to a trimmed deletion are matched to the
//! reference again and the clip is removed.
use log::trace;

use crate::{indel::ExtractedIndels, utils};

/// Trim the first and, if there are at least two indels, the last indel. Returns the number of
/// bases the start of the alignment moved to the right on the reference, which the caller adds
/// to its offset.
pub fn trim_boundary_deletions(extracted: &mut ExtractedIndels, query: &[u8], reference: &[u8]) -> usize {
    let shift = trim_leading_deletion(extracted, query, reference);
    let reference = reference.get(shift..).unwrap_or_default();
    trim_trailing_deletion(extracted, query, reference);
    shift
}

/// Shrink the first indel if it is a deletion whose preceding read bases also match the
/// reference further to the right.
fn trim_leading_deletion(extracted: &mut ExtractedIndels, query: &[u8], reference: &[u8]) -> usize {
    let Some(first) = extracted.indels.first() else {
        return 0;
    };
    if first.is_insertion() {
        return 0;
    }

    let flank_len = first.read_position;
    let Some(flank) = query.get(..flank_len) else {
        return 0;
    };
    let deletion_end = first.ref_end();
    // the trimmed deletion starts at `trim + flank_len` and still ends at `deletion_end`
    let Some(max_trim) = deletion_end.checked_sub(flank_len) else {
        return 0;
    };
    let Some(trim) = (0..=max_trim.min(first.length))
        .rev()
        .find(|&trim| utils::window(reference, trim, flank_len) == flank)
    else {
        return 0;
    };

    let new_length = deletion_end - flank_len - trim;
    if new_length > first.length || (trim == 0 && new_length == first.length) {
        return 0;
    }

    let first = &mut extracted.indels[0];
    trace!("trimming leading {first} to {new_length}bp, alignment start moves {trim}bp");
    first.sequence = first.sequence[first.length - new_length..].to_vec();
    first.length = new_length;
    first.position = flank_len;
    for indel in extracted.indels.iter_mut().skip(1) {
        indel.position -= trim;
    }
    extracted.aligned_length -= trim;
    extracted.soft_begin.clear();

    trim
}

/// Shrink the last indel if it is a deletion whose following read bases also match the
/// reference further to the left. The start of the alignment is unaffected.
fn trim_trailing_deletion(extracted: &mut ExtractedIndels, query: &[u8], reference: &[u8]) {
    if extracted.indels.len() < 2 {
        return;
    }
    let Some(last) = extracted.indels.last() else {
        return;
    };
    if last.is_insertion() {
        return;
    }

    let Some(flank) = query.get(last.read_position..) else {
        return;
    };
    let flank_len = flank.len();
    // the trimmed deletion starts at `last.position` and ends where the flank starts
    let Some(max_trim) = extracted
        .aligned_length
        .checked_sub(flank_len)
        .and_then(|end| end.checked_sub(last.position))
    else {
        return;
    };
    let aligned_length = extracted.aligned_length;
    let Some(trim) = (0..=max_trim.min(last.length)).rev().find(|&trim| {
        utils::window(reference, aligned_length - flank_len - trim, flank_len) == flank
    }) else {
        return;
    };

    let new_length = aligned_length - flank_len - trim - last.position;
    if new_length > last.length || (trim == 0 && new_length == last.length) {
        return;
    }

    let idx = extracted.indels.len() - 1;
    let last = &mut extracted.indels[idx];
    trace!("trimming trailing {last} to {new_length}bp");
    // the start stays put, so the deletion keeps its leading bases
    last.sequence = last.sequence[..new_length].to_vec();
    last.length = new_length;
    extracted.aligned_length -= trim;
    extracted.soft_end.clear();
}
