//! # Shifting indels to the left
//!
//! Every indel is moved as far left as it can go without changing the aligned bases, but
//! never past the right reference edge of the indel before it. Indels move in two phases:
//! first by whole repeat units, then one base at a time by exchanging the base to their left
//! with their last base.
//!
//! ```text
//! GTGTGACGTGT           GTGTGACGTGT
//! GTGTG-----T   ---->   GT-----GTGT
//! ```
use log::trace;

use crate::{indel::Indel, utils};

/// Left-shift all `indels` (sorted by position) against the `query` and the reference window
/// `reference`. Indels are processed from left to right.
pub fn left_shift_indels(indels: &mut [Indel], query: &[u8], reference: &[u8]) {
    for idx in 0..indels.len() {
        let boundary = match idx {
            0 => 0,
            _ => indels[idx - 1].ref_end(),
        };
        let indel = &mut indels[idx];
        shift_by_repeat_units(indel, boundary, query, reference);
        shift_by_exchange(indel, boundary, query, reference);
    }
}

/// Shift `indel` left in steps of each divisor of its length, smallest first, as long as the
/// indel sequence is found at the shifted position in both the reference and the query.
fn shift_by_repeat_units(indel: &mut Indel, boundary: usize, query: &[u8], reference: &[u8]) {
    let len = indel.length;
    for step in (1..=len).filter(|step| len % step == 0) {
        while can_shift_by(indel, step, boundary, query, reference) {
            trace!("{indel} shifting {step}bp left");
            indel.position -= step;
            indel.read_position -= step;
        }
    }
}

fn can_shift_by(
    indel: &Indel,
    step: usize,
    boundary: usize,
    query: &[u8],
    reference: &[u8],
) -> bool {
    let (Some(pos), Some(read_pos)) = (
        indel.position.checked_sub(step),
        indel.read_position.checked_sub(step),
    ) else {
        return false;
    };

    pos >= boundary
        && utils::window(reference, pos, indel.length) == indel.sequence.as_slice()
        && utils::window(query, read_pos, indel.length) == indel.sequence.as_slice()
}

/// Shift `indel` left one base at a time while the bases directly left of it, in both the
/// reference and the query, equal its last base. The indel sequence rotates along.
fn shift_by_exchange(indel: &mut Indel, boundary: usize, query: &[u8], reference: &[u8]) {
    while indel.position > boundary && indel.read_position > 0 {
        let Some(&last) = indel.sequence.last() else {
            return;
        };
        if reference.get(indel.position - 1) != Some(&last)
            || query.get(indel.read_position - 1) != Some(&last)
        {
            return;
        }
        trace!("{indel} exchanging bases 1bp left");
        indel.sequence = utils::rotate_right(&indel.sequence);
        indel.position -= 1;
        indel.read_position -= 1;
    }
}
