//! # Bringing together neighbouring indels
//!
//! After left-shifting, two indels separated only by repeat sequence can still be represented
//! as a single, longer indel. This pass moves the left indel of such a pair to the right until it
//! abuts its neighbour, so that [`reconstruct`](super::reconstruct) fuses them into one CIGAR
//! operation. Lengths are never changed and indels are never removed here.
use log::trace;

use crate::{
    indel::{Indel, IndelKind},
    utils,
};

/// Walk over consecutive pairs of `indels` from left to right and move the left indel of each
/// same-kind pair rightwards when it can be made to abut the right one without changing the
/// aligned bases.
pub fn bridge_neighbouring_indels(indels: &mut [Indel], query: &[u8], reference: &[u8]) {
    for idx in 1..indels.len() {
        let (left, right) = indels.split_at_mut(idx);
        let previous = &mut left[idx - 1];
        let current = &right[0];

        // only indels of the same kind fuse
        if previous.kind != current.kind {
            continue;
        }
        if !(previous.ref_end() < current.position && previous.read_position < current.read_position)
        {
            continue;
        }

        if previous.is_homopolymer() {
            bridge_homopolymer(previous, current, query, reference);
        } else {
            bridge_tandem_repeat(previous, current, query, reference);
        }
    }
}

/// Slide a homopolymer indel right up to `current` if everything in between, in both the
/// reference and the query, is made of the same base.
fn bridge_homopolymer(previous: &mut Indel, current: &Indel, query: &[u8], reference: &[u8]) {
    let base = previous.sequence[0];
    let gap = current.position - previous.ref_end();
    let ref_between = utils::window(reference, previous.ref_end(), gap);
    let read_between = utils::window(query, previous.read_end(), gap);

    if ref_between.len() == gap
        && read_between.len() == gap
        && ref_between.iter().all(|b| *b == base)
        && read_between.iter().all(|b| *b == base)
    {
        let new_position = current.position - (previous.ref_end() - previous.position);
        trace!("moving homopolymer {previous} right to {new_position}");
        previous.read_position += new_position - previous.position;
        previous.position = new_position;
    }
}

/// Walk `previous` right by whole repeat units, then base by base, and keep the new placement
/// only if it ends up directly against `current`.
fn bridge_tandem_repeat(previous: &mut Indel, current: &Indel, query: &[u8], reference: &[u8]) {
    let len = previous.length;
    if len == 0 {
        return;
    }
    let kind = previous.kind;
    let stays_left = |pos: usize, read_pos: usize| {
        let (ref_end, read_end) = match kind {
            IndelKind::Insertion => (pos, read_pos + len),
            IndelKind::Deletion => (pos + len, read_pos),
        };
        ref_end <= current.position && read_end <= current.read_position
    };

    let mut pos = previous.position;
    let mut read_pos = previous.read_position;
    let mut seq = previous.sequence.clone();

    // whole repeat units
    loop {
        let (ref_next, read_next) = match kind {
            IndelKind::Insertion => (
                utils::window(reference, pos, len),
                utils::window(query, read_pos + len, len),
            ),
            IndelKind::Deletion => (
                utils::window(reference, pos + len, len),
                utils::window(query, read_pos, len),
            ),
        };
        if ref_next != seq.as_slice()
            || read_next != seq.as_slice()
            || !stays_left(pos + len, read_pos + len)
        {
            break;
        }
        pos += len;
        read_pos += len;
    }
    if pos == previous.position {
        return;
    }

    // wobble single bases
    loop {
        let first = seq[0];
        let (ref_base, read_base) = match kind {
            IndelKind::Insertion => (reference.get(pos), query.get(read_pos + len)),
            IndelKind::Deletion => (reference.get(pos + len), query.get(read_pos)),
        };
        if ref_base != Some(&first) || read_base != Some(&first) || !stays_left(pos + 1, read_pos + 1)
        {
            break;
        }
        seq = utils::rotate_left(&seq);
        pos += 1;
        read_pos += 1;
    }

    let lands = match kind {
        IndelKind::Insertion => pos == current.position,
        IndelKind::Deletion => pos + len == current.position,
    };
    if lands {
        trace!("right-merging tandem repeat: moving {previous} right to {pos}");
        previous.position = pos;
        previous.read_position = read_pos;
        previous.sequence = seq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homopolymer_deletions_are_brought_together() {
        // G A A A A A T with one A deleted at 1 and another at 4
        let reference = b"GAAAAAT";
        let query = b"GAAAT";
        let mut indels = vec![
            Indel::new(IndelKind::Deletion, 1, 1, b"A".to_vec()),
            Indel::new(IndelKind::Deletion, 4, 3, b"A".to_vec()),
        ];
        bridge_neighbouring_indels(&mut indels, query, reference);

        assert_eq!(3, indels[0].position);
        assert_eq!(3, indels[0].read_position);
        assert_eq!(indels[0].ref_end(), indels[1].position);
    }

    #[test]
    fn homopolymer_insertions_are_brought_together() {
        let reference = b"GAAT";
        let query = b"GAAAAAT";
        let mut indels = vec![
            Indel::new(IndelKind::Insertion, 1, 1, b"AA".to_vec()),
            Indel::new(IndelKind::Insertion, 3, 5, b"A".to_vec()),
        ];
        bridge_neighbouring_indels(&mut indels, query, reference);

        assert_eq!(3, indels[0].position);
        assert_eq!(3, indels[0].read_position);
    }

    #[test]
    fn differing_bases_block_homopolymer_bridge() {
        let reference = b"GAACAAT";
        let query = b"GACAT";
        let mut indels = vec![
            Indel::new(IndelKind::Deletion, 1, 1, b"A".to_vec()),
            Indel::new(IndelKind::Deletion, 4, 3, b"A".to_vec()),
        ];
        let before = indels.clone();
        bridge_neighbouring_indels(&mut indels, query, reference);

        assert_eq!(before, indels);
    }

    #[test]
    fn tandem_deletions_are_brought_together() {
        // CA deleted twice from a CA repeat, one unit of CA in between
        let reference = b"TCACACAG";
        let query = b"TCAG";
        let mut indels = vec![
            Indel::new(IndelKind::Deletion, 1, 1, b"CA".to_vec()),
            Indel::new(IndelKind::Deletion, 5, 3, b"CA".to_vec()),
        ];
        bridge_neighbouring_indels(&mut indels, query, reference);

        assert_eq!(3, indels[0].position);
        assert_eq!(3, indels[0].read_position);
        assert_eq!(indels[0].ref_end(), indels[1].position);
        assert_eq!(b"CA".to_vec(), indels[0].sequence);
    }

    #[test]
    fn opposite_kinds_are_not_brought_together() {
        // the deletion could walk right up to the insertion, but they would never fuse
        let reference = b"TCACAGGT";
        let query = b"TCATTGGT";
        let mut indels = vec![
            Indel::new(IndelKind::Deletion, 1, 1, b"CA".to_vec()),
            Indel::new(IndelKind::Insertion, 5, 3, b"TT".to_vec()),
        ];
        let before = indels.clone();
        bridge_neighbouring_indels(&mut indels, query, reference);

        assert_eq!(before, indels);
    }

    #[test]
    fn tandem_walk_that_does_not_land_is_discarded() {
        let reference = b"TCACACAGGTCA";
        let query = b"TCACAGGCA";
        let mut indels = vec![
            Indel::new(IndelKind::Deletion, 1, 1, b"CA".to_vec()),
            Indel::new(IndelKind::Deletion, 9, 7, b"T".to_vec()),
        ];
        let before = indels.clone();
        bridge_neighbouring_indels(&mut indels, query, reference);

        assert_eq!(before, indels);
    }
}
