//! # Scanning for tandem repeat units
//!
//! Given a position in a sequence, [`repeat_counts`] reports which short units starting at that
//! position are tandemly repeated to the right, and how many times. Longer units that are only
//! multiples of a shorter repeated unit are left out, so `AAAAAAAA` reports `A` and not `AA`.
use std::collections::BTreeMap;

use log::trace;

use crate::utils;

/// Count consecutive copies of every unit of size `1..=max_size` that starts at `position` in
/// `sequence`. Units that occur only once are dropped. The scan stops as soon as the next copy
/// would reach the last base of `sequence`.
///
/// ```
/// use leftalign::repeat::repeat_counts;
///
/// let counts = repeat_counts(b"ACACACAG", 0, 4);
/// assert_eq!(Some(&3), counts.get("AC"));
/// assert_eq!(1, counts.len());
/// ```
pub fn repeat_counts(sequence: &[u8], position: usize, max_size: usize) -> BTreeMap<String, usize> {
    let mut found: Vec<(&[u8], usize)> = Vec::new();
    if position >= sequence.len() {
        return BTreeMap::new();
    }

    for size in 1..=max_size {
        let unit = utils::window(sequence, position, size);
        let mut j = position;
        let mut steps = 0;
        while j + size < sequence.len() && utils::window(sequence, j, size) == unit {
            j += size;
            steps += 1;
        }
        if steps > 1 {
            trace!("{} repeats {steps} times at {position}", String::from_utf8_lossy(unit));
            found.push((unit, steps));
        }
    }

    let mut counts = BTreeMap::new();
    let mut previous: Option<&[u8]> = None;
    for (unit, steps) in found {
        if previous.is_some_and(|prev| is_concatenation_of(unit, prev)) {
            continue;
        }
        counts.insert(String::from_utf8_lossy(unit).into_owned(), steps);
        previous = Some(unit);
    }

    counts
}

/// True if `unit` is made up of whole copies of `prev` with nothing left over.
fn is_concatenation_of(unit: &[u8], prev: &[u8]) -> bool {
    !prev.is_empty()
        && unit.len() % prev.len() == 0
        && unit.chunks(prev.len()).all(|chunk| chunk == prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dinucleotide_repeat() {
        let counts = repeat_counts(b"ACACACAG", 0, 4);
        assert_eq!(BTreeMap::from([("AC".to_owned(), 3)]), counts);
    }

    #[test]
    fn multiples_of_shorter_unit_are_dropped() {
        let counts = repeat_counts(b"AAAAAAAA", 0, 4);
        assert_eq!(BTreeMap::from([("A".to_owned(), 7)]), counts);
    }

    #[test]
    fn longer_unit_not_made_of_shorter_is_kept() {
        let counts = repeat_counts(b"AATAATAATAATG", 0, 3);
        assert_eq!(Some(&2), counts.get("A"));
        assert_eq!(Some(&4), counts.get("AAT"));
        assert!(!counts.contains_key("AA"));
    }

    #[test]
    fn scan_starts_at_position() {
        let counts = repeat_counts(b"GGTCATCATCATT", 2, 3);
        assert_eq!(Some(&3), counts.get("TCA"));
        assert_eq!(1, counts.len());
    }

    #[test]
    fn single_copies_are_ignored() {
        assert!(repeat_counts(b"ACGTACGT", 0, 3).is_empty());
    }

    #[test]
    fn position_past_end_is_empty() {
        assert!(repeat_counts(b"ACGT", 4, 2).is_empty());
        assert!(repeat_counts(b"", 0, 2).is_empty());
    }

    #[test]
    fn concatenation() {
        assert!(is_concatenation_of(b"ACAC", b"AC"));
        assert!(!is_concatenation_of(b"ACA", b"AC"));
        assert!(!is_concatenation_of(b"AC", b""));
    }
}
