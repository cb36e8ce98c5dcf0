//! # Root for utility functions in `leftalign`
//!
//! This top-level module contains small sequence helpers shared by the realignment passes,
//! the sub-modules contain functions related to specific functionality.
pub mod cigar;

/// Return at most `len` bytes of `seq` starting at `start`.
/// Out-of-range requests are clamped to the end of `seq`, so the returned slice
/// can be shorter than `len` (or empty).
///
/// # Examples
///
/// ```
/// use leftalign::utils::window;
///
/// assert_eq!(b"CG", window(b"ACGT", 1, 2));
/// assert_eq!(b"T", window(b"ACGT", 3, 5));
/// assert!(window(b"ACGT", 9, 1).is_empty());
/// ```
pub fn window(seq: &[u8], start: usize, len: usize) -> &[u8] {
    let start = start.min(seq.len());
    let end = start.saturating_add(len).min(seq.len());
    &seq[start..end]
}

/// Check that `seq` is non-empty and consists of a single repeated byte.
///
/// # Examples
///
/// ```
/// use leftalign::utils::is_homopolymer;
///
/// assert!(is_homopolymer(b"AAAA"));
/// assert!(!is_homopolymer(b"AACA"));
/// assert!(!is_homopolymer(b""));
/// ```
pub fn is_homopolymer(seq: &[u8]) -> bool {
    match seq.first() {
        Some(first) => seq.iter().all(|b| b == first),
        None => false,
    }
}

/// Move the last byte of `seq` to the front: `ACG` becomes `GAC`.
pub fn rotate_right(seq: &[u8]) -> Vec<u8> {
    let mut rotated = seq.to_vec();
    rotated.rotate_right(1.min(seq.len()));
    rotated
}

/// Move the first byte of `seq` to the back: `ACG` becomes `CGA`.
pub fn rotate_left(seq: &[u8]) -> Vec<u8> {
    let mut rotated = seq.to_vec();
    rotated.rotate_left(1.min(seq.len()));
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations() {
        assert_eq!(b"GAC".to_vec(), rotate_right(b"ACG"));
        assert_eq!(b"CGA".to_vec(), rotate_left(b"ACG"));
        assert!(rotate_right(b"").is_empty());
        assert_eq!(b"ACG".to_vec(), rotate_left(&rotate_right(b"ACG")));
    }

    #[test]
    fn window_is_exact_inside_bounds() {
        let seq = b"GAAAAT";
        assert_eq!(b"AAAA", window(seq, 1, 4));
        assert_eq!(b"GAAAAT", window(seq, 0, 6));
        assert_eq!(b"", window(seq, 6, 1));
    }
}
