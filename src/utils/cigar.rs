//! # CIGAR Utils
//!
//! Parsing and serializing CIGAR strings, and functions to check which
//! sequence a CIGAR operation advances.
use anyhow::Result;
use rust_htslib::bam::record::Cigar;

use crate::error::LeftAlignError;

/// Check if the provided cigar operation `cigar` advances the
/// position in the reference sequence.
pub fn consumes_ref(cigar: &Cigar) -> bool {
    matches!(
        cigar,
        Cigar::Match(_) | Cigar::Del(_) | Cigar::RefSkip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Check if the provided cigar operation `cigar` advances the
/// position in the query sequence.
pub fn consumes_query(cigar: &Cigar) -> bool {
    matches!(
        cigar,
        Cigar::Match(_) | Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Number of reference bases spanned by `cigar`.
pub fn reference_span(cigar: &[Cigar]) -> usize {
    cigar
        .iter()
        .filter(|op| consumes_ref(op))
        .map(|op| op.len() as usize)
        .sum()
}

/// Number of query bases spanned by `cigar`, soft clips included.
pub fn query_span(cigar: &[Cigar]) -> usize {
    cigar
        .iter()
        .filter(|op| consumes_query(op))
        .map(|op| op.len() as usize)
        .sum()
}

/// Build the operation for CIGAR letter `op` with length `len`.
fn cigar_from_char(op: char, len: u32) -> Option<Cigar> {
    let cigar = match op {
        'M' => Cigar::Match(len),
        'I' => Cigar::Ins(len),
        'D' => Cigar::Del(len),
        'N' => Cigar::RefSkip(len),
        'S' => Cigar::SoftClip(len),
        'H' => Cigar::HardClip(len),
        'P' => Cigar::Pad(len),
        '=' => Cigar::Equal(len),
        'X' => Cigar::Diff(len),
        _ => return None,
    };
    Some(cigar)
}

/// Parse a CIGAR string such as `10M2I5M` into its operations.
///
/// A letter that is not preceded by a length, or a letter that is not a CIGAR
/// operation, is an error. Digits at the end of the string that are not followed
/// by an operation form a truncated token and are dropped.
///
/// # Examples
///
/// ```
/// use leftalign::utils::cigar::parse_cigar;
/// use rust_htslib::bam::record::Cigar;
///
/// let ops = parse_cigar("4M2I3M").unwrap();
/// assert_eq!(vec![Cigar::Match(4), Cigar::Ins(2), Cigar::Match(3)], ops);
/// assert!(parse_cigar("M4").is_err());
/// ```
pub fn parse_cigar(text: &str) -> Result<Vec<Cigar>> {
    let malformed = |reason: String| LeftAlignError::MalformedCigar {
        cigar: text.to_owned(),
        reason,
    };

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;
    for c in text.chars() {
        if let Some(digit) = c.to_digit(10) {
            let current = len.unwrap_or(0);
            let next = current
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| malformed("operation length overflows".into()))?;
            len = Some(next);
            continue;
        }
        let Some(op_len) = len.take() else {
            return Err(malformed(format!("operation '{c}' has no length")).into());
        };
        let op = cigar_from_char(c, op_len)
            .ok_or_else(|| malformed(format!("unknown operation '{c}'")))?;
        ops.push(op);
    }

    Ok(ops)
}

/// Serialize CIGAR operations to text, leaving out operations of length zero.
///
/// # Examples
///
/// ```
/// use leftalign::utils::cigar::join_cigar;
/// use rust_htslib::bam::record::Cigar;
///
/// let ops = [Cigar::Match(4), Cigar::Del(0), Cigar::Match(3)];
/// assert_eq!("4M3M", join_cigar(&ops));
/// ```
pub fn join_cigar(cigar: &[Cigar]) -> String {
    cigar
        .iter()
        .filter(|op| op.len() > 0)
        .map(|op| op.to_string())
        .collect()
}

/// Check whether two operations are of the same kind, regardless of their lengths.
pub fn same_kind(a: &Cigar, b: &Cigar) -> bool {
    a.char() == b.char()
}

/// Return `op` with its length replaced by `len`.
pub fn with_len(op: Cigar, len: u32) -> Cigar {
    match op {
        Cigar::Match(_) => Cigar::Match(len),
        Cigar::Ins(_) => Cigar::Ins(len),
        Cigar::Del(_) => Cigar::Del(len),
        Cigar::RefSkip(_) => Cigar::RefSkip(len),
        Cigar::SoftClip(_) => Cigar::SoftClip(len),
        Cigar::HardClip(_) => Cigar::HardClip(len),
        Cigar::Pad(_) => Cigar::Pad(len),
        Cigar::Equal(_) => Cigar::Equal(len),
        Cigar::Diff(_) => Cigar::Diff(len),
    }
}

/// Append `op` to `cigar`, extending the last operation instead if it is of the same kind.
/// Operations of length zero are ignored.
pub fn push_fused(cigar: &mut Vec<Cigar>, op: Cigar) {
    if op.len() == 0 {
        return;
    }
    match cigar.last_mut() {
        Some(last) if same_kind(last, &op) => *last = with_len(*last, last.len() + op.len()),
        _ => cigar.push(op),
    }
}

/// Join the CIGARs of two consecutive alignment blocks. If the last operation
/// of `first` and the first operation of `second` are of the same kind, they are
/// fused into one operation.
///
/// # Examples
///
/// ```
/// use leftalign::utils::cigar::merge_cigar;
///
/// assert_eq!("4M2I3M", merge_cigar("4M2I", "3M").unwrap());
/// assert_eq!("7M2D", merge_cigar("4M", "3M2D").unwrap());
/// ```
pub fn merge_cigar(first: &str, second: &str) -> Result<String> {
    let mut merged = parse_cigar(first)?;
    let mut rest = parse_cigar(second)?.into_iter().peekable();

    let junction = match (merged.last(), rest.peek()) {
        (Some(last), Some(next)) if same_kind(last, next) => Some(with_len(*last, last.len() + next.len())),
        _ => None,
    };
    if let Some(fused) = junction {
        merged.pop();
        merged.push(fused);
        rest.next();
    }
    merged.extend(rest);

    Ok(join_cigar(&merged))
}
