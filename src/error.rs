//! # Errors raised while realigning indels
//!
//! Most functions in this crate return [`anyhow::Result`]. Failures that a caller
//! may want to react to are raised as a [`LeftAlignError`] and can be recovered with
//! `err.downcast_ref::<LeftAlignError>()`.
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeftAlignError {
    /// A CIGAR token is missing its length or carries an unknown operation.
    MalformedCigar { cigar: String, reason: String },
    /// An indel ended up left of the right edge of the indel before it.
    ImpossibleAlignment { position: usize, lastend: usize },
    /// The iteration budget ran out before the CIGAR stopped changing.
    ExhaustedIterations { iterations: usize },
    /// A CIGAR walks past the end of the reference or query sequence.
    SequenceTooShort { cigar: String, sequence: &'static str },
}

impl fmt::Display for LeftAlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeftAlignError::MalformedCigar { cigar, reason } => {
                write!(f, "Malformed CIGAR '{cigar}': {reason}")
            }
            LeftAlignError::ImpossibleAlignment { position, lastend } => write!(
                f,
                "Indel at position {position} was realigned left of the previous indel ending at {lastend}"
            ),
            LeftAlignError::ExhaustedIterations { iterations } => write!(
                f,
                "Alignment did not stabilize within {iterations} iterations"
            ),
            LeftAlignError::SequenceTooShort { cigar, sequence } => {
                write!(f, "CIGAR '{cigar}' runs past the end of the {sequence} sequence")
            }
        }
    }
}

impl Error for LeftAlignError {}
