//! # Reading and writing alignments
//!
//! Plain-text alignments are read from and written to tab separated files ([`tsv`]), run
//! summaries and repeat scans are written as JSON ([`json`]), and mapped reads can be realigned
//! straight from SAM/BAM files ([`bam`]).
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use anyhow::{Context, Result};

pub mod bam;
pub mod json;
pub mod tsv;

/// Open `path` for buffered writing, or stdout if no path is given.
pub fn open_output(path: Option<&str>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Could not create output file {path}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
