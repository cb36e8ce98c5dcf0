//! # Command line interface for `leftalign`
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::leftalign::{LeftAlignConfig, DEFAULT_MAX_ITERATIONS};

#[derive(Parser)]
#[command(
    name = "leftalign",
    author,
    version,
    about = "Left-align indels in pairwise alignments",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Realignment settings shared by all subcommands that realign.
    pub fn leftalign_config(&self) -> LeftAlignConfig {
        let max_iterations = match &self.command {
            Commands::Cigar { max_iterations, .. }
            | Commands::Batch { max_iterations, .. }
            | Commands::Bam { max_iterations, .. } => *max_iterations,
            Commands::Repeats { .. } => DEFAULT_MAX_ITERATIONS,
        };
        LeftAlignConfig { max_iterations }
    }
    pub fn threads(&self) -> usize {
        match &self.command {
            Commands::Batch { threads, .. } | Commands::Bam { threads, .. } => *threads,
            Commands::Cigar { .. } | Commands::Repeats { .. } => 1,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Left-align a single alignment given on the command line
    Cigar {
        /// Reference sequence
        #[arg(short, long)]
        reference: String,

        /// Query (read) sequence
        #[arg(short, long)]
        query: String,

        /// CIGAR describing the alignment of the query to the reference
        #[arg(short, long)]
        cigar: String,

        /// 0-based position in the reference where the alignment starts
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of extra passes before giving up on a stable CIGAR
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS, value_parser = iterations_in_range)]
        max_iterations: usize,
    },
    /// Left-align alignments from a tab separated file (`[name] reference query cigar offset`)
    Batch {
        /// Input file with one alignment per line
        #[arg(short, long)]
        input: String,

        /// Output file for realigned records. Written to stdout if not given
        #[arg(short, long)]
        output: Option<String>,

        /// Write a JSON summary of the run to this file
        #[arg(long)]
        summary: Option<String>,

        /// Number of threads to use
        #[arg(long, default_value_t = 1, value_parser = threads_in_range)]
        threads: usize,

        /// Maximum number of extra passes before giving up on a stable CIGAR
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS, value_parser = iterations_in_range)]
        max_iterations: usize,
    },
    /// Left-align the mapped reads of a SAM/BAM file
    Bam {
        /// Input alignment file. Can be SAM or BAM.
        #[arg(short, long)]
        alignment: String,

        /// Reference genome. Expected format is FASTA, the index is created next to it if missing.
        #[arg(short, long)]
        reference: String,

        /// Output BAM file
        #[arg(short, long)]
        output: String,

        /// Write a JSON summary of the run to this file
        #[arg(long)]
        summary: Option<String>,

        /// Number of threads to use
        #[arg(long, default_value_t = 1, value_parser = threads_in_range)]
        threads: usize,

        /// Maximum number of extra passes before giving up on a stable CIGAR
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS, value_parser = iterations_in_range)]
        max_iterations: usize,

        /// Number of records held in memory and realigned together
        #[arg(long, default_value_t = 10_000)]
        chunksize: usize,
    },
    /// Report tandem repeat units starting at a position in a sequence, as JSON
    Repeats {
        /// Sequence to scan
        #[arg(short, long)]
        sequence: String,

        /// 0-based position where the repeat units start
        #[arg(short, long)]
        position: usize,

        /// Longest repeat unit to look for
        #[arg(long, default_value_t = 20)]
        max_size: usize,
    },
}

fn threads_in_range(s: &str) -> Result<usize> {
    let threads = s
        .parse()
        .context("Could not parse value passed to --threads to integer")?;
    if threads < 1 {
        bail!("--threads must be at least 1");
    }
    Ok(threads)
}

fn iterations_in_range(s: &str) -> Result<usize> {
    let iterations = s
        .parse()
        .context("Could not parse value passed to --max-iterations to integer")?;
    if iterations > 1000 {
        bail!("--max-iterations must be at most 1000");
    }
    Ok(iterations)
}
