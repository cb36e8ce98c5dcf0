use std::io;

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use leftalign::{
    self,
    cli::{Cli, Commands},
    io::{bam, json, open_output, tsv},
    repeat, RealignmentJob, RecordStatus,
};
use log::info;
use rayon::ThreadPoolBuilder;

fn main() -> Result<()> {
    // Initialize the logger. If the log level is not set via `RUST_LOG`, set it to 'info' by default
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.leftalign_config();
    ThreadPoolBuilder::new()
        .num_threads(cli.threads())
        .build_global()?;

    match &cli.command {
        Commands::Cigar {
            reference,
            query,
            cigar,
            offset,
            ..
        } => {
            let realignment = leftalign::leftalign::stably_left_align(
                query.as_bytes(),
                cigar,
                reference.as_bytes(),
                *offset,
                &config,
            )?;
            let record = tsv::RealignmentRecord {
                name: "cigar".to_owned(),
                status: RecordStatus::from(&realignment),
                cigar: realignment.cigar,
                offset: realignment.offset,
            };
            tsv::write_realignments(&[record], io::stdout().lock())?;
        }
        Commands::Batch {
            input,
            output,
            summary,
            threads,
            ..
        } => {
            let mut jobs: Vec<RealignmentJob> = tsv::read_alignments(input)?
                .into_iter()
                .map(RealignmentJob::new)
                .collect();
            let chunksize = jobs.len() / threads + 1;

            info!("Starting realignment");
            let run_summary = leftalign::realign_all(&mut jobs, &config, chunksize);
            info!(
                "Finished realignment: {} realigned, {} unchanged, {} failed",
                run_summary.realigned, run_summary.unchanged, run_summary.failed
            );

            let records: Vec<_> = jobs.iter().map(RealignmentJob::to_record).collect();
            tsv::write_realignments(&records, open_output(output.as_deref())?)?;
            if let Some(path) = summary {
                json::write_json_to(&run_summary, Some(path.as_str()))?;
            }
        }
        Commands::Bam {
            alignment,
            reference,
            output,
            summary,
            chunksize,
            ..
        } => {
            info!("Starting realignment of {alignment}");
            let run_summary = bam::realign_bam(alignment, reference, output, &config, *chunksize)?;
            if let Some(path) = summary {
                json::write_json_to(&run_summary, Some(path.as_str()))?;
            }
        }
        Commands::Repeats {
            sequence,
            position,
            max_size,
        } => {
            if *position >= sequence.len() {
                bail!(
                    "--position {position} is outside of the sequence ({}bp)",
                    sequence.len()
                );
            }
            let counts = repeat::repeat_counts(sequence.as_bytes(), *position, *max_size);
            json::write_json_to(&counts, None)?;
        }
    }

    Ok(())
}
