//! # leftalign
//!
//! Left-realignment of indels in pairwise alignments. Given a query, a reference and a CIGAR
//! describing how the query aligns to the reference, every insertion and deletion is moved to
//! its left-most equivalent position, neighbouring indels that are separated only by repeat
//! sequence are merged, and deletions at the read edges are trimmed. The resulting CIGAR is the
//! same for all equivalent input alignments, which makes indel calls from different reads
//! comparable.
//!
//! The core lives in [`leftalign`]. The rest of the crate wraps it for batches of plain-text
//! alignments and for SAM/BAM files.
pub mod cli;
pub mod error;
pub mod indel;
pub mod io;
pub mod leftalign;
pub mod repeat;
pub mod utils;

use log::{debug, trace};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    io::tsv::{AlignmentRecord, RealignmentRecord},
    leftalign::{Convergence, LeftAlignConfig, Realignment},
};

/// What happened to a single alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Unchanged,
    Realigned,
    Exhausted,
    Failed,
    Skipped,
}

impl From<&Realignment> for RecordStatus {
    fn from(realignment: &Realignment) -> Self {
        match (realignment.status, realignment.changed) {
            (Convergence::Exhausted, _) => RecordStatus::Exhausted,
            (Convergence::Stable, true) => RecordStatus::Realigned,
            (Convergence::Stable, false) => RecordStatus::Unchanged,
        }
    }
}

/// Totals over one run, written as JSON at the end of a batch.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub unchanged: usize,
    pub realigned: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn add(&mut self, status: RecordStatus) {
        self.total += 1;
        match status {
            RecordStatus::Unchanged => self.unchanged += 1,
            RecordStatus::Realigned => self.realigned += 1,
            RecordStatus::Exhausted => self.exhausted += 1,
            RecordStatus::Failed => self.failed += 1,
            RecordStatus::Skipped => self.skipped += 1,
        }
    }
    pub fn merge(&mut self, other: &RunSummary) {
        self.total += other.total;
        self.unchanged += other.unchanged;
        self.realigned += other.realigned;
        self.exhausted += other.exhausted;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// An alignment together with the result of realigning it. `outcome` is `None` until the job
/// has been run.
#[derive(Debug, Clone)]
pub struct RealignmentJob {
    pub alignment: AlignmentRecord,
    pub outcome: Option<Result<Realignment, String>>,
}

impl RealignmentJob {
    pub fn new(alignment: AlignmentRecord) -> Self {
        Self {
            alignment,
            outcome: None,
        }
    }
    pub fn status(&self) -> RecordStatus {
        match &self.outcome {
            Some(Ok(realignment)) => RecordStatus::from(realignment),
            Some(Err(_)) => RecordStatus::Failed,
            None => RecordStatus::Skipped,
        }
    }
    /// The output row for this job. Failed and pending jobs keep their input CIGAR and offset.
    pub fn to_record(&self) -> RealignmentRecord {
        let (cigar, offset) = match &self.outcome {
            Some(Ok(realignment)) => (realignment.cigar.clone(), realignment.offset),
            _ => (self.alignment.cigar.clone(), self.alignment.offset),
        };
        RealignmentRecord {
            name: self.alignment.name.clone(),
            cigar,
            offset,
            status: self.status(),
        }
    }
}

/// Realign every job in `jobs`. This is meant to be called from inside a rayon parallel
/// iterator, one chunk of jobs per call. A job that fails is logged and left with an error
/// outcome, the remaining jobs are still processed.
pub fn run(jobs: &mut [RealignmentJob], config: &LeftAlignConfig, tidx: usize) {
    trace!("Launching thread {tidx}");

    for job in jobs {
        let alignment = &job.alignment;
        let result = leftalign::stably_left_align(
            alignment.query.as_bytes(),
            &alignment.cigar,
            alignment.reference.as_bytes(),
            alignment.offset,
            config,
        );
        match result {
            Ok(realignment) => job.outcome = Some(Ok(realignment)),
            Err(e) => {
                debug!("Could not realign {}, skipping: {e:?}", alignment.name);
                job.outcome = Some(Err(e.to_string()));
            }
        }
    }

    trace!("Finished on thread {tidx}");
}

/// Realign `jobs` in parallel on the global rayon thread pool, `chunksize` jobs per task, and
/// return the totals.
pub fn realign_all(
    jobs: &mut [RealignmentJob],
    config: &LeftAlignConfig,
    chunksize: usize,
) -> RunSummary {
    jobs.par_chunks_mut(chunksize.max(1)).for_each(|jobs| {
        let tidx = rayon::current_thread_index().unwrap_or(0);
        run(jobs, config, tidx);
    });

    let mut summary = RunSummary::default();
    for job in jobs.iter() {
        summary.add(job.status());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str, reference: &str, query: &str, cigar: &str, offset: usize) -> RealignmentJob {
        RealignmentJob::new(AlignmentRecord {
            name: name.to_owned(),
            reference: reference.to_owned(),
            query: query.to_owned(),
            cigar: cigar.to_owned(),
            offset,
        })
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let mut jobs = vec![
            job("shift", "GAAAAT", "GAAAT", "2M1D3M", 0),
            job("broken", "GAAAAT", "GAAAT", "2M1Q3M", 0),
            job("stable", "GAAAAT", "GAAAT", "1M1D4M", 0),
            job("short", "GAAAAT", "GAAAT", "2M1D9M", 0),
        ];
        let summary = realign_all(&mut jobs, &LeftAlignConfig::default(), 1);

        assert_eq!(
            RunSummary {
                total: 4,
                unchanged: 1,
                realigned: 1,
                exhausted: 0,
                failed: 2,
                skipped: 0,
            },
            summary
        );
        assert_eq!(RecordStatus::Failed, jobs[1].status());
        assert_eq!("2M1Q3M", jobs[1].to_record().cigar);
        assert_eq!("1M1D4M", jobs[0].to_record().cigar);
    }

    #[test]
    fn exhausted_jobs_are_counted() {
        let mut jobs = vec![job("shift", "GAAAAT", "GAAAT", "2M1D3M", 0)];
        let summary = realign_all(&mut jobs, &LeftAlignConfig { max_iterations: 0 }, 8);

        assert_eq!(1, summary.exhausted);
        assert_eq!(RecordStatus::Exhausted, jobs[0].to_record().status);
    }

    #[test]
    fn pending_job_is_skipped() {
        let job = job("pending", "GAAAAT", "GAAAT", "2M1D3M", 0);
        assert_eq!(RecordStatus::Skipped, job.status());
        assert_eq!(0, job.to_record().offset);
    }

    #[test]
    fn summaries_merge() {
        let mut a = RunSummary::default();
        a.add(RecordStatus::Realigned);
        let mut b = RunSummary::default();
        b.add(RecordStatus::Skipped);
        b.add(RecordStatus::Failed);
        a.merge(&b);

        assert_eq!(3, a.total);
        assert_eq!(1, a.realigned);
        assert_eq!(1, a.skipped);
        assert_eq!(1, a.failed);
    }
}
