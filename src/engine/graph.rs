//! The job set for one run and its dependency bookkeeping.

use crate::engine::core::{Job, JobKind, JobStatus, RunConfig};

/// Enabled jobs in catalog order, with their runtime status
#[derive(Debug, Clone)]
pub struct JobGraph {
    jobs: Vec<Job>,
}

impl JobGraph {
    /// Instantiate every job whose variant is enabled. Optimize jobs are only
    /// created when the optimizer tool is available.
    pub fn build(run: &RunConfig, optimizer_available: bool) -> Self {
        let kinds = JobKind::catalog().into_iter().filter(|kind| {
            run.enabled().is_enabled(kind.variant())
                && (optimizer_available || !matches!(kind, JobKind::PosterOptimize(_)))
        });
        Self::from_kinds(kinds)
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = JobKind>) -> Self {
        Self {
            jobs: kinds.into_iter().map(Job::new).collect(),
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, kind: JobKind) -> Option<&Job> {
        self.jobs.iter().find(|j| j.kind == kind)
    }

    pub fn status(&self, kind: JobKind) -> Option<JobStatus> {
        self.get(kind).map(|j| j.status)
    }

    /// Pending jobs whose dependency (if any) has succeeded.
    /// A dependency that is not part of the graph is never satisfied.
    pub fn ready(&self) -> Vec<JobKind> {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .filter(|j| match j.kind.depends_on() {
                Some(parent) => self.status(parent) == Some(JobStatus::Succeeded),
                None => true,
            })
            .map(|j| j.kind)
            .collect()
    }

    /// Move a job along its lifecycle. Returns false (and leaves the job
    /// untouched) for an edge the lifecycle does not allow.
    pub fn set_status(&mut self, kind: JobKind, status: JobStatus) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|j| j.kind == kind) else {
            return false;
        };
        if !job.status.can_advance_to(status) {
            tracing::warn!("ignoring {} transition {:?} -> {:?}", kind, job.status, status);
            return false;
        }
        job.status = status;
        true
    }

    /// Record a terminal outcome along with timing and an optional note
    pub fn finish(
        &mut self,
        kind: JobKind,
        status: JobStatus,
        elapsed_ms: u64,
        note: Option<String>,
    ) -> bool {
        if !self.set_status(kind, status) {
            return false;
        }
        if let Some(job) = self.jobs.iter_mut().find(|j| j.kind == kind) {
            job.elapsed_ms = Some(elapsed_ms);
            job.note = note;
        }
        true
    }

    /// Mark every job that never started as skipped
    pub fn skip_pending(&mut self) -> Vec<JobKind> {
        let mut skipped = Vec::new();
        for job in &mut self.jobs {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Skipped;
                skipped.push(job.kind);
            }
        }
        skipped
    }

    pub fn is_finished(&self) -> bool {
        self.jobs.iter().all(|j| j.status.is_terminal())
    }

    pub fn all_succeeded(&self) -> bool {
        self.jobs.iter().all(|j| j.status == JobStatus::Succeeded)
    }
}
