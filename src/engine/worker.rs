// Job execution: one monitor thread per running subprocess, results over a channel

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use super::core::{CommandFactory, JobKind, JobStatus, RunConfig, TimeoutClass, format_cmd};
use super::graph::JobGraph;
use super::monitor::{CancelToken, Exit, supervise};
use super::poster::{Replacement, discard, keep_smaller};
use crate::error::{Error, Result};

/// Lines of stderr kept for failure messages
const STDERR_TAIL_LINES: usize = 12;

/// Per-class wall-clock limits; `None` means unlimited
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeouts {
    pub encode: Option<Duration>,
    pub stream: Option<Duration>,
    pub poster: Option<Duration>,
    pub optimize: Option<Duration>,
}

impl Timeouts {
    pub fn for_class(&self, class: TimeoutClass) -> Option<Duration> {
        match class {
            TimeoutClass::Encode => self.encode,
            TimeoutClass::Stream => self.stream,
            TimeoutClass::Poster => self.poster,
            TimeoutClass::Optimize => self.optimize,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on concurrently running jobs; 0 means no bound
    pub max_parallel: usize,
    pub poll_interval: Duration,
    pub timeouts: Timeouts,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_parallel: 0,
            poll_interval: Duration::from_millis(200),
            timeouts: Timeouts::default(),
        }
    }
}

/// Terminal result of one job as decided by its monitor thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { note: Option<String> },
    Failed { reason: String },
}

/// Message from a monitor thread to the coordinator
#[derive(Debug)]
pub enum WorkerMessage {
    /// Process spawned
    JobStarted { kind: JobKind, pid: u32 },

    /// Process reached a terminal state
    JobFinished {
        kind: JobKind,
        outcome: JobOutcome,
        elapsed: Duration,
    },
}

/// Everything a monitor thread needs, moved into it at launch
struct WorkerJob {
    kind: JobKind,
    timeout: Option<Duration>,
    poll_interval: Duration,
    cancel: CancelToken,
    /// (poster, candidate) for optimize jobs
    replace: Option<(PathBuf, PathBuf)>,
}

impl WorkerJob {
    /// A failure of the optimizer never fails the run; the original poster is
    /// kept instead.
    fn failed(&self, reason: String) -> JobOutcome {
        match &self.replace {
            Some((_, candidate)) => {
                discard(candidate);
                JobOutcome::Succeeded {
                    note: Some(format!("optimizer {reason}; kept original")),
                }
            }
            None => JobOutcome::Failed { reason },
        }
    }

    fn succeeded(&self) -> JobOutcome {
        let Some((poster, candidate)) = &self.replace else {
            return JobOutcome::Succeeded { note: None };
        };
        let note = match keep_smaller(poster, candidate) {
            Ok(Replacement::Replaced { before, after }) => {
                format!("optimized {before} -> {after} bytes")
            }
            Ok(Replacement::KeptOriginal { before, candidate }) => {
                format!("kept original ({before} bytes, optimizer produced {candidate})")
            }
            Err(e) => format!("kept original: {e}"),
        };
        JobOutcome::Succeeded { note: Some(note) }
    }
}

/// Runs a [`JobGraph`] to completion or first failure.
///
/// The coordinator launches every ready job (up to `max_parallel`), then
/// blocks on the result channel only; each child is watched by its own
/// thread polling `try_wait`.
pub struct Executor<'a> {
    factory: &'a dyn CommandFactory,
    settings: &'a EngineSettings,
    cancel: CancelToken,
}

impl<'a> Executor<'a> {
    pub fn new(
        factory: &'a dyn CommandFactory,
        settings: &'a EngineSettings,
        cancel: CancelToken,
    ) -> Self {
        Self {
            factory,
            settings,
            cancel,
        }
    }

    fn has_capacity(&self, in_flight: usize) -> bool {
        self.settings.max_parallel == 0 || in_flight < self.settings.max_parallel
    }

    /// Execute every job in `graph`.
    ///
    /// On the first failure the cancellation token is set so in-flight
    /// children are killed, nothing new is launched and the remaining jobs are
    /// marked skipped. Statuses in `graph` are final when this returns.
    pub fn execute(&self, run: &RunConfig, graph: &mut JobGraph) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut in_flight = 0usize;
        let mut failure: Option<Error> = None;

        loop {
            if failure.is_none() && !self.cancel.is_cancelled() {
                for kind in graph.ready() {
                    if !self.has_capacity(in_flight) {
                        break;
                    }
                    graph.set_status(kind, JobStatus::Running);
                    match self.launch(kind, run, tx.clone()) {
                        Ok(()) => {
                            tracing::info!("started {}", kind);
                            in_flight += 1;
                        }
                        Err(e) => {
                            let reason = format!("could not launch: {e}");
                            tracing::error!("{} failed: {}", kind, reason);
                            graph.finish(kind, JobStatus::Failed, 0, Some(reason.clone()));
                            failure = Some(Error::JobFailed { job: kind, reason });
                            self.cancel.cancel();
                            break;
                        }
                    }
                }
            }

            if in_flight == 0 {
                break;
            }

            let Ok(message) = rx.recv() else {
                break;
            };
            match message {
                WorkerMessage::JobStarted { kind, pid } => {
                    tracing::debug!(pid, "{} spawned", kind);
                }
                WorkerMessage::JobFinished {
                    kind,
                    outcome,
                    elapsed,
                } => {
                    in_flight -= 1;
                    let elapsed_ms = elapsed.as_millis() as u64;
                    match outcome {
                        JobOutcome::Succeeded { note } => {
                            tracing::info!("finished {} in {:.1}s", kind, elapsed.as_secs_f64());
                            if let Some(note) = &note {
                                tracing::info!("{}: {}", kind, note);
                            }
                            graph.finish(kind, JobStatus::Succeeded, elapsed_ms, note);
                        }
                        JobOutcome::Failed { reason } => {
                            graph.finish(kind, JobStatus::Failed, elapsed_ms, Some(reason.clone()));
                            if failure.is_none() && !self.cancel.is_cancelled() {
                                tracing::error!("{} failed: {}", kind, reason);
                                failure = Some(Error::JobFailed { job: kind, reason });
                                self.cancel.cancel();
                            } else {
                                tracing::debug!("{} stopped: {}", kind, reason);
                            }
                        }
                    }
                }
            }
        }

        let skipped = graph.skip_pending();
        if !skipped.is_empty() {
            tracing::debug!("skipped {} job(s) that never started", skipped.len());
        }

        if let Some(err) = failure {
            return Err(err);
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(&kind) = skipped.first() {
            return Err(Error::Unschedulable(kind));
        }
        Ok(())
    }

    fn launch(&self, kind: JobKind, run: &RunConfig, tx: Sender<WorkerMessage>) -> io::Result<()> {
        if let Some(dir) = kind.workdir() {
            fs::create_dir_all(run.output_dir().join(dir))?;
        }

        let cmd = self.factory.command(kind, run);
        tracing::debug!("{}: {}", kind, format_cmd(&cmd));

        let job = WorkerJob {
            kind,
            timeout: self.settings.timeouts.for_class(kind.timeout_class()),
            poll_interval: self.settings.poll_interval,
            cancel: self.cancel.clone(),
            replace: kind
                .candidate_path(run.name())
                .map(|candidate| (run.artifact_path(kind), run.output_dir().join(candidate))),
        };

        thread::Builder::new()
            .name(format!("job-{kind}"))
            .spawn(move || run_job(job, cmd, tx))?;
        Ok(())
    }
}

fn run_job(job: WorkerJob, mut cmd: Command, tx: Sender<WorkerMessage>) {
    let started = Instant::now();
    let program = cmd.get_program().to_string_lossy().into_owned();

    let outcome = match spawn_and_supervise(&job, &mut cmd, &tx) {
        Ok((Exit::Exited(status), _)) if status.success() => job.succeeded(),
        Ok((Exit::Exited(status), stderr)) => {
            if stderr.is_empty() {
                job.failed(format!("exited with {status}"))
            } else {
                job.failed(format!("exited with {status}:\n{stderr}"))
            }
        }
        Ok((Exit::TimedOut(limit), _)) => {
            job.failed(format!("timed out after {:.1}s", limit.as_secs_f64()))
        }
        Ok((Exit::Cancelled, _)) => JobOutcome::Failed {
            reason: "cancelled".to_string(),
        },
        Err(e) => job.failed(format!("could not run {program}: {e}")),
    };

    let _ = tx.send(WorkerMessage::JobFinished {
        kind: job.kind,
        outcome,
        elapsed: started.elapsed(),
    });
}

fn spawn_and_supervise(
    job: &WorkerJob,
    cmd: &mut Command,
    tx: &Sender<WorkerMessage>,
) -> io::Result<(Exit, String)> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let _ = tx.send(WorkerMessage::JobStarted {
        kind: job.kind,
        pid: child.id(),
    });

    let stderr_thread = child
        .stderr
        .take()
        .map(|stderr| thread::spawn(move || stderr_tail(stderr)));

    let exit = supervise(&mut child, job.timeout, job.poll_interval, &job.cancel)?;

    // A killed child may leave grandchildren holding the pipe open; only wait
    // for the reader when the process exited on its own.
    let stderr = match (&exit, stderr_thread) {
        (Exit::Exited(_), Some(handle)) => handle.join().unwrap_or_default(),
        _ => String::new(),
    };

    Ok((exit, stderr))
}

/// Keep the last lines of a child's stderr. The pipe is drained to EOF so the
/// child never writes into a closed pipe; bytes that are not UTF-8 are
/// replaced rather than ending the read.
fn stderr_tail<R: Read>(stderr: R) -> String {
    let mut lines: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    for chunk in BufReader::new(stderr).split(b'\n') {
        let Ok(chunk) = chunk else {
            break;
        };
        if lines.len() == STDERR_TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(String::from_utf8_lossy(&chunk).trim_end().to_string());
    }
    Vec::from(lines).join("\n").trim().to_string()
}
