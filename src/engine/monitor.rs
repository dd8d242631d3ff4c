// Liveness monitoring for external processes

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Shared run-wide cancellation flag.
///
/// Set by the coordinator on the first failure and by the signal handler;
/// every monitor checks it between polls.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a monitored process ended
#[derive(Debug)]
pub enum Exit {
    Exited(ExitStatus),
    TimedOut(Duration),
    Cancelled,
}

/// Poll `child` until it exits, its timeout elapses or the run is cancelled.
/// On timeout or cancellation the child is killed and reaped.
pub fn supervise(
    child: &mut Child,
    timeout: Option<Duration>,
    poll_interval: Duration,
    cancel: &CancelToken,
) -> io::Result<Exit> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Exit::Exited(status));
        }

        if cancel.is_cancelled() {
            terminate(child);
            return Ok(Exit::Cancelled);
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                terminate(child);
                return Ok(Exit::TimedOut(limit));
            }
        }

        thread::sleep(poll_interval);
    }
}

fn terminate(child: &mut Child) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        // Already gone between the poll and the kill
        tracing::debug!(pid, "kill failed: {}", e);
    }
    let _ = child.wait();
}
