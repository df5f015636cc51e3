//! Time-bounded execution on a worker thread.
//!
//! The closure runs on its own named thread; the caller waits on a channel
//! with `recv_timeout`. A worker that outlives its bound is detached and its
//! eventual result discarded.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why a bounded call produced no value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("failed to spawn worker: {0}")]
    Spawn(String),
}

/// Value returned by a bounded call, with its wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Run `f` on a worker thread named `bb-<name>`, waiting at most `timeout`.
pub fn run_bounded<T, F>(name: &str, timeout: Duration, f: F) -> Result<Timed<T>, (WorkerError, Duration)>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();

    let spawned = thread::Builder::new()
        .name(format!("bb-{}", name))
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message);
            // receiver may be gone after a timeout
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        return Err((WorkerError::Spawn(e.to_string()), start.elapsed()));
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(value)) => Ok(Timed {
            value,
            elapsed: start.elapsed(),
        }),
        Ok(Err(message)) => Err((WorkerError::Panicked(message), start.elapsed())),
        Err(mpsc::RecvTimeoutError::Timeout) => Err((WorkerError::Timeout(timeout), start.elapsed())),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err((
            WorkerError::Panicked("worker exited without a result".to_string()),
            start.elapsed(),
        )),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Milliseconds in a duration, saturating.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
