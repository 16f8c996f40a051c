//! Static fan-out/fan-in of parse work across CPU workers.
//!
//! Work is split once, up front, into one contiguous chunk per worker; each
//! worker runs the parse routine over its chunk and sends its partial result
//! back over a dedicated channel. The orchestrator collects results in the
//! order workers were started, so a slow early worker delays collection of
//! later ones that already finished. There is no work stealing, no
//! rebalancing, and no timeout: parsing is CPU-bound with roughly uniform
//! file counts per host, so a simple split is enough, and workers are
//! assumed to terminate.

use si_common::{Error, Result};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info};

/// A worker's partial output; the dispatcher logs its size on collection.
pub trait Partial {
    fn record_count(&self) -> usize;
}

/// Default worker count: one per logical CPU.
pub fn default_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Split `items` into `workers` contiguous chunks whose lengths sum to the
/// input length.
///
/// The first `workers - 1` chunks take `len / workers` items each from the
/// front; the last chunk is taken from the tail and absorbs the remainder.
/// When the split is uneven the tail slice selects the same sizes but not
/// the same elements as a front slice would, and that selection is part of
/// the contract. More workers than items yields empty chunks, which the
/// dispatcher still runs and collects.
///
/// # Panics
/// If `workers` is zero.
pub fn partition<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    assert!(workers >= 1, "worker count must be at least 1");
    let len = items.len();
    let chunk_size = len / workers;
    let remainder = len % workers;

    let mut chunks = Vec::with_capacity(workers);
    for worker in 0..workers - 1 {
        chunks.push(items[worker * chunk_size..(worker + 1) * chunk_size].to_vec());
    }
    chunks.push(items[len - (chunk_size + remainder)..].to_vec());
    chunks
}

/// Run `job` over each chunk on its own OS thread and collect the partial
/// results in start order.
///
/// Each worker owns its chunk outright and reports back wholesale over a
/// dedicated channel; there is no shared mutable state. A worker that
/// errors fails the run with its own error; a worker that dies without
/// reporting (its channel hangs up) surfaces as [`Error::WorkerFailed`].
/// On failure the remaining workers are still drained and joined before
/// the first error is returned, so no thread outlives the call.
pub fn dispatch<T, R, F>(chunks: Vec<Vec<T>>, label: &'static str, job: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Partial + Send + 'static,
    F: Fn(&[T]) -> Result<R> + Clone + Send + 'static,
{
    let mut workers = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.into_iter().enumerate() {
        let (tx, rx) = mpsc::channel();
        let job = job.clone();
        debug!(label, worker = index, items = chunk.len(), "starting worker");
        let handle = thread::Builder::new()
            .name(format!("{label}-worker-{index}"))
            .spawn(move || {
                let _ = tx.send(job(&chunk));
            })?;
        workers.push((index, handle, rx));
    }

    let mut partials = Vec::with_capacity(workers.len());
    let mut failure: Option<Error> = None;
    for (index, handle, rx) in workers {
        debug!(label, worker = index, "waiting for worker result");
        let received = rx.recv();
        let joined = handle.join();
        if failure.is_some() {
            // Already failing; this worker was only drained and joined.
            continue;
        }
        let result = match received {
            Ok(result) => result,
            Err(_) => Err(Error::WorkerFailed { worker: index }),
        };
        match result {
            Ok(partial) if joined.is_ok() => {
                info!(
                    label,
                    worker = index,
                    records = partial.record_count(),
                    "worker complete"
                );
                partials.push(partial);
            }
            Ok(_) => failure = Some(Error::WorkerFailed { worker: index }),
            Err(err) => failure = Some(err),
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(partials),
    }
}
