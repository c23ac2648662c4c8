//! Fixed-size worker-thread pool for CPU-bound jobs.
//!
//! One bounded job channel per worker with round-robin dispatch. The only
//! objects crossing the thread boundary are channel messages: a job going
//! out, its output coming back on a capacity-one reply channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::rendezvous;

/// Jobs queued per worker before submitters start waiting.
const QUEUE_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum OffloadError {
    #[error("worker pool unavailable")]
    WorkerGone,
}

type Job = Box<dyn FnOnce() -> String + Send + 'static>;

struct Envelope {
    job: Job,
    reply: rendezvous::Sender<String>,
}

/// Independent execution domain for simulated CPU-bound jobs, kept apart
/// from the connection-handling runtime.
pub struct WorkerPool {
    channels: Vec<mpsc::Sender<Envelope>>,
    next_worker: AtomicUsize,
}

impl WorkerPool {
    pub fn start(workers: usize) -> Self {
        let workers = workers.max(1);
        info!(workers, "starting worker pool");

        let mut channels = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);
            channels.push(tx);

            thread::spawn(move || {
                while let Some(envelope) = rx.blocking_recv() {
                    let output = (envelope.job)();
                    // The caller may have gone away; the output is
                    // dropped with its reply slot in that case.
                    let _ = envelope.reply.blocking_send(output);
                }
                debug!(worker_id, "worker exiting");
            });
        }

        Self {
            channels,
            next_worker: AtomicUsize::new(0),
        }
    }

    /// Run `job` on a worker thread and suspend until its output crosses
    /// back into the async domain. Exactly one job is in flight per call.
    pub async fn submit<F>(&self, job: F) -> Result<String, OffloadError>
    where
        F: FnOnce() -> String + Send + 'static,
    {
        let (reply_tx, mut reply_rx) = rendezvous::channel();
        let envelope = Envelope {
            job: Box::new(job),
            reply: reply_tx,
        };

        let worker_idx =
            self.next_worker.fetch_add(1, Ordering::Relaxed) % self.channels.len();
        self.channels[worker_idx]
            .send(envelope)
            .await
            .map_err(|_| OffloadError::WorkerGone)?;

        reply_rx.recv().await.ok_or(OffloadError::WorkerGone)
    }

    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }
}
