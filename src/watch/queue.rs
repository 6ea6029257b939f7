// src/watch/queue.rs

//! Single-concurrency FIFO task queue.
//!
//! Every registry-mutating unit of work goes through here. Tasks run one at a
//! time, in submission order. Submission happens when `add` is called, not
//! when its future is first polled.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::errors::{CompwatchError, Result};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Cloneable handle to a strict concurrency-1 queue.
///
/// Must be created inside a tokio runtime; the worker lives until every
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct WatchQueue {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
}

impl WatchQueue {
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                // Each job runs on its own task so a panic cannot take the worker down.
                if let Err(err) = tokio::spawn(job).await {
                    worker_pending.fetch_sub(1, Ordering::SeqCst);
                    warn!(error = %err, "queued task panicked");
                }
            }
            debug!("watch queue worker finished");
        });

        Self { tx, pending }
    }

    /// Enqueue `task` and return a future resolving to its output once it
    /// has run in turn.
    pub fn add<F, T>(&self, task: F) -> impl Future<Output = Result<T>> + Send + 'static
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job_pending = Arc::clone(&self.pending);
        let job: Job = Box::pin(async move {
            let output = task.await;
            job_pending.fetch_sub(1, Ordering::SeqCst);
            let _ = done_tx.send(output);
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        let submitted = self.tx.send(job).is_ok();
        if !submitted {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }

        async move {
            if !submitted {
                return Err(CompwatchError::QueueClosed);
            }
            done_rx.await.map_err(|_| CompwatchError::QueueTaskAborted)
        }
    }

    /// Resolve once every task submitted before this call has finished.
    pub fn on_idle(&self) -> impl Future<Output = ()> + Send + 'static {
        let marker = self.add(async {});
        async move {
            let _ = marker.await;
        }
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Default for WatchQueue {
    fn default() -> Self {
        Self::new()
    }
}
