//! Serial task queue: the single worker every mutating manager operation
//! runs on.
//!
//! Jobs are executed one at a time, in the order the channel accepted them.
//! `post` is fire-and-forget; `post_sync` waits for the job's result over a
//! oneshot channel.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::manager::SceneSessionManager;

type Job = Box<dyn FnOnce(&SceneSessionManager) + Send + 'static>;

struct Task {
    name: &'static str,
    job: Job,
}

pub struct SerialTaskQueue {
    manager: Arc<SceneSessionManager>,
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialTaskQueue {
    /// Spawn the worker on the current tokio runtime.
    #[must_use]
    pub fn start(manager: Arc<SceneSessionManager>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(Arc::clone(&manager), rx));
        debug!(capacity, "serial task queue started");
        Self {
            manager,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Shared manager, for read-only queries that need not be serialized.
    #[must_use]
    pub fn manager(&self) -> &Arc<SceneSessionManager> {
        &self.manager
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn sender(&self) -> Result<mpsc::Sender<Task>> {
        self.sender.lock().clone().ok_or(Error::QueueClosed)
    }

    /// Submit `job` without waiting for it to run.
    pub async fn post<F>(&self, name: &'static str, job: F) -> Result<()>
    where
        F: FnOnce(&SceneSessionManager) + Send + 'static,
    {
        let sender = self.sender()?;
        sender
            .send(Task {
                name,
                job: Box::new(job),
            })
            .await
            .map_err(|_| Error::QueueClosed)
    }

    /// Submit `job` and wait for its result.
    pub async fn post_sync<F, R>(&self, name: &'static str, job: F) -> Result<R>
    where
        F: FnOnce(&SceneSessionManager) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.post(name, move |manager| {
            // The waiter may have given up; the result is simply dropped then.
            let _ = tx.send(job(manager));
        })
        .await?;
        rx.await.map_err(|_| Error::TaskDropped(name.to_string()))
    }

    /// Stop accepting jobs, let the worker drain what was already accepted,
    /// then wait for it to exit.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                warn!(error = %err, "serial task queue worker ended abnormally");
            }
        }
        debug!("serial task queue stopped");
    }
}

async fn run_worker(manager: Arc<SceneSessionManager>, mut rx: mpsc::Receiver<Task>) {
    while let Some(task) = rx.recv().await {
        let _span = tracing::debug_span!("ssm_task", task = task.name).entered();
        let Task { name, job } = task;
        // Unwinding drops the job and with it any post_sync reply sender, so
        // the waiter sees TaskDropped while the worker keeps serving.
        if panic::catch_unwind(AssertUnwindSafe(|| job(&manager))).is_err() {
            warn!(task = name, "queued task panicked");
            metrics::counter!("ssm.queue.panics", "task" => name).increment(1);
            continue;
        }
        metrics::counter!("ssm.queue.tasks", "task" => name).increment(1);
    }
}

impl std::fmt::Debug for SerialTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTaskQueue")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
