//! Worker pool backends
//!
//! A pool owns the lifecycle of a fixed-size set of page workers. Every
//! backend shares the same two queues and the same lifecycle:
//!
//! 1. [`build_queues`] creates the work and result queues
//! 2. [`WorkerPool::spawn`] prepares `n` workers from one [`WorkerInit`]
//! 3. [`WorkerPool::start`] launches them
//! 4. [`stop`] pushes one `Done` message per worker
//!
//! Only the worker unit differs: an OS thread ([`ThreadPool`]), an OS
//! process ([`ProcessPool`]) or a cooperative task ([`CooperativePool`]).

mod cooperative;
mod process;
mod threaded;

pub use cooperative::CooperativePool;
pub use process::{run_worker_process, ProcessPool, WORKER_PROCESS_FLAG};
pub use threaded::ThreadPool;

use crate::crawler::{FetchResult, WorkMessage, WorkerConfig};
use flume::{Receiver, Sender};
use std::any::Any;

/// The two queues shared by the driver and the workers
///
/// Both are unbounded: a put never blocks, so the single consumer can
/// always re-queue the work it discovers.
pub struct Queues {
    pub work_tx: Sender<WorkMessage>,
    pub work_rx: Receiver<WorkMessage>,
    pub results_tx: Sender<FetchResult>,
    pub results_rx: Receiver<FetchResult>,
}

pub fn build_queues() -> Queues {
    let (work_tx, work_rx) = flume::unbounded();
    let (results_tx, results_rx) = flume::unbounded();
    Queues {
        work_tx,
        work_rx,
        results_tx,
        results_rx,
    }
}

/// Everything a worker is spawned with
///
/// The settings are fixed for the worker's lifetime.
#[derive(Debug, Clone)]
pub struct WorkerInit {
    pub config: WorkerConfig,
    pub work: Receiver<WorkMessage>,
    pub results: Sender<FetchResult>,
}

/// A concurrency backend for page workers
pub trait WorkerPool {
    /// A prepared, not yet running worker
    type Handle;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Prepares `count` workers
    ///
    /// `init` is consumed so that no queue endpoint outlives the workers
    /// in the caller's hands.
    fn spawn(&self, count: usize, init: WorkerInit) -> crate::Result<Vec<Self::Handle>>;

    /// Launches prepared workers
    fn start(&self, handles: Vec<Self::Handle>) -> crate::Result<Vec<RunningWorker>>;
}

/// Pushes one `Done` message per worker onto the work queue
///
/// Workers finish the item they hold before reading their `Done`.
pub fn stop(work: &Sender<WorkMessage>, count: usize) {
    for _ in 0..count {
        if work.send(WorkMessage::Done).is_err() {
            tracing::debug!("Work queue closed, workers already gone");
            break;
        }
    }
}

/// A launched worker
#[derive(Debug)]
pub enum RunningWorker {
    Thread(std::thread::JoinHandle<()>),
    Task(tokio::task::JoinHandle<()>),
}

impl RunningWorker {
    /// Waits for the worker to terminate
    pub async fn join(self) {
        match self {
            Self::Thread(handle) => {
                match tokio::task::spawn_blocking(move || handle.join()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(payload)) => {
                        tracing::error!("Worker thread panicked: {}", panic_message(payload.as_ref()))
                    }
                    Err(e) => tracing::error!("Failed to join worker thread: {}", e),
                }
            }
            Self::Task(handle) => {
                if let Err(e) = handle.await {
                    tracing::error!("Worker task failed: {}", e);
                }
            }
        }
    }
}

/// Extracts the message of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
