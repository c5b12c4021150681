//! Cooperative backend: workers are tasks on the current thread
//!
//! Tasks are spawned with [`tokio::task::spawn_local`], so starting them
//! requires a running [`tokio::task::LocalSet`]. Workers only suspend while
//! waiting on the network or on the work queue. All tasks share one
//! [`PageWorker`], and with it one HTTP connection pool.

use crate::crawler::{FetchResult, PageWorker, WorkMessage};
use crate::pool::{RunningWorker, WorkerInit, WorkerPool};
use flume::{Receiver, Sender};

/// A task that has not been started yet
#[derive(Debug)]
pub struct PendingTask {
    worker: PageWorker,
    work: Receiver<WorkMessage>,
    results: Sender<FetchResult>,
}

/// Runs workers as cooperative tasks on a `LocalSet`
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativePool;

impl CooperativePool {
    pub fn new() -> Self {
        Self
    }
}

impl WorkerPool for CooperativePool {
    type Handle = PendingTask;

    fn name(&self) -> &'static str {
        "green"
    }

    fn spawn(&self, count: usize, init: WorkerInit) -> crate::Result<Vec<PendingTask>> {
        let worker = PageWorker::new(&init.config)?;

        Ok((0..count)
            .map(|_| PendingTask {
                worker: worker.clone(),
                work: init.work.clone(),
                results: init.results.clone(),
            })
            .collect())
    }

    fn start(&self, handles: Vec<PendingTask>) -> crate::Result<Vec<RunningWorker>> {
        Ok(handles
            .into_iter()
            .map(|task| {
                RunningWorker::Task(tokio::task::spawn_local(async move {
                    task.worker.run(task.work, task.results).await;
                }))
            })
            .collect())
    }
}
