//! Thread backend: one OS thread per worker
//!
//! Each thread drives its own single-threaded tokio runtime, so a worker's
//! HTTP client and connections never leave the thread that created them.

use crate::crawler::PageWorker;
use crate::pool::{RunningWorker, WorkerInit, WorkerPool};
use crate::CrawlError;
use std::thread;
use tokio::runtime::Builder;

/// A worker thread that has not been started yet
#[derive(Debug)]
pub struct PendingThread {
    name: String,
    init: WorkerInit,
}

/// Runs workers on OS threads
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPool;

impl ThreadPool {
    pub fn new() -> Self {
        Self
    }
}

impl WorkerPool for ThreadPool {
    type Handle = PendingThread;

    fn name(&self) -> &'static str {
        "thread"
    }

    fn spawn(&self, count: usize, init: WorkerInit) -> crate::Result<Vec<PendingThread>> {
        Ok((0..count)
            .map(|index| PendingThread {
                name: format!("linkcrawl-worker-{}", index),
                init: init.clone(),
            })
            .collect())
    }

    fn start(&self, handles: Vec<PendingThread>) -> crate::Result<Vec<RunningWorker>> {
        let mut running = Vec::with_capacity(handles.len());

        for pending in handles {
            let name = pending.name.clone();
            let init = pending.init;
            let handle = thread::Builder::new().name(pending.name).spawn(move || {
                if let Err(e) = run_thread(init) {
                    tracing::error!("Worker thread {} failed: {}", name, e);
                }
            })?;
            running.push(RunningWorker::Thread(handle));
        }

        Ok(running)
    }
}

fn run_thread(init: WorkerInit) -> Result<(), CrawlError> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let worker = PageWorker::new(&init.config)?;
    runtime.block_on(worker.run(init.work, init.results));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ElementKind, WorkItem, WorkMessage, WorkerConfig};
    use crate::pool::{build_queues, stop};
    use crate::url::normalize_url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_threads_process_items_and_stop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(4)
            .mount(&server)
            .await;

        let queues = build_queues();
        let pool = ThreadPool::new();
        let handles = pool
            .spawn(
                2,
                WorkerInit {
                    config: WorkerConfig {
                        timeout_secs: 5,
                        types: vec![ElementKind::Anchor],
                        credentials: None,
                    },
                    work: queues.work_rx,
                    results: queues.results_tx,
                },
            )
            .unwrap();
        let running = pool.start(handles).unwrap();
        assert_eq!(running.len(), 2);

        for i in 0..4 {
            let url = normalize_url(&format!("{}/page{}", server.uri(), i)).unwrap();
            queues
                .work_tx
                .send(WorkMessage::Crawl(WorkItem {
                    url,
                    should_expand: true,
                }))
                .unwrap();
        }

        for _ in 0..4 {
            let result = queues.results_rx.recv_async().await.unwrap();
            assert_eq!(result.status, Some(200));
        }

        stop(&queues.work_tx, running.len());
        for worker in running {
            worker.join().await;
        }

        // every worker dropped its result sender on exit
        assert!(queues.results_rx.recv_async().await.is_err());
    }
}
