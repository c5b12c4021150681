//! Process backend: one OS process per worker
//!
//! Workers are copies of the linkcrawl executable started with
//! [`WORKER_PROCESS_FLAG`]. Each child is paired with a proxy task in the
//! parent that moves messages between the shared queues and the child's
//! pipes. The pipes carry newline-delimited JSON:
//!
//! - parent to child: the [`WorkerConfig`], then one [`WorkMessage`] per line
//! - child to parent: one [`FetchResult`] per `Crawl` message
//!
//! A child that dies mid-item is reported as a `WorkerProcess` exception
//! for that item and replaced before the next one.

use crate::crawler::{
    FetchException, FetchResult, PageWorker, WorkItem, WorkMessage, WorkerConfig,
};
use crate::pool::{RunningWorker, WorkerInit, WorkerPool};
use crate::CrawlError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines,
};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Command-line flag that turns the executable into a worker process
pub const WORKER_PROCESS_FLAG: &str = "--worker-process";

/// Exception kind reported when a worker process fails
const WORKER_PROCESS_EXCEPTION: &str = "WorkerProcess";

/// A worker process that has not been started yet
#[derive(Debug)]
pub struct PendingProcess {
    index: usize,
    init: WorkerInit,
}

/// Runs workers as separate OS processes
#[derive(Debug, Clone)]
pub struct ProcessPool {
    program: PathBuf,
}

impl ProcessPool {
    /// Creates a pool whose workers run `program` with [`WORKER_PROCESS_FLAG`]
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl WorkerPool for ProcessPool {
    type Handle = PendingProcess;

    fn name(&self) -> &'static str {
        "process"
    }

    fn spawn(&self, count: usize, init: WorkerInit) -> crate::Result<Vec<PendingProcess>> {
        Ok((0..count)
            .map(|index| PendingProcess {
                index,
                init: init.clone(),
            })
            .collect())
    }

    fn start(&self, handles: Vec<PendingProcess>) -> crate::Result<Vec<RunningWorker>> {
        let mut running = Vec::with_capacity(handles.len());

        for pending in handles {
            let child = WorkerProcess::launch(&self.program)?;
            tracing::debug!(
                "Started worker process {} (pid {:?})",
                pending.index,
                child.child.id()
            );

            let program = self.program.clone();
            running.push(RunningWorker::Task(tokio::spawn(proxy(
                program,
                child,
                pending.init,
            ))));
        }

        Ok(running)
    }
}

/// A running child and its pipes
struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    configured: bool,
}

impl WorkerProcess {
    fn launch(program: &Path) -> crate::Result<Self> {
        let mut child = Command::new(program)
            .arg(WORKER_PROCESS_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CrawlError::Ipc("worker process has no stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CrawlError::Ipc("worker process has no stdout".to_string()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            configured: false,
        })
    }

    async fn crawl(&mut self, config: &WorkerConfig, item: &WorkItem) -> crate::Result<FetchResult> {
        if !self.configured {
            write_line(&mut self.stdin, config).await?;
            self.configured = true;
        }

        write_line(&mut self.stdin, &WorkMessage::Crawl(item.clone())).await?;
        let result: FetchResult = read_line(&mut self.stdout)
            .await?
            .ok_or_else(|| CrawlError::Ipc("worker process closed its output".to_string()))?;

        if result.original_url != item.url {
            return Err(CrawlError::Ipc(format!(
                "expected a result for {}, got one for {}",
                item.url, result.original_url
            )));
        }

        Ok(result)
    }

    /// Asks the child to exit and waits for it
    async fn shutdown(mut self) {
        if self.configured {
            let _ = write_line(&mut self.stdin, &WorkMessage::Done).await;
        }
        drop(self.stdin);

        match self.child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::warn!("Worker process exited with {}", status),
            Err(e) => tracing::warn!("Failed to wait for worker process: {}", e),
        }
    }

    async fn kill(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!("Failed to kill worker process: {}", e);
        }
    }
}

/// Moves work from the shared queue to one child and its results back
async fn proxy(program: PathBuf, child: WorkerProcess, init: WorkerInit) {
    let mut child = Some(child);

    while let Ok(message) = init.work.recv_async().await {
        let item = match message {
            WorkMessage::Crawl(item) => item,
            WorkMessage::Done => break,
        };

        if child.is_none() {
            match WorkerProcess::launch(&program) {
                Ok(relaunched) => child = Some(relaunched),
                Err(e) => tracing::error!("Failed to relaunch worker process: {}", e),
            }
        }

        let outcome = match child.as_mut() {
            Some(process) => process.crawl(&init.config, &item).await,
            None => Err(CrawlError::Ipc("no worker process available".to_string())),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Worker process failed on {}: {}", item.url, e);
                if let Some(process) = child.take() {
                    process.kill().await;
                }
                FetchResult::exception(
                    item.url.clone(),
                    FetchException::new(WORKER_PROCESS_EXCEPTION, e.to_string()),
                )
            }
        };

        if init.results.send(result).is_err() {
            tracing::debug!("Result queue closed, proxy exiting");
            break;
        }
    }

    if let Some(process) = child {
        process.shutdown().await;
    }
}

/// Entry point of a worker process
///
/// Serves the parent over stdin and stdout until a `Done` message or the
/// end of input.
pub async fn run_worker_process() -> crate::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(stdin, stdout).await
}

async fn serve<R, W>(reader: R, mut writer: W) -> crate::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    let config: WorkerConfig = match read_line(&mut lines).await? {
        Some(config) => config,
        None => return Ok(()),
    };
    let worker = PageWorker::new(&config)?;
    tracing::debug!("Worker process ready (pid {})", std::process::id());

    while let Some(message) = read_line::<_, WorkMessage>(&mut lines).await? {
        let item = match message {
            WorkMessage::Crawl(item) => item,
            WorkMessage::Done => break,
        };

        let result = worker.crawl_page(&item).await;
        write_line(&mut writer, &result).await?;
    }

    Ok(())
}

async fn write_line<W, T>(writer: &mut W, value: &T) -> crate::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_string(value).map_err(|e| CrawlError::Ipc(e.to_string()))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_line<R, T>(lines: &mut Lines<R>) -> crate::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    match lines.next_line().await? {
        Some(line) => serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| CrawlError::Ipc(format!("malformed message: {}", e))),
        None => Ok(None),
    }
}
