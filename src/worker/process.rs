use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;

use super::{InvocationFailure, Worker, WorkerResult};
use crate::consts::{
    DEFAULT_MAX_WORKER_OUTPUT, DEFAULT_WORKER_PROGRAM, DEFAULT_WORKER_SCRIPT,
    DEFAULT_WORKER_TIMEOUT,
};
use crate::validate::Task;

/// How to launch the external worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Executable, e.g. `python3`.
    pub program: PathBuf,
    /// Entry script passed as the first argument. `None` runs `program` directly.
    pub script: Option<PathBuf>,
    /// Working directory for the child. `None` inherits the gateway's.
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    /// Per-stream capture cap. Stdout past this is a parse failure; stderr
    /// past this is clipped.
    pub max_output_bytes: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_WORKER_PROGRAM),
            script: Some(PathBuf::from(DEFAULT_WORKER_SCRIPT)),
            working_dir: None,
            timeout: DEFAULT_WORKER_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_WORKER_OUTPUT,
        }
    }
}

/// Spawns one child process per invocation and relays its JSON result.
pub struct ProcessWorker {
    config: WorkerConfig,
}

impl ProcessWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// `<program> [script] --task <task> --text <text>`, one argv entry
    /// each. No shell is involved. On unix the worker leads its own process
    /// group so anything it starts can be killed along with it.
    fn command(&self, task: Task, text: &str) -> Command {
        let mut cmd = Command::new(&self.config.program);
        if let Some(script) = &self.config.script {
            cmd.arg(script);
        }
        cmd.arg("--task")
            .arg(task.as_str())
            .arg("--text")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Wait for exit while draining both pipes. All three run together so
    /// a chatty worker can't block on a full pipe.
    async fn collect(
        child: &mut Child,
        limit: usize,
    ) -> io::Result<(ExitStatus, Captured, Captured)> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::try_join!(child.wait(), drain(stdout, limit), drain(stderr, limit))
    }

    fn settle(
        status: ExitStatus,
        stdout: &Captured,
        stderr: &Captured,
    ) -> Result<WorkerResult, InvocationFailure> {
        if status.success() {
            if stdout.overflowed() {
                return Err(InvocationFailure::OutputParse(format!(
                    "worker output exceeded {} bytes",
                    stdout.bytes.len()
                )));
            }
            return WorkerResult::parse(&stdout.bytes);
        }
        let mut text = String::from_utf8_lossy(&stderr.bytes).into_owned();
        if stderr.overflowed() {
            text.push_str(&format!(
                "\n[stderr clipped: kept {}/{} bytes]",
                stderr.bytes.len(),
                stderr.total
            ));
        }
        Err(InvocationFailure::Exit {
            code: status.code(),
            stderr: text,
        })
    }
}

#[async_trait]
impl Worker for ProcessWorker {
    async fn invoke(&self, task: Task, text: &str) -> Result<WorkerResult, InvocationFailure> {
        let deadline = Instant::now() + self.config.timeout;

        let child = self
            .command(task, text)
            .spawn()
            .map_err(InvocationFailure::Spawn)?;
        tracing::debug!(pid = child.id(), %task, "worker started");
        let mut running = Running::new(child);

        let collected = tokio::time::timeout_at(
            deadline,
            Self::collect(&mut running.child, self.config.max_output_bytes),
        )
        .await;
        match collected {
            Ok(Ok((status, stdout, stderr))) => {
                running.release();
                Self::settle(status, &stdout, &stderr)
            }
            Ok(Err(e)) => {
                running.terminate().await;
                Err(InvocationFailure::Exit {
                    code: None,
                    stderr: format!("failed to collect worker output: {e}"),
                })
            }
            Err(_) => {
                running.terminate().await;
                Err(InvocationFailure::Timeout(self.config.timeout))
            }
        }
    }
}

/// A spawned worker and its process group. Dropping it while the group is
/// still held kills the whole group, so a cancelled invocation takes any
/// grandchildren down with the worker.
struct Running {
    child: Child,
    group: Option<u32>,
}

impl Running {
    fn new(child: Child) -> Self {
        let group = if cfg!(unix) { child.id() } else { None };
        Self { child, group }
    }

    /// The worker finished on its own; stop tracking its group.
    fn release(&mut self) {
        self.group = None;
    }

    fn kill(&mut self) {
        match self.group.take() {
            Some(pgid) => kill_group(pgid),
            None => {
                if let Err(e) = self.child.start_kill() {
                    tracing::warn!("failed to kill worker: {e}");
                }
            }
        }
    }

    /// Kill and reap. Errors are logged; the caller's outcome stands either way.
    async fn terminate(&mut self) {
        self.kill();
        if let Err(e) = self.child.wait().await {
            tracing::warn!("failed to reap worker: {e}");
        }
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        if self.group.is_some() {
            self.kill();
        }
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers; a negative pid addresses the group.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let e = io::Error::last_os_error();
        if e.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, "failed to kill worker process group: {e}");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Bytes kept from one stream, and how many the worker actually wrote.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    total: usize,
}

impl Captured {
    fn overflowed(&self) -> bool {
        self.total > self.bytes.len()
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes. The rest is read
/// and discarded so the worker never stalls on a full pipe.
async fn drain<R: AsyncRead + Unpin>(stream: Option<R>, limit: usize) -> io::Result<Captured> {
    let mut captured = Captured::default();
    let Some(mut stream) = stream else {
        return Ok(captured);
    };
    let mut chunk = [0u8; 8 * 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(captured.bytes.len());
        captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
        captured.total += n;
    }
    Ok(captured)
}
