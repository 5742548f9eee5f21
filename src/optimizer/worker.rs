//! # Isolated Worker Processes
//!
//! Ogni Task gira in un processo separato: il binario stesso rilanciato con
//! `--worker`. Il processo padre scrive una `WorkerRequest` JSON su stdin e
//! legge un `OptimizationResult` JSON da stdout. Un crash, un'uscita non-zero,
//! una risposta illeggibile o un superamento del tempo limite del worker
//! diventano un errore per quel solo Task.

use crate::error::OptimizeError;
use crate::executor::TransformExecutor;
use crate::task::{OptimizationResult, Task};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;

/// Hidden CLI flag that switches the binary into worker mode
pub const WORKER_FLAG: &str = "--worker";

/// Extra wall-clock allowance for a worker on top of the optimizer timeout
const WORKER_GRACE: Duration = Duration::from_secs(30);

/// Everything a worker process needs to run one Task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub task: Task,
    pub optimizer: PathBuf,
    pub timeout_secs: u64,
}

/// Runs one Task somewhere isolated from the caller and reports its outcome
#[async_trait::async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, task: &Task) -> Result<OptimizationResult, OptimizeError>;
}

/// Launches each Task in a fresh OS process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<OsString>,
    optimizer: PathBuf,
    timeout: Duration,
}

impl ProcessLauncher {
    /// Worker processes run `program --worker`
    pub fn new(program: PathBuf, optimizer: PathBuf, timeout: Duration) -> Self {
        Self {
            program,
            args: vec![WORKER_FLAG.into()],
            optimizer,
            timeout,
        }
    }

    /// Re-execute the running binary as the worker
    pub fn current_exe(optimizer: PathBuf, timeout: Duration) -> Result<Self, OptimizeError> {
        let program = std::env::current_exe()?;
        Ok(Self::new(program, optimizer, timeout))
    }

    fn request_for(&self, task: &Task) -> WorkerRequest {
        WorkerRequest {
            task: task.clone(),
            optimizer: self.optimizer.clone(),
            timeout_secs: self.timeout.as_secs().max(1),
        }
    }
}

#[async_trait::async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, task: &Task) -> Result<OptimizationResult, OptimizeError> {
        let payload = serde_json::to_vec(&self.request_for(task))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OptimizeError::Worker("worker stdin unavailable".to_string()))?;
        stdin.write_all(&payload).await?;
        drop(stdin);

        let limit = self.timeout + WORKER_GRACE;
        let output = tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| OptimizeError::Worker(format!("worker exceeded {:?}, killed", limit)))??;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[worker {}] {}", task.file_name(), line);
        }

        if !output.status.success() {
            return Err(OptimizeError::Worker(format!(
                "worker for {} exited with {}",
                task.path.display(),
                output.status
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            OptimizeError::Worker(format!(
                "unreadable reply for {}: {}",
                task.path.display(),
                e
            ))
        })
    }
}

/// Worker-mode entry point: one request on stdin, one result on stdout
pub async fn run_worker() -> Result<()> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let request: WorkerRequest = serde_json::from_str(&input)?;

    let executor = TransformExecutor::new(
        request.optimizer,
        Duration::from_secs(request.timeout_secs),
    );
    let result = executor.execute(&request.task).await;

    let mut reply = serde_json::to_vec(&result)?;
    reply.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&reply).await?;
    stdout.flush().await?;
    Ok(())
}
