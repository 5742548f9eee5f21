//! # Transform Executor Module
//!
//! Questo modulo esegue la trasformazione di un singolo file.
//!
//! ## Sequenza per ogni Task:
//! 1. Legge la dimensione originale
//! 2. Crea il backup `<nome>.bak` se richiesto (se fallisce, il file non viene toccato)
//! 3. Registra atime/mtime del file
//! 4. Costruisce gli argomenti per l'ottimizzatore esterno
//! 5. Esegue l'ottimizzatore con un timeout
//! 6. Ripristina atime/mtime in ogni caso
//! 7. Legge la dimensione finale (se il file è cresciuto il Task fallisce)
//!
//! ## Gestione errori:
//! `execute()` non restituisce mai un errore: ogni fallimento diventa un
//! `OptimizationResult` con `success = false` e `final_size == original_size`.

use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use crate::task::{OptimizationResult, Task};
use filetime::FileTime;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs the backup/preserve/invoke/restore sequence for one file
#[derive(Debug, Clone)]
pub struct TransformExecutor {
    optimizer: PathBuf,
    timeout: Duration,
}

impl TransformExecutor {
    pub fn new(optimizer: PathBuf, timeout: Duration) -> Self {
        Self { optimizer, timeout }
    }

    /// Transform one file. Never fails: errors come back as a failed result.
    pub async fn execute(&self, task: &Task) -> OptimizationResult {
        let original_size = match FileManager::file_size(&task.path).await {
            Ok(size) => size,
            Err(e) => {
                warn!("Cannot read size of {}: {}", task.path.display(), e);
                return OptimizationResult::failed(0, e);
            }
        };

        match self.transform(task, original_size).await {
            Ok(final_size) => {
                debug!(
                    "{}: {} -> {} ({:.1}% saved)",
                    task.path.display(),
                    FileManager::format_size(original_size),
                    FileManager::format_size(final_size),
                    FileManager::calculate_reduction(original_size, final_size)
                );
                OptimizationResult::succeeded(original_size, final_size)
            }
            Err(e) => {
                warn!("Failed to optimize {}: {}", task.path.display(), e);
                OptimizationResult::failed(original_size, e)
            }
        }
    }

    async fn transform(&self, task: &Task, original_size: u64) -> Result<u64, OptimizeError> {
        if task.backup {
            Self::create_backup(&task.path).await?;
        }

        let times = FileTimes::capture(&task.path)?;
        let invoked = self.run_optimizer(task).await;
        let restored = times.restore(&task.path);
        invoked?;
        restored?;

        let final_size = FileManager::file_size(&task.path).await?;

        if final_size > original_size {
            return Err(OptimizeError::Grew {
                original: original_size,
                actual: final_size,
            });
        }

        Ok(final_size)
    }

    async fn create_backup(path: &Path) -> Result<(), OptimizeError> {
        let backup_path = FileManager::backup_path(path);
        tokio::fs::copy(path, &backup_path)
            .await
            .map_err(|source| OptimizeError::Backup {
                path: backup_path.clone(),
                source,
            })?;
        debug!("Backed up {} to {}", path.display(), backup_path.display());
        Ok(())
    }

    async fn run_optimizer(&self, task: &Task) -> Result<(), OptimizeError> {
        let args = optimizer_args(task);
        debug!("Running {:?} {:?}", self.optimizer, args);

        let start_time = Instant::now();
        let output = Command::new(&self.optimizer)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| OptimizeError::Timeout(self.timeout))??;
        let elapsed = start_time.elapsed();

        if !output.status.success() {
            return Err(OptimizeError::Optimizer {
                path: task.path.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("Optimizer finished {} in {:?}", task.path.display(), elapsed);
        Ok(())
    }
}

/// Command line for the optimizer: in place, quality bound, optional strip, file last
pub fn optimizer_args(task: &Task) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--overwrite".into(),
        format!("--max={}", task.mode.max_quality()).into(),
    ];
    if task.strip_metadata {
        args.push("--strip-all".into());
    }
    args.push(task.path.as_os_str().to_os_string());
    args
}

/// Access and modification times captured before the optimizer runs
struct FileTimes {
    accessed: FileTime,
    modified: FileTime,
}

impl FileTimes {
    fn capture(path: &Path) -> Result<Self, OptimizeError> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            accessed: FileTime::from_last_access_time(&metadata),
            modified: FileTime::from_last_modification_time(&metadata),
        })
    }

    fn restore(&self, path: &Path) -> Result<(), OptimizeError> {
        filetime::set_file_times(path, self.accessed, self.modified).map_err(|source| {
            OptimizeError::Timestamps {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
