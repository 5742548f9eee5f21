//! # Task & Result Data Model
//!
//! Un `Task` descrive un'unità di lavoro: un file più la configurazione di
//! trasformazione già risolta. Un `OptimizationResult` è l'esito di un Task,
//! prodotto esattamente una volta e mai modificato.
//!
//! Entrambi attraversano il confine di processo verso i worker come JSON.

use crate::config::{Config, OptimizationMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file plus its resolved transformation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub path: PathBuf,
    pub mode: OptimizationMode,
    pub strip_metadata: bool,
    pub backup: bool,
}

impl Task {
    pub fn new(path: PathBuf, config: &Config) -> Self {
        Self {
            path,
            mode: config.mode,
            strip_metadata: config.strip_metadata,
            backup: config.backup,
        }
    }

    /// Build one Task per discovered file, in discovery order
    pub fn from_files(files: Vec<PathBuf>, config: &Config) -> Vec<Self> {
        files.into_iter().map(|path| Self::new(path, config)).collect()
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// Outcome of a single Task.
///
/// A failed result always reports `final_size == original_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub original_size: u64,
    pub final_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptimizationResult {
    pub fn succeeded(original_size: u64, final_size: u64) -> Self {
        Self {
            success: true,
            original_size,
            final_size,
            error: None,
        }
    }

    pub fn failed(original_size: u64, reason: impl ToString) -> Self {
        Self {
            success: false,
            original_size,
            final_size: original_size,
            error: Some(reason.to_string()),
        }
    }

    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.final_size)
    }
}

/// A result tagged with the submission index of the Task that produced it
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub index: usize,
    pub path: PathBuf,
    pub result: OptimizationResult,
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
