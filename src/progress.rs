//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di ottimizzazione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar principale (`indicatif`)
//! - `Aggregator`: Accumula i risultati man mano che arrivano
//! - `RunSummary`: Riepilogo finale immutabile
//!
//! ## Statistiche tracciate:
//! - **processed_count**: Totale file elaborati
//! - **failed_count**: File falliti (dimensione invariata)
//! - **total_original_bytes**: Somma delle dimensioni originali
//! - **total_final_bytes**: Somma delle dimensioni finali
//!
//! ## Invariante:
//! `total_original_bytes >= total_final_bytes` sempre: un file fallito
//! contribuisce la stessa dimensione a entrambi i totali.
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) [OK] photo.jpg: 45.2% saved
//! ```

use crate::file_manager::FileManager;
use crate::task::{file_name_of, CompletedTask, OptimizationResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for batch optimization
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one completed file
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Tick for a completed task, with a short per-file status
    pub fn file_completed(&self, done: &CompletedTask) {
        let name = file_name_of(&done.path);
        let message = if done.result.success {
            format!(
                "[OK] {}: {:.1}% saved",
                name,
                FileManager::calculate_reduction(done.result.original_size, done.result.final_size)
            )
        } else {
            format!("[ERROR] {}", name)
        };
        self.update(&message);
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}

/// Final totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_original_bytes: u64,
    pub total_final_bytes: u64,
    pub processed_count: usize,
    pub failed_count: usize,
}

/// How widespread the failures of a run were
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAssessment {
    /// Some files failed; typically corrupt or locked individual files
    Scattered,
    /// Every file failed; typically a missing or broken optimizer
    Systemic,
}

impl RunSummary {
    pub fn succeeded_count(&self) -> usize {
        self.processed_count - self.failed_count
    }

    pub fn saved_bytes(&self) -> u64 {
        self.total_original_bytes - self.total_final_bytes
    }

    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_bytes, self.total_final_bytes)
    }

    pub fn failure_assessment(&self) -> Option<FailureAssessment> {
        match self.failed_count {
            0 => None,
            n if n == self.processed_count => Some(FailureAssessment::Systemic),
            _ => Some(FailureAssessment::Scattered),
        }
    }

    /// Original, final and saved totals, human readable
    pub fn formatted_sizes(&self) -> (String, String, String) {
        (
            FileManager::format_size(self.total_original_bytes),
            FileManager::format_size(self.total_final_bytes),
            FileManager::format_size(self.saved_bytes()),
        )
    }

    pub fn format_summary(&self) -> String {
        let (original, optimized, saved) = self.formatted_sizes();
        format!(
            "Processed: {} files | Failed: {} | {} -> {} | Saved: {} ({:.2}%)",
            self.processed_count,
            self.failed_count,
            original,
            optimized,
            saved,
            self.reduction_percent()
        )
    }
}

/// Accumulates results as they arrive. Owned by the single collecting loop.
#[derive(Debug, Default)]
pub struct Aggregator {
    summary: RunSummary,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &OptimizationResult) {
        let summary = &mut self.summary;
        summary.processed_count += 1;
        summary.total_original_bytes += result.original_size;

        if result.success {
            summary.total_final_bytes += result.final_size.min(result.original_size);
        } else {
            summary.failed_count += 1;
            summary.total_final_bytes += result.original_size;
        }
    }

    /// Snapshot of the running totals
    pub fn current(&self) -> RunSummary {
        self.summary
    }

    pub fn finish(self) -> RunSummary {
        self.summary
    }
}
