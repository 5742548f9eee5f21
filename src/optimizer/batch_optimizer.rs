//! # Batch Optimizer Orchestrator
//!
//! Orchestratore principale: discovery → Task → pool di worker → aggregazione.
//!
//! ## Flusso di esecuzione:
//! 1. **Inizializzazione**: Valida la config, risolve l'ottimizzatore
//! 2. **Dependency check**: Avvisa se l'ottimizzatore non si trova (non fatale)
//! 3. **File discovery**: Trova i file sotto tutte le root
//! 4. **Parallel processing**: Ogni Task gira in un processo worker isolato
//! 5. **Progress tracking**: Un tick per file completato
//! 6. **Statistics**: L'`Aggregator` raccoglie i risultati in un unico punto
//! 7. **Reporting**: Report finale con byte risparmiati e percentuali

use crate::{
    config::Config,
    file_manager::FileManager,
    optimizer::scheduler::Scheduler,
    optimizer::worker::{Launcher, ProcessLauncher},
    platform,
    progress::{Aggregator, FailureAssessment, ProgressManager, RunSummary},
    task::Task,
    tool_resolver::{ToolPathResolver, OPTIMIZER_TOOL},
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Main batch optimizer orchestrator
pub struct BatchOptimizer {
    config: Config,
    launcher: Arc<dyn Launcher>,
    show_progress: bool,
}

impl BatchOptimizer {
    /// Create an optimizer whose workers re-execute the current binary
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let optimizer = ToolPathResolver::new().resolve_optimizer(&config);
        Self::check_dependencies(&optimizer);

        let launcher = ProcessLauncher::current_exe(optimizer, config.timeout())?;
        Ok(Self::with_launcher(config, Arc::new(launcher)))
    }

    /// Create an optimizer around a custom launcher
    pub fn with_launcher(config: Config, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            config,
            launcher,
            show_progress: true,
        }
    }

    /// Disable the progress bar (scripts, tests)
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Run the optimization process over every root
    pub async fn run(&self, roots: &[PathBuf]) -> Result<RunSummary> {
        self.config.validate()?;
        let start_time = Instant::now();
        self.log_configuration(roots);

        let files = self.discover(roots).await?;
        info!("Found {} files to process", files.len());

        if files.is_empty() {
            info!("No matching files found");
            return Ok(RunSummary::default());
        }

        let tasks = Task::from_files(files, &self.config);
        let progress = self
            .show_progress
            .then(|| ProgressManager::new(tasks.len() as u64));
        let mut aggregator = Aggregator::new();

        let scheduler = Scheduler::new(self.launcher.clone(), self.config.workers);
        scheduler
            .run(tasks, |done| {
                aggregator.record(&done.result);
                if let Some(ref progress) = progress {
                    progress.file_completed(done);
                }
            })
            .await;

        let summary = aggregator.finish();
        if let Some(ref progress) = progress {
            progress.finish(&summary.format_summary());
        }
        self.print_final_stats(&summary, start_time.elapsed().as_secs_f64());

        Ok(summary)
    }

    /// Walk the roots off the async runtime; a spinner covers long scans
    async fn discover(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let spinner = self
            .show_progress
            .then(|| ProgressManager::spinner("Scanning for images..."));

        let roots = roots.to_vec();
        let extensions = self.config.extensions.clone();
        let files =
            tokio::task::spawn_blocking(move || FileManager::find_files(&roots, &extensions))
                .await?;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        Ok(files)
    }

    fn log_configuration(&self, roots: &[PathBuf]) {
        info!("Starting batch optimization on {}", platform::system_info());
        for root in roots {
            info!("📁 Root: {}", root.display());
        }
        info!("🎯 Mode: {}", self.config.mode);
        info!(
            "⚙️ Workers: {} | Timeout: {}s | Extensions: {}",
            self.config.workers,
            self.config.timeout_secs,
            self.config.extensions.join(", ")
        );
        if self.config.strip_metadata {
            info!("🧹 Stripping all metadata");
        }
        if self.config.backup {
            info!("💾 Backups enabled (<name>.bak)");
        }
    }

    /// Missing optimizer is not fatal: every file will fail and the summary says so
    fn check_dependencies(optimizer: &std::path::Path) {
        if ToolPathResolver::is_available(optimizer) {
            info!("🔧 Using optimizer: {}", optimizer.display());
        } else {
            warn!(
                "⚠️ Optimizer {} not found. {}",
                optimizer.display(),
                ToolPathResolver::install_instructions(OPTIMIZER_TOOL)
            );
        }
    }

    fn print_final_stats(&self, summary: &RunSummary, duration: f64) {
        let (original, optimized, saved) = summary.formatted_sizes();

        info!("=== Optimization Complete ===");
        info!("Files processed: {}", summary.processed_count);
        info!("Files optimized: {}", summary.succeeded_count());
        info!("Files failed: {}", summary.failed_count);
        info!("Original size: {}", original);
        info!("Final size: {}", optimized);
        info!("Space saved: {} ({:.2}%)", saved, summary.reduction_percent());
        info!("Duration: {:.1}s", duration);

        match summary.failure_assessment() {
            Some(FailureAssessment::Systemic) => error!(
                "Every file failed. Check that {} is installed and runnable.",
                OPTIMIZER_TOOL
            ),
            Some(FailureAssessment::Scattered) => warn!(
                "{} files could not be optimized; see the warnings above",
                summary.failed_count
            ),
            None => {}
        }
    }
}
