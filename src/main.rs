//! # picoptim - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Risoluzione della configurazione (default → file utente → `--config` → flag CLI)
//! - Risoluzione del target (path, drive, o `all`)
//! - Modalità worker nascosta (`--worker`) usata dal pool di processi
//!
//! ## Exit code:
//! - `1` per errori di configurazione (quality, target, piattaforma)
//! - `0` a fine run, anche se alcuni file sono falliti
//!
//! ## Esempio di utilizzo:
//! ```bash
//! picoptim /path/to/images --lossy --quality 75 --strip-metadata --workers 8
//! ```

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use picoptim::config::DEFAULT_LOSSY_QUALITY;
use picoptim::optimizer::worker::run_worker;
use picoptim::{platform, BatchOptimizer, Config, OptimizationMode, OptimizeError};

#[derive(Parser, Debug)]
#[command(name = "picoptim")]
#[command(about = "Optimize JPEG images in bulk with jpegoptim, preserving timestamps")]
struct Args {
    /// Directory, drive (e.g. D:) or "all" for the entire machine [default: .]
    target: Option<String>,

    /// Lossless optimization (no quality reduction)
    #[arg(long, conflicts_with = "lossy")]
    lossless: bool,

    /// Lossy optimization (reduce quality)
    #[arg(long)]
    lossy: bool,

    /// Quality for lossy optimization (1-100, implies --lossy)
    #[arg(short, long, conflicts_with = "lossless")]
    quality: Option<u32>,

    /// Remove all image metadata
    #[arg(long)]
    strip_metadata: bool,

    /// Keep a <name>.bak copy of every file before optimizing it
    #[arg(long)]
    backup: bool,

    /// Number of parallel worker processes [default: 2 x CPUs]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seconds allowed for a single optimizer run
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the jpegoptim binary
    #[arg(long)]
    optimizer: Option<PathBuf>,

    /// Comma-separated extensions to optimize
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Load settings from a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the resolved settings to a JSON config file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run a single task read from stdin (used by the worker pool)
    #[arg(long, hide = true)]
    worker: bool,
}

impl Args {
    /// Layer CLI flags over the user config file and the `--config` file
    async fn resolve_config(&self) -> Result<Config> {
        let mut config = match Config::default_path() {
            Some(path) if path.exists() => {
                debug!("Loading user config from {}", path.display());
                Config::from_file(&path).await?
            }
            _ => Config::default(),
        };

        if let Some(ref path) = self.config {
            if !path.exists() {
                return Err(OptimizeError::Config(format!(
                    "Config file does not exist: {}",
                    path.display()
                ))
                .into());
            }
            config = Config::from_file(path).await?;
        }

        config.mode = self.resolve_mode(config.mode)?;
        config.strip_metadata |= self.strip_metadata;
        config.backup |= self.backup;
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(ref optimizer) = self.optimizer {
            config.optimizer = Some(optimizer.clone());
        }
        if let Some(ref extensions) = self.extensions {
            config.extensions = extensions.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn resolve_mode(&self, base: OptimizationMode) -> Result<OptimizationMode, OptimizeError> {
        let quality = self
            .quality
            .map(|q| {
                u8::try_from(q)
                    .ok()
                    .filter(|q| (1..=100).contains(q))
                    .ok_or_else(|| {
                        OptimizeError::Config(format!("Quality must be between 1 and 100, got {}", q))
                    })
            })
            .transpose()?;

        if self.lossless {
            return Ok(OptimizationMode::Lossless);
        }
        if !self.lossy && quality.is_none() {
            return Ok(base);
        }

        let inherited = match base {
            OptimizationMode::Lossy { quality } => Some(quality),
            OptimizationMode::Lossless => None,
        };
        Ok(OptimizationMode::Lossy {
            quality: quality.or(inherited).unwrap_or(DEFAULT_LOSSY_QUALITY),
        })
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout is reserved for the worker protocol
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Parse the command line; usage errors are configuration errors and exit 1
fn parse_args() -> Result<Args> {
    match Args::try_parse() {
        Ok(args) => Ok(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            e.print()?;
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    init_logging(args.verbose)?;

    if args.worker {
        return run_worker().await;
    }

    let config = args.resolve_config().await?;

    if let Some(ref path) = args.save_config {
        config.save_to_file(path).await?;
        info!("Saved configuration to {}", path.display());
    }

    let roots = platform::resolve_target(args.target.as_deref().unwrap_or("."))?;

    let mut optimizer = BatchOptimizer::new(config)?;
    if args.quiet {
        optimizer = optimizer.quiet();
    }
    optimizer.run(&roots).await?;

    Ok(())
}
