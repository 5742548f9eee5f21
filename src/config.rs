//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `mode`: `Lossless` oppure `Lossy { quality }` (quality 1-100)
//! - `strip_metadata`: Rimuove tutti i metadata (default: false)
//! - `backup`: Copia `<nome>.bak` prima di modificare il file (default: false)
//! - `workers`: Numero di worker paralleli (default: 2 × CPU)
//! - `timeout_secs`: Tempo massimo per invocazione dell'ottimizzatore (default: 120)
//! - `optimizer`: Path esplicito del binario (default: None = risoluzione automatica)
//! - `extensions`: Estensioni da cercare (default: jpg, jpeg)
//!
//! ## Validazione:
//! - Controlla che quality sia 1-100
//! - Controlla che workers sia > 0
//! - Controlla che timeout_secs sia > 0
//! - Controlla che ci sia almeno un'estensione
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     mode: OptimizationMode::Lossy { quality: 75 },
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::OptimizeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quality used when lossy mode is requested without an explicit value
pub const DEFAULT_LOSSY_QUALITY: u8 = 85;

/// How the optimizer is allowed to treat image data.
///
/// Exactly one mode is active per run: lossless, or lossy bounded by a quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OptimizationMode {
    Lossless,
    Lossy { quality: u8 },
}

impl OptimizationMode {
    /// The `--max` bound passed to the optimizer
    pub fn max_quality(&self) -> u8 {
        match self {
            Self::Lossless => 100,
            Self::Lossy { quality } => *quality,
        }
    }
}

impl Default for OptimizationMode {
    fn default() -> Self {
        Self::Lossless
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lossless => write!(f, "lossless"),
            Self::Lossy { quality } => write!(f, "lossy (quality {})", quality),
        }
    }
}

/// Configuration for batch optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lossless or lossy with a quality bound
    pub mode: OptimizationMode,
    /// Strip all metadata (EXIF, comments, ICC)
    pub strip_metadata: bool,
    /// Keep a `<name>.bak` copy of every file before it is rewritten
    pub backup: bool,
    /// Number of parallel worker processes
    pub workers: usize,
    /// Upper bound for a single optimizer invocation, in seconds
    pub timeout_secs: u64,
    /// Explicit optimizer binary (None = resolve next to the executable, then PATH)
    pub optimizer: Option<PathBuf>,
    /// File extensions to pick up, matched case-insensitively
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: OptimizationMode::Lossless,
            strip_metadata: false,
            backup: false,
            workers: default_workers(),
            timeout_secs: 120,
            optimizer: None,
            extensions: vec!["jpg".to_string(), "jpeg".to_string()],
        }
    }
}

/// Two workers per logical CPU
pub fn default_workers() -> usize {
    (num_cpus::get() * 2).max(1)
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if let OptimizationMode::Lossy { quality } = self.mode {
            if quality == 0 || quality > 100 {
                return Err(OptimizeError::Config(
                    "Quality must be between 1 and 100".to_string(),
                ));
            }
        }

        if self.workers == 0 {
            return Err(OptimizeError::Config(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(OptimizeError::Config(
                "Timeout must be greater than 0 seconds".to_string(),
            ));
        }

        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(OptimizeError::Config(
                "At least one file extension is required".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default per-user config location: `~/.picoptim/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".picoptim").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
