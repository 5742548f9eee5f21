//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori di configurazione (fatali) da errori per singolo file
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Backup`: Copia di backup fallita prima della modifica del file
//! - `Optimizer`: L'ottimizzatore esterno è uscito con stato non-zero
//! - `Timeout`: L'ottimizzatore esterno non ha terminato in tempo
//! - `Grew`: L'ottimizzatore ha ingrandito il file invece di ridurlo
//! - `Timestamps`: Ripristino di atime/mtime fallito
//! - `Worker`: Il processo worker isolato è fallito o ha risposto male
//! - `Config`: Parametri di configurazione non validi
//! - `UnsupportedPlatform`: Target "intera macchina" non supportato
//!
//! Gli errori per singolo file non escono mai dal pool: vengono convertiti
//! in un `OptimizationResult` fallito. Solo `Config` e `UnsupportedPlatform`
//! terminano il processo.

use std::path::PathBuf;
use std::time::Duration;

/// Custom error types for batch optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup of {path} failed: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Optimizer exited with {status} for {path}: {stderr}")]
    Optimizer {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Optimizer timed out after {0:?}")]
    Timeout(Duration),

    #[error("file grew from {original} to {actual} bytes and was left larger on disk")]
    Grew { original: u64, actual: u64 },

    #[error("Failed to restore timestamps on {path}: {source}")]
    Timestamps {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker process error: {0}")]
    Worker(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
