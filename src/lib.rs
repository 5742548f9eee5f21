//! # picoptim Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test di integrazione
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `task`: Task (unità di lavoro) e OptimizationResult
//! - `file_manager`: Discovery dei file e utilità
//! - `executor`: Trasformazione di un singolo file (backup, timestamp, ottimizzatore)
//! - `optimizer`: Orchestratore, pool di worker, processi isolati
//! - `progress`: Progress bar e aggregazione statistiche
//! - `platform` / `tool_resolver`: Target e binario dell'ottimizzatore
//!
//! ## Utilizzo:
//! ```ignore
//! use picoptim::{BatchOptimizer, Config};
//!
//! let optimizer = BatchOptimizer::new(Config::default())?;
//! let summary = optimizer.run(&[path]).await?;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod file_manager;
pub mod optimizer;
pub mod platform;
pub mod progress;
pub mod task;
pub mod tool_resolver;

pub use config::{Config, OptimizationMode};
pub use error::OptimizeError;
pub use executor::TransformExecutor;
pub use optimizer::{BatchOptimizer, Launcher, ProcessLauncher, Scheduler};
pub use progress::{Aggregator, RunSummary};
pub use task::{CompletedTask, OptimizationResult, Task};
