//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `batch_optimizer`: Orchestratore principale
//! - `scheduler`: Pool limitato di slot concorrenti
//! - `worker`: Esecuzione isolata di un Task in un processo separato

pub mod batch_optimizer;
pub mod scheduler;
pub mod worker;

pub use batch_optimizer::BatchOptimizer;
pub use scheduler::Scheduler;
pub use worker::{Launcher, ProcessLauncher};
