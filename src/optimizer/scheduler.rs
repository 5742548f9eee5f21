//! # Worker Pool / Scheduler
//!
//! Distribuisce i Task su un pool limitato di slot concorrenti.
//!
//! ## Garanzie:
//! - Al massimo `workers` invocazioni in volo (semaforo con `workers` permessi)
//! - I permessi vengono acquisiti nell'ordine di sottomissione
//! - Un callback per ogni Task completato, in ordine di completamento
//! - Ritorna solo quando ogni Task ha prodotto esattamente un risultato
//! - Nessun Task riordinato in sottomissione, perso o deduplicato
//!
//! Gli errori del launcher (crash del worker, timeout, risposta illeggibile)
//! diventano un `OptimizationResult` fallito per quel Task soltanto.

use crate::file_manager::FileManager;
use crate::optimizer::worker::Launcher;
use crate::task::{CompletedTask, OptimizationResult, Task};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, warn};

/// Bounded pool feeding Tasks to a [`Launcher`]
pub struct Scheduler {
    launcher: Arc<dyn Launcher>,
    workers: usize,
}

impl Scheduler {
    pub fn new(launcher: Arc<dyn Launcher>, workers: usize) -> Self {
        Self {
            launcher,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every Task, calling `on_complete` as each one finishes.
    ///
    /// Returns the completed Tasks in completion order.
    pub async fn run<F>(&self, tasks: Vec<Task>, mut on_complete: F) -> Vec<CompletedTask>
    where
        F: FnMut(&CompletedTask),
    {
        let total = tasks.len();
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(Self::dispatch(
            tasks,
            self.launcher.clone(),
            Arc::new(Semaphore::new(self.workers)),
            sender,
        ));

        let mut completed = Vec::with_capacity(total);
        while let Some(done) = receiver.recv().await {
            on_complete(&done);
            completed.push(done);
        }

        if let Err(e) = dispatcher.await {
            error!("Task dispatcher failed: {}", e);
        }
        if completed.len() != total {
            error!("Only {} of {} tasks reported back", completed.len(), total);
        }

        completed
    }

    /// Hand Tasks to the pool in submission order, one permit per in-flight Task
    async fn dispatch(
        tasks: Vec<Task>,
        launcher: Arc<dyn Launcher>,
        semaphore: Arc<Semaphore>,
        sender: mpsc::UnboundedSender<CompletedTask>,
    ) {
        for (index, task) in tasks.into_iter().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Worker pool closed: {}", e);
                    return;
                }
            };

            let launcher = launcher.clone();
            let sender = sender.clone();
            debug!("Dispatching task {}: {}", index, task.path.display());

            tokio::spawn(async move {
                let _permit = permit;
                let done = execute_isolated(launcher.as_ref(), index, task).await;
                // Receiver only goes away if the caller was dropped
                let _ = sender.send(done);
            });
        }
    }
}

async fn execute_isolated(launcher: &dyn Launcher, index: usize, task: Task) -> CompletedTask {
    let original_size = FileManager::file_size(&task.path).await.unwrap_or(0);

    let result = match AssertUnwindSafe(launcher.launch(&task)).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!("Task {} ({}) failed: {}", index, task.path.display(), e);
            OptimizationResult::failed(original_size, e)
        }
        Err(_) => {
            error!("Task {} ({}) panicked", index, task.path.display());
            OptimizationResult::failed(original_size, "worker panicked")
        }
    };

    CompletedTask {
        index,
        path: task.path,
        result,
    }
}
