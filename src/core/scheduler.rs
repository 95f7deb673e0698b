//! Fixed-delay scheduler for the publish sweeps.
//!
//! Each registered task runs on its own tokio task. The next run is only
//! scheduled once the previous one has returned, so a task never overlaps
//! itself; different tasks run independently of each other.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::core::publishing::{PublishPayload, RetrySweeper, UnconfirmedSweeper};
use crate::error::{AppError, Result};

#[async_trait]
pub trait PeriodicTask: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run_once(&self);
}

#[async_trait]
impl<P: PublishPayload> PeriodicTask for UnconfirmedSweeper<P> {
    fn name(&self) -> &'static str {
        "unconfirmed-sweeper"
    }

    async fn run_once(&self) {
        self.sweep().await;
    }
}

#[async_trait]
impl<P: PublishPayload> PeriodicTask for RetrySweeper<P> {
    fn name(&self) -> &'static str {
        "retry-sweeper"
    }

    async fn run_once(&self) {
        self.sweep().await;
    }
}

struct ScheduledTask {
    task: Arc<dyn PeriodicTask>,
    delay: Duration,
}

pub struct SweepScheduler {
    tasks: Vec<ScheduledTask>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl SweepScheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Run `task` every `delay`, measured from the end of its previous run.
    pub fn register(&mut self, task: Arc<dyn PeriodicTask>, delay: Duration) {
        self.tasks.push(ScheduledTask { task, delay });
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub async fn is_running(&self) -> bool {
        self.shutdown.lock().await.is_some()
    }

    pub async fn start(&self) -> Result<()> {
        let mut shutdown = self.shutdown.lock().await;
        if shutdown.is_some() {
            return Err(AppError::SchedulerError(
                "Sweep scheduler is already running".to_string(),
            ));
        }

        let (tx, rx) = watch::channel(false);
        let mut handles = self.handles.lock().await;
        for scheduled in &self.tasks {
            handles.push(tokio::spawn(run_fixed_delay(
                scheduled.task.clone(),
                scheduled.delay,
                rx.clone(),
            )));
        }
        *shutdown = Some(tx);

        info!(tasks = self.tasks.len(), "Sweep scheduler started");
        Ok(())
    }

    /// Stop every task after its current run. Store entries are left as they are.
    pub async fn stop(&self) -> Result<()> {
        let Some(tx) = self.shutdown.lock().await.take() else {
            return Ok(());
        };
        // Receivers may already be gone if every task exited.
        let _ = tx.send(true);

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Sweep task ended abnormally");
            }
        }

        info!("Sweep scheduler stopped");
        Ok(())
    }
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_fixed_delay(
    task: Arc<dyn PeriodicTask>,
    delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(task = task.name(), delay_ms = delay.as_millis() as u64, "Sweep task scheduled");
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                if AssertUnwindSafe(task.run_once()).catch_unwind().await.is_err() {
                    error!(task = task.name(), "Sweep task panicked, continuing with next run");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!(task = task.name(), "Sweep task exited");
}
