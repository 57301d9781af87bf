use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::IngestError;
use crate::state::SharedState;

pub struct Scheduler {
    state: Arc<SharedState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: Arc<SharedState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        // One run at process start, then the regular cadence.
        run_ingest(&self.state).await;

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_ingest(&state).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.fetch_interval_minutes;

        info!("Scheduler running every {} minutes", interval_mins);

        let mut fetch_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));
        // The first tick fires immediately; the startup run already covered it.
        fetch_interval.tick().await;

        loop {
            fetch_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            info!("Running scheduled article fetch...");
            run_ingest(&self.state).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

/// A failed run is fatal to that run only, never to the scheduler.
async fn run_ingest(state: &Arc<SharedState>) {
    match state.ingest.run().await {
        Ok(stats) => info!(
            fetched = stats.fetched,
            existing = stats.existing,
            inserted = stats.inserted,
            batches = stats.batches,
            "Scheduled fetch complete"
        ),
        Err(IngestError::AlreadyRunning) => {}
        Err(e) => error!("Scheduled fetch failed: {}", e),
    }
}
