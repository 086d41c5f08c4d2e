use std::sync::Arc;
use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::job::{Job, NotificationTask};
use crate::domain::services::job_queue::JobOutcome;
use crate::error::AppError;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    let interval = state.config.worker_poll_interval;
    let mut runner = JobRunner::new(state);
    loop {
        runner.poll().await;
        sleep(interval).await;
    }
}

/// Claims jobs into free slots and runs them on their own tasks. A poll never
/// waits for running jobs, so a job stuck in the mail transport holds only its
/// own slot.
pub struct JobRunner {
    state: Arc<AppState>,
    running: JoinSet<()>,
}

impl JobRunner {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, running: JoinSet::new() }
    }

    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// Reaps finished jobs, then claims and spawns as many as there are free
    /// slots. Returns the number claimed.
    pub async fn poll(&mut self) -> usize {
        self.reap();

        let free = self.state.config.worker_concurrency.saturating_sub(self.running.len());
        let limit = free.min(self.state.config.worker_batch_size.max(0) as usize);
        if limit == 0 {
            debug!("All {} worker slots busy", self.running.len());
            return 0;
        }

        let stale_before = Utc::now() - self.state.config.job_lease;
        let jobs = match self.state.job_repo.find_pending(limit as i32, stale_before).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Failed to fetch pending jobs: {:?}", e);
                return 0;
            }
        };

        let claimed = jobs.len();
        for job in jobs {
            self.spawn(job);
        }
        claimed
    }

    /// Waits for every running job to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.running.join_next().await {
            log_join(joined);
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.running.try_join_next() {
            log_join(joined);
        }
    }

    fn spawn(&mut self, job: Job) {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            booking_id = %job.booking_id(),
            attempt = job.retries + 1,
        );
        let state = self.state.clone();

        self.running.spawn(
            async move {
                info!("Processing job: {}", job.job_type);
                let job_id = job.id.clone();
                if let Err(e) = run_job(&state, job).await {
                    // Left PROCESSING; reclaimed once its lease runs out.
                    error!("Failed to record outcome of job {}: {:?}", job_id, e);
                }
            }
            .instrument(span),
        );
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!("Job task panicked: {:?}", e);
    }
}

/// Claims one round of jobs and waits for all of them.
pub async fn run_pending_jobs(state: &Arc<AppState>) -> usize {
    let mut runner = JobRunner::new(state.clone());
    let claimed = runner.poll().await;
    runner.drain().await;
    claimed
}

/// Executes one claimed job and records its outcome on the queue.
pub async fn run_job(state: &AppState, job: Job) -> Result<JobOutcome, AppError> {
    let task = match job.job_type.parse::<NotificationTask>() {
        Ok(task) => task,
        Err(reason) => return state.job_queue.fail(&job, reason).await,
    };
    let booking_id = job.booking_id().to_string();

    match task {
        NotificationTask::GuestConfirmation => {
            match state.dispatcher.send_booking_confirmation_email(&booking_id).await {
                Ok(result) => state.job_queue.complete(&job, result).await,
                Err(retry) => state.job_queue.retry(&job, retry).await,
            }
        }
        NotificationTask::HostNotification => {
            match state.dispatcher.send_booking_notification_to_host(&booking_id).await {
                Ok(result) => state.job_queue.complete(&job, result).await,
                Err(failure) => state.job_queue.fail(&job, failure).await,
            }
        }
    }
}
