//! Jobs-table task queue.
//!
//! Submitting inserts a PENDING row; the worker reports each run back through
//! [`JobQueue::complete`], [`JobQueue::fail`] or [`JobQueue::retry`].

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::models::job::{Job, NotificationTask, STATUS_COMPLETED, STATUS_FAILED};
use crate::domain::ports::{JobRepository, TaskQueue};
use crate::domain::services::notification::Retry;
use crate::error::AppError;

/// Where a single job invocation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Sent,
    RetryScheduled { execute_at: DateTime<Utc> },
    FailedTerminal,
}

/// Task queue backed by the `jobs` table.
pub struct JobQueue {
    repo: Arc<dyn JobRepository>,
}

impl JobQueue {
    pub fn new(repo: Arc<dyn JobRepository>) -> Self {
        Self { repo }
    }

    pub async fn complete(&self, job: &Job, result: String) -> Result<JobOutcome, AppError> {
        info!("Job {} completed: {}", job.id, result);
        self.repo.update_status(&job.id, STATUS_COMPLETED, Some(result), None).await?;
        Ok(JobOutcome::Sent)
    }

    /// Terminal failure that the job itself reported.
    pub async fn fail(&self, job: &Job, reason: String) -> Result<JobOutcome, AppError> {
        warn!("Job {} failed permanently: {}", job.id, reason);
        self.repo.update_status(&job.id, STATUS_FAILED, Some(reason.clone()), Some(reason)).await?;
        Ok(JobOutcome::FailedTerminal)
    }

    /// Reschedules the job after `retry.countdown`, or marks it failed once
    /// its retry budget is spent.
    pub async fn retry(&self, job: &Job, retry: Retry) -> Result<JobOutcome, AppError> {
        if !job.can_retry() {
            let msg = format!("Max retries ({}) exceeded for job {}: {}", job.max_retries, job.id, retry.cause);
            error!("{}", msg);
            self.repo.update_status(&job.id, STATUS_FAILED, None, Some(msg)).await?;
            return Ok(JobOutcome::FailedTerminal);
        }

        let countdown = chrono::Duration::from_std(retry.countdown)
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid retry countdown: {}", e)))?;
        let execute_at = Utc::now() + countdown;
        let attempt = job.retries + 1;

        warn!(
            "Retry {}/{} for job {} scheduled at {} ({})",
            attempt, job.max_retries, job.id, execute_at, retry.cause
        );
        self.repo.reschedule(&job.id, execute_at, attempt, Some(retry.cause.to_string())).await?;
        Ok(JobOutcome::RetryScheduled { execute_at })
    }
}

#[async_trait]
impl TaskQueue for JobQueue {
    async fn submit(&self, task: NotificationTask, booking_id: &str) -> Result<(), AppError> {
        let job = Job::new(task, booking_id.to_string(), Utc::now());
        let created = self.repo.create(&job).await?;
        debug!("Queued {} job {} for booking {}", task, created.id, booking_id);
        Ok(())
    }
}
