use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_PROCESSING: &str = "PROCESSING";
pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const STATUS_FAILED: &str = "FAILED";

/// The two notifications sent after a booking is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTask {
    /// Email to the guest; retried on failure.
    GuestConfirmation,
    /// Email to the listing's host; never retried.
    HostNotification,
}

impl NotificationTask {
    pub const ALL: [NotificationTask; 2] = [NotificationTask::GuestConfirmation, NotificationTask::HostNotification];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTask::GuestConfirmation => "send_booking_confirmation_email",
            NotificationTask::HostNotification => "send_booking_notification_to_host",
        }
    }

    pub fn max_retries(&self) -> i32 {
        match self {
            NotificationTask::GuestConfirmation => 3,
            NotificationTask::HostNotification => 0,
        }
    }
}

impl fmt::Display for NotificationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationTask::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| format!("Unknown job type {}", s))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPayload {
    pub booking_id: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub payload: Json<JobPayload>,
    pub execute_at: DateTime<Utc>,
    pub status: String,
    pub retries: i32,
    pub max_retries: i32,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(task: NotificationTask, booking_id: String, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: task.as_str().to_string(),
            payload: Json(JobPayload { booking_id }),
            execute_at,
            status: STATUS_PENDING.to_string(),
            retries: 0,
            max_retries: task.max_retries(),
            result: None,
            error_message: None,
            created_at: Utc::now(),
            claimed_at: None,
        }
    }

    pub fn booking_id(&self) -> &str {
        &self.payload.booking_id
    }

    pub fn can_retry(&self) -> bool {
        self.retries < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_round_trips_through_its_name() {
        for task in NotificationTask::ALL {
            assert_eq!(task.as_str().parse::<NotificationTask>(), Ok(task));
        }
        assert!("CONFIRMATION".parse::<NotificationTask>().is_err());
    }

    #[test]
    fn guest_jobs_allow_three_retries() {
        let mut job = Job::new(NotificationTask::GuestConfirmation, "b1".into(), Utc::now());
        assert_eq!(job.status, STATUS_PENDING);
        for _ in 0..3 {
            assert!(job.can_retry());
            job.retries += 1;
        }
        assert!(!job.can_retry());
    }

    #[test]
    fn host_jobs_never_retry() {
        let job = Job::new(NotificationTask::HostNotification, "b1".into(), Utc::now());
        assert_eq!(job.max_retries, 0);
        assert!(!job.can_retry());
    }
}
