use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_CANCELED: &str = "CANCELED";

pub fn is_valid_status(status: &str) -> bool {
    matches!(status, STATUS_PENDING | STATUS_CONFIRMED | STATUS_CANCELED)
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub listing_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub listing_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            listing_id: params.listing_id,
            guest_id: params.guest_id,
            check_in: params.check_in,
            check_out: params.check_out,
            guests: params.guests,
            status: STATUS_PENDING.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_booking_starts_pending() {
        let booking = Booking::new(NewBookingParams {
            listing_id: "l1".into(),
            guest_id: "g1".into(),
            check_in: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2030, 6, 4).unwrap(),
            guests: 2,
        });
        assert_eq!(booking.status, STATUS_PENDING);
        assert_eq!(booking.nights(), 3);
    }

    #[test]
    fn status_whitelist() {
        assert!(is_valid_status("CONFIRMED"));
        assert!(!is_valid_status("confirmed"));
        assert!(!is_valid_status("ARCHIVED"));
    }
}
