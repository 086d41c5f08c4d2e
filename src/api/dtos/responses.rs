use serde::Serialize;
use crate::domain::models::booking::Booking;

pub const BOOKING_CREATED_MESSAGE: &str = "Booking created successfully. Confirmation email will be sent shortly.";

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub message: String,
    pub booking: Booking,
}
