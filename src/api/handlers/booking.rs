use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateBookingRequest, UpdateBookingRequest};
use crate::api::dtos::responses::{BookingCreatedResponse, BOOKING_CREATED_MESSAGE};
use crate::domain::models::booking::{is_valid_status, Booking, NewBookingParams};
use crate::domain::services::notification::enqueue_booking_notifications;
use crate::error::AppError;
use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let listing = state.listing_repo.find_by_id(&payload.listing_id).await?
        .ok_or(AppError::Validation("Listing does not exist".into()))?;

    validate_stay(payload.check_in, payload.check_out, payload.guests)?;

    let mut booking = Booking::new(NewBookingParams {
        listing_id: listing.id,
        guest_id: user.id,
        check_in: payload.check_in,
        check_out: payload.check_out,
        guests: payload.guests,
    });
    if let Some(status) = payload.status {
        validate_status(&status)?;
        booking.status = status;
    }

    let created = state.booking_repo.create(&booking).await?;
    info!("Booking created: {} for listing {}", created.id, created.listing_id);

    enqueue_booking_notifications(state.task_queue.as_ref(), &created.id).await;

    Ok((StatusCode::CREATED, Json(BookingCreatedResponse {
        message: BOOKING_CREATED_MESSAGE.to_string(),
        booking: created,
    })))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_guest(&user.id).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = find_own_booking(&state, &user, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn replace_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut booking = find_own_booking(&state, &user, &booking_id).await?;

    if payload.listing_id != booking.listing_id
        && state.listing_repo.find_by_id(&payload.listing_id).await?.is_none()
    {
        return Err(AppError::Validation("Listing does not exist".into()));
    }
    validate_stay(payload.check_in, payload.check_out, payload.guests)?;

    booking.listing_id = payload.listing_id;
    booking.check_in = payload.check_in;
    booking.check_out = payload.check_out;
    booking.guests = payload.guests;
    if let Some(status) = payload.status {
        validate_status(&status)?;
        booking.status = status;
    }

    let updated = state.booking_repo.update(&booking).await?;
    info!("Booking replaced: {}", updated.id);
    Ok(Json(updated))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut booking = find_own_booking(&state, &user, &booking_id).await?;

    let dates_changed = payload.check_in.is_some() || payload.check_out.is_some();
    if let Some(check_in) = payload.check_in { booking.check_in = check_in; }
    if let Some(check_out) = payload.check_out { booking.check_out = check_out; }
    if let Some(guests) = payload.guests { booking.guests = guests; }
    if let Some(status) = payload.status {
        validate_status(&status)?;
        booking.status = status;
    }

    if booking.check_out <= booking.check_in {
        return Err(AppError::Validation("Check-out date must be after check-in date".into()));
    }
    if dates_changed && booking.check_in < Utc::now().date_naive() {
        return Err(AppError::Validation("Check-in date cannot be in the past".into()));
    }
    if booking.guests < 1 {
        return Err(AppError::Validation("At least one guest is required".into()));
    }

    let updated = state.booking_repo.update(&booking).await?;
    info!("Booking updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = find_own_booking(&state, &user, &booking_id).await?;
    state.booking_repo.delete(&user.id, &booking.id).await?;
    info!("Booking deleted: {}", booking.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Delivery state of the notification jobs queued for one booking.
pub async fn list_booking_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = find_own_booking(&state, &user, &booking_id).await?;
    let jobs = state.job_repo.list_by_booking(&booking.id).await?;
    Ok(Json(jobs))
}

async fn find_own_booking(state: &AppState, user: &AuthUser, booking_id: &str) -> Result<Booking, AppError> {
    state.booking_repo.find_for_guest(&user.id, booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))
}

fn validate_stay(check_in: NaiveDate, check_out: NaiveDate, guests: i32) -> Result<(), AppError> {
    if check_out <= check_in {
        return Err(AppError::Validation("Check-out date must be after check-in date".into()));
    }
    if check_in < Utc::now().date_naive() {
        return Err(AppError::Validation("Check-in date cannot be in the past".into()));
    }
    if guests < 1 {
        return Err(AppError::Validation("At least one guest is required".into()));
    }
    Ok(())
}

fn validate_status(status: &str) -> Result<(), AppError> {
    if !is_valid_status(status) {
        return Err(AppError::Validation(format!("Invalid booking status: {}", status)));
    }
    Ok(())
}
