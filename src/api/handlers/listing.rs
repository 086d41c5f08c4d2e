use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateListingRequest, UpdateListingRequest};
use crate::domain::models::listing::{Listing, NewListingParams};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_listings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let listings = state.listing_repo.list().await?;
    Ok(Json(listings))
}

pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(listing_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let listing = state.listing_repo.find_by_id(&listing_id).await?
        .ok_or(AppError::NotFound("Listing not found".into()))?;
    Ok(Json(listing))
}

pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_listing(&payload.title, payload.price_per_night)?;

    let listing = Listing::new(NewListingParams {
        host_id: user.id,
        title: payload.title.trim().to_string(),
        description: payload.description,
        location: payload.location,
        price_per_night: payload.price_per_night,
    });
    let created = state.listing_repo.create(&listing).await?;

    info!("Listing created: {} by host {}", created.id, created.host_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_listing(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(listing_id): Path<String>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut listing = find_hosted_listing(&state, &user, &listing_id).await?;
    validate_listing(&payload.title, payload.price_per_night)?;

    listing.title = payload.title.trim().to_string();
    listing.description = payload.description;
    listing.location = payload.location;
    listing.price_per_night = payload.price_per_night;
    listing.updated_at = Utc::now();

    let updated = state.listing_repo.update(&listing).await?;
    info!("Listing replaced: {}", updated.id);
    Ok(Json(updated))
}

pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(listing_id): Path<String>,
    Json(payload): Json<UpdateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut listing = find_hosted_listing(&state, &user, &listing_id).await?;

    if let Some(title) = payload.title { listing.title = title.trim().to_string(); }
    if let Some(description) = payload.description { listing.description = description; }
    if let Some(location) = payload.location { listing.location = location; }
    if let Some(price) = payload.price_per_night { listing.price_per_night = price; }
    validate_listing(&listing.title, listing.price_per_night)?;
    listing.updated_at = Utc::now();

    let updated = state.listing_repo.update(&listing).await?;
    info!("Listing updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(listing_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let listing = find_hosted_listing(&state, &user, &listing_id).await?;
    state.listing_repo.delete(&listing.id).await?;
    info!("Listing deleted: {}", listing.id);
    Ok(StatusCode::NO_CONTENT)
}

async fn find_hosted_listing(state: &AppState, user: &AuthUser, listing_id: &str) -> Result<Listing, AppError> {
    let listing = state.listing_repo.find_by_id(listing_id).await?
        .ok_or(AppError::NotFound("Listing not found".into()))?;
    if listing.host_id != user.id {
        return Err(AppError::Forbidden("Only the host can modify this listing".into()));
    }
    Ok(listing)
}

fn validate_listing(title: &str, price_per_night: f64) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if !price_per_night.is_finite() || price_per_night < 0.0 {
        return Err(AppError::Validation("Price per night must be a non-negative number".into()));
    }
    Ok(())
}
