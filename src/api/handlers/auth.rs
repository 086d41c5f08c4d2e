use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, RegisterRequest};
use crate::api::extractors::auth::ACCESS_TOKEN_COOKIE;
use crate::domain::models::auth::{AuthResponse, UserProfile};
use crate::domain::models::user::User;
use crate::domain::services::auth_service::{hash_password, verify_password, ACCESS_TOKEN_TTL_MINUTES};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::info;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".into()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation("Password must be at least 8 characters".into()));
    }
    if state.user_repo.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let created = state.user_repo.create(&User::new(username, email, password_hash)).await?;

    info!("Registered user: {}", created.id);

    Ok((StatusCode::CREATED, Json(UserProfile {
        id: created.id,
        username: created.username,
        email: created.email,
    })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_username(payload.username.trim()).await?
        .ok_or(AppError::Unauthorized)?;

    verify_password(&payload.password, &user.password_hash)?;

    let (access_jwt, csrf_token) = state.auth_service.issue_access_token(&user)?;
    set_access_cookie(&cookies, &access_jwt);

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse {
        csrf_token,
        user: UserProfile {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }))
}

pub async fn logout(cookies: Cookies) -> StatusCode {
    cookies.remove(Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").into());
    info!("User logged out");
    StatusCode::OK
}

fn set_access_cookie(cookies: &Cookies, access: &str) {
    let mut access_c = Cookie::new(ACCESS_TOKEN_COOKIE, access.to_string());
    access_c.set_http_only(true);
    access_c.set_secure(true);
    access_c.set_same_site(SameSite::Strict);
    access_c.set_path("/");
    access_c.set_max_age(Duration::minutes(ACCESS_TOKEN_TTL_MINUTES));
    cookies.add(access_c);
}
