//! Authentication service routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    jwt::TokenPair,
    middleware::AuthUser,
    models::{LoginCredentials, NewUser, RegisterRequest, UserProfile},
    password::{hash_password, verify_password},
    validation::{validate_email, validate_password, validate_username},
};

/// Request for token refresh
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for user login
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/me", get(me))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AuthResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AuthError::invalid("body", rejection.body_text()))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = if state.users.ping().await { "up" } else { "down" };

    Json(serde_json::json!({
        "status": "ok",
        "service": "auth",
        "database": database,
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_lowercase();

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&request.password)?;

    let user = state
        .users
        .create(&NewUser {
            username,
            email,
            password_hash: hash_password(&request.password)?,
        })
        .await?;

    info!(user_id = %user.id, "User registered: {}", user.username);
    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCredentials>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let credentials = json_body(payload)?;
    let login = credentials.username_or_email.trim();
    info!("Login attempt for user: {}", login);

    let user = state
        .users
        .find_by_username_or_email(login)
        .await?
        .filter(|user| verify_password(&credentials.password, &user.password_hash))
        .ok_or_else(|| {
            warn!("Failed login for user: {}", login);
            AuthError::InvalidCredentials
        })?;

    let tokens = state.jwt_service.issue_pair(&user)?;

    Ok(Json(LoginResponse {
        tokens,
        user: user.into(),
    }))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let (claims, access) = state.jwt_service.refresh(&request.refresh_token)?;

    // Tokens of deleted users stop working
    if state.users.find_by_id(claims.sub).await?.is_none() {
        return Err(AuthError::Unauthorized);
    }

    Ok(Json(access))
}

/// Current user profile
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    Ok(Json(UserProfile::from(user)))
}
