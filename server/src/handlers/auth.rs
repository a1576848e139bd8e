//! HTTP handlers for the authentication endpoints. Thin wrappers that hand
//! payloads to the session service and wrap results in the envelope.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Envelope},
    models::user::{
        AuthResponse, ChangePasswordRequest, LoginRequest, LogoutRequest, MessageResponse,
        RefreshRequest, ResetPasswordRequest, SignupRequest, TokenPairResponse, User, UserResponse,
    },
    services::session,
    state::AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Envelope<AuthResponse>>), AppError> {
    let response = session::signup(&state.pool, &state.config, payload).await?;
    Ok((StatusCode::CREATED, Envelope::success(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Envelope<AuthResponse>>, AppError> {
    let response = session::login(&state.pool, &state.config, payload).await?;
    Ok(Envelope::success(response))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<Envelope<TokenPairResponse>>, AppError> {
    let response = session::refresh(&state.pool, &state.config, &payload.refresh_token).await?;
    Ok(Envelope::success(response))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<Envelope<MessageResponse>>, AppError> {
    let response =
        session::logout(&state.pool, &state.config, payload.refresh_token.as_deref()).await?;
    Ok(Envelope::success(response))
}

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Envelope<MessageResponse>>, AppError> {
    let response = session::logout_all_devices(&state.pool, &user).await?;
    Ok(Envelope::success(response))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Envelope<MessageResponse>>, AppError> {
    let response = session::reset_password(&state.pool, payload).await?;
    Ok(Envelope::success(response))
}

pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Envelope<MessageResponse>>, AppError> {
    let response = session::update_password(&state.pool, &user, payload).await?;
    Ok(Envelope::success(response))
}

pub async fn profile(
    Extension(user): Extension<User>,
) -> Result<Json<Envelope<UserResponse>>, AppError> {
    Ok(Envelope::success(session::profile(&user)))
}
