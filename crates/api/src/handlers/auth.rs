//! Handlers for the `/auth` resource (login, token verification).

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studies_core::error::CoreError;
use studies_db::repositories::{RefreshTokenRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, is_expired, validate_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Issued token pair with absolute expiry times.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expired_at: DateTime<Utc>,
    pub refresh_token_expired_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Check email + password against an active user, then issue an access token
/// and a refresh token. The refresh token's hash is persisted.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    // 1. Find the active accounts registered under this email.
    let email = input.email.clone();
    let candidates = state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move { UserRepo::list_active_by_email(tx, ctx, &email).await })
        })
        .await?;

    // 2. Accept the first account whose password matches.
    let mut authenticated = None;
    for candidate in candidates {
        let password_valid = verify_password(&input.password, &candidate.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if password_valid {
            authenticated = Some(candidate);
            break;
        }
    }
    let Some(user) = authenticated else {
        tracing::debug!("Login rejected: unknown email or wrong password");
        return Err(CoreError::InvalidCredentials.into());
    };

    // 3. Issue tokens.
    let jwt = &state.config.jwt;
    let access = generate_access_token(user.id, &user.email, user.role.as_str(), jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let access_token_expired_at = DateTime::<Utc>::from_timestamp(access.expires_at, 0)
        .ok_or_else(|| AppError::InternalError("Access token expiry out of range".into()))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let refresh_token_expired_at =
        Utc::now() + chrono::Duration::hours(jwt.refresh_token_expiry_hours);

    // 4. Persist the refresh token hash.
    let user_id = user.id;
    state
        .store
        .run_in_transaction(move |tx, ctx| {
            Box::pin(async move {
                RefreshTokenRepo::create(tx, ctx, user_id, &refresh_hash, refresh_token_expired_at)
                    .await
            })
        })
        .await?;

    tracing::info!(user_id, "User logged in");

    Ok(Json(LoginResponse {
        access_token: access.token,
        refresh_token: refresh_plaintext,
        access_token_expired_at,
        refresh_token_expired_at,
    }))
}

/// POST /api/v1/auth/verify
///
/// `{ "valid": false }` for expired, tampered, malformed or foreign-issuer tokens.
pub async fn verify(
    State(state): State<AppState>,
    Json(input): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let valid = match validate_token(&input.token, &state.config.jwt) {
        Ok(_) => true,
        Err(e) if is_expired(&e) => false,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            false
        }
    };

    Json(VerifyResponse { valid })
}
