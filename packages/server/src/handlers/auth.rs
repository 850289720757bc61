use axum::{Json, extract::State};
use common::mail::Email;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{SignupRequest, SignupResponse, TokenRequest, TokenResponse};
use crate::state::AppState;
use crate::store::{NewUser, User};
use crate::utils::code::generate_confirmation_code;

pub const CONFIRMATION_SUBJECT: &str = "Confirmation code";

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Sign up or request a new confirmation code",
    description = "Creates an account for a new (username, email) pair and mails it a 6-digit confirmation code. Repeating the request with the same pair mails a fresh code. A username or email already bound to a different account is rejected per field.",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Mail delivery failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let (username, email) = payload.validate()?;

    let by_username = state.store.find_user_by_username(&username).await?;
    let by_email = state.store.find_user_by_email(&email).await?;
    let code = generate_confirmation_code();

    let user = match (by_username, by_email) {
        (Some(existing), Some(same)) if existing.id == same.id => {
            tracing::debug!(user_id = existing.id, "Reissuing confirmation code");
            state
                .store
                .update_user(User {
                    confirmation_code: code,
                    ..existing
                })
                .await?
        }
        (None, None) => {
            let user = state
                .store
                .insert_user(NewUser::signup(username, email, code))
                .await?;
            tracing::info!(user_id = user.id, "User signed up");
            user
        }
        (by_username, by_email) => {
            return Err(AppError::identity_taken(
                by_username.is_some(),
                by_email.is_some(),
            ));
        }
    };

    let message = Email::new(
        CONFIRMATION_SUBJECT,
        format!(
            "Hello {},\n\nYour confirmation code: {}\n",
            user.username, user.confirmation_code
        ),
        state.config.mail.from.clone(),
        vec![user.email.clone()],
    );
    state.mailer.send(&message).await?;

    Ok(Json(SignupResponse {
        username: user.username,
        email: user.email,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "Auth",
    operation_id = "obtainToken",
    summary = "Exchange a confirmation code for an access token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 400, description = "Wrong or missing confirmation code (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown username (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn obtain_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    let user = state
        .store
        .find_user_by_username(payload.username.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !payload.code_matches(&user.confirmation_code) {
        return Err(AppError::field(
            "confirmation_code",
            "Invalid confirmation code.",
        ));
    }

    let user = if state.config.auth.consume_confirmation_code {
        state
            .store
            .update_user(User {
                confirmation_code: String::new(),
                ..user
            })
            .await?
    } else {
        user
    };

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    Ok(Json(TokenResponse { token }))
}
