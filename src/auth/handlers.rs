use axum::{
    extract::State,
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{ActivateRequest, LoginRequest, RegisterRequest},
    password::{hash_password, verify_password},
    permissions::{Permissions, DEFAULT_GRANTS},
    repo_types::User,
    token::{hash_token, Token, TokenScope, TOKEN_PLAINTEXT_LENGTH},
};
use crate::errors::ApiError;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/activated", put(activate))
        .route("/users/login", post(login))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "must be at least 8 characters long",
        ));
    }
    if password.len() > 72 {
        return Err(ApiError::validation(
            "password",
            "must be at most 72 characters long",
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if payload.name.is_empty() {
        return Err(ApiError::validation("name", "must be provided"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("email", "must be a valid email address"));
    }
    validate_password(&payload.password)?;

    let hash = hash_password(&payload.password)?;
    let user = User::insert(&state.db, &payload.name, &payload.email, &hash).await?;

    Permissions::add_for_user(&state.db, user.id, DEFAULT_GRANTS).await?;

    let ttl = Duration::hours(state.config.tokens.activation_ttl_hours);
    let token = Token::new(&state.db, user.id, ttl, TokenScope::Activation).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "activation_token": token })),
    ))
}

#[instrument(skip(state, payload))]
async fn activate(
    State(state): State<AppState>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.token.len() != TOKEN_PLAINTEXT_LENGTH {
        return Err(ApiError::validation(
            "token",
            format!("must be {TOKEN_PLAINTEXT_LENGTH} characters long"),
        ));
    }

    let digest = hash_token(&payload.token);
    let mut user = match User::get_for_token(&state.db, TokenScope::Activation, &digest).await? {
        Some((user, expiry)) if OffsetDateTime::now_utc() < expiry => user,
        _ => {
            warn!("invalid or expired activation token");
            return Err(ApiError::validation(
                "token",
                "invalid or expired activation token",
            ));
        }
    };

    user.activated = true;
    user.update(&state.db).await?;

    // Activation tokens are single use.
    Token::delete_all_for_user(&state.db, TokenScope::Activation, user.id).await?;

    info!(user_id = %user.id, "user activated");
    Ok(Json(json!({ "user": user })))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("email", "must be a valid email address"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password", "must be provided"));
    }

    // Unknown email and wrong password collapse into the same 401.
    let user = match User::get_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login with unknown email");
            return Err(ApiError::AuthenticationRequired);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::AuthenticationRequired);
    }

    let ttl = Duration::hours(state.config.tokens.authentication_ttl_hours);
    let token = Token::new(&state.db, user.id, ttl, TokenScope::Authentication).await?;

    info!(user_id = %user.id, "authentication token issued");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "authentication_token": token })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plausible_addresses() {
        assert!(is_valid_email("doctor@clinic.example"));
        assert!(is_valid_email("a.b+c@d.co"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@clinic.example"));
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(72)).is_ok());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }
}
