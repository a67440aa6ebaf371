use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::warn;

use crate::auth::repo_types::User;
use crate::auth::token::{hash_token, TokenScope, TOKEN_PLAINTEXT_LENGTH};
use crate::errors::ApiError;
use crate::state::AppState;

/// Upper bound on the token lookup so a stalled pool cannot hang the request.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// The resolved caller for a single request. Never cached across requests.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    /// The authenticated user, or a 401 for callers that required one.
    pub fn user(&self) -> Result<&User, ApiError> {
        match self {
            Identity::User(user) => Ok(user),
            Identity::Anonymous => Err(ApiError::AuthenticationRequired),
        }
    }
}

/// Extract the plaintext token from an Authorization header value.
///
/// An absent header is a legitimate anonymous caller (`Ok(None)`). A header
/// that is present but not `Bearer <token>` of the expected length is a hard
/// authentication failure; garbage must not degrade to anonymous.
pub fn parse_bearer(header: Option<&str>) -> Result<Option<&str>, ApiError> {
    let Some(header) = header else {
        return Ok(None);
    };
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::AuthenticationRequired)?;
    if token.len() != TOKEN_PLAINTEXT_LENGTH {
        return Err(ApiError::AuthenticationRequired);
    }
    Ok(Some(token))
}

/// A digest match authenticates its owner only while `now < expiry`. An
/// expired match is the same hard failure as no match at all, never an
/// anonymous fallback.
fn authenticate_owner(
    found: Option<(User, OffsetDateTime)>,
    now: OffsetDateTime,
) -> Result<Identity, ApiError> {
    match found {
        Some((user, expiry)) if now < expiry => Ok(Identity::User(user)),
        Some(_) => {
            warn!("expired authentication token");
            Err(ApiError::AuthenticationRequired)
        }
        None => {
            warn!("invalid authentication token");
            Err(ApiError::AuthenticationRequired)
        }
    }
}

/// Resolve the caller identity from the raw Authorization header value.
pub async fn resolve_identity(
    db: &PgPool,
    authorization: Option<&str>,
) -> Result<Identity, ApiError> {
    let Some(plaintext) = parse_bearer(authorization)? else {
        return Ok(Identity::Anonymous);
    };

    let digest = hash_token(plaintext);
    let lookup = User::get_for_token(db, TokenScope::Authentication, &digest);
    let found = tokio::time::timeout(LOOKUP_TIMEOUT, lookup)
        .await
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("token lookup timed out")))??;

    authenticate_owner(found, OffsetDateTime::now_utc())
}

/// Axum extractor wrapping [`resolve_identity`], so handlers receive an
/// explicit Identity value instead of digging it out of request extensions.
pub struct RequestIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for RequestIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let identity = resolve_identity(&state.db, authorization).await?;
        Ok(RequestIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use time::Duration as TimeDuration;
    use uuid::Uuid;

    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            name: "Dana Seitkali".into(),
            email: "dana@clinic.example".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            activated: true,
            version: 1,
        }
    }

    #[test]
    fn absent_header_is_anonymous() {
        assert_eq!(parse_bearer(None).expect("anonymous"), None);
    }

    #[test]
    fn well_formed_bearer_is_accepted() {
        let header = "Bearer AAAAAAAAAAAAAAAAAAAAAA";
        let token = parse_bearer(Some(header)).expect("parsed");
        assert_eq!(token, Some("AAAAAAAAAAAAAAAAAAAAAA"));
    }

    #[test]
    fn wrong_scheme_is_a_hard_failure() {
        let err = parse_bearer(Some("Basic dXNlcjpwYXNz")).unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }

    #[test]
    fn wrong_length_token_is_a_hard_failure() {
        assert!(parse_bearer(Some("Bearer short")).is_err());
        assert!(parse_bearer(Some("Bearer AAAAAAAAAAAAAAAAAAAAAAAAAAAA")).is_err());
        assert!(parse_bearer(Some("Bearer ")).is_err());
    }

    #[test]
    fn live_token_match_authenticates_its_owner() {
        let user = sample_user();
        let user_id = user.id;
        let now = OffsetDateTime::now_utc();
        let identity = authenticate_owner(Some((user, now + TimeDuration::hours(1))), now)
            .expect("live token accepted");
        match identity {
            Identity::User(user) => assert_eq!(user.id, user_id),
            Identity::Anonymous => panic!("expected an authenticated identity"),
        }
    }

    #[test]
    fn expired_token_match_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let expired = now - TimeDuration::seconds(1);
        let err = authenticate_owner(Some((sample_user(), expired)), now).unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }

    #[test]
    fn token_expiring_exactly_now_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let err = authenticate_owner(Some((sample_user(), now)), now).unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }

    #[test]
    fn digest_miss_is_a_hard_failure_not_anonymous() {
        let err = authenticate_owner(None, OffsetDateTime::now_utc()).unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }

    #[test]
    fn anonymous_identity_yields_401_when_user_required() {
        let identity = Identity::Anonymous;
        let err = identity.user().unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }
}
