use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ApiError;

/// 16 random bytes encoded as URL-safe base64 without padding.
const TOKEN_ENTROPY_BYTES: usize = 16;
pub const TOKEN_PLAINTEXT_LENGTH: usize = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Activation,
    Authentication,
}

impl TokenScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }
}

/// An issued token. `plaintext` goes to the client exactly once; only the
/// SHA-256 `hash` of it is persisted and queryable.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip_serializing)]
    pub hash: Vec<u8>,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
    #[serde(skip_serializing)]
    pub scope: TokenScope,
}

/// Deterministic lookup key for a plaintext token. Pure; safe to call on
/// untrusted input.
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Draw fresh CSPRNG entropy and derive the (plaintext, hash) pair.
pub fn generate_token(user_id: Uuid, ttl: Duration, scope: TokenScope) -> Token {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&plaintext);
    Token {
        plaintext,
        hash,
        user_id,
        expiry: OffsetDateTime::now_utc() + ttl,
        scope,
    }
}

impl Token {
    /// Generate and persist a token in one step.
    pub async fn new(
        db: &PgPool,
        user_id: Uuid,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, ApiError> {
        let token = generate_token(user_id, ttl, scope);
        token.insert(db).await?;
        debug!(user_id = %user_id, scope = scope.as_str(), "token issued");
        Ok(token)
    }

    pub async fn insert(&self, db: &PgPool) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&self.hash)
        .bind(self.user_id)
        .bind(self.expiry)
        .bind(self.scope.as_str())
        .execute(db)
        .await?;
        Ok(())
    }

    /// Drop every token a user holds for a scope. Consumes single-use
    /// activation tokens after a successful activation.
    pub async fn delete_all_for_user(
        db: &PgPool,
        scope: TokenScope,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE scope = $1 AND user_id = $2
            "#,
        )
        .bind(scope.as_str())
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn plaintext_has_expected_length() {
        let token = generate_token(Uuid::new_v4(), Duration::hours(1), TokenScope::Activation);
        assert_eq!(token.plaintext.len(), TOKEN_PLAINTEXT_LENGTH);
    }

    #[test]
    fn hash_is_deterministic_and_matches_stored() {
        let token = generate_token(
            Uuid::new_v4(),
            Duration::hours(1),
            TokenScope::Authentication,
        );
        assert_eq!(hash_token(&token.plaintext), token.hash);
        assert_eq!(hash_token(&token.plaintext), hash_token(&token.plaintext));
    }

    #[test]
    fn hash_differs_from_plaintext_bytes() {
        let token = generate_token(
            Uuid::new_v4(),
            Duration::hours(1),
            TokenScope::Authentication,
        );
        assert_ne!(token.hash, token.plaintext.as_bytes());
        assert_eq!(token.hash.len(), 32);
    }

    #[test]
    fn generated_plaintexts_do_not_collide() {
        let user_id = Uuid::new_v4();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let token = generate_token(user_id, Duration::hours(1), TokenScope::Authentication);
            assert!(seen.insert(token.plaintext), "duplicate token plaintext");
        }
    }

    #[test]
    fn expiry_is_in_the_future_by_ttl() {
        let before = OffsetDateTime::now_utc();
        let token = generate_token(Uuid::new_v4(), Duration::hours(24), TokenScope::Activation);
        assert!(token.expiry > before + Duration::hours(23));
        assert!(token.expiry <= OffsetDateTime::now_utc() + Duration::hours(24));
    }

    #[test]
    fn serialized_token_exposes_only_plaintext_and_expiry() {
        let token = generate_token(
            Uuid::new_v4(),
            Duration::hours(1),
            TokenScope::Authentication,
        );
        let json = serde_json::to_value(&token).expect("serializable");
        let object = json.as_object().expect("object");
        assert!(object.contains_key("token"));
        assert!(object.contains_key("expiry"));
        assert!(!object.contains_key("hash"));
        assert!(!object.contains_key("user_id"));
    }
}
