use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::auth::token::TokenScope;
use crate::errors::ApiError;

#[derive(FromRow)]
struct TokenOwnerRow {
    id: Uuid,
    created_at: OffsetDateTime,
    name: String,
    email: String,
    password_hash: String,
    activated: bool,
    version: i32,
    expiry: OffsetDateTime,
}

impl User {
    /// Insert a new (not yet activated) user. A duplicate email surfaces as a
    /// field-level validation error rather than a 500.
    pub async fn insert(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, activated)
            VALUES ($1, $2, $3, false)
            RETURNING id, created_at, name, email, password_hash, activated, version
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::validation("email", "a user with this email address already exists")
            }
            _ => ApiError::from(e),
        })?;
        Ok(user)
    }

    pub async fn get_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, created_at, name, email, password_hash, activated, version
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Resolve the owner of a token with the given scope and plaintext
    /// digest, together with the token's expiry. `None` covers a digest miss
    /// and a token whose owner row is gone; the caller judges the expiry
    /// against the current time.
    pub async fn get_for_token(
        db: &PgPool,
        scope: TokenScope,
        token_hash: &[u8],
    ) -> Result<Option<(User, OffsetDateTime)>, ApiError> {
        let row = sqlx::query_as::<_, TokenOwnerRow>(
            r#"
            SELECT u.id, u.created_at, u.name, u.email, u.password_hash, u.activated, u.version,
                   t.expiry
            FROM users u
            INNER JOIN tokens t ON t.user_id = u.id
            WHERE t.hash = $1 AND t.scope = $2
            "#,
        )
        .bind(token_hash)
        .bind(scope.as_str())
        .fetch_optional(db)
        .await?;
        Ok(row.map(|r| {
            (
                User {
                    id: r.id,
                    created_at: r.created_at,
                    name: r.name,
                    email: r.email,
                    password_hash: r.password_hash,
                    activated: r.activated,
                    version: r.version,
                },
                r.expiry,
            )
        }))
    }

    /// Version-checked update. Zero rows means another request updated the
    /// record between our read and this write.
    pub async fn update(&mut self, db: &PgPool) -> Result<(), ApiError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
            "#,
        )
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(self.activated)
        .bind(self.id)
        .bind(self.version)
        .fetch_optional(db)
        .await?;

        match row {
            Some((version,)) => {
                self.version = version;
                Ok(())
            }
            None => Err(ApiError::EditConflict),
        }
    }
}
