use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    pub activated: bool,
    #[serde(skip_serializing)]
    pub version: i32, // optimistic-concurrency counter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_and_version_never_serialize() {
        let user = User {
            id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            name: "Aset Kairat".into(),
            email: "aset@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            activated: true,
            version: 3,
        };
        let json = serde_json::to_string(&user).expect("serializable");
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("version"));
        assert!(json.contains("aset@example.com"));
    }
}
