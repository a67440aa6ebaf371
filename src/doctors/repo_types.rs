use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Doctor record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Doctor {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub name: String,
    pub specialty: String,
    pub clinic_id: Option<Uuid>,
}
