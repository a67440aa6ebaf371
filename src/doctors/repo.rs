use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::doctors::repo_types::Doctor;
use crate::errors::ApiError;
use crate::filters::{Filters, Metadata};

#[derive(FromRow)]
struct CountedDoctor {
    total: i64,
    id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    name: String,
    specialty: String,
    clinic_id: Option<Uuid>,
}

impl Doctor {
    pub async fn insert(
        db: &PgPool,
        name: &str,
        specialty: &str,
        clinic_id: Option<Uuid>,
    ) -> Result<Doctor, ApiError> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            INSERT INTO doctors (name, specialty, clinic_id)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at, name, specialty, clinic_id
            "#,
        )
        .bind(name)
        .bind(specialty)
        .bind(clinic_id)
        .fetch_one(db)
        .await?;
        Ok(doctor)
    }

    /// List with optional exact-match filters. Only the validated sort column
    /// and direction are interpolated; every client value is bound.
    pub async fn get_all(
        db: &PgPool,
        name: &str,
        specialty: &str,
        filters: &Filters,
    ) -> Result<(Vec<Doctor>, Metadata), ApiError> {
        let query = format!(
            r#"
            SELECT count(*) OVER() AS total,
                   id, created_at, updated_at, name, specialty, clinic_id
            FROM doctors
            WHERE (LOWER(name) = LOWER($1) OR $1 = '')
            AND (LOWER(specialty) = LOWER($2) OR $2 = '')
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            filters.sort_column(),
            filters.sort_direction()
        );

        let rows = sqlx::query_as::<_, CountedDoctor>(&query)
            .bind(name)
            .bind(specialty)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(db)
            .await?;

        let total = rows.first().map_or(0, |r| r.total);
        let doctors = rows
            .into_iter()
            .map(|r| Doctor {
                id: r.id,
                created_at: r.created_at,
                updated_at: r.updated_at,
                name: r.name,
                specialty: r.specialty,
                clinic_id: r.clinic_id,
            })
            .collect();

        let metadata = Metadata::calculate(total, filters.page, filters.page_size);
        Ok((doctors, metadata))
    }

    pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Doctor>, ApiError> {
        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT id, created_at, updated_at, name, specialty, clinic_id
            FROM doctors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(doctor)
    }

    pub async fn update(&mut self, db: &PgPool) -> Result<(), ApiError> {
        let updated_at: OffsetDateTime = sqlx::query_scalar(
            r#"
            UPDATE doctors
            SET name = $1, specialty = $2, clinic_id = $3, updated_at = now()
            WHERE id = $4
            RETURNING updated_at
            "#,
        )
        .bind(&self.name)
        .bind(&self.specialty)
        .bind(self.clinic_id)
        .bind(self.id)
        .fetch_one(db)
        .await?;
        self.updated_at = updated_at;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            DELETE FROM doctors
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
