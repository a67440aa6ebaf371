use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::filters::{Filters, Metadata};
use crate::patients::repo_types::Patient;

#[derive(FromRow)]
struct CountedPatient {
    total: i64,
    id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    name: String,
    birthdate: Date,
    gender: String,
}

impl Patient {
    pub async fn insert(
        db: &PgPool,
        name: &str,
        birthdate: Date,
        gender: &str,
    ) -> Result<Patient, ApiError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (name, birthdate, gender)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at, name, birthdate, gender
            "#,
        )
        .bind(name)
        .bind(birthdate)
        .bind(gender)
        .fetch_one(db)
        .await?;
        Ok(patient)
    }

    /// Name matches case-insensitively; gender is a coded value and matches
    /// exactly.
    pub async fn get_all(
        db: &PgPool,
        name: &str,
        gender: &str,
        filters: &Filters,
    ) -> Result<(Vec<Patient>, Metadata), ApiError> {
        let query = format!(
            r#"
            SELECT count(*) OVER() AS total,
                   id, created_at, updated_at, name, birthdate, gender
            FROM patients
            WHERE (LOWER(name) = LOWER($1) OR $1 = '')
            AND (gender = $2 OR $2 = '')
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            filters.sort_column(),
            filters.sort_direction()
        );

        let rows = sqlx::query_as::<_, CountedPatient>(&query)
            .bind(name)
            .bind(gender)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(db)
            .await?;

        let total = rows.first().map_or(0, |r| r.total);
        let patients = rows
            .into_iter()
            .map(|r| Patient {
                id: r.id,
                created_at: r.created_at,
                updated_at: r.updated_at,
                name: r.name,
                birthdate: r.birthdate,
                gender: r.gender,
            })
            .collect();

        let metadata = Metadata::calculate(total, filters.page, filters.page_size);
        Ok((patients, metadata))
    }

    pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Patient>, ApiError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, created_at, updated_at, name, birthdate, gender
            FROM patients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(patient)
    }

    pub async fn update(&mut self, db: &PgPool) -> Result<(), ApiError> {
        let updated_at: OffsetDateTime = sqlx::query_scalar(
            r#"
            UPDATE patients
            SET name = $1, birthdate = $2, gender = $3, updated_at = now()
            WHERE id = $4
            RETURNING updated_at
            "#,
        )
        .bind(&self.name)
        .bind(self.birthdate)
        .bind(&self.gender)
        .bind(self.id)
        .fetch_one(db)
        .await?;
        self.updated_at = updated_at;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            DELETE FROM patients
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
