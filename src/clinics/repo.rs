use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::clinics::repo_types::Clinic;
use crate::errors::ApiError;
use crate::filters::{Filters, Metadata};

#[derive(FromRow)]
struct CountedClinic {
    total: i64,
    id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    name: String,
    city: String,
    address: String,
}

impl Clinic {
    pub async fn insert(
        db: &PgPool,
        name: &str,
        city: &str,
        address: &str,
    ) -> Result<Clinic, ApiError> {
        let clinic = sqlx::query_as::<_, Clinic>(
            r#"
            INSERT INTO clinics (name, city, address)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at, name, city, address
            "#,
        )
        .bind(name)
        .bind(city)
        .bind(address)
        .fetch_one(db)
        .await?;
        Ok(clinic)
    }

    pub async fn get_all(
        db: &PgPool,
        name: &str,
        city: &str,
        filters: &Filters,
    ) -> Result<(Vec<Clinic>, Metadata), ApiError> {
        let query = format!(
            r#"
            SELECT count(*) OVER() AS total,
                   id, created_at, updated_at, name, city, address
            FROM clinics
            WHERE (LOWER(name) = LOWER($1) OR $1 = '')
            AND (LOWER(city) = LOWER($2) OR $2 = '')
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            filters.sort_column(),
            filters.sort_direction()
        );

        let rows = sqlx::query_as::<_, CountedClinic>(&query)
            .bind(name)
            .bind(city)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(db)
            .await?;

        let total = rows.first().map_or(0, |r| r.total);
        let clinics = rows
            .into_iter()
            .map(|r| Clinic {
                id: r.id,
                created_at: r.created_at,
                updated_at: r.updated_at,
                name: r.name,
                city: r.city,
                address: r.address,
            })
            .collect();

        let metadata = Metadata::calculate(total, filters.page, filters.page_size);
        Ok((clinics, metadata))
    }

    pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Clinic>, ApiError> {
        let clinic = sqlx::query_as::<_, Clinic>(
            r#"
            SELECT id, created_at, updated_at, name, city, address
            FROM clinics
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(clinic)
    }

    pub async fn update(&mut self, db: &PgPool) -> Result<(), ApiError> {
        let updated_at: OffsetDateTime = sqlx::query_scalar(
            r#"
            UPDATE clinics
            SET name = $1, city = $2, address = $3, updated_at = now()
            WHERE id = $4
            RETURNING updated_at
            "#,
        )
        .bind(&self.name)
        .bind(&self.city)
        .bind(&self.address)
        .bind(self.id)
        .fetch_one(db)
        .await?;
        self.updated_at = updated_at;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            DELETE FROM clinics
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
