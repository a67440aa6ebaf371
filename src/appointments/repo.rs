use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::appointments::repo_types::Appointment;
use crate::errors::ApiError;

impl Appointment {
    /// Insert a new appointment. A broken patient/doctor reference surfaces
    /// as a validation error instead of a 500.
    pub async fn insert(
        db: &PgPool,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: OffsetDateTime,
    ) -> Result<Appointment, ApiError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, date)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at, patient_id, doctor_id, date
            "#,
        )
        .bind(patient_id)
        .bind(doctor_id)
        .bind(date)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ApiError::validation("appointment", "unknown patient or doctor")
            }
            _ => ApiError::from(e),
        })?;
        Ok(appointment)
    }

    pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Appointment>, ApiError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, created_at, updated_at, patient_id, doctor_id, date
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(appointment)
    }

    pub async fn update(&mut self, db: &PgPool) -> Result<(), ApiError> {
        let updated_at: OffsetDateTime = sqlx::query_scalar(
            r#"
            UPDATE appointments
            SET patient_id = $1, doctor_id = $2, date = $3, updated_at = now()
            WHERE id = $4
            RETURNING updated_at
            "#,
        )
        .bind(self.patient_id)
        .bind(self.doctor_id)
        .bind(self.date)
        .bind(self.id)
        .fetch_one(db)
        .await?;
        self.updated_at = updated_at;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            DELETE FROM appointments
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
