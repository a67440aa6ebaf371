use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::appointments::{
    dto::{CreateAppointmentRequest, UpdateAppointmentRequest},
    repo_types::Appointment,
};
use crate::auth::identity::RequestIdentity;
use crate::auth::permissions::require_permissions;
use crate::errors::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(create_appointment))
        .route(
            "/appointments/:appointment_id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

#[instrument(skip(state, identity, payload))]
async fn create_appointment(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_permissions(&state.db, &identity, &["appointments:write"]).await?;

    let appointment = Appointment::insert(
        &state.db,
        payload.patient_id,
        payload.doctor_id,
        payload.date,
    )
    .await?;

    info!(appointment_id = %appointment.id, "appointment created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "appointment": appointment })),
    ))
}

#[instrument(skip(state))]
async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let appointment = Appointment::get(&state.db, appointment_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(json!({ "appointment": appointment })))
}

#[instrument(skip(state, identity, payload))]
async fn update_appointment(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permissions(&state.db, &identity, &["appointments:write"]).await?;

    let mut appointment = Appointment::get(&state.db, appointment_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(patient_id) = payload.patient_id {
        appointment.patient_id = patient_id;
    }
    if let Some(doctor_id) = payload.doctor_id {
        appointment.doctor_id = doctor_id;
    }
    if let Some(date) = payload.date {
        appointment.date = date;
    }

    appointment.update(&state.db).await?;
    info!(appointment_id = %appointment.id, "appointment updated");
    Ok(Json(json!({ "appointment": appointment })))
}

#[instrument(skip(state, identity))]
async fn delete_appointment(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(appointment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_permissions(&state.db, &identity, &["appointments:write"]).await?;

    Appointment::delete(&state.db, appointment_id).await?;
    info!(appointment_id = %appointment_id, "appointment deleted");
    Ok(StatusCode::NO_CONTENT)
}
