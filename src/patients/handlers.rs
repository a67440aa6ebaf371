use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::identity::RequestIdentity;
use crate::auth::permissions::require_permissions;
use crate::errors::ApiError;
use crate::filters::Filters;
use crate::patients::{
    dto::{CreatePatientRequest, ListPatientsParams, UpdatePatientRequest},
    repo_types::Patient,
};
use crate::state::AppState;

const SORT_SAFE_LIST: &[&str] = &[
    "id", "name", "birthdate", "created_at", "updated_at",
    "-id", "-name", "-birthdate", "-created_at", "-updated_at",
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:patient_id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

#[instrument(skip(state, identity, payload))]
async fn create_patient(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Json(payload): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_permissions(&state.db, &identity, &["patients:write"]).await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name", "must be provided"));
    }
    if payload.gender.trim().is_empty() {
        return Err(ApiError::validation("gender", "must be provided"));
    }

    let patient = Patient::insert(
        &state.db,
        payload.name.trim(),
        payload.birthdate,
        payload.gender.trim(),
    )
    .await?;

    info!(patient_id = %patient.id, "patient created");
    Ok((StatusCode::CREATED, Json(json!({ "patient": patient }))))
}

#[instrument(skip(state))]
async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<ListPatientsParams>,
) -> Result<Json<Value>, ApiError> {
    let filters = Filters::parse(
        params.page.as_deref(),
        params.page_size.as_deref(),
        params.sort.as_deref(),
        SORT_SAFE_LIST,
    )?;

    let (patients, metadata) = Patient::get_all(
        &state.db,
        params.name.as_deref().unwrap_or(""),
        params.gender.as_deref().unwrap_or(""),
        &filters,
    )
    .await?;

    Ok(Json(json!({ "patients": patients, "metadata": metadata })))
}

#[instrument(skip(state))]
async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let patient = Patient::get(&state.db, patient_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(json!({ "patient": patient })))
}

#[instrument(skip(state, identity, payload))]
async fn update_patient(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permissions(&state.db, &identity, &["patients:write"]).await?;

    let mut patient = Patient::get(&state.db, patient_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        patient.name = name.trim().to_string();
    }
    if let Some(birthdate) = payload.birthdate {
        patient.birthdate = birthdate;
    }
    if let Some(gender) = payload.gender {
        if gender.trim().is_empty() {
            return Err(ApiError::validation("gender", "must not be empty"));
        }
        patient.gender = gender.trim().to_string();
    }

    patient.update(&state.db).await?;
    info!(patient_id = %patient.id, "patient updated");
    Ok(Json(json!({ "patient": patient })))
}

#[instrument(skip(state, identity))]
async fn delete_patient(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_permissions(&state.db, &identity, &["patients:write"]).await?;

    Patient::delete(&state.db, patient_id).await?;
    info!(patient_id = %patient_id, "patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
