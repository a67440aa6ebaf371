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
use crate::doctors::{
    dto::{CreateDoctorRequest, ListDoctorsParams, UpdateDoctorRequest},
    repo_types::Doctor,
};
use crate::errors::ApiError;
use crate::filters::Filters;
use crate::state::AppState;

const SORT_SAFE_LIST: &[&str] = &[
    "id", "name", "specialty", "created_at", "updated_at",
    "-id", "-name", "-specialty", "-created_at", "-updated_at",
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/doctors/:doctor_id",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
}

#[instrument(skip(state, identity, payload))]
async fn create_doctor(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Json(payload): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_permissions(&state.db, &identity, &["doctors:write"]).await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name", "must be provided"));
    }
    if payload.specialty.trim().is_empty() {
        return Err(ApiError::validation("specialty", "must be provided"));
    }

    let doctor = Doctor::insert(
        &state.db,
        payload.name.trim(),
        payload.specialty.trim(),
        payload.clinic_id,
    )
    .await?;

    info!(doctor_id = %doctor.id, "doctor created");
    Ok((StatusCode::CREATED, Json(json!({ "doctor": doctor }))))
}

#[instrument(skip(state))]
async fn list_doctors(
    State(state): State<AppState>,
    Query(params): Query<ListDoctorsParams>,
) -> Result<Json<Value>, ApiError> {
    let filters = Filters::parse(
        params.page.as_deref(),
        params.page_size.as_deref(),
        params.sort.as_deref(),
        SORT_SAFE_LIST,
    )?;

    let (doctors, metadata) = Doctor::get_all(
        &state.db,
        params.name.as_deref().unwrap_or(""),
        params.specialty.as_deref().unwrap_or(""),
        &filters,
    )
    .await?;

    Ok(Json(json!({ "doctors": doctors, "metadata": metadata })))
}

#[instrument(skip(state))]
async fn get_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let doctor = Doctor::get(&state.db, doctor_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(json!({ "doctor": doctor })))
}

#[instrument(skip(state, identity, payload))]
async fn update_doctor(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(doctor_id): Path<Uuid>,
    Json(payload): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permissions(&state.db, &identity, &["doctors:write"]).await?;

    let mut doctor = Doctor::get(&state.db, doctor_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        doctor.name = name.trim().to_string();
    }
    if let Some(specialty) = payload.specialty {
        if specialty.trim().is_empty() {
            return Err(ApiError::validation("specialty", "must not be empty"));
        }
        doctor.specialty = specialty.trim().to_string();
    }
    if let Some(clinic_id) = payload.clinic_id {
        doctor.clinic_id = Some(clinic_id);
    }

    doctor.update(&state.db).await?;
    info!(doctor_id = %doctor.id, "doctor updated");
    Ok(Json(json!({ "doctor": doctor })))
}

#[instrument(skip(state, identity))]
async fn delete_doctor(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(doctor_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_permissions(&state.db, &identity, &["doctors:write"]).await?;

    Doctor::delete(&state.db, doctor_id).await?;
    info!(doctor_id = %doctor_id, "doctor deleted");
    Ok(StatusCode::NO_CONTENT)
}
