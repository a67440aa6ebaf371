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
use crate::clinics::{
    dto::{CreateClinicRequest, ListClinicsParams, UpdateClinicRequest},
    repo_types::Clinic,
};
use crate::errors::ApiError;
use crate::filters::Filters;
use crate::state::AppState;

const SORT_SAFE_LIST: &[&str] = &[
    "id", "name", "city", "created_at", "updated_at",
    "-id", "-name", "-city", "-created_at", "-updated_at",
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clinics", get(list_clinics).post(create_clinic))
        .route(
            "/clinics/:clinic_id",
            get(get_clinic).put(update_clinic).delete(delete_clinic),
        )
}

#[instrument(skip(state, identity, payload))]
async fn create_clinic(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Json(payload): Json<CreateClinicRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_permissions(&state.db, &identity, &["clinics:write"]).await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name", "must be provided"));
    }
    if payload.city.trim().is_empty() {
        return Err(ApiError::validation("city", "must be provided"));
    }
    if payload.address.trim().is_empty() {
        return Err(ApiError::validation("address", "must be provided"));
    }

    let clinic = Clinic::insert(
        &state.db,
        payload.name.trim(),
        payload.city.trim(),
        payload.address.trim(),
    )
    .await?;

    info!(clinic_id = %clinic.id, "clinic created");
    Ok((StatusCode::CREATED, Json(json!({ "clinic": clinic }))))
}

#[instrument(skip(state))]
async fn list_clinics(
    State(state): State<AppState>,
    Query(params): Query<ListClinicsParams>,
) -> Result<Json<Value>, ApiError> {
    let filters = Filters::parse(
        params.page.as_deref(),
        params.page_size.as_deref(),
        params.sort.as_deref(),
        SORT_SAFE_LIST,
    )?;

    let (clinics, metadata) = Clinic::get_all(
        &state.db,
        params.name.as_deref().unwrap_or(""),
        params.city.as_deref().unwrap_or(""),
        &filters,
    )
    .await?;

    Ok(Json(json!({ "clinics": clinics, "metadata": metadata })))
}

#[instrument(skip(state))]
async fn get_clinic(
    State(state): State<AppState>,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let clinic = Clinic::get(&state.db, clinic_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(json!({ "clinic": clinic })))
}

#[instrument(skip(state, identity, payload))]
async fn update_clinic(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(clinic_id): Path<Uuid>,
    Json(payload): Json<UpdateClinicRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permissions(&state.db, &identity, &["clinics:write"]).await?;

    let mut clinic = Clinic::get(&state.db, clinic_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        clinic.name = name.trim().to_string();
    }
    if let Some(city) = payload.city {
        if city.trim().is_empty() {
            return Err(ApiError::validation("city", "must not be empty"));
        }
        clinic.city = city.trim().to_string();
    }
    if let Some(address) = payload.address {
        if address.trim().is_empty() {
            return Err(ApiError::validation("address", "must not be empty"));
        }
        clinic.address = address.trim().to_string();
    }

    clinic.update(&state.db).await?;
    info!(clinic_id = %clinic.id, "clinic updated");
    Ok(Json(json!({ "clinic": clinic })))
}

#[instrument(skip(state, identity))]
async fn delete_clinic(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(clinic_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_permissions(&state.db, &identity, &["clinics:write"]).await?;

    Clinic::delete(&state.db, clinic_id).await?;
    info!(clinic_id = %clinic_id, "clinic deleted");
    Ok(StatusCode::NO_CONTENT)
}
