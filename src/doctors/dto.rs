use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialty: String,
    pub clinic_id: Option<Uuid>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub clinic_id: Option<Uuid>,
}

/// Raw list-endpoint query parameters. Pagination values arrive as strings so
/// a bad `page=abc` becomes a field validation error, not a routing 400.
#[derive(Debug, Deserialize)]
pub struct ListDoctorsParams {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}
