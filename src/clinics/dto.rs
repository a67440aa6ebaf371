use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub city: String,
    pub address: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListClinicsParams {
    pub name: Option<String>,
    pub city: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}
