use serde::Deserialize;
use time::Date;

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub birthdate: Date,
    pub gender: String,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub birthdate: Option<Date>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPatientsParams {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}
