use serde::Deserialize;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for account activation.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

/// Request body for login (authentication token issuance).
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
