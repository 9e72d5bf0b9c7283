use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Alice")]
    pub firstname: String,
    #[schema(example = "Wonder")]
    pub lastname: String,
    /// Unique account email.
    #[schema(example = "alice@example.edu")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Minimal well-formedness check: one `@`, a dotted domain, no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().count() > 254 || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let firstname = payload.firstname.trim();
    if firstname.is_empty() || firstname.chars().count() > 64 {
        return Err(AppError::Validation(
            "First name must be 1-64 characters".into(),
        ));
    }
    let lastname = payload.lastname.trim();
    if lastname.is_empty() || lastname.chars().count() > 64 {
        return Err(AppError::Validation(
            "Last name must be 1-64 characters".into(),
        ));
    }
    if !is_valid_email(payload.email.trim()) {
        return Err(AppError::Validation(
            "Email must be a valid email address".into(),
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.edu")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    /// ID of the newly created user.
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice@example.edu")]
    pub email: String,
}

impl From<crate::entity::user::Model> for RegisterResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice@example.edu")]
    pub email: String,
    /// User's role.
    #[schema(example = "applicant")]
    pub role: String,
    /// Permissions granted to the user.
    #[schema(example = json!(["application:submit"]))]
    pub permissions: Vec<String>,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice@example.edu")]
    pub email: String,
    #[schema(example = "applicant")]
    pub role: String,
    #[schema(example = json!(["application:submit"]))]
    pub permissions: Vec<String>,
}
