use chrono::{DateTime, Utc};
use expensa_application::UserSummary;
use serde::Serialize;

/// API representation of health status.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Public user projection.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserSummary> for UserResponse {
    fn from(value: UserSummary) -> Self {
        Self {
            id: value.id.to_string(),
            email: value.email,
            created_at: value.created_at,
        }
    }
}
