mod admin;
mod auth;
mod common;
mod reports;

pub use admin::{
    ApiTokenResponse, AssignPermissionsRequest, CreateGroupRequest, CreateUserRequest,
    GroupResponse,
};
pub use auth::{LoginRequest, LoginResponse, MeResponse};
pub use common::{HealthResponse, UserResponse};
pub use reports::{
    CreateReportRequest, ExportResponse, ItemRequest, ItemResponse, ReportResponse,
};
