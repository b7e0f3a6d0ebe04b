use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use uuid::Uuid;

use expensa_application::{CreateUserInput, ItemInput, ReceiptUpload};
use expensa_core::AppError;
use expensa_domain::{ExpenseItemId, GroupId, Principal, ReportId, UserId};

use crate::dto::{
    ApiTokenResponse, AssignPermissionsRequest, CreateGroupRequest, CreateReportRequest,
    CreateUserRequest, ExportResponse, GroupResponse, HealthResponse, ItemRequest, ItemResponse,
    LoginRequest, LoginResponse, MeResponse, ReportResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod admin;
mod auth;
mod items;
mod reports;

pub use admin::{
    add_group_member_handler, assign_permissions_handler, create_api_token_handler,
    create_group_handler, create_user_handler, export_reports_handler, list_groups_handler,
    list_permissions_handler, list_users_handler, remove_group_member_handler,
};
pub use auth::{login_handler, me_handler};
pub use items::{read_receipt_handler, update_item_handler, upload_receipt_handler};
pub use reports::{
    add_item_handler, approve_report_handler, create_report_handler, delete_report_handler,
    list_own_reports_handler, list_reviewable_reports_handler, reject_report_handler,
    submit_report_handler, view_report_handler,
};

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
