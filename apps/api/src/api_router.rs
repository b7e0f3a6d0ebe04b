use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use expensa_application::MAX_RECEIPT_BYTES;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};


/// Room for multipart framing around the largest accepted receipt.
const RECEIPT_BODY_LIMIT: usize = MAX_RECEIPT_BYTES + 64 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::me_handler))
        .route(
            "/api/reports",
            get(handlers::list_own_reports_handler).post(handlers::create_report_handler),
        )
        .route(
            "/api/reports/{report_id}",
            get(handlers::view_report_handler).delete(handlers::delete_report_handler),
        )
        .route(
            "/api/reports/{report_id}/submit",
            post(handlers::submit_report_handler),
        )
        .route(
            "/api/reports/{report_id}/items",
            post(handlers::add_item_handler),
        )
        .route("/api/items/{item_id}", put(handlers::update_item_handler))
        .route(
            "/api/items/{item_id}/receipt",
            get(handlers::read_receipt_handler)
                .post(handlers::upload_receipt_handler)
                .layer(DefaultBodyLimit::max(RECEIPT_BODY_LIMIT)),
        )
        .route(
            "/api/admin/reports",
            get(handlers::list_reviewable_reports_handler),
        )
        .route(
            "/api/admin/reports/{report_id}/approve",
            post(handlers::approve_report_handler),
        )
        .route(
            "/api/admin/reports/{report_id}/reject",
            post(handlers::reject_report_handler),
        )
        .route(
            "/api/admin/users",
            get(handlers::list_users_handler).post(handlers::create_user_handler),
        )
        .route(
            "/api/admin/users/{user_id}/token",
            post(handlers::create_api_token_handler),
        )
        .route(
            "/api/admin/groups",
            get(handlers::list_groups_handler).post(handlers::create_group_handler),
        )
        .route(
            "/api/admin/groups/{group_id}/permissions",
            post(handlers::assign_permissions_handler),
        )
        .route(
            "/api/admin/groups/{group_id}/members/{user_id}",
            put(handlers::add_group_member_handler).delete(handlers::remove_group_member_handler),
        )
        .route(
            "/api/admin/permissions",
            get(handlers::list_permissions_handler),
        )
        .route("/api/admin/export", get(handlers::export_reports_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
