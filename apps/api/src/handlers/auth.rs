use super::*;

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .authentication_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse::from(outcome)))
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<MeResponse>> {
    let profile = state.authentication_service.profile(&principal).await?;
    Ok(Json(MeResponse::from(profile)))
}
