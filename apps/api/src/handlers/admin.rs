use super::*;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .admin_service
        .list_users(&principal)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .admin_service
        .create_user(
            &principal,
            CreateUserInput {
                email: payload.email,
                password: payload.password,
                group_ids: payload
                    .group_ids
                    .into_iter()
                    .map(GroupId::from_uuid)
                    .collect(),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn list_groups_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let groups = state
        .admin_service
        .list_groups(&principal)
        .await?
        .into_iter()
        .map(GroupResponse::from)
        .collect();

    Ok(Json(groups))
}

pub async fn create_group_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let group = state
        .admin_service
        .create_group(&principal, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<&'static str>>> {
    let catalog = state.admin_service.permission_catalog(&principal).await?;
    Ok(Json(
        catalog
            .iter()
            .map(|permission| permission.as_str())
            .collect(),
    ))
}

pub async fn assign_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<AssignPermissionsRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let group = state
        .admin_service
        .assign_permissions(&principal, GroupId::from_uuid(group_id), &payload.permissions)
        .await?;

    Ok(Json(GroupResponse::from(group)))
}

pub async fn add_group_member_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .admin_service
        .add_group_member(
            &principal,
            GroupId::from_uuid(group_id),
            UserId::from_uuid(user_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_group_member_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .admin_service
        .remove_group_member(
            &principal,
            GroupId::from_uuid(group_id),
            UserId::from_uuid(user_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_api_token_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<ApiTokenResponse>)> {
    let user_id = UserId::from_uuid(user_id);
    let token = state
        .admin_service
        .create_api_token(&principal, user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiTokenResponse {
            user_id: user_id.to_string(),
            token,
        }),
    ))
}

pub async fn export_reports_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ExportResponse>> {
    let reports = state
        .report_service
        .export_reports(&principal)
        .await?
        .into_iter()
        .map(ReportResponse::from)
        .collect();

    Ok(Json(ExportResponse {
        generated_at: Utc::now(),
        reports,
    }))
}
