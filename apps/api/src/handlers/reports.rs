use super::*;

pub async fn create_report_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportResponse>)> {
    let report = state
        .report_service
        .create_report(&principal, &payload.title)
        .await?;

    Ok((StatusCode::CREATED, Json(ReportResponse::header(&report))))
}

pub async fn list_own_reports_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<ReportResponse>>> {
    let reports = state
        .report_service
        .list_own_reports(&principal)
        .await?
        .into_iter()
        .map(ReportResponse::from)
        .collect();

    Ok(Json(reports))
}

pub async fn view_report_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let details = state
        .report_service
        .view_report(&principal, ReportId::from_uuid(report_id))
        .await?;

    Ok(Json(ReportResponse::from(details)))
}

pub async fn delete_report_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .report_service
        .delete_report(&principal, ReportId::from_uuid(report_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_report_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let report = state
        .report_service
        .submit_report(&principal, ReportId::from_uuid(report_id))
        .await?;

    Ok(Json(ReportResponse::header(&report)))
}

pub async fn add_item_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<ItemRequest>,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    let item = state
        .report_service
        .add_item(
            &principal,
            ReportId::from_uuid(report_id),
            &ItemInput::from(payload),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(&item))))
}

pub async fn list_reviewable_reports_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<ReportResponse>>> {
    let reports = state
        .report_service
        .list_reviewable_reports(&principal)
        .await?
        .into_iter()
        .map(ReportResponse::from)
        .collect();

    Ok(Json(reports))
}

pub async fn approve_report_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let report = state
        .report_service
        .approve_report(&principal, ReportId::from_uuid(report_id))
        .await?;

    Ok(Json(ReportResponse::header(&report)))
}

pub async fn reject_report_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let report = state
        .report_service
        .reject_report(&principal, ReportId::from_uuid(report_id))
        .await?;

    Ok(Json(ReportResponse::header(&report)))
}
