use super::*;

const RECEIPT_FIELD: &str = "file";

pub async fn update_item_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ItemRequest>,
) -> ApiResult<Json<ItemResponse>> {
    let item = state
        .report_service
        .update_item(
            &principal,
            ExpenseItemId::from_uuid(item_id),
            &ItemInput::from(payload),
        )
        .await?;

    Ok(Json(ItemResponse::from(&item)))
}

pub async fn upload_receipt_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(item_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<ItemResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::Validation(format!("invalid multipart body: {error}")))?
    {
        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| AppError::Validation(format!("failed to read receipt: {error}")))?;
        upload = Some(ReceiptUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::Validation(format!("multipart field '{RECEIPT_FIELD}' is required"))
    })?;
    let item = state
        .report_service
        .upload_receipt(&principal, ExpenseItemId::from_uuid(item_id), &upload)
        .await?;

    Ok(Json(ItemResponse::from(&item)))
}

pub async fn read_receipt_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Response> {
    let receipt = state
        .report_service
        .read_receipt(&principal, ExpenseItemId::from_uuid(item_id))
        .await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        receipt.file_name
    ))
    .map_err(|error| AppError::Internal(format!("invalid receipt file name: {error}")))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&receipt.file_name)),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        receipt.bytes,
    )
        .into_response())
}

fn content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .unwrap_or_default();

    match extension {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
