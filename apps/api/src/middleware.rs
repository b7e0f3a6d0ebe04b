use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use expensa_application::Credential;

use crate::error::ApiResult;
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// Authenticates the caller and exposes the principal as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let credential = credential_from_headers(request.headers());
    let principal = state.gate.authenticate(credential.as_ref()).await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// A bearer header wins over an API key. An `Authorization` header with any
/// other scheme is passed on as an empty bearer token so it is refused.
fn credential_from_headers(headers: &HeaderMap) -> Option<Credential> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .unwrap_or_default();
        return Some(Credential::Bearer(token.trim().to_owned()));
    }

    headers
        .get(API_KEY_HEADER)
        .map(|value| Credential::ApiKey(value.to_str().unwrap_or_default().trim().to_owned()))
}
