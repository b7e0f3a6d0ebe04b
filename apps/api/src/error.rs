use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use expensa_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: &'static str,
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Credential and authorization failures never say why.
    fn public_message(&self) -> String {
        match &self.0 {
            AppError::Unauthenticated(_) => "authentication required".to_owned(),
            AppError::Forbidden(_) => "forbidden".to_owned(),
            AppError::Internal(_) => "internal server error".to_owned(),
            AppError::Validation(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::InvalidState(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            AppError::Internal(detail) => tracing::error!(%detail, "request failed"),
            AppError::Unauthenticated(detail) | AppError::Forbidden(detail) => {
                tracing::debug!(kind = self.0.kind(), %detail, "request denied");
            }
            _ => {}
        }

        let payload = Json(ErrorResponse {
            error: self.0.kind(),
            message: self.public_message(),
        });

        (self.status(), payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use expensa_core::AppError;

    use super::ApiError;

    #[test]
    fn every_kind_maps_to_a_fixed_status() {
        let cases = [
            (AppError::Unauthenticated("x".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".to_owned()), StatusCode::FORBIDDEN),
            (AppError::InvalidState("x".to_owned()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::NotFound("x".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".to_owned()), StatusCode::CONFLICT),
            (AppError::Validation("x".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::Internal("x".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).into_response().status(), status);
        }
    }

    #[test]
    fn denial_details_are_not_echoed() {
        let unauthenticated = ApiError(AppError::Unauthenticated("token expired".to_owned()));
        let forbidden = ApiError(AppError::Forbidden("missing reports:approve".to_owned()));
        let internal = ApiError(AppError::Internal("connection refused".to_owned()));

        assert_eq!(unauthenticated.public_message(), "authentication required");
        assert_eq!(forbidden.public_message(), "forbidden");
        assert_eq!(internal.public_message(), "internal server error");
    }
}
