//! Mapping of PostgreSQL constraint violations onto application errors.

use expensa_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn has_code(error: &sqlx::Error, code: &str) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some(code))
}

/// Returns whether the error is a foreign key violation.
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    has_code(error, FOREIGN_KEY_VIOLATION)
}

/// Unique violations become `Conflict`, anything else `Internal`.
pub(crate) fn unique_or_internal(
    error: sqlx::Error,
    conflict_message: impl Into<String>,
    operation: &str,
) -> AppError {
    if has_code(&error, UNIQUE_VIOLATION) {
        return AppError::Conflict(conflict_message.into());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

/// Foreign key violations become `Validation`, anything else `Internal`.
pub(crate) fn foreign_key_or_internal(
    error: sqlx::Error,
    validation_message: impl Into<String>,
    operation: &str,
) -> AppError {
    if is_foreign_key_violation(&error) {
        return AppError::Validation(validation_message.into());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
