//! # API Error Type
//!
//! Unified error type for Tauri commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Error Flow in StockDesk                               │
//! │                                                                         │
//! │  Frontend                    Rust Backend                               │
//! │  ────────                    ────────────                               │
//! │                                                                         │
//! │  invoke('save_categories')                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │  DbError::UniqueViolation ──► code: DUPLICATE                    │  │
//! │  │  DbError::ForeignKeyViolation ──► code: IN_USE                   │  │
//! │  │  CoreError::Validation ──► code: VALIDATION_ERROR                │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  catch (e) { dialog(e.message) } — per-operation error dialogs          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tauri requires errors to be serializable. We implement `Serialize` and
//! include both a machine-readable `code` and human-readable `message`.

use serde::Serialize;
use stockdesk_core::CoreError;
use stockdesk_db::DbError;

/// API error returned from Tauri commands.
///
/// ## Serialization
/// This is what the frontend receives when a command fails:
/// ```json
/// {
///   "code": "DUPLICATE",
///   "message": "Duplicate value for items.item_name"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// A unique constraint was violated (duplicate name)
    Duplicate,

    /// The row is still referenced by other rows and cannot be deleted
    InUse,

    /// Database operation failed
    DatabaseError,

    /// Not logged in, or insufficient privilege for the edit
    Unauthorized,

    /// Business rule violation (inactive reference, deleted-row edit, ...)
    BusinessLogic,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field } => ApiError::new(
                ErrorCode::Duplicate,
                format!("Duplicate value for {}", field),
            ),
            DbError::ForeignKeyViolation { .. } => ApiError::new(
                ErrorCode::InUse,
                "Row is referenced by other rows and cannot be deleted",
            ),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::NonExistentItemId(_)
            | CoreError::NonExistentSkuId(_)
            | CoreError::UnknownRow(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),

            CoreError::InactiveItemId(_)
            | CoreError::InactiveSkuId(_)
            | CoreError::DeletedRowEdit(_) => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }

            CoreError::InvalidTransactionType(_) => ApiError::validation(err.to_string()),

            CoreError::NotEditable { .. } => ApiError::unauthorized(err.to_string()),

            CoreError::PasswordHash(e) => {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal("Password hashing failed")
            }

            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_duplicate_code() {
        let err: ApiError = DbError::UniqueViolation {
            field: "category.category_name".to_string(),
        }
        .into();
        assert!(matches!(err.code, ErrorCode::Duplicate));
    }

    #[test]
    fn test_fk_violation_maps_to_in_use() {
        let err: ApiError = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        }
        .into();
        assert!(matches!(err.code, ErrorCode::InUse));
    }

    #[test]
    fn test_inactive_sku_is_business_logic() {
        let err: ApiError = CoreError::InactiveSkuId(3).into();
        assert!(matches!(err.code, ErrorCode::BusinessLogic));
        assert_eq!(err.message, "SKU 3 is inactive");
    }
}
