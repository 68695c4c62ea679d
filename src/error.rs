#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Credential error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Crypto(_) => "CREDENTIAL_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::warn!("Unique constraint violated: {}", db_err.message());
                AppError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(ref db_err) if is_lock_contention(db_err.code().as_deref()) => {
                tracing::warn!("Database is locked: {}", db_err.message());
                AppError::StoreUnavailable(db_err.message().to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => {
                tracing::error!("Backing store unreachable: {:?}", err);
                AppError::StoreUnavailable(err.to_string())
            }
            other => {
                tracing::error!("Database error: {:?}", other);
                AppError::Database(other)
            }
        }
    }
}

/// SQLITE_BUSY (5) or SQLITE_LOCKED (6), including their extended codes.
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}

pub type AppResult<T> = Result<T, AppError>;
