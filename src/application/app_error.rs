use thiserror::Error;

use crate::domain::entities::scope::ScopeSetError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access denied")]
    AuthorizationDenied,

    #[error("Provider {module} reported error {code}")]
    ProviderCallback { code: i32, module: String },

    #[error("Link session ended without a provider response")]
    AmbiguousSessionOutcome,

    #[error("Cannot save settings")]
    PersistenceFailure,

    #[error("Account link request failed")]
    Gateway {
        code: Option<i32>,
        module: Option<String>,
    },

    #[error("A link session is already in progress")]
    SessionInProgress,

    #[error("Account is not connected")]
    NotConnected,

    #[error("Action not permitted: {0}")]
    ActionNotPermitted(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::AuthorizationDenied => ErrorCode::AccessDenied,
            AppError::ProviderCallback { .. } => ErrorCode::ProviderError,
            AppError::AmbiguousSessionOutcome => ErrorCode::AmbiguousSession,
            AppError::PersistenceFailure => ErrorCode::CannotSaveSettings,
            AppError::Gateway { .. } => ErrorCode::GatewayError,
            AppError::SessionInProgress => ErrorCode::SessionInProgress,
            AppError::NotConnected => ErrorCode::NotConnected,
            AppError::ActionNotPermitted(_) => ErrorCode::ActionNotPermitted,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ScopeSetError> for AppError {
    fn from(err: ScopeSetError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    AccessDenied,
    ProviderError,
    AmbiguousSession,
    CannotSaveSettings,
    GatewayError,
    SessionInProgress,
    NotConnected,
    ActionNotPermitted,
    InvalidInput,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::AmbiguousSession => "AMBIGUOUS_SESSION",
            ErrorCode::CannotSaveSettings => "CANNOT_SAVE_SETTINGS",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::SessionInProgress => "SESSION_IN_PROGRESS",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::ActionNotPermitted => "ACTION_NOT_PERMITTED",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Numeric code shown to users alongside the originating module.
    pub fn numeric(&self) -> i32 {
        match self {
            ErrorCode::InvalidCredentials => 11,
            ErrorCode::AccessDenied => 12,
            ErrorCode::InvalidInput => 101,
            ErrorCode::NotFound => 102,
            ErrorCode::CannotSaveSettings => 103,
            ErrorCode::DatabaseError => 104,
            ErrorCode::SessionInProgress => 201,
            ErrorCode::NotConnected => 202,
            ErrorCode::ActionNotPermitted => 203,
            ErrorCode::AmbiguousSession => 204,
            ErrorCode::ProviderError => 205,
            ErrorCode::GatewayError => 206,
            ErrorCode::InternalError => 999,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
