use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let code = self.code();
        let message = self.to_string();
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::InvalidCredentials => error_resp(StatusCode::UNAUTHORIZED, code, None),
            AppError::AuthorizationDenied => error_resp(StatusCode::FORBIDDEN, code, None),
            AppError::PersistenceFailure => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, Some(message))
            }
            AppError::ProviderCallback { code: provider_code, module } => provider_resp(
                StatusCode::BAD_GATEWAY,
                code,
                Some(provider_code),
                Some(module),
            ),
            AppError::Gateway {
                code: provider_code,
                module,
            } => provider_resp(StatusCode::BAD_GATEWAY, code, provider_code, module),
            AppError::AmbiguousSessionOutcome | AppError::SessionInProgress => {
                error_resp(StatusCode::CONFLICT, code, Some(message))
            }
            AppError::NotConnected => error_resp(StatusCode::CONFLICT, code, None),
            AppError::ActionNotPermitted(msg) => {
                error_resp(StatusCode::FORBIDDEN, code, Some(msg))
            }
            AppError::InvalidInput(msg) => error_resp(StatusCode::BAD_REQUEST, code, Some(msg)),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, None),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}

/// Provider-originated failures also carry the provider's code and module.
fn provider_resp(
    status: StatusCode,
    code: ErrorCode,
    provider_code: Option<i32>,
    module: Option<String>,
) -> Response {
    let body = serde_json::json!({
        "code": code.as_str(),
        "error_code": provider_code.unwrap_or_else(|| code.numeric()),
        "module": module,
    });
    (status, Json(body)).into_response()
}
