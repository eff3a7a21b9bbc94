use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
    domain::entities::caller::Caller,
};

/// Resolves the request's [`Caller`] and stores it in the extensions.
///
/// No token means anonymous; a token that fails verification is rejected.
pub async fn caller_context(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = cookies
        .get("access_token")
        .map(|c| c.value().to_owned())
        .or_else(|| bearer_token(&request));

    let caller = match token {
        Some(token) => caller_from_token(&token, &app_state.config.jwt_secret)?,
        None => Caller::anonymous(),
    };

    tracing::debug!(user_id = ?caller.user_id, role = %caller.role, "Resolved caller");

    request.extensions_mut().insert(caller);
    // Preserve cookie jar for downstream extractors.
    request.extensions_mut().insert(cookies);

    Ok(next.run(request).await)
}

fn caller_from_token(token: &str, secret: &SecretString) -> AppResult<Caller> {
    let claims = jwt::verify(token, secret)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidCredentials)?;
    Ok(Caller::user(user_id, claims.role))
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The caller's user id, for endpoints that act on the caller's own links.
pub fn require_user(caller: &Caller) -> AppResult<Uuid> {
    caller.user_id.ok_or(AppError::AuthorizationDenied)
}
