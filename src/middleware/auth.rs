// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::error::AppError, config::AppState, models::auth::User, services::auth::SESSION_COOKIE,
};

// Accepts the token either as a Bearer header (API clients) or as the
// session cookie set at login (browser clients). The header wins when
// both are present.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(bearer.to_owned());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or(AppError::InvalidToken)?;

    // The token only names a user; role and active status come from the
    // current row in the database.
    let user = app_state.auth_service.validate_token(&token).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extractor handing the authenticated user straight to handlers.
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn bearer_header_is_used_when_present() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn session_cookie_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("{SESSION_COOKIE}=tok456").parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("tok456"));
    }

    #[test]
    fn header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer fromheader".parse().unwrap());
        headers.insert(COOKIE, format!("{SESSION_COOKIE}=fromcookie").parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("fromheader"));
    }

    #[test]
    fn no_credentials_yields_none() {
        assert!(extract_token(&HeaderMap::new()).is_none());
    }
}
