// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload, User},
    services::auth::SESSION_COOKIE,
};

// Browser clients ride on the HttpOnly cookie; API clients can ignore it
// and send the token from the JSON body as a Bearer header instead.
fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn register(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .register_user(
            &payload.email,
            &payload.password,
            &payload.full_name,
            payload.phone.as_deref(),
            payload.role,
        )
        .await?;

    let jar = jar.add(session_cookie(&token));
    Ok((StatusCode::CREATED, jar, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUserPayload>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    let jar = jar.add(session_cookie(&token));
    Ok((jar, Json(AuthResponse { token, user })))
}

pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
