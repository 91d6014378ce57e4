// src/handlers/auth.rs

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, metadata::extract_metadata},
    config::AppState,
    models::auth::{LoginPayload, LoginResponse, RefreshPayload, TokenPairResponse},
};

// O refresh token vive num cookie httpOnly; o corpo da resposta também o
// devolve para clientes que não conseguem usar cookies.
fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(("refreshToken", token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub async fn login(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let metadata = extract_metadata(&headers);
    let response = app_state
        .auth_service
        .login(&payload.email, &payload.password, &metadata)
        .await?;
    let jar = jar.add(refresh_cookie(&response.refresh_token));
    Ok((jar, Json(response)))
}

// O refresh token vem do cookie quando existe; o corpo é o fallback.
fn resolve_refresh_token(jar: &CookieJar, payload: &RefreshPayload) -> Result<String, AppError> {
    jar.get("refreshToken")
        .map(|c| c.value().to_string())
        .or_else(|| payload.refresh_token.clone())
        .ok_or_else(|| AppError::unauthorized("Refresh token not provided"))
}

pub async fn refresh(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    payload: Option<Json<RefreshPayload>>,
) -> Result<(CookieJar, Json<TokenPairResponse>), AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let token = resolve_refresh_token(&jar, &payload)?;

    let metadata = extract_metadata(&headers);
    let response = app_state.auth_service.refresh(&token, &metadata).await?;
    // Rotação: o cookie passa a apontar para o token novo.
    let jar = jar.add(refresh_cookie(&response.refresh_token));
    Ok((jar, Json(response)))
}

pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshPayload>>,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    // Logout sem token ainda responde ok: não há sessão a derrubar.
    if let Ok(token) = resolve_refresh_token(&jar, &payload) {
        app_state.auth_service.logout(&token).await?;
    }
    let jar = jar.remove(Cookie::build("refreshToken").path("/").build());
    Ok((jar, Json(json!({ "message": "Logged out" }))))
}
