use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::User;

pub const LOGIN_REQUIRED: &str = "Please log in to access this resource.";

type AuthRejection = (StatusCode, Json<Value>);

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
    pub city: Option<String>,
}

/// Пользователь с правами администратора
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn unauthorized() -> AuthRejection {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": LOGIN_REQUIRED })))
}

// Разбирает заголовок "Authorization: Basic base64(username:password)"
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// bcrypt считается вне рабочих потоков рантайма
pub async fn verify_password(user: &User, password: &str) -> bool {
    let user = user.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || user.verify_password(&password))
        .await
        .unwrap_or(false)
}

pub async fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (username, password) = basic_credentials(&parts.headers).ok_or_else(unauthorized)?;

        let user = state
            .store
            .find_user(&username)
            .await
            .map_err(|e| {
                tracing::error!("auth lookup failed for {}: {:?}", username, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Authentication is temporarily unavailable" })),
                )
            })?
            .ok_or_else(unauthorized)?;

        if !verify_password(&user, &password).await {
            return Err(unauthorized());
        }

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            city: user.city,
        })
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Admin access required" })),
            ));
        }
        Ok(AdminUser(user))
    }
}
