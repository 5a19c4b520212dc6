use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::internal_error;
use crate::middleware::{hash_password, AuthUser};
use crate::models::theater::is_known_city;
use crate::models::{NewUser, CITIES};
use crate::store::StoreError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/select_city", get(list_cities).post(select_city))
}

// POST /register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 50, message = "Username must be 1 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email"), length(max = 120))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    form.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let password_hash = hash_password(&form.password, state.config.security.bcrypt_cost)
        .await
        .map_err(|e| internal_error("hash_password", e))?;

    let res = state
        .store
        .create_user(NewUser {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password_hash,
            is_admin: false,
        })
        .await;

    match res {
        Ok(user) => {
            tracing::info!("user {} registered", user.username);
            Ok((
                StatusCode::CREATED,
                Json(json!({ "id": user.id, "username": user.username, "message": "Registration successful! Please log in." })),
            ))
        }
        Err(StoreError::Duplicate(field)) if field == "email" => {
            Err((StatusCode::CONFLICT, "Email already exists.".to_string()))
        }
        Err(StoreError::Duplicate(_)) => Err((StatusCode::CONFLICT, "Username already exists.".to_string())),
        Err(e) => Err(internal_error("register", e)),
    }
}

/* ---------- CITY ---------- */

// GET /select_city
async fn list_cities(user: AuthUser) -> impl IntoResponse {
    Json(json!({ "cities": CITIES, "selected_city": user.city }))
}

#[derive(Debug, Deserialize)]
pub struct CityForm {
    pub city: String,
}

// POST /select_city
async fn select_city(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Form(form): Form<CityForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let city = form.city.trim();
    if !is_known_city(city) {
        return Err((StatusCode::BAD_REQUEST, "Please select a valid city.".to_string()));
    }

    state
        .store
        .set_user_city(user.user_id, city)
        .await
        .map_err(|e| internal_error("set_user_city", e))?;

    tracing::info!("user {} selected city {}", user.username, city);
    Ok(Redirect::to("/browse"))
}
