//! Рекомендации по жанру: поиск пользователя в его городе с записью в журнал,
//! поиск администратора по всему каталогу и журнал поисков.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::internal_error;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::NewRecommendationSearch;
use crate::AppState;

pub const GENRE_REQUIRED: &str = "Genre is required.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/admin/view_recommendations", post(view_recommendations))
        .route("/admin/customer_recommendations", get(customer_recommendations))
}

#[derive(Debug, Deserialize)]
pub struct GenreForm {
    pub genre: String,
}

fn parse_genre(form: &GenreForm) -> Result<&str, (StatusCode, String)> {
    let genre = form.genre.trim();
    if genre.is_empty() {
        return Err((StatusCode::BAD_REQUEST, GENRE_REQUIRED.to_string()));
    }
    if genre.chars().count() > 50 {
        return Err((StatusCode::BAD_REQUEST, "Genre must be at most 50 characters".to_string()));
    }
    Ok(genre)
}

// POST /recommend
async fn recommend(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Form(form): Form<GenreForm>,
) -> Result<Response, (StatusCode, String)> {
    let genre = parse_genre(&form)?;
    let Some(city) = user.city.as_deref() else {
        return Ok(Redirect::to("/select_city").into_response());
    };

    let movies = state
        .store
        .find_movies_by_genre(genre, Some(city))
        .await
        .map_err(|e| internal_error("find_movies_by_genre", e))?;

    // пустой результат в журнал не пишем
    if !movies.is_empty() {
        state
            .store
            .log_recommendation_search(NewRecommendationSearch {
                genre: genre.to_string(),
                titles: movies.iter().map(|m| m.movie.title.clone()).collect(),
            })
            .await
            .map_err(|e| internal_error("log_recommendation_search", e))?;
    }

    tracing::info!("user {} searched {:?} in {}: {} movies", user.username, genre, city, movies.len());
    Ok(Json(movies).into_response())
}

// POST /admin/view_recommendations
async fn view_recommendations(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Form(form): Form<GenreForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let genre = parse_genre(&form)?;
    let movies = state
        .store
        .find_movies_by_genre(genre, None)
        .await
        .map_err(|e| internal_error("find_movies_by_genre", e))?;
    Ok(Json(movies))
}

// GET /admin/customer_recommendations
async fn customer_recommendations(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let searches = state
        .store
        .list_recommendation_searches()
        .await
        .map_err(|e| internal_error("list_recommendation_searches", e))?;
    Ok(Json(searches))
}
