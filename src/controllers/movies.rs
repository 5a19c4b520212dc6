//! Каталог фильмов и админские маршруты: добавление и удаление фильмов,
//! цены мест в кинотеатрах. Афиша города пользователя.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use super::internal_error;
use crate::booking_page::{check_add_movie_title, SubmitDecision};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::movie::split_list;
use crate::models::{MovieWithTheater, NewMovie, SeatPrices, Theater};
use crate::store::StoreError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/browse", get(browse_city))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/add_movie", post(add_movie))
        .route("/admin/remove_movie/{movie_id}", post(remove_movie))
        .route("/admin/seat_prices", get(list_seat_prices).post(update_seat_prices))
}

// GET /movies
async fn list_movies(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movies = state
        .store
        .list_movies()
        .await
        .map_err(|e| internal_error("list_movies", e))?;
    Ok(Json(movies))
}

// GET /browse: кинотеатры и фильмы выбранного города
#[derive(Debug, Serialize)]
pub struct CityCatalog {
    pub city: String,
    pub theaters: Vec<Theater>,
    pub movies: Vec<MovieWithTheater>,
}

async fn browse_city(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Response, (StatusCode, String)> {
    let Some(city) = user.city else {
        tracing::debug!("user {} has no city, redirecting", user.username);
        return Ok(Redirect::to("/select_city").into_response());
    };

    let theaters = state
        .store
        .list_theaters_in(&city)
        .await
        .map_err(|e| internal_error("list_theaters_in", e))?;
    let movies = state
        .store
        .list_movies_in(&city)
        .await
        .map_err(|e| internal_error("list_movies_in", e))?;

    Ok(Json(CityCatalog { city, theaters, movies }).into_response())
}

// GET /admin/dashboard
async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movies = state
        .store
        .list_movies()
        .await
        .map_err(|e| internal_error("admin_dashboard", e))?;
    Ok(Json(movies))
}

/* ---------- ADD / REMOVE ---------- */

// POST /admin/add_movie
#[derive(Debug, Deserialize, Validate)]
pub struct AddMovieForm {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 50, message = "Genre must be 1 to 50 characters"))]
    pub genre: String,
    #[validate(length(min = 1, max = 200, message = "Showtimes must be 1 to 200 characters"))]
    pub showtimes: String,
    pub theater_id: String,
    #[validate(length(max = 200))]
    pub poster_url: Option<String>,
}

async fn add_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Form(form): Form<AddMovieForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let SubmitDecision::Blocked { alert } = check_add_movie_title(&form.title) {
        return Err((StatusCode::BAD_REQUEST, alert.to_string()));
    }
    form.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let theater_id: i64 = form
        .theater_id
        .trim()
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "theater_id must be a number".to_string()))?;

    let showtimes = split_list(&form.showtimes);
    if showtimes.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "At least one showtime is required".to_string()));
    }

    let res = state
        .store
        .add_movie(NewMovie {
            title: form.title.trim().to_string(),
            genre: form.genre.trim().to_string(),
            showtimes: showtimes.join(","),
            theater_id,
            poster_url: form.poster_url.unwrap_or_default(),
        })
        .await;

    match res {
        Ok(movie) => {
            tracing::info!("movie {} ({}) added by {}", movie.id, movie.title, admin.username);
            Ok(Redirect::to("/admin/dashboard"))
        }
        Err(StoreError::NotFound) => Err((StatusCode::BAD_REQUEST, format!("Unknown theater {theater_id}"))),
        Err(e) => Err(internal_error("add_movie", e)),
    }
}

// POST /admin/remove_movie/{movie_id}
async fn remove_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let removed = state
        .store
        .remove_movie(movie_id)
        .await
        .map_err(|e| internal_error("remove_movie", e))?;

    if !removed {
        return Err((StatusCode::NOT_FOUND, "Movie not found".to_string()));
    }
    tracing::info!("movie {} removed by {}", movie_id, admin.username);
    Ok(Redirect::to("/admin/dashboard"))
}

/* ---------- SEAT PRICES ---------- */

// GET /admin/seat_prices
async fn list_seat_prices(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let theaters = state
        .store
        .list_theaters()
        .await
        .map_err(|e| internal_error("list_theaters", e))?;
    Ok(Json(theaters))
}

fn price_field(form: &HashMap<String, String>, key: &str) -> Result<f64, (StatusCode, String)> {
    let raw = form
        .get(key)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Missing field {key}")))?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err((StatusCode::BAD_REQUEST, format!("Invalid price in {key}"))),
    }
}

// POST /admin/seat_prices: поля classic_price_{id} и premium_price_{id} для каждого кинотеатра
async fn update_seat_prices(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Form(form): Form<HashMap<String, String>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let theaters = state
        .store
        .list_theaters()
        .await
        .map_err(|e| internal_error("list_theaters", e))?;

    let mut prices = Vec::with_capacity(theaters.len());
    for theater in &theaters {
        prices.push(SeatPrices {
            theater_id: theater.id,
            classic_price: price_field(&form, &format!("classic_price_{}", theater.id))?,
            premium_price: price_field(&form, &format!("premium_price_{}", theater.id))?,
        });
    }

    match state.store.update_seat_prices(&prices).await {
        Ok(()) => Ok(Redirect::to("/admin/seat_prices")),
        // кинотеатр удалили между чтением и записью
        Err(StoreError::NotFound) => Err((StatusCode::CONFLICT, "Theater list changed, retry".to_string())),
        Err(e) => Err(internal_error("update_seat_prices", e)),
    }
}
