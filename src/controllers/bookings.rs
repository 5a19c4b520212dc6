use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::internal_error;
use crate::booking_page::validation::NO_SEATS_SELECTED;
use crate::middleware::AuthUser;
use crate::models::{Booking, Movie, MovieWithTheater, NewBooking, Theater};
use crate::store::StoreError;
use crate::AppState;

pub const SEATS_ALREADY_BOOKED: &str = "One or more selected seats are already booked.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/book/{movie_id}", get(booking_page).post(create_booking))
        .route("/get_booked_seats/{movie_id}/{showtime}", get(get_booked_seats))
        .route("/confirmation/{booking_id}", get(get_confirmation))
}

/* ---------- helpers ---------- */

async fn load_movie(state: &AppState, movie_id: i64) -> Result<MovieWithTheater, (StatusCode, String)> {
    state
        .store
        .get_movie(movie_id)
        .await
        .map_err(|e| internal_error("get_movie", e))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Movie not found".to_string()))
}

/// Разбирает `seat_ids` формы: непустой список без повторов.
pub fn parse_seat_ids(raw: &str) -> Result<Vec<String>, &'static str> {
    if raw.trim().is_empty() {
        return Err(NO_SEATS_SELECTED);
    }
    let seats: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
    if seats.iter().any(String::is_empty) {
        return Err("Seat list contains an empty seat id");
    }
    let mut seen = HashSet::with_capacity(seats.len());
    if !seats.iter().all(|s| seen.insert(s.as_str())) {
        return Err("Seat list contains the same seat twice");
    }
    Ok(seats)
}

pub fn parse_total_price(raw: &str) -> Result<f64, &'static str> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err("Invalid total price"),
    }
}

/* ---------- BOOKING PAGE ---------- */

// GET /book/{movie_id}
#[derive(Debug, Serialize)]
pub struct BookingPageResponse {
    pub movie: Movie,
    pub theater: Theater,
    pub showtimes: Vec<String>,
    pub classic_price: f64,
    pub premium_price: f64,
    pub username: String,
}

async fn booking_page(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let MovieWithTheater { movie, theater } = load_movie(&state, movie_id).await?;

    Ok(Json(BookingPageResponse {
        showtimes: movie.showtime_list(),
        classic_price: theater.classic_price,
        premium_price: theater.premium_price,
        movie,
        theater,
        username: user.username,
    }))
}

/* ---------- SEATS ---------- */

// GET /get_booked_seats/{movie_id}/{showtime}
async fn get_booked_seats(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path((movie_id, showtime)): Path<(i64, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let seats = state
        .store
        .booked_seats(movie_id, &showtime)
        .await
        .map_err(|e| internal_error("get_booked_seats", e))?;

    tracing::debug!("movie {} showtime {:?}: {} booked seats", movie_id, showtime, seats.len());
    Ok(Json(seats))
}

/* ---------- BOOKINGS ---------- */

// POST /book/{movie_id}
#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub seat_ids: String,
    pub showtime: String,
    pub total_price: String,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(movie_id): Path<i64>,
    Form(form): Form<BookingForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let seats = parse_seat_ids(&form.seat_ids).map_err(|msg| (StatusCode::BAD_REQUEST, msg.to_string()))?;
    let total_price =
        parse_total_price(&form.total_price).map_err(|msg| (StatusCode::BAD_REQUEST, msg.to_string()))?;

    let MovieWithTheater { movie, .. } = load_movie(&state, movie_id).await?;
    let showtime = form.showtime.trim().to_string();
    if !movie.has_showtime(&showtime) {
        return Err((StatusCode::BAD_REQUEST, format!("Unknown showtime {showtime:?}")));
    }

    let res = state
        .store
        .create_booking(NewBooking {
            movie_id,
            user_id: user.user_id,
            seats,
            showtime,
            total_price,
        })
        .await;

    match res {
        Ok(booking) => {
            tracing::info!(
                "booking {} created: user={} movie={} seats={}",
                booking.id,
                user.username,
                movie_id,
                booking.seat_ids
            );
            Ok(Redirect::to(&format!("/confirmation/{}", booking.id)))
        }
        Err(StoreError::SeatsTaken(taken)) => {
            tracing::info!("booking rejected for movie {}: {:?} already booked", movie_id, taken);
            Err((StatusCode::CONFLICT, SEATS_ALREADY_BOOKED.to_string()))
        }
        Err(StoreError::NotFound) => Err((StatusCode::NOT_FOUND, "Movie not found".to_string())),
        Err(e) => Err(internal_error("create_booking", e)),
    }
}

// GET /confirmation/{booking_id}
#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub booking: Booking,
    pub seats: Vec<String>,
    pub movie: Movie,
    pub theater: Theater,
}

async fn get_confirmation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let booking = state
        .store
        .get_booking(booking_id)
        .await
        .map_err(|e| internal_error("get_booking", e))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Booking not found".to_string()))?;

    if booking.user_id != user.user_id {
        return Err((StatusCode::FORBIDDEN, "You are not authorized to view this booking.".to_string()));
    }

    let MovieWithTheater { movie, theater } = load_movie(&state, booking.movie_id).await?;
    Ok(Json(ConfirmationResponse {
        seats: booking.seat_list(),
        booking,
        movie,
        theater,
    }))
}
