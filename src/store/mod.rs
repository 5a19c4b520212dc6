//! Хранилище каталога, пользователей и броней.
//!
//! Две реализации: `PgStore` поверх sqlx и `MemoryStore` для разработки
//! без базы и для тестов. Проверка конфликта мест и вставка брони
//! выполняются атомарно в обеих.

pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{
    Booking, Movie, MovieWithTheater, NewBooking, NewMovie, NewRecommendationSearch, NewTheater, NewUser,
    RecommendationSearch, SeatPrices, Theater, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("seats already booked: {}", .0.join(","))]
    SeatsTaken(Vec<String>),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("record not found")]
    NotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn list_theaters(&self) -> StoreResult<Vec<Theater>>;
    async fn list_theaters_in(&self, city: &str) -> StoreResult<Vec<Theater>>;
    async fn add_theater(&self, theater: NewTheater) -> StoreResult<Theater>;
    /// Обновляет цены всех перечисленных кинотеатров. Если хоть одного нет - `NotFound`, ничего не меняется.
    async fn update_seat_prices(&self, prices: &[SeatPrices]) -> StoreResult<()>;

    async fn list_movies(&self) -> StoreResult<Vec<MovieWithTheater>>;
    /// Фильмы кинотеатров указанного города.
    async fn list_movies_in(&self, city: &str) -> StoreResult<Vec<MovieWithTheater>>;
    /// Фильмы, в жанре которых есть `genre` без учёта регистра. `city` сужает поиск до города.
    async fn find_movies_by_genre(&self, genre: &str, city: Option<&str>) -> StoreResult<Vec<MovieWithTheater>>;
    async fn get_movie(&self, movie_id: i64) -> StoreResult<Option<MovieWithTheater>>;
    /// `NotFound`, если кинотеатра нет.
    async fn add_movie(&self, movie: NewMovie) -> StoreResult<Movie>;
    /// Удаляет фильм вместе с его бронями.
    async fn remove_movie(&self, movie_id: i64) -> StoreResult<bool>;

    async fn find_user(&self, username: &str) -> StoreResult<Option<User>>;
    /// `Duplicate("username")` или `Duplicate("email")` при совпадении.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// `NotFound`, если пользователя нет.
    async fn set_user_city(&self, user_id: i64, city: &str) -> StoreResult<()>;

    /// Все занятые места для фильма и сеанса, в порядке броней.
    async fn booked_seats(&self, movie_id: i64, showtime: &str) -> StoreResult<Vec<String>>;
    /// `SeatsTaken` со списком пересечений, если хоть одно место уже занято.
    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking>;
    async fn get_booking(&self, booking_id: i64) -> StoreResult<Option<Booking>>;

    async fn log_recommendation_search(&self, search: NewRecommendationSearch) -> StoreResult<RecommendationSearch>;
    /// Новые поиски первыми.
    async fn list_recommendation_searches(&self) -> StoreResult<Vec<RecommendationSearch>>;
}

/// Запрошенные места, которые уже есть среди занятых.
pub fn overlapping_seats(booked: &[String], requested: &[String]) -> Vec<String> {
    let booked: HashSet<&str> = booked.iter().map(String::as_str).collect();
    requested
        .iter()
        .filter(|seat| booked.contains(seat.as_str()))
        .cloned()
        .collect()
}
