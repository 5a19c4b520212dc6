use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::movie::split_list;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    /// места через запятую, в том порядке, в котором их выбрал пользователь
    pub seat_ids: String,
    pub showtime: String,
    pub total_price: f64,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn seat_list(&self) -> Vec<String> {
        split_list(&self.seat_ids)
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub movie_id: i64,
    pub user_id: i64,
    pub seats: Vec<String>,
    pub showtime: String,
    pub total_price: f64,
}
