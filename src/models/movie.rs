use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Theater;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genre: String,
    /// сеансы через запятую: "4:00 PM,7:00 PM"
    pub showtimes: String,
    pub theater_id: i64,
    pub poster_url: String,
}

impl Movie {
    pub fn showtime_list(&self) -> Vec<String> {
        split_list(&self.showtimes)
    }

    pub fn has_showtime(&self, showtime: &str) -> bool {
        self.showtimes.split(',').any(|s| s.trim() == showtime.trim())
    }
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub genre: String,
    pub showtimes: String,
    pub theater_id: i64,
    pub poster_url: String,
}

/// Фильм вместе с кинотеатром, для страницы бронирования и списков
#[derive(Debug, Clone, Serialize)]
pub struct MovieWithTheater {
    #[serde(flatten)]
    pub movie: Movie,
    pub theater: Theater,
}

/// Разбивает список через запятую, пустые элементы выбрасываются
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
