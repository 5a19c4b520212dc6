use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use super::movie::split_list;

/// Запись о поиске рекомендаций по жанру
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RecommendationSearch {
    pub id: i64,
    pub genre: String,
    /// названия найденных фильмов через запятую
    pub recommended_movies: String,
    pub searched_at: NaiveDateTime,
}

impl RecommendationSearch {
    pub fn titles(&self) -> Vec<String> {
        split_list(&self.recommended_movies)
    }
}

#[derive(Debug, Clone)]
pub struct NewRecommendationSearch {
    pub genre: String,
    pub titles: Vec<String>,
}

/// Жанр фильма содержит запрос без учёта регистра.
/// Запрос ищется как есть, без шаблонных символов.
pub fn genre_matches(movie_genre: &str, query: &str) -> bool {
    movie_genre.to_lowercase().contains(&query.to_lowercase())
}
