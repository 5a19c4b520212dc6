pub mod bookings;
pub mod movies;
pub mod recommendations;
pub mod users;

use axum::{http::StatusCode, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(users::routes())
        .merge(movies::routes())
        .merge(bookings::routes())
        .merge(recommendations::routes())
}

// Внутренняя ошибка: подробности в лог, клиенту общий текст
pub(crate) fn internal_error(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    tracing::error!("{} failed: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
}
