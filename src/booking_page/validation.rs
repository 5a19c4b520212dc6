use serde::Serialize;

pub const NO_SEATS_SELECTED: &str = "Please select at least one seat.";
pub const MOVIE_TITLE_REQUIRED: &str = "Movie title is required.";

/// Итог проверки формы перед отправкой.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum SubmitDecision {
    Proceed,
    /// Отправка отменена, пользователю показывается alert
    Blocked { alert: &'static str },
}

impl SubmitDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, SubmitDecision::Blocked { .. })
    }
}

/// Форма добавления фильма: название не должно быть пустым после trim.
pub fn check_add_movie_title(title: &str) -> SubmitDecision {
    if title.trim().is_empty() {
        SubmitDecision::Blocked {
            alert: MOVIE_TITLE_REQUIRED,
        }
    } else {
        SubmitDecision::Proceed
    }
}
