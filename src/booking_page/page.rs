//! Снимок страницы бронирования: форма, сетка мест, селектор сеанса и поля вывода.

use serde::{Deserialize, Serialize};

/// Состояние места. На странице отражается взаимоисключающими CSS-классами.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    Booked,
}

/// Элемент `.seat` с атрибутами `data-seat` и `data-price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatElement {
    pub seat: String,
    pub price: Option<String>,
    pub status: SeatStatus,
}

impl SeatElement {
    pub fn new(seat: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            seat: seat.into(),
            price: Some(price.into()),
            status: SeatStatus::Available,
        }
    }

    pub fn booked(mut self) -> Self {
        self.status = SeatStatus::Booked;
        self
    }
}

/// Всё, что контроллер находит на странице при загрузке.
/// `None` означает, что элемента в разметке нет.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingPage {
    /// action формы `#booking-form`
    pub form_action: Option<String>,
    pub seats: Vec<SeatElement>,
    /// значение `#showtime`
    pub showtime: Option<String>,
    /// скрытое поле `#seat_ids`
    pub seat_ids_field: Option<String>,
    /// скрытое поле `#total_price`
    pub total_price_field: Option<String>,
    /// `#total-price-display`
    pub total_price_display: Option<String>,
}

impl BookingPage {
    /// Страница со всеми полями на месте и пустыми значениями.
    pub fn new(form_action: impl Into<String>, showtime: impl Into<String>, seats: Vec<SeatElement>) -> Self {
        Self {
            form_action: Some(form_action.into()),
            seats,
            showtime: Some(showtime.into()),
            seat_ids_field: Some(String::new()),
            total_price_field: Some(String::new()),
            total_price_display: Some(String::new()),
        }
    }

    pub fn seat(&self, seat_id: &str) -> Option<&SeatElement> {
        self.seats.iter().find(|s| s.seat == seat_id)
    }
}

/// Достаёт id фильма из пути вида `/book/<digits>`.
pub fn movie_id_from_action(action: &str) -> Option<i64> {
    const MARKER: &str = "/book/";
    let mut rest = action;
    while let Some(pos) = rest.find(MARKER) {
        let tail = &rest[pos + MARKER.len()..];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
        rest = tail;
    }
    None
}
