//! Страница бронирования без браузера.
//!
//! Пользователь кликает по местам, контроллер ведёт выбор, считает сумму
//! и обновляет занятые места при смене сеанса. Перед отправкой формы
//! выполняется минимальная проверка, окончательное решение за сервером.

pub mod client;
pub mod controller;
pub mod draft;
pub mod page;
pub mod validation;

pub use client::{BookedSeatsClient, BookedSeatsSource, BookingSubmission, FetchError};
pub use controller::{ApplyOutcome, ClickOutcome, FetchTicket, InitError, SeatSelectionController};
pub use draft::BookingDraft;
pub use page::{BookingPage, SeatElement, SeatStatus};
pub use validation::{check_add_movie_title, SubmitDecision};
