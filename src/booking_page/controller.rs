use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::client::{BookedSeatsSource, BookingSubmission, FetchError};
use super::draft::{compute_draft, parse_price, BookingDraft};
use super::page::{movie_id_from_action, BookingPage, SeatStatus};
use super::validation::{SubmitDecision, NO_SEATS_SELECTED};

/// Причины, по которым страница остаётся без бронирования.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("Booking form not found")]
    MissingForm,
    #[error("Movie ID not found in form action {0:?}")]
    MissingMovieId(String),
    #[error("No seats found in seat selection grid")]
    NoSeats,
    #[error("Total price elements not found")]
    MissingPriceFields,
    #[error("Seat ids field not found")]
    MissingSeatIdsField,
    #[error("Showtime selector not found")]
    MissingShowtime,
}

/// Запрос занятых мест, помеченный сеансом, для которого он ушёл.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub movie_id: i64,
    pub showtime: String,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected,
    Deselected,
    /// место занято, клик ничего не меняет
    Ignored,
    UnknownSeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied {
        booked: usize,
        /// выбранные места, которые оказались заняты
        evicted: Vec<String>,
    },
    /// ответ для сеанса, который уже не выбран, или обогнанный более новым
    Stale,
}

/// Контроллер выбора мест. Владеет снимком страницы и текущим выбором.
#[derive(Debug, Clone)]
pub struct SeatSelectionController {
    movie_id: i64,
    page: BookingPage,
    index: HashMap<String, usize>,
    selection: Vec<String>,
    generation: u64,
    /// поколение последнего применённого ответа
    applied: u64,
}

impl SeatSelectionController {
    pub fn initialize(mut page: BookingPage) -> Result<Self, InitError> {
        let result = Self::check_page(&page);
        let movie_id = match result {
            Ok(id) => id,
            Err(e) => {
                error!("{}", e);
                return Err(e);
            }
        };

        let mut index = HashMap::with_capacity(page.seats.len());
        for (i, seat) in page.seats.iter_mut().enumerate() {
            // выбор всегда начинается с пустого
            if seat.status == SeatStatus::Selected {
                seat.status = SeatStatus::Available;
            }
            index.entry(seat.seat.clone()).or_insert(i);
        }

        info!("Booking form initialized for movie {} with {} seats", movie_id, page.seats.len());

        let mut controller = Self {
            movie_id,
            page,
            index,
            selection: Vec::new(),
            generation: 0,
            applied: 0,
        };
        controller.update_seat_ids_and_price();
        Ok(controller)
    }

    fn check_page(page: &BookingPage) -> Result<i64, InitError> {
        let action = page.form_action.as_deref().ok_or(InitError::MissingForm)?;
        let movie_id = movie_id_from_action(action).ok_or_else(|| InitError::MissingMovieId(action.to_string()))?;
        if page.seats.is_empty() {
            return Err(InitError::NoSeats);
        }
        if page.total_price_field.is_none() || page.total_price_display.is_none() {
            return Err(InitError::MissingPriceFields);
        }
        if page.seat_ids_field.is_none() {
            return Err(InitError::MissingSeatIdsField);
        }
        if page.showtime.is_none() {
            return Err(InitError::MissingShowtime);
        }
        Ok(movie_id)
    }

    pub fn movie_id(&self) -> i64 {
        self.movie_id
    }

    pub fn page(&self) -> &BookingPage {
        &self.page
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn showtime(&self) -> &str {
        self.page.showtime.as_deref().unwrap_or_default()
    }

    pub fn seat_status(&self, seat_id: &str) -> Option<SeatStatus> {
        self.index.get(seat_id).map(|&i| self.page.seats[i].status)
    }

    pub fn seat_ids_value(&self) -> &str {
        self.page.seat_ids_field.as_deref().unwrap_or_default()
    }

    pub fn total_price_value(&self) -> &str {
        self.page.total_price_field.as_deref().unwrap_or_default()
    }

    pub fn total_price_display(&self) -> &str {
        self.page.total_price_display.as_deref().unwrap_or_default()
    }

    /// Текущий черновик, пересчитанный из выбора.
    pub fn draft(&self) -> BookingDraft {
        compute_draft(&self.selection, |id| {
            self.page.seat(id).map(|seat| parse_price(seat.price.as_deref())).unwrap_or(0.0)
        })
    }

    /// Клик по месту: занятое игнорируется, остальные переключаются.
    pub fn click(&mut self, seat_id: &str) -> ClickOutcome {
        let Some(&i) = self.index.get(seat_id) else {
            warn!("Seat clicked that is not on the page: {}", seat_id);
            return ClickOutcome::UnknownSeat;
        };
        let seat = &mut self.page.seats[i];
        debug!("Seat clicked: {}, Price: {:?}", seat_id, seat.price);

        let outcome = match seat.status {
            SeatStatus::Booked => return ClickOutcome::Ignored,
            SeatStatus::Selected => {
                seat.status = SeatStatus::Available;
                self.selection.retain(|id| id != seat_id);
                ClickOutcome::Deselected
            }
            SeatStatus::Available => {
                seat.status = SeatStatus::Selected;
                self.selection.push(seat_id.to_string());
                ClickOutcome::Selected
            }
        };
        self.update_seat_ids_and_price();
        outcome
    }

    /// Пишет id мест и сумму в поля формы и на экран.
    pub fn update_seat_ids_and_price(&mut self) -> BookingDraft {
        let draft = self.draft();
        let total = draft.total_price_text();
        self.page.seat_ids_field = Some(draft.seat_ids.clone());
        self.page.total_price_field = Some(total.clone());
        self.page.total_price_display = Some(total);
        debug!("Selected seats: {:?}, Total price: {}", self.selection, draft.total_price_text());
        draft
    }

    /// Начинает запрос занятых мест для текущего сеанса.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            movie_id: self.movie_id,
            showtime: self.showtime().to_string(),
            generation: self.generation,
        }
    }

    /// Смена сеанса: обновляет селектор и выдаёт новый запрос.
    pub fn change_showtime(&mut self, showtime: impl Into<String>) -> FetchTicket {
        self.page.showtime = Some(showtime.into());
        self.begin_fetch()
    }

    /// Применяет ответ сервера. Ответ для устаревшего сеанса отбрасывается,
    /// как и ответ, обогнанный более новым запросом.
    pub fn apply_booked_seats(&mut self, ticket: &FetchTicket, booked: &[String]) -> ApplyOutcome {
        if ticket.showtime != self.showtime() {
            debug!(
                "Discarding booked seats for showtime {:?}, current is {:?}",
                ticket.showtime,
                self.showtime()
            );
            return ApplyOutcome::Stale;
        }
        if ticket.generation <= self.applied {
            debug!(
                "Discarding booked seats from request {}, request {} already applied",
                ticket.generation, self.applied
            );
            return ApplyOutcome::Stale;
        }
        self.applied = ticket.generation;

        let booked: HashSet<&str> = booked.iter().map(String::as_str).collect();
        let mut evicted = Vec::new();
        let mut booked_count = 0;

        for seat in self.page.seats.iter_mut() {
            if booked.contains(seat.seat.as_str()) {
                seat.status = SeatStatus::Booked;
                booked_count += 1;
                if self.selection.iter().any(|id| id == &seat.seat) {
                    self.selection.retain(|id| id != &seat.seat);
                    evicted.push(seat.seat.clone());
                }
            } else if seat.status != SeatStatus::Selected {
                seat.status = SeatStatus::Available;
            }
        }
        // id из выбора без элемента на странице тоже не должны остаться
        self.selection.retain(|id| !booked.contains(id.as_str()));

        if !evicted.is_empty() {
            info!("Seats {:?} were booked by someone else and removed from selection", evicted);
        }
        self.update_seat_ids_and_price();

        ApplyOutcome::Applied {
            booked: booked_count,
            evicted,
        }
    }

    /// Полный цикл: запрос, ожидание ответа, применение.
    /// При ошибке сети состояние мест не меняется.
    pub async fn refresh_booked_seats<S>(&mut self, source: &S) -> Result<ApplyOutcome, FetchError>
    where
        S: BookedSeatsSource + ?Sized,
    {
        let ticket = self.begin_fetch();
        debug!("Fetching booked seats for movie {}, showtime {}", ticket.movie_id, ticket.showtime);
        match source.booked_seats(ticket.movie_id, &ticket.showtime).await {
            Ok(booked) => Ok(self.apply_booked_seats(&ticket, &booked)),
            Err(e) => {
                error!("Error fetching booked seats: {}", e);
                Err(e)
            }
        }
    }

    /// Проверка перед отправкой формы бронирования.
    pub fn validate_submit(&self) -> SubmitDecision {
        if self.seat_ids_value().is_empty() {
            info!("Form submission blocked: No seats selected");
            SubmitDecision::Blocked {
                alert: NO_SEATS_SELECTED,
            }
        } else {
            SubmitDecision::Proceed
        }
    }

    /// Тело формы, если отправка разрешена.
    pub fn submission(&self) -> Option<BookingSubmission> {
        if self.validate_submit().is_blocked() {
            return None;
        }
        Some(BookingSubmission {
            seat_ids: self.seat_ids_value().to_string(),
            showtime: self.showtime().to_string(),
            total_price: self.total_price_value().to_string(),
        })
    }
}
