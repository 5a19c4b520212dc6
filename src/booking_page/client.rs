//! HTTP-клиент страницы бронирования: занятые места и отправка формы.

use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid booking api url: {0}")]
    Url(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! Status: {0}")]
    Status(StatusCode),
    #[error("one or more selected seats are already booked")]
    SeatsTaken,
    #[error("unexpected booking response: {0}")]
    UnexpectedResponse(String),
}

/// Источник занятых мест для пары фильм/сеанс.
#[async_trait]
pub trait BookedSeatsSource: Send + Sync {
    async fn booked_seats(&self, movie_id: i64, showtime: &str) -> Result<Vec<String>, FetchError>;
}

/// Тело формы `POST /book/{movie_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSubmission {
    pub seat_ids: String,
    pub showtime: String,
    pub total_price: String,
}

#[derive(Clone)]
pub struct BookedSeatsClient {
    base_url: Url,
    http_client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl BookedSeatsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::Url(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Url(base_url.to_string()));
        }
        // Редиректы не отслеживаем: id брони берём из Location
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            credentials: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, FetchError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_seconds))
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    /// Отправляет форму бронирования и возвращает id созданной брони.
    pub async fn submit_booking(&self, movie_id: i64, submission: &BookingSubmission) -> Result<i64, FetchError> {
        let url = self.endpoint(&["book", &movie_id.to_string()])?;
        info!("Submitting booking for movie {}: seats={}", movie_id, submission.seat_ids);

        let response = self
            .authorize(self.http_client.post(url))
            .form(submission)
            .send()
            .await?;

        match response.status() {
            StatusCode::SEE_OTHER | StatusCode::FOUND => {
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                booking_id_from_location(location)
                    .ok_or_else(|| FetchError::UnexpectedResponse(format!("redirect to {location:?}")))
            }
            StatusCode::CONFLICT => Err(FetchError::SeatsTaken),
            status => Err(FetchError::Status(status)),
        }
    }
}

#[async_trait]
impl BookedSeatsSource for BookedSeatsClient {
    async fn booked_seats(&self, movie_id: i64, showtime: &str) -> Result<Vec<String>, FetchError> {
        let url = self.endpoint(&["get_booked_seats", &movie_id.to_string(), showtime])?;
        debug!("Fetching booked seats for movie {}, showtime {}", movie_id, showtime);

        let response = self.authorize(self.http_client.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.json::<Vec<String>>().await?)
    }
}

fn booking_id_from_location(location: &str) -> Option<i64> {
    let path = location.split(['?', '#']).next()?;
    path.trim_end_matches('/')
        .rsplit_once("/confirmation/")
        .and_then(|(_, id)| id.parse().ok())
}
