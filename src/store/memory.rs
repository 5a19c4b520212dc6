use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{overlapping_seats, BookingStore, StoreError, StoreResult};
use crate::models::recommendation::genre_matches;
use crate::models::{
    Booking, Movie, MovieWithTheater, NewBooking, NewMovie, NewRecommendationSearch, NewTheater, NewUser,
    RecommendationSearch, SeatPrices, Theater, User,
};

/// Хранилище в памяти процесса. Данные живут до перезапуска.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    theaters: Vec<Theater>,
    movies: Vec<Movie>,
    users: Vec<User>,
    bookings: Vec<Booking>,
    searches: Vec<RecommendationSearch>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_theater(&self, movie: &Movie) -> Option<MovieWithTheater> {
        self.theaters
            .iter()
            .find(|t| t.id == movie.theater_id)
            .map(|theater| MovieWithTheater {
                movie: movie.clone(),
                theater: theater.clone(),
            })
    }

    fn movies_where<F>(&self, keep: F) -> Vec<MovieWithTheater>
    where
        F: Fn(&MovieWithTheater) -> bool,
    {
        self.movies
            .iter()
            .filter_map(|m| self.with_theater(m))
            .filter(|m| keep(m))
            .collect()
    }

    fn booked_seats(&self, movie_id: i64, showtime: &str) -> Vec<String> {
        self.bookings
            .iter()
            .filter(|b| b.movie_id == movie_id && b.showtime == showtime)
            .flat_map(|b| b.seat_list())
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn list_theaters(&self) -> StoreResult<Vec<Theater>> {
        Ok(self.inner.read().await.theaters.clone())
    }

    async fn list_theaters_in(&self, city: &str) -> StoreResult<Vec<Theater>> {
        let inner = self.inner.read().await;
        Ok(inner.theaters.iter().filter(|t| t.location == city).cloned().collect())
    }

    async fn add_theater(&self, theater: NewTheater) -> StoreResult<Theater> {
        let mut inner = self.inner.write().await;
        let theater = Theater {
            id: inner.next_id(),
            name: theater.name,
            location: theater.location,
            classic_price: theater.classic_price,
            premium_price: theater.premium_price,
        };
        inner.theaters.push(theater.clone());
        Ok(theater)
    }

    async fn update_seat_prices(&self, prices: &[SeatPrices]) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if prices
            .iter()
            .any(|p| !inner.theaters.iter().any(|t| t.id == p.theater_id))
        {
            return Err(StoreError::NotFound);
        }
        for p in prices {
            if let Some(theater) = inner.theaters.iter_mut().find(|t| t.id == p.theater_id) {
                theater.classic_price = p.classic_price;
                theater.premium_price = p.premium_price;
            }
        }
        Ok(())
    }

    async fn list_movies(&self) -> StoreResult<Vec<MovieWithTheater>> {
        Ok(self.inner.read().await.movies_where(|_| true))
    }

    async fn list_movies_in(&self, city: &str) -> StoreResult<Vec<MovieWithTheater>> {
        Ok(self.inner.read().await.movies_where(|m| m.theater.location == city))
    }

    async fn find_movies_by_genre(&self, genre: &str, city: Option<&str>) -> StoreResult<Vec<MovieWithTheater>> {
        Ok(self.inner.read().await.movies_where(|m| {
            genre_matches(&m.movie.genre, genre) && city.map_or(true, |c| m.theater.location == c)
        }))
    }

    async fn get_movie(&self, movie_id: i64) -> StoreResult<Option<MovieWithTheater>> {
        let inner = self.inner.read().await;
        Ok(inner
            .movies
            .iter()
            .find(|m| m.id == movie_id)
            .and_then(|m| inner.with_theater(m)))
    }

    async fn add_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        let mut inner = self.inner.write().await;
        if !inner.theaters.iter().any(|t| t.id == movie.theater_id) {
            return Err(StoreError::NotFound);
        }
        let movie = Movie {
            id: inner.next_id(),
            title: movie.title,
            genre: movie.genre,
            showtimes: movie.showtimes,
            theater_id: movie.theater_id,
            poster_url: movie.poster_url,
        };
        inner.movies.push(movie.clone());
        Ok(movie)
    }

    async fn remove_movie(&self, movie_id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.movies.len();
        inner.movies.retain(|m| m.id != movie_id);
        if inner.movies.len() == before {
            return Ok(false);
        }
        inner.bookings.retain(|b| b.movie_id != movie_id);
        Ok(true)
    }

    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        let user = User {
            id: inner.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            city: None,
            registered_at: chrono::Utc::now().naive_utc(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn set_user_city(&self, user_id: i64, city: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::NotFound)?;
        user.city = Some(city.to_string());
        Ok(())
    }

    async fn booked_seats(&self, movie_id: i64, showtime: &str) -> StoreResult<Vec<String>> {
        Ok(self.inner.read().await.booked_seats(movie_id, showtime))
    }

    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        // проверка и вставка под одной блокировкой записи
        let mut inner = self.inner.write().await;
        if !inner.movies.iter().any(|m| m.id == booking.movie_id) {
            return Err(StoreError::NotFound);
        }
        let taken = overlapping_seats(
            &inner.booked_seats(booking.movie_id, &booking.showtime),
            &booking.seats,
        );
        if !taken.is_empty() {
            return Err(StoreError::SeatsTaken(taken));
        }

        let booking = Booking {
            id: inner.next_id(),
            movie_id: booking.movie_id,
            user_id: booking.user_id,
            seat_ids: booking.seats.join(","),
            showtime: booking.showtime,
            total_price: booking.total_price,
            created_at: chrono::Utc::now().naive_utc(),
        };
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, booking_id: i64) -> StoreResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.iter().find(|b| b.id == booking_id).cloned())
    }

    async fn log_recommendation_search(&self, search: NewRecommendationSearch) -> StoreResult<RecommendationSearch> {
        let mut inner = self.inner.write().await;
        let search = RecommendationSearch {
            id: inner.next_id(),
            genre: search.genre,
            recommended_movies: search.titles.join(","),
            searched_at: chrono::Utc::now().naive_utc(),
        };
        inner.searches.push(search.clone());
        Ok(search)
    }

    async fn list_recommendation_searches(&self) -> StoreResult<Vec<RecommendationSearch>> {
        let inner = self.inner.read().await;
        let mut searches = inner.searches.clone();
        // при равном времени новее тот, у кого id больше
        searches.sort_by(|a, b| b.searched_at.cmp(&a.searched_at).then(b.id.cmp(&a.id)));
        Ok(searches)
    }
}
