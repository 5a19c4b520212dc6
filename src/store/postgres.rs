use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use tracing::{debug, info};

use super::{overlapping_seats, BookingStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::movie::split_list;
use crate::models::{
    Booking, Movie, MovieWithTheater, NewBooking, NewMovie, NewRecommendationSearch, NewTheater, NewUser,
    RecommendationSearch, SeatPrices, Theater, User,
};

const MOVIE_SELECT: &str = r#"
    SELECT m.id, m.title, m.genre, m.showtimes, m.theater_id, m.poster_url,
           t.name AS theater_name, t.location AS theater_location,
           t.classic_price, t.premium_price
    FROM movies m
    JOIN theaters t ON t.id = m.theater_id
"#;

const BOOKING_COLUMNS: &str = "id, movie_id, user_id, seat_ids, showtime, total_price, created_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, city, registered_at";
const THEATER_COLUMNS: &str = "id, name, location, classic_price, premium_price";

// Строка фильма вместе с кинотеатром
#[derive(FromRow)]
struct MovieRow {
    id: i64,
    title: String,
    genre: String,
    showtimes: String,
    theater_id: i64,
    poster_url: String,
    theater_name: String,
    theater_location: String,
    classic_price: f64,
    premium_price: f64,
}

impl From<MovieRow> for MovieWithTheater {
    fn from(row: MovieRow) -> Self {
        MovieWithTheater {
            theater: Theater {
                id: row.theater_id,
                name: row.theater_name,
                location: row.theater_location,
                classic_price: row.classic_price,
                premium_price: row.premium_price,
            },
            movie: Movie {
                id: row.id,
                title: row.title,
                genre: row.genre,
                showtimes: row.showtimes,
                theater_id: row.theater_id,
                poster_url: row.poster_url,
            },
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Пул соединений по настройкам из окружения.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.url)
            .await?;
        info!("Database connected, pool size {}", config.pool_size);
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }
}

// Нарушение уникальности users -> Duplicate с именем поля
fn map_user_conflict(e: sqlx::Error) -> StoreError {
    let field: Option<&'static str> = e
        .as_database_error()
        .and_then(|db| db.constraint())
        .and_then(|constraint| match constraint {
            "users_username_key" => Some("username"),
            "users_email_key" => Some("email"),
            _ => None,
        });
    match field {
        Some(field) => StoreError::Duplicate(field.to_string()),
        None => StoreError::Database(e),
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn list_theaters(&self) -> StoreResult<Vec<Theater>> {
        let theaters = sqlx::query_as::<_, Theater>(&format!("SELECT {THEATER_COLUMNS} FROM theaters ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(theaters)
    }

    async fn list_theaters_in(&self, city: &str) -> StoreResult<Vec<Theater>> {
        let theaters = sqlx::query_as::<_, Theater>(&format!(
            "SELECT {THEATER_COLUMNS} FROM theaters WHERE location = $1 ORDER BY id"
        ))
        .bind(city)
        .fetch_all(&self.pool)
        .await?;
        Ok(theaters)
    }

    async fn add_theater(&self, theater: NewTheater) -> StoreResult<Theater> {
        let theater = sqlx::query_as::<_, Theater>(
            "INSERT INTO theaters (name, location, classic_price, premium_price)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, location, classic_price, premium_price",
        )
        .bind(&theater.name)
        .bind(&theater.location)
        .bind(theater.classic_price)
        .bind(theater.premium_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(theater)
    }

    async fn update_seat_prices(&self, prices: &[SeatPrices]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for p in prices {
            let updated = sqlx::query(
                "UPDATE theaters SET classic_price = $1, premium_price = $2 WHERE id = $3",
            )
            .bind(p.classic_price)
            .bind(p.premium_price)
            .bind(p.theater_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                tx.rollback().await?;
                return Err(StoreError::NotFound);
            }
        }

        tx.commit().await?;
        info!("Seat prices updated for {} theaters", prices.len());
        Ok(())
    }

    async fn list_movies(&self) -> StoreResult<Vec<MovieWithTheater>> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!("{MOVIE_SELECT} ORDER BY m.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_movies_in(&self, city: &str) -> StoreResult<Vec<MovieWithTheater>> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!("{MOVIE_SELECT} WHERE t.location = $1 ORDER BY m.id"))
            .bind(city)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_movies_by_genre(&self, genre: &str, city: Option<&str>) -> StoreResult<Vec<MovieWithTheater>> {
        // strpos вместо ILIKE: % и _ в запросе ищутся как обычные символы
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "{MOVIE_SELECT}
             WHERE strpos(lower(m.genre), lower($1)) > 0
               AND ($2::TEXT IS NULL OR t.location = $2)
             ORDER BY m.id"
        ))
        .bind(genre)
        .bind(city)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_movie(&self, movie_id: i64) -> StoreResult<Option<MovieWithTheater>> {
        let row = sqlx::query_as::<_, MovieRow>(&format!("{MOVIE_SELECT} WHERE m.id = $1"))
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn add_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        let theater_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM theaters WHERE id = $1)",
        )
        .bind(movie.theater_id)
        .fetch_one(&self.pool)
        .await?;
        if !theater_exists {
            return Err(StoreError::NotFound);
        }

        let movie = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, genre, showtimes, theater_id, poster_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, title, genre, showtimes, theater_id, poster_url",
        )
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(&movie.showtimes)
        .bind(movie.theater_id)
        .bind(&movie.poster_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn remove_movie(&self, movie_id: i64) -> StoreResult<bool> {
        // брони удаляются каскадом
        let removed = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, is_admin)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_conflict)
    }

    async fn set_user_city(&self, user_id: i64, city: &str) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE users SET city = $1 WHERE id = $2")
            .bind(city)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn booked_seats(&self, movie_id: i64, showtime: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT seat_ids FROM bookings WHERE movie_id = $1 AND showtime = $2 ORDER BY id",
        )
        .bind(movie_id)
        .bind(showtime)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().flat_map(|r| split_list(r)).collect())
    }

    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        let mut tx = self.pool.begin().await?;

        // Сериализуем брони одного фильма до конца транзакции
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(booking.movie_id)
            .execute(&mut *tx)
            .await?;

        let movie_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)",
        )
        .bind(booking.movie_id)
        .fetch_one(&mut *tx)
        .await?;
        if !movie_exists {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }

        let rows = sqlx::query_scalar::<_, String>(
            "SELECT seat_ids FROM bookings WHERE movie_id = $1 AND showtime = $2",
        )
        .bind(booking.movie_id)
        .bind(&booking.showtime)
        .fetch_all(&mut *tx)
        .await?;
        let booked: Vec<String> = rows.iter().flat_map(|r| split_list(r)).collect();

        let taken = overlapping_seats(&booked, &booking.seats);
        if !taken.is_empty() {
            tx.rollback().await?;
            debug!("Booking for movie {} rejected, taken seats: {:?}", booking.movie_id, taken);
            return Err(StoreError::SeatsTaken(taken));
        }

        let created = sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (movie_id, user_id, seat_ids, showtime, total_price)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.movie_id)
        .bind(booking.user_id)
        .bind(booking.seats.join(","))
        .bind(&booking.showtime)
        .bind(booking.total_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_booking(&self, booking_id: i64) -> StoreResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    async fn log_recommendation_search(&self, search: NewRecommendationSearch) -> StoreResult<RecommendationSearch> {
        let search = sqlx::query_as::<_, RecommendationSearch>(
            "INSERT INTO recommendation_searches (genre, recommended_movies)
             VALUES ($1, $2)
             RETURNING id, genre, recommended_movies, searched_at",
        )
        .bind(&search.genre)
        .bind(search.titles.join(","))
        .fetch_one(&self.pool)
        .await?;
        Ok(search)
    }

    async fn list_recommendation_searches(&self) -> StoreResult<Vec<RecommendationSearch>> {
        let searches = sqlx::query_as::<_, RecommendationSearch>(
            "SELECT id, genre, recommended_movies, searched_at
             FROM recommendation_searches
             ORDER BY searched_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(searches)
    }
}
