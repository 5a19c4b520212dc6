use tracing::info;

use super::{BookingStore, StoreError, StoreResult};
use crate::config::AdminConfig;
use crate::models::{NewMovie, NewTheater, NewUser};

// (кинотеатр, город)
const THEATERS: [(&str, &str); 8] = [
    ("PVR Orion Mall", "Bangalore"),
    ("INOX South City", "Kolkata"),
    ("PVR Ambience Mall", "Delhi"),
    ("Cinepolis Viviana Mall", "Mumbai"),
    ("Sathyam Cinemas", "Chennai"),
    ("PVR Banjara Hills", "Hyderabad"),
    ("INOX Amanora Mall", "Pune"),
    ("PVR SG Highway", "Ahmedabad"),
];

// (название, жанр, сеансы, постер); i-й фильм идёт в i-м кинотеатре
const MOVIES: [(&str, &str, &str, &str); 8] = [
    ("Inception", "Sci-Fi, Thriller", "4:00 PM,7:00 PM,10:00 PM", "images/inception.jpg"),
    ("The Dark Knight", "Action, Thriller", "5:00 PM,8:00 PM,11:00 PM", "images/dark_knight.jpg"),
    ("La La Land", "Romance, Musical", "3:00 PM,6:00 PM,9:00 PM", "images/lalaland.jpg"),
    ("Interstellar", "Sci-Fi, Adventure", "6:00 PM,9:00 PM,12:00 AM", "images/interstellar.jpg"),
    ("Dangal", "Drama, Sports", "2:00 PM,5:00 PM,8:00 PM", "images/dangal.jpg"),
    ("Baahubali", "Action, Drama", "3:00 PM,6:00 PM,9:00 PM", "images/baahubali.jpg"),
    ("3 Idiots", "Comedy, Drama", "4:00 PM,7:00 PM,10:00 PM", "images/3idiots.jpg"),
    ("Gujarati Natak", "Drama, Comedy", "5:00 PM,8:00 PM,11:00 PM", "images/gujarati_natak.jpg"),
];

/// Заполняет пустой каталог. Возвращает `false`, если кинотеатры уже есть.
pub async fn seed_catalog(store: &dyn BookingStore) -> StoreResult<bool> {
    if !store.list_theaters().await?.is_empty() {
        return Ok(false);
    }

    let mut theater_ids = Vec::with_capacity(THEATERS.len());
    for (name, location) in THEATERS {
        theater_ids.push(store.add_theater(NewTheater::new(name, location)).await?.id);
    }

    for ((title, genre, showtimes, poster), theater_id) in MOVIES.into_iter().zip(theater_ids) {
        store
            .add_movie(NewMovie {
                title: title.to_string(),
                genre: genre.to_string(),
                showtimes: showtimes.to_string(),
                theater_id,
                poster_url: poster.to_string(),
            })
            .await?;
    }

    info!("Catalog seeded with {} theaters and {} movies", THEATERS.len(), MOVIES.len());
    Ok(true)
}

/// Создаёт администратора из конфигурации, если такого пользователя ещё нет.
pub async fn ensure_admin(store: &dyn BookingStore, admin: &AdminConfig, bcrypt_cost: u32) -> anyhow::Result<bool> {
    if store.find_user(&admin.username).await?.is_some() {
        return Ok(false);
    }

    let password_hash = crate::middleware::hash_password(&admin.password, bcrypt_cost).await?;
    let created = store
        .create_user(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            is_admin: true,
        })
        .await;

    match created {
        Ok(user) => {
            info!("Admin account {} created", user.username);
            Ok(true)
        }
        // параллельный старт уже создал его
        Err(StoreError::Duplicate(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
