use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    /// выбранный город, `None` пока не выбран
    pub city: Option<String>,
    pub registered_at: NaiveDateTime,
}

impl User {
    // Проверить пароль по bcrypt-хешу
    pub fn verify_password(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("Broken password hash for user {}: {:?}", self.username, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}
