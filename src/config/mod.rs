use serde::Deserialize;
use std::env;
use thiserror::Error;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: Option<DatabaseConfig>,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
    pub client: ClientConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных. Без DATABASE_URL сервер работает на in-memory хранилище
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Стоимость bcrypt для новых паролей
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
}

// Учётка администратора, создаётся при старте если её нет
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

// Настройки клиента страницы бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "cinema_booking=debug,tower_http=debug".to_string(),
            },
            database: None,
            security: SecurityConfig {
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            admin: AdminConfig {
                username: "admin".to_string(),
                email: "admin@localhost".to_string(),
                password: "admin123".to_string(),
            },
            client: ClientConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                timeout_seconds: 10,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                pool_size: parse_var("DB_POOL_SIZE", 20, "number")?,
            }),
            _ => None,
        };

        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or(defaults.app.host),
                port: parse_var("PORT", defaults.app.port, "port number")?,
                environment: env::var("ENVIRONMENT").unwrap_or(defaults.app.environment),
                rust_log: env::var("RUST_LOG").unwrap_or(defaults.app.rust_log),
            },
            database,
            security: SecurityConfig {
                bcrypt_cost: parse_var("BCRYPT_COST", defaults.security.bcrypt_cost, "number")?,
            },
            admin: AdminConfig {
                username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin.username),
                email: env::var("ADMIN_EMAIL").unwrap_or(defaults.admin.email),
                password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
            },
            client: ClientConfig {
                base_url: env::var("BOOKING_API_URL").unwrap_or(defaults.client.base_url),
                timeout_seconds: parse_var(
                    "CLIENT_TIMEOUT_SECONDS",
                    defaults.client.timeout_seconds,
                    "number",
                )?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}
