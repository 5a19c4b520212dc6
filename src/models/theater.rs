use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_CLASSIC_PRICE: f64 = 500.0;
pub const DEFAULT_PREMIUM_PRICE: f64 = 1000.0;

/// Города, которые можно выбрать для просмотра афиши
pub const CITIES: [&str; 12] = [
    "Mumbai", "Delhi", "Bangalore", "Hyderabad", "Chennai", "Kolkata",
    "Pune", "Ahmedabad", "Jaipur", "Lucknow", "Kochi", "Indore",
];

pub fn is_known_city(city: &str) -> bool {
    CITIES.contains(&city)
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Theater {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub classic_price: f64,
    pub premium_price: f64,
}

#[derive(Debug, Clone)]
pub struct NewTheater {
    pub name: String,
    pub location: String,
    pub classic_price: f64,
    pub premium_price: f64,
}

impl NewTheater {
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            classic_price: DEFAULT_CLASSIC_PRICE,
            premium_price: DEFAULT_PREMIUM_PRICE,
        }
    }
}

/// Новые цены мест для одного кинотеатра
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeatPrices {
    pub theater_id: i64,
    pub classic_price: f64,
    pub premium_price: f64,
}
