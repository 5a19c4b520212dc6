pub mod booking;
pub mod movie;
pub mod recommendation;
pub mod theater;
pub mod user;

pub use booking::{Booking, NewBooking};
pub use movie::{Movie, MovieWithTheater, NewMovie};
pub use recommendation::{NewRecommendationSearch, RecommendationSearch};
pub use theater::{NewTheater, SeatPrices, Theater, CITIES};
pub use user::{NewUser, User};
