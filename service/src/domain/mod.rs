//! Domain definitions.

pub mod amenity;
pub mod booking;
pub mod geo;
pub mod listing;
pub mod review;
pub mod traffic;
pub mod user;

pub use self::{
    amenity::Amenity, booking::Booking, listing::Listing, review::Review,
    user::User,
};
