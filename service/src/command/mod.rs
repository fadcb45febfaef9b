//! [`Command`] definition.

pub mod adjust_traffic_occupancy;
pub mod authorize_user_session;
pub mod cancel_booking;
pub mod confirm_booking_payment;
pub mod create_booking;
pub mod create_listing;
pub mod create_review;
pub mod create_traffic_area;
pub mod create_user;
pub mod create_user_session;
pub mod delete_listing;
pub mod toggle_favorite_listing;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    adjust_traffic_occupancy::AdjustTrafficOccupancy,
    authorize_user_session::AuthorizeUserSession,
    cancel_booking::CancelBooking,
    confirm_booking_payment::ConfirmBookingPayment,
    create_booking::CreateBooking, create_listing::CreateListing,
    create_review::CreateReview, create_traffic_area::CreateTrafficArea,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_listing::DeleteListing,
    toggle_favorite_listing::ToggleFavoriteListing,
};
