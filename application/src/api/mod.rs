//! GraphQL API definitions.

pub mod amenity;
pub mod booking;
pub mod listing;
mod mutation;
mod query;
pub mod report;
pub mod review;
pub mod scalar;
pub mod traffic;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    amenity::Amenity, booking::Booking, listing::Listing, mutation::Mutation,
    query::Query, review::Review, user::User,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PrivilegeError {
        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is not allowed to access the \
                     requested resource"]
        Forbidden,
    }
}
