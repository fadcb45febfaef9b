//! [`Amenity`]-related definitions.

use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::Context;

/// Feature a `Listing` may offer.
#[derive(Clone, Debug, From, Into)]
pub struct Amenity(domain::Amenity);

/// Feature a `Listing` may offer.
#[graphql_object(context = Context)]
impl Amenity {
    /// Unique identifier of this `Amenity`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `Amenity`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name.as_ref()
    }
}

/// Unique identifier of an `Amenity`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::amenity::Id)]
#[into(domain::amenity::Id)]
#[graphql(name = "AmenityId", transparent)]
pub struct Id(Uuid);
