//! [`Review`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// Review of a `Listing` left by a `User`.
#[derive(Clone, Debug, From, Into)]
pub struct Review(domain::Review);

/// Review of a `Listing` left by a `User`.
#[graphql_object(context = Context)]
impl Review {
    /// Unique identifier of this `Review`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Reviewed `Listing`.
    #[must_use]
    pub fn listing(&self) -> api::Listing {
        #[expect(unsafe_code, reason = "`listing_id` is a foreign key")]
        unsafe {
            api::Listing::new_unchecked(self.0.listing_id)
        }
    }

    /// `User` who left this `Review`.
    #[must_use]
    pub fn author(&self) -> api::User {
        #[expect(unsafe_code, reason = "`author_id` is a foreign key")]
        unsafe {
            api::User::new_unchecked(self.0.author_id)
        }
    }

    /// Number of stars given, from 1 to 5.
    #[must_use]
    pub fn rating(&self) -> i32 {
        self.0.rating.stars().into()
    }

    /// Comment of this `Review`.
    #[must_use]
    pub fn comment(&self) -> Option<Comment> {
        self.0.comment.clone().map(Into::into)
    }

    /// `DateTime` when this `Review` was left.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Review`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::review::Id)]
#[into(domain::review::Id)]
#[graphql(name = "ReviewId", transparent)]
pub struct Id(Uuid);

/// Comment of a `Review`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ReviewComment",
    with = scalar::Via::<domain::review::Comment>,
)]
pub struct Comment(domain::review::Comment);
