//! [`Query`] collection related to the multiple [`Review`]s.

use common::operations::By;

use crate::domain::{listing, Review};
#[cfg(doc)]
use crate::{domain::Listing, Query};

use super::DatabaseQuery;

/// Queries the [`Review`]s of a [`Listing`], latest first.
pub type ByListing = DatabaseQuery<By<Vec<Review>, listing::Id>>;
