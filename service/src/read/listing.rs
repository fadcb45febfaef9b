//! [`Listing`] read model definition.
//!
//! [`Listing`]: crate::domain::Listing

use rust_decimal::Decimal;

use crate::domain::{amenity, user};
#[cfg(doc)]
use crate::domain::{Amenity, Listing, User};

/// Filter of [`Listing`]s search.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// Text the [`Listing`] location should contain, regardless of its case.
    pub location: Option<String>,

    /// Lowest acceptable hourly rate amount, inclusively.
    pub min_rate: Option<Decimal>,

    /// Highest acceptable hourly rate amount, inclusively.
    pub max_rate: Option<Decimal>,

    /// [`Amenity`]s the [`Listing`] should offer all of.
    pub amenities: Vec<amenity::Id>,
}

/// Selector of all the [`Listing`]s having coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct Located;

/// Selector of [`Listing`]s owned by the host [`User`].
#[derive(Clone, Copy, Debug)]
pub struct HostedBy(pub user::Id);

/// Selector of [`Listing`]s marked as favorite by the [`User`].
#[derive(Clone, Copy, Debug)]
pub struct FavoredBy(pub user::Id);
