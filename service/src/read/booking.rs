//! [`Booking`] read model definition.
//!
//! [`Booking`]: crate::domain::Booking

use common::Money;
use derive_more::{From, Into};

use crate::domain::{booking, listing, user};
#[cfg(doc)]
use crate::domain::{booking::Status, Booking, Listing, User};

/// Selector of [`Booking`]s holding a [`Listing`] within the
/// [`booking::Interval`].
///
/// [`Status::Cancelled`] ones are skipped.
#[derive(Clone, Copy, Debug)]
pub struct Overlapping {
    /// ID of the [`Listing`] to select [`Booking`]s of.
    pub listing_id: listing::Id,

    /// [`booking::Interval`] the selected [`Booking`]s overlap.
    pub interval: booking::Interval,
}

/// Selector of [`Listing`]s occupied by a [`Booking`] at the moment.
#[derive(Clone, Debug)]
pub struct ActiveAt {
    /// IDs of [`Listing`]s to check.
    pub listing_ids: Vec<listing::Id>,

    /// Moment to check the [`Listing`]s at.
    pub at: booking::PeriodDateTime,
}

/// Selector of a [`User`]'s [`Booking`]s history, latest first.
#[derive(Clone, Copy, Debug)]
pub struct History(pub user::Id);

/// Total earnings of a host [`User`] from [`Status::Confirmed`]
/// [`Booking`]s, one amount per currency.
#[derive(Clone, Debug, Default, Eq, From, Into, PartialEq)]
pub struct Earnings(pub Vec<Money>);
