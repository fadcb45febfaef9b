//! Host reports definitions.

use common::Money;
use derive_more::{From, Into};
use juniper::graphql_object;
use service::query;

use crate::{api, Context};

/// Dashboard of a host `User`.
#[derive(Clone, Debug, From, Into)]
pub struct Dashboard(query::report::Dashboard);

/// Dashboard of a host `User`.
#[graphql_object(name = "HostDashboard", context = Context)]
impl Dashboard {
    /// `Listing`s of the host, latest first.
    #[must_use]
    pub fn listings(&self) -> Vec<api::Listing> {
        self.0.listings.iter().cloned().map(Into::into).collect()
    }

    /// Total price of the confirmed `Booking`s of the host's `Listing`s.
    ///
    /// One amount per currency, empty if nothing is earned yet.
    #[must_use]
    pub fn earnings(&self) -> Vec<Money> {
        self.0.earnings.0.clone()
    }
}
