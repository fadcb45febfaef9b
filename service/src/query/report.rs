//! [`Query`] collection of host reports.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{user, Listing},
    infra::{database, Database},
    read::{booking::Earnings, listing::HostedBy},
    Query, Service,
};
#[cfg(doc)]
use crate::domain::{booking::Status, Booking, User};

/// Queries the dashboard of a host [`User`].
#[derive(Clone, Copy, Debug)]
pub struct HostEarnings(pub user::Id);

/// Dashboard of a host [`User`].
#[derive(Clone, Debug)]
pub struct Dashboard {
    /// [`Listing`]s owned by the host, latest first.
    pub listings: Vec<Listing>,

    /// Total price of [`Status::Confirmed`] [`Booking`]s of the
    /// [`Dashboard::listings`].
    pub earnings: Earnings,
}

impl<Db> Query<HostEarnings> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Listing>, HostedBy>>,
            Ok = Vec<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Earnings, user::Id>>,
            Ok = Earnings,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Dashboard;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        HostEarnings(host_id): HostEarnings,
    ) -> Result<Self::Ok, Self::Err> {
        let listings = self
            .database()
            .execute(Select(By::new(HostedBy(host_id))))
            .await
            .map_err(tracerr::wrap!())?;
        let earnings = self
            .database()
            .execute(Select(By::<Earnings, _>::new(host_id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Dashboard { listings, earnings })
    }
}
