//! [`Command`] for deleting a [`Listing`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{Booking, Review, User};
use crate::{
    domain::{listing, user, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Listing`] along with its [`Booking`]s,
/// [`Review`]s and favorite marks.
#[derive(Clone, Copy, Debug)]
pub struct DeleteListing {
    /// ID of the [`Listing`] to be deleted.
    pub listing_id: listing::Id,

    /// ID of the [`User`] who deletes the [`Listing`].
    pub user_id: user::Id,
}

impl<Db> Command<DeleteListing> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteListing {
            listing_id,
            user_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with new reservations of the `Listing`.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if !listing.is_owned_by(user_id) {
            return Err(tracerr::new!(E::NotOwner(user_id)));
        }

        tx.execute(Delete(By::<Listing, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(listing.id = %listing_id, "`Listing` deleted");

        Ok(listing)
    }
}

/// Error of [`DeleteListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`User`] doesn't own the [`Listing`].
    #[display("`User(id: {_0})` doesn't own the `Listing`")]
    NotOwner(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::listing,
        infra::database::memory::{self, usd},
        Command as _,
    };

    use super::{DeleteListing, ExecutionError};

    #[tokio::test]
    async fn owner_deletes_with_bookings() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        _ = memory::booking(
            &service,
            &listing,
            guest.id,
            ("2030-01-01T09:00", "2030-01-01T11:00"),
        );
        _ = service.database().store().favorites.insert(listing::Favorite {
            user_id: guest.id,
            listing_id: listing.id,
        });

        let deleted = service
            .execute(DeleteListing {
                listing_id: listing.id,
                user_id: host.id,
            })
            .await
            .unwrap();
        assert_eq!(deleted.id, listing.id);

        let store = service.database().store();
        assert!(store.listings.is_empty());
        assert!(store.bookings.is_empty());
        assert!(store.favorites.is_empty());
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let other = memory::user(&service, true);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let err = service
            .execute(DeleteListing {
                listing_id: listing.id,
                user_id: other.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotOwner(id) if *id == other.id,
        ));
        assert_eq!(service.database().store().listings.len(), 1);
    }
}
