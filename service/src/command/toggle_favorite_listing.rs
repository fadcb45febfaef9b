//! [`Command`] for toggling a favorite [`Listing`] of a [`User`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{listing, user, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for toggling a favorite [`Listing`] of a [`User`].
///
/// Outputs whether the [`Listing`] is a favorite one after the toggle.
#[derive(Clone, Copy, Debug)]
pub struct ToggleFavoriteListing {
    /// ID of the [`User`] toggling the favorite [`Listing`].
    pub user_id: user::Id,

    /// ID of the [`Listing`] to be toggled.
    pub listing_id: listing::Id,
}

impl<Db> Command<ToggleFavoriteListing> for Service<Db>
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
            Select<By<bool, listing::Favorite>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Insert<listing::Favorite>, Err = Traced<database::Error>>
        + Database<Delete<listing::Favorite>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = bool;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ToggleFavoriteListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ToggleFavoriteListing {
            user_id,
            listing_id,
        } = cmd;
        let favorite = listing::Favorite {
            user_id,
            listing_id,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with the `Listing` deletion.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let is_favorite = tx
            .execute(Select(By::<bool, _>::new(favorite)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if is_favorite {
            tx.execute(Delete(favorite))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        } else {
            tx.execute(Insert(favorite))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(!is_favorite)
    }
}

/// Error of [`ToggleFavoriteListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::listing,
        infra::database::memory::{self, usd},
        Command as _,
    };

    use super::{ExecutionError, ToggleFavoriteListing};

    #[tokio::test]
    async fn toggles_back_and_forth() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        let cmd = ToggleFavoriteListing {
            user_id: guest.id,
            listing_id: listing.id,
        };

        assert!(service.execute(cmd).await.unwrap());
        assert_eq!(service.database().store().favorites.len(), 1);

        assert!(!service.execute(cmd).await.unwrap());
        assert!(service.database().store().favorites.is_empty());
    }

    #[tokio::test]
    async fn requires_existing_listing() {
        let service = memory::service();
        let guest = memory::user(&service, false);
        let missing = listing::Id::new();

        let err = service
            .execute(ToggleFavoriteListing {
                user_id: guest.id,
                listing_id: missing,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ListingNotExists(id) if *id == missing,
        ));
    }
}
