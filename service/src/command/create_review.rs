//! [`Command`] for reviewing a [`Listing`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::review::{Comment, Rating};
use crate::{
    domain::{listing, review, user, Listing, Review, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for reviewing a [`Listing`].
#[derive(Clone, Debug)]
pub struct CreateReview {
    /// ID of the [`Listing`] to be reviewed.
    pub listing_id: listing::Id,

    /// ID of the [`User`] who reviews the [`Listing`].
    pub author_id: user::Id,

    /// [`Rating`] of a new [`Review`].
    pub rating: review::Rating,

    /// [`Comment`] of a new [`Review`].
    pub comment: Option<review::Comment>,
}

impl<Db> Command<CreateReview> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Review>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Review;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReview {
            listing_id,
            author_id,
            rating,
            comment,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<User>, _>::new(author_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(author_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;
        self.database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let review = Review {
            id: review::Id::new(),
            listing_id,
            author_id,
            rating,
            comment,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(review.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(review)
    }
}

/// Error of [`CreateReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{listing, review, user},
        infra::database::memory::{self, usd},
        Command as _,
    };

    use super::{CreateReview, ExecutionError};

    #[tokio::test]
    async fn stores_review() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let created = service
            .execute(CreateReview {
                listing_id: listing.id,
                author_id: guest.id,
                rating: review::Rating::new(4).unwrap(),
                comment: review::Comment::new("Easy access"),
            })
            .await
            .unwrap();

        assert_eq!(created.listing_id, listing.id);
        assert_eq!(created.author_id, guest.id);
        assert_eq!(created.rating, review::Rating::new(4).unwrap());

        let stored = service.database().store().reviews.clone();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, created.id);
    }

    #[tokio::test]
    async fn requires_existing_listing_and_author() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let missing = listing::Id::new();
        let err = service
            .execute(CreateReview {
                listing_id: missing,
                author_id: host.id,
                rating: review::Rating::new(5).unwrap(),
                comment: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ListingNotExists(id) if *id == missing,
        ));

        let stranger = user::Id::new();
        let err = service
            .execute(CreateReview {
                listing_id: listing.id,
                author_id: stranger,
                rating: review::Rating::new(5).unwrap(),
                comment: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::UserNotExists(id) if *id == stranger,
        ));

        assert!(service.database().store().reviews.is_empty());
    }
}
