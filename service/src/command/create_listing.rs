//! [`Command`] for listing a new parking spot.

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{Description, Location, Title};
use crate::{
    domain::{amenity, geo::Coordinates, listing, user, Amenity, Listing, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for listing a new parking spot.
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// ID of the host [`User`] listing the parking spot.
    pub host_id: user::Id,

    /// [`Title`] of a new [`Listing`].
    pub title: listing::Title,

    /// [`Location`] of a new [`Listing`].
    pub location: listing::Location,

    /// [`Description`] of a new [`Listing`].
    pub description: Option<listing::Description>,

    /// Hourly rate of a new [`Listing`].
    pub hourly_rate: Money,

    /// [`Coordinates`] of a new [`Listing`].
    pub coordinates: Option<Coordinates>,

    /// IDs of [`Amenity`]s a new [`Listing`] offers.
    pub amenities: Vec<amenity::Id>,
}

impl<Db> Command<CreateListing> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<amenity::Id, Amenity>, Vec<amenity::Id>>>,
            Ok = HashMap<amenity::Id, Amenity>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Listing>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateListing {
            host_id,
            title,
            location,
            description,
            hourly_rate,
            coordinates,
            amenities,
        } = cmd;

        if !hourly_rate.is_positive() {
            return Err(tracerr::new!(E::NonPositiveRate(hourly_rate)));
        }

        let host = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(host_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(host_id))
            .map_err(tracerr::wrap!())?;
        if !host.is_host {
            return Err(tracerr::new!(E::NotHost(host_id)));
        }

        let amenities = amenities.into_iter().unique().collect::<Vec<_>>();
        let known = self
            .database()
            .execute(Select(By::new(amenities.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(id) = amenities.iter().find(|id| !known.contains_key(id)) {
            return Err(tracerr::new!(E::AmenityNotExists(*id)));
        }

        let listing = Listing {
            id: listing::Id::new(),
            host_id,
            title,
            location,
            description,
            hourly_rate,
            coordinates,
            amenities,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Amenity`] with the provided ID does not exist.
    #[display("`Amenity(id: {_0})` does not exist")]
    AmenityNotExists(#[error(not(source))] amenity::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Hourly rate is not positive.
    #[display("Hourly rate must be positive, but is `{_0}`")]
    NonPositiveRate(#[error(not(source))] Money),

    /// [`User`] is not a host.
    #[display("`User(id: {_0})` is not a host")]
    NotHost(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{amenity, listing, user, Amenity},
        infra::database::memory::{self, usd},
        Command as _,
    };

    use super::{CreateListing, ExecutionError};

    fn create(host_id: user::Id) -> CreateListing {
        CreateListing {
            host_id,
            title: listing::Title::new("Covered spot").unwrap(),
            location: listing::Location::new("Downtown").unwrap(),
            description: None,
            hourly_rate: usd(10),
            coordinates: None,
            amenities: vec![],
        }
    }

    #[tokio::test]
    async fn only_hosts_list_parking() {
        let service = memory::service();
        let guest = memory::user(&service, false);

        let err = service.execute(create(guest.id)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotHost(id) if *id == guest.id,
        ));
        assert!(service.database().store().listings.is_empty());
    }

    #[tokio::test]
    async fn rate_must_be_positive() {
        let service = memory::service();
        let host = memory::user(&service, true);

        let err = service
            .execute(CreateListing {
                hourly_rate: usd(0),
                ..create(host.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NonPositiveRate(_)));
    }

    #[tokio::test]
    async fn links_known_amenities() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let cctv = Amenity {
            id: amenity::Id::from(uuid::Uuid::new_v4()),
            name: amenity::Name::new("CCTV").unwrap(),
        };
        _ = service
            .database()
            .store()
            .amenities
            .insert(cctv.id, cctv.clone());

        let listing = service
            .execute(CreateListing {
                amenities: vec![cctv.id, cctv.id],
                ..create(host.id)
            })
            .await
            .unwrap();
        assert_eq!(listing.amenities, vec![cctv.id]);

        let unknown = amenity::Id::from(uuid::Uuid::new_v4());
        let err = service
            .execute(CreateListing {
                amenities: vec![cctv.id, unknown],
                ..create(host.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::AmenityNotExists(id) if *id == unknown,
        ));
    }
}
