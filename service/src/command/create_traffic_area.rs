//! [`Command`] for registering a new traffic [`Area`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::traffic::{Area, Name};
use crate::{
    domain::{geo::Coordinates, traffic},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new traffic [`Area`].
#[derive(Clone, Debug)]
pub struct CreateTrafficArea {
    /// [`Name`] of a new [`Area`].
    pub name: traffic::Name,

    /// [`Coordinates`] of a new [`Area`].
    pub coordinates: Coordinates,

    /// Number of vehicles a new [`Area`] is designed for.
    pub max_capacity: u32,
}

impl<Db> Command<CreateTrafficArea> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<By<Option<traffic::Area>, &'l traffic::Name>>,
            Ok = Option<traffic::Area>,
            Err = Traced<database::Error>,
        > + Database<Insert<traffic::Area>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = traffic::Area;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateTrafficArea,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTrafficArea {
            name,
            coordinates,
            max_capacity,
        } = cmd;

        if max_capacity == 0 {
            return Err(tracerr::new!(E::ZeroCapacity));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::new(&name)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let now = DateTime::now();
        let area = traffic::Area {
            id: traffic::Id::new(),
            name,
            coordinates,
            max_capacity,
            current_occupancy: 0,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        tx.execute(Insert(area.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation() {
                    tracerr::new!(E::NameOccupied(area.name.clone()))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(area)
    }
}

/// Error of [`CreateTrafficArea`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Name`] is already occupied by another [`Area`].
    #[display("`{_0}` traffic area name is occupied")]
    NameOccupied(#[error(not(source))] traffic::Name),

    /// [`Area`] is designed for no vehicles.
    #[display("Traffic area capacity must be positive")]
    ZeroCapacity,
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            geo::Coordinates,
            traffic::{self, Level},
        },
        infra::database::memory,
        Command as _,
    };

    use super::{CreateTrafficArea, ExecutionError};

    fn create(name: &str, max_capacity: u32) -> CreateTrafficArea {
        CreateTrafficArea {
            name: traffic::Name::new(name).unwrap(),
            coordinates: Coordinates::new(40.758, -73.9855).unwrap(),
            max_capacity,
        }
    }

    #[tokio::test]
    async fn creates_empty_area() {
        let service = memory::service();

        let area = service.execute(create("Times Square", 100)).await.unwrap();

        assert_eq!(area.current_occupancy, 0);
        assert_eq!(area.status().level, Level::Low);
    }

    #[tokio::test]
    async fn name_is_unique_regardless_of_case() {
        let service = memory::service();
        _ = service.execute(create("Times Square", 100)).await.unwrap();

        let err = service
            .execute(create("TIMES SQUARE", 50))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NameOccupied(_)));
        assert_eq!(service.database().store().areas.len(), 1);
    }

    #[tokio::test]
    async fn capacity_must_be_positive() {
        let service = memory::service();

        let err = service.execute(create("Harbor", 0)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ZeroCapacity));
    }
}
