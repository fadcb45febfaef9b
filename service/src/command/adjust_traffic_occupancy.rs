//! [`Command`] for adjusting the occupancy of a traffic [`Area`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::traffic::{Area, Name};
use crate::{
    domain::traffic,
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adjusting the occupancy of a traffic [`Area`] by the
/// number of arrived (positive) or departed (negative) vehicles.
///
/// This is the only way the occupancy changes: reading the congestion
/// status of an [`Area`] never modifies it.
#[derive(Clone, Debug)]
pub struct AdjustTrafficOccupancy {
    /// [`Name`] of the [`Area`] to adjust.
    pub name: traffic::Name,

    /// Change of the number of parked vehicles.
    pub delta: i32,
}

impl<Db> Command<AdjustTrafficOccupancy> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<By<Option<traffic::Area>, &'l traffic::Name>>,
            Ok = Option<traffic::Area>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<traffic::Area>, traffic::Id>>,
            Ok = Option<traffic::Area>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<traffic::Area, traffic::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<traffic::Area>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = traffic::Area;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AdjustTrafficOccupancy,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdjustTrafficOccupancy { name, delta } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let id = tx
            .execute(Select(By::new(&name)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::AreaNotExists(name.clone()))
            .map_err(tracerr::wrap!())?
            .id;

        // Serialize concurrent adjustments of the same `Area`.
        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut area = tx
            .execute(Select(By::<Option<traffic::Area>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::AreaNotExists(name.clone()))
            .map_err(tracerr::wrap!())?;

        area.current_occupancy = area
            .adjusted_occupancy(delta)
            .map_err(|e| match e {
                traffic::AdjustmentError::Negative => {
                    E::NegativeOccupancy(delta)
                }
                traffic::AdjustmentError::Overflow => {
                    E::OccupancyOverflow(delta)
                }
            })
            .map_err(tracerr::wrap!())?;
        area.updated_at = DateTime::now().coerce();

        tx.execute(Update(area.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            area.name = %area.name,
            occupancy = area.current_occupancy,
            "traffic area occupancy adjusted",
        );

        Ok(area)
    }
}

/// Error of [`AdjustTrafficOccupancy`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Area`] with the provided [`Name`] does not exist.
    #[display("`{_0}` traffic area does not exist")]
    AreaNotExists(#[error(not(source))] traffic::Name),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Occupancy would become negative.
    #[display("Adjusting by `{_0}` makes occupancy negative")]
    NegativeOccupancy(#[error(not(source))] i32),

    /// Occupancy would exceed the representable maximum.
    #[display("Adjusting by `{_0}` overflows occupancy")]
    OccupancyOverflow(#[error(not(source))] i32),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::traffic::{self, Level},
        infra::database::memory,
        Command as _,
    };

    use super::{AdjustTrafficOccupancy, ExecutionError};

    fn adjust(name: &str, delta: i32) -> AdjustTrafficOccupancy {
        AdjustTrafficOccupancy {
            name: traffic::Name::new(name).unwrap(),
            delta,
        }
    }

    #[tokio::test]
    async fn changes_occupancy_explicitly() {
        let service = memory::service();
        let area =
            memory::area(&service, "Times Square", (40.758, -73.9855), 100, 70);

        let adjusted =
            service.execute(adjust("times square", 15)).await.unwrap();

        assert_eq!(adjusted.id, area.id);
        assert_eq!(adjusted.current_occupancy, 85);
        assert_eq!(adjusted.status().level, Level::High);
        assert!(adjusted.should_reroute());
        assert_eq!(
            service.database().store().areas[&area.id].current_occupancy,
            85,
        );
    }

    #[tokio::test]
    async fn allows_overflow_but_not_negative() {
        let service = memory::service();
        let area = memory::area(&service, "Harbor", (40.7, -74.0), 10, 3);

        let adjusted = service.execute(adjust("Harbor", 9)).await.unwrap();
        assert_eq!(adjusted.current_occupancy, 12);
        assert!(adjusted.status().is_full);

        let err = service.execute(adjust("Harbor", -13)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NegativeOccupancy(-13),
        ));
        assert_eq!(
            service.database().store().areas[&area.id].current_occupancy,
            12,
        );
    }

    #[tokio::test]
    async fn concurrent_adjustments_add_up() {
        let service = memory::service();
        let area = memory::area(&service, "Harbor", (40.7, -74.0), 100, 0);

        let (first, second) = tokio::join!(
            service.execute(adjust("Harbor", 5)),
            service.execute(adjust("Harbor", 7)),
        );

        assert!(first.is_ok() && second.is_ok());
        assert_eq!(
            service.database().store().areas[&area.id].current_occupancy,
            12,
        );
    }

    #[tokio::test]
    async fn unknown_area_is_rejected() {
        let service = memory::service();

        let err = service.execute(adjust("Nowhere", 1)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::AreaNotExists(_)));
    }

    #[tokio::test]
    async fn overflow_is_not_reported_as_negative() {
        let service = memory::service();
        let area =
            memory::area(&service, "Harbor", (40.7, -74.0), 10, u32::MAX - 1);

        let err = service.execute(adjust("Harbor", 2)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::OccupancyOverflow(2),
        ));
        assert_eq!(
            service.database().store().areas[&area.id].current_occupancy,
            u32::MAX - 1,
        );
    }
}
