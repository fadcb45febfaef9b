//! [`Query`] collection related to traffic [`Area`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::traffic::{self, Area},
    infra::{database, Database},
    Query, Service,
};

/// Queries the current [`traffic::Status`] of an [`Area`] by its name.
///
/// [`traffic::Status::unknown()`] is returned if there is no such [`Area`].
#[derive(Clone, Debug)]
pub struct StatusByName(pub String);

impl<Db> Query<StatusByName> for Service<Db>
where
    Db: for<'n> Database<
        Select<By<Option<Area>, &'n traffic::Name>>,
        Ok = Option<Area>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = traffic::Status;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        StatusByName(name): StatusByName,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(name) = traffic::Name::new(name.trim()) else {
            return Ok(traffic::Status::unknown());
        };

        let area = self
            .database()
            .execute(Select(By::new(&name)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(area.map_or_else(traffic::Status::unknown, |a| a.status()))
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::traffic::{Color, Level, Status},
        infra::database::memory,
        Query as _,
    };

    use super::StatusByName;

    #[tokio::test]
    async fn classifies_known_area() {
        let service = memory::service();
        let area =
            memory::area(&service, "Times Square", (40.758, -73.9855), 100, 85);

        let status = service
            .execute(StatusByName("times square".into()))
            .await
            .unwrap();

        assert_eq!(status, Status::classify(85, 100));
        assert_eq!(status.level, Level::High);
        assert_eq!(status.color, Color::Orange);
        assert_eq!(
            service.database().store().areas[&area.id].current_occupancy,
            85,
        );
    }

    #[tokio::test]
    async fn unknown_area_is_gray() {
        let service = memory::service();

        for name in ["Nowhere", ""] {
            let status =
                service.execute(StatusByName(name.into())).await.unwrap();

            assert_eq!(status, Status::unknown());
        }
    }
}
