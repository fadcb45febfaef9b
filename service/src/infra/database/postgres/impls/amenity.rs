//! [`Amenity`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{amenity, Amenity},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<amenity::Id, Amenity>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[amenity::Id]>,
{
    type Ok = HashMap<amenity::Id, Amenity>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<amenity::Id, Amenity>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[amenity::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, name \
            FROM amenities \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Amenity {
                        id,
                        name: row.get("name"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Amenity>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Amenity>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Amenity>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, name \
            FROM amenities \
            ORDER BY name";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Amenity {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }
}
