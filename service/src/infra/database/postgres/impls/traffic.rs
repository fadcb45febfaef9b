//! Traffic [`Area`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{
        geo::Coordinates,
        traffic::{self, Area},
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Area>, traffic::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Area>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Area>, traffic::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: traffic::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, \
                   latitude, longitude, \
                   max_capacity, current_occupancy, \
                   created_at, updated_at \
            FROM traffic_areas \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Area {
                id: row.get("id"),
                name: row.get("name"),
                coordinates: Coordinates {
                    latitude: row.get("latitude"),
                    longitude: row.get("longitude"),
                },
                max_capacity: u32::try_from(
                    row.get::<_, i64>("max_capacity"),
                )
                .expect("`max_capacity` overflow"),
                current_occupancy: u32::try_from(
                    row.get::<_, i64>("current_occupancy"),
                )
                .expect("`current_occupancy` overflow"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
    }
}

impl<'n, C> Database<Select<By<Option<Area>, &'n traffic::Name>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Area>, traffic::Id>>,
        Ok = Option<Area>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Area>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Area>, &'n traffic::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM traffic_areas \
            WHERE LOWER(name) = LOWER($1::VARCHAR) \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&name])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let area_id: traffic::Id = row.get("id");
        self.execute(Select(By::new(area_id)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Area>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Area>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(area): Insert<Area>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(area)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Area>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(area): Update<Area>,
    ) -> Result<Self::Ok, Self::Err> {
        let Area {
            id,
            name,
            coordinates,
            max_capacity,
            current_occupancy,
            created_at,
            updated_at,
        } = area;

        // Derived `Status` is never stored, but classified on demand.
        const SQL: &str = "\
            INSERT INTO traffic_areas (\
                id, name, \
                latitude, longitude, \
                max_capacity, current_occupancy, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::FLOAT8, $4::FLOAT8, \
                $5::INT8, $6::INT8, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                latitude = EXCLUDED.latitude, \
                longitude = EXCLUDED.longitude, \
                max_capacity = EXCLUDED.max_capacity, \
                current_occupancy = EXCLUDED.current_occupancy, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &coordinates.latitude,
                &coordinates.longitude,
                &i64::from(max_capacity),
                &i64::from(current_occupancy),
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Area, traffic::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Area, traffic::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: traffic::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM traffic_areas \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
