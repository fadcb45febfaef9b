//! [`Listing`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{
        geo::{Coordinates, Latitude, Longitude},
        listing, Listing,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, LikePattern},
            Postgres,
        },
        Database,
    },
    read::listing::{FavoredBy, Filter, HostedBy, Located},
};

/// Selects [`Listing`]s by the provided `ids`, preserving their order.
async fn select_ordered<C>(
    db: &Postgres<C>,
    ids: Vec<listing::Id>,
) -> Result<Vec<Listing>, Traced<database::Error>>
where
    C: Connection,
    Postgres<C>: Database<
        Select<By<HashMap<listing::Id, Listing>, Vec<listing::Id>>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    let mut found = db
        .execute(Select(By::new(ids.clone())))
        .await
        .map_err(tracerr::wrap!())?;
    Ok(ids.into_iter().filter_map(|id| found.remove(&id)).collect())
}

impl<C, IDs> Database<Select<By<HashMap<listing::Id, Listing>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[listing::Id]>,
{
    type Ok = HashMap<listing::Id, Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<listing::Id, Listing>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[listing::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT l.id, l.host_id, \
                   l.title, l.location, l.description, \
                   l.hourly_rate, l.hourly_rate_currency, \
                   l.latitude, l.longitude, \
                   ARRAY(\
                       SELECT la.amenity_id \
                       FROM listing_amenities AS la \
                       WHERE la.listing_id = l.id \
                       ORDER BY la.amenity_id\
                   ) AS amenities, \
                   l.created_at \
            FROM listings AS l \
            WHERE l.id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let coordinates = row
                    .get::<_, Option<Latitude>>("latitude")
                    .zip(row.get::<_, Option<Longitude>>("longitude"))
                    .map(|(latitude, longitude)| Coordinates {
                        latitude,
                        longitude,
                    });
                (
                    id,
                    Listing {
                        id,
                        host_id: row.get("host_id"),
                        title: row.get("title"),
                        location: row.get("location"),
                        description: row.get("description"),
                        hourly_rate: Money {
                            amount: row.get("hourly_rate"),
                            currency: row.get("hourly_rate_currency"),
                        },
                        coordinates,
                        amenities: row.get("amenities"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Listing>, listing::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, [listing::Id; 1]>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Listing>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Listing>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(listing)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(listing): Update<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        let Listing {
            id,
            host_id,
            title,
            location,
            description,
            hourly_rate,
            coordinates,
            amenities,
            created_at,
        } = listing;
        let (latitude, longitude) =
            coordinates.map(|c| (c.latitude, c.longitude)).unzip();

        const SQL: &str = "\
            INSERT INTO listings (\
                id, host_id, \
                title, location, description, \
                hourly_rate, hourly_rate_currency, \
                latitude, longitude, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, \
                $6::NUMERIC, $7::INT2, \
                $8::FLOAT8, $9::FLOAT8, \
                $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET host_id = EXCLUDED.host_id, \
                title = EXCLUDED.title, \
                location = EXCLUDED.location, \
                description = EXCLUDED.description, \
                hourly_rate = EXCLUDED.hourly_rate, \
                hourly_rate_currency = EXCLUDED.hourly_rate_currency, \
                latitude = EXCLUDED.latitude, \
                longitude = EXCLUDED.longitude, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &host_id,
                &title,
                &location,
                &description,
                &hourly_rate.amount,
                &hourly_rate.currency,
                &latitude,
                &longitude,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        const UNLINK_SQL: &str = "\
            DELETE FROM listing_amenities \
            WHERE listing_id = $1::UUID \
              AND amenity_id <> ALL($2::UUID[])";
        self.exec(UNLINK_SQL, &[&id, &amenities])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        const LINK_SQL: &str = "\
            INSERT INTO listing_amenities (listing_id, amenity_id) \
            SELECT $1::UUID, unnest($2::UUID[]) \
            ON CONFLICT DO NOTHING";
        self.exec(LINK_SQL, &[&id, &amenities])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        // Bookings, reviews and favorites are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM listings \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Listing>, Filter>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, Vec<listing::Id>>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Filter {
            location,
            min_rate,
            max_rate,
            amenities,
        } = by.into_inner();

        let location = location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(LikePattern::containing);
        let amenities = amenities.into_iter().unique().collect::<Vec<_>>();
        let amenities_count =
            i64::try_from(amenities.len()).unwrap_or(i64::MAX);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let location_idx = location.as_ref().map(|l| {
            ps.push(l);
            ps.len()
        });
        let min_rate_idx = min_rate.as_ref().map(|r| {
            ps.push(r);
            ps.len()
        });
        let max_rate_idx = max_rate.as_ref().map(|r| {
            ps.push(r);
            ps.len()
        });
        let amenities_idx = (!amenities.is_empty()).then(|| {
            ps.push(&amenities);
            ps.push(&amenities_count);
            ps.len() - 1
        });

        let sql = format!(
            "SELECT l.id \
             FROM listings AS l \
             WHERE TRUE \
                   {location_filtering} \
                   {min_rate_filtering} \
                   {max_rate_filtering} \
                   {amenities_filtering} \
             ORDER BY l.created_at DESC, l.id",
            location_filtering =
                location_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND l.location ILIKE ${idx}::VARCHAR"))
                }),
            min_rate_filtering =
                min_rate_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND l.hourly_rate >= ${idx}::NUMERIC"))
                }),
            max_rate_filtering =
                max_rate_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND l.hourly_rate <= ${idx}::NUMERIC"))
                }),
            amenities_filtering =
                amenities_idx.into_iter().format_with("", |idx, f| {
                    let count_idx = idx + 1;
                    f(&format_args!(
                        "AND l.id IN (\
                             SELECT la.listing_id \
                             FROM listing_amenities AS la \
                             WHERE la.amenity_id = ANY(${idx}::UUID[]) \
                             GROUP BY la.listing_id \
                             HAVING COUNT(*) = ${count_idx}::INT8\
                         )"
                    ))
                }),
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();

        select_ordered(self, ids).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Listing>, Located>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, Vec<listing::Id>>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Listing>, Located>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE latitude IS NOT NULL \
              AND longitude IS NOT NULL \
            ORDER BY id";
        let ids = self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();

        select_ordered(self, ids).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Listing>, HostedBy>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, Vec<listing::Id>>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, HostedBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let HostedBy(host_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE host_id = $1::UUID \
            ORDER BY created_at DESC, id";
        let ids = self
            .query(SQL, &[&host_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();

        select_ordered(self, ids).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Listing>, FavoredBy>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, Vec<listing::Id>>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, FavoredBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let FavoredBy(user_id) = by.into_inner();

        const SQL: &str = "\
            SELECT listing_id \
            FROM favorites \
            WHERE user_id = $1::UUID \
            ORDER BY created_at DESC, listing_id";
        let ids = self
            .query(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("listing_id"))
            .collect();

        select_ordered(self, ids).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<bool, listing::Favorite>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<bool, listing::Favorite>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing::Favorite {
            user_id,
            listing_id,
        } = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM favorites \
                WHERE user_id = $1::UUID \
                  AND listing_id = $2::UUID\
            )";
        self.query_opt(SQL, &[&user_id, &listing_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get(0))
    }
}

impl<C> Database<Insert<listing::Favorite>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(favorite): Insert<listing::Favorite>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing::Favorite {
            user_id,
            listing_id,
        } = favorite;

        const SQL: &str = "\
            INSERT INTO favorites (user_id, listing_id, created_at) \
            VALUES ($1::UUID, $2::UUID, NOW()) \
            ON CONFLICT DO NOTHING";
        self.exec(SQL, &[&user_id, &listing_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<listing::Favorite>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(favorite): Delete<listing::Favorite>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing::Favorite {
            user_id,
            listing_id,
        } = favorite;

        const SQL: &str = "\
            DELETE FROM favorites \
            WHERE user_id = $1::UUID \
              AND listing_id = $2::UUID";
        self.exec(SQL, &[&user_id, &listing_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

