//! [`Booking`]-related [`Database`] implementations.

use std::collections::{HashMap, HashSet};

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, Interval, Status},
        listing, user, Booking,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::booking::{ActiveAt, Earnings, History, Overlapping},
};

/// Columns of the `bookings` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, listing_id, user_id, \
    start_time, end_time, \
    status, payment_status, \
    total_price, total_price_currency, \
    created_at";

/// Reads a [`Booking`] out of the provided `bookings` table [`Row`].
fn from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        user_id: row.get("user_id"),
        interval: Interval::new(row.get("start_time"), row.get("end_time"))
            .expect("checked by `bookings_interval_check`"),
        status: row.get("status"),
        payment_status: row.get("payment_status"),
        total_price: Money {
            amount: row.get("total_price"),
            currency: row.get("total_price_currency"),
        },
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<booking::Id, Booking>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[booking::Id]>,
{
    type Ok = HashMap<booking::Id, Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<booking::Id, Booking>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[booking::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let booking = from_row(row);
                (booking.id, booking)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<booking::Id, Booking>, [booking::Id; 1]>>,
        Ok = HashMap<booking::Id, Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            listing_id,
            user_id,
            interval,
            status,
            payment_status,
            total_price,
            created_at,
        } = booking;

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, listing_id, user_id, \
                start_time, end_time, \
                status, payment_status, \
                total_price, total_price_currency, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ, \
                $6::INT2, $7::INT2, \
                $8::NUMERIC, $9::INT2, \
                $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET listing_id = EXCLUDED.listing_id, \
                user_id = EXCLUDED.user_id, \
                start_time = EXCLUDED.start_time, \
                end_time = EXCLUDED.end_time, \
                status = EXCLUDED.status, \
                payment_status = EXCLUDED.payment_status, \
                total_price = EXCLUDED.total_price, \
                total_price_currency = EXCLUDED.total_price_currency, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &user_id,
                &interval.start(),
                &interval.end(),
                &status,
                &payment_status,
                &total_price.amount,
                &total_price.currency,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Booking>, Overlapping>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, Overlapping>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Overlapping {
            listing_id,
            interval,
        } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE listing_id = $1::UUID \
               AND status <> $2::INT2 \
               AND start_time < $4::TIMESTAMPTZ \
               AND end_time > $3::TIMESTAMPTZ \
             ORDER BY start_time",
        );
        Ok(self
            .query(
                &sql,
                &[
                    &listing_id,
                    &Status::Cancelled,
                    &interval.start(),
                    &interval.end(),
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<HashSet<listing::Id>, ActiveAt>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = HashSet<listing::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashSet<listing::Id>, ActiveAt>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ActiveAt { listing_ids, at } = by.into_inner();
        if listing_ids.is_empty() {
            return Ok(HashSet::new());
        }

        const SQL: &str = "\
            SELECT DISTINCT listing_id \
            FROM bookings \
            WHERE listing_id = ANY($1::UUID[]) \
              AND status <> $2::INT2 \
              AND start_time <= $3::TIMESTAMPTZ \
              AND end_time > $3::TIMESTAMPTZ";
        Ok(self
            .query(SQL, &[&listing_ids, &Status::Cancelled, &at])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("listing_id"))
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Booking>, History>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, History>>,
    ) -> Result<Self::Ok, Self::Err> {
        let History(user_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE user_id = $1::UUID \
             ORDER BY start_time DESC, id",
        );
        Ok(self
            .query(&sql, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Earnings, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Earnings;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Earnings, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let host_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT SUM(b.total_price) AS amount, \
                   b.total_price_currency AS currency \
            FROM bookings AS b \
            INNER JOIN listings AS l ON l.id = b.listing_id \
            WHERE l.host_id = $1::UUID \
              AND b.status = $2::INT2 \
            GROUP BY b.total_price_currency \
            ORDER BY b.total_price_currency";
        Ok(Earnings(
            self.query(SQL, &[&host_id, &Status::Confirmed])
                .await
                .map_err(tracerr::wrap!())?
                .into_iter()
                .map(|row| Money {
                    amount: row.get("amount"),
                    currency: row.get("currency"),
                })
                .collect(),
        ))
    }
}
