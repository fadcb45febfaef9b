//! [`Review`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{listing, review::Rating, Review},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Review>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        let Review {
            id,
            listing_id,
            author_id,
            rating,
            comment,
            created_at,
        } = review;

        const SQL: &str = "\
            INSERT INTO reviews (\
                id, listing_id, author_id, \
                rating, comment, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::INT2, $5::VARCHAR, \
                $6::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &author_id,
                &i16::from(rating.stars()),
                &comment,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Review>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let listing_id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, author_id, \
                   rating, comment, \
                   created_at \
            FROM reviews \
            WHERE listing_id = $1::UUID \
            ORDER BY created_at DESC, id";
        Ok(self
            .query(SQL, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Review {
                id: row.get("id"),
                listing_id: row.get("listing_id"),
                author_id: row.get("author_id"),
                rating: u8::try_from(row.get::<_, i16>("rating"))
                    .ok()
                    .and_then(Rating::new)
                    .expect("checked by `reviews_rating_check`"),
                comment: row.get("comment"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
