//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `users` table a [`User`] is built from.
const COLUMNS: &str = "\
    id, name, email, password_hash, phone, is_host, created_at";

impl From<Row> for User {
    fn from(row: Row) -> Self {
        Self {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            phone: row.get("phone"),
            is_host: row.get("is_host"),
            created_at: row.get("created_at"),
        }
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(User::from))
    }
}

impl<'e, C> Database<Select<By<Option<User>, &'e user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE LOWER(email) = LOWER($1::VARCHAR) \
             LIMIT 1",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&email])
            .await
            .map_err(tracerr::wrap!())?
            .map(User::from))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            email,
            password_hash,
            phone,
            is_host,
            created_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, name, \
                email, password_hash, phone, \
                is_host, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, \
                $6::BOOL, $7::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &email,
                &password_hash,
                &phone,
                &is_host,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
