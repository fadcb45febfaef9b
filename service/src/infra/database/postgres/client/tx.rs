//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// The transaction is started lazily, on the first executed statement, and
/// is shared between all the clones of this client. It's rolled back if the
/// last clone is dropped without [`Tx::commit()`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to take a connection for the transaction from.
    non_tx: NonTx,

    /// Started transaction, if any.
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client taking its connection from the provided
    /// [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(non_tx: NonTx) -> Self {
        Self {
            non_tx,
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the started [`connection::Tx`], starting it if necessary.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let started = self.tx.read().await;
        if started.is_some() {
            return Ok(RwLockReadGuard::map(started, |tx| {
                tx.as_ref().expect("checked to be started")
            }));
        }
        drop(started);

        let mut started = self.tx.write().await;
        if started.is_none() {
            let conn = self
                .non_tx
                .connection()
                .await
                .map_err(tracerr::wrap!())?;
            *started = Some(
                connection::Tx::begin(conn)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(RwLockReadGuard::map(started.downgrade(), |tx| {
            tx.as_ref().expect("started above")
        }))
    }

    /// Commits the transaction of this [`Tx`] client, if it was started.
    ///
    /// Next statement executed with this [`Tx`] client starts a new
    /// transaction.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query(&*tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query_opt(&*tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::exec(&*tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
