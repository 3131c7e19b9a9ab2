//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection},
};

use super::NonTx;

/// Postgres client running all its statements in a single transaction.
///
/// The transaction is opened by the first statement and lasts until
/// [`Tx::commit()`], or is rolled back once the last clone of this client is
/// dropped.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to lease a connection from, if the [`NonTx`]
    /// client has none to hand over.
    pool: connection::Pool,

    /// [`NonTx`] client whose connection is reused for the transaction.
    ///
    /// Taken on the first statement.
    origin: Arc<Mutex<Option<NonTx>>>,

    /// Open transaction, if started and not committed yet.
    open: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client reusing the connection of the provided
    /// [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(Mutex::new(Some(client))),
            open: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the open [`connection::Tx`], opening it first if needed.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let open = self.open.read().await;
        let open = if open.is_some() {
            open
        } else {
            drop(open);

            let mut open = self.open.write().await;
            if open.is_none() {
                *open = Some(
                    connection::Tx::begin(self.lease().await?)
                        .await
                        .map_err(tracerr::wrap!())?,
                );
            }
            open.downgrade()
        };

        Ok(RwLockReadGuard::map(open, |tx| {
            tx.as_ref().expect("opened above")
        }))
    }

    /// Leases a [`connection::NonTx`] for the transaction, preferring the
    /// one already leased by the origin [`NonTx`] client.
    async fn lease(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        let origin = self.origin.lock().await.take();
        let released = match origin {
            Some(client) => client.release().await,
            None => None,
        };
        match released {
            Some(conn) => Ok(conn),
            None => self
                .pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from),
        }
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// Committing a [`Tx`] client that ran no statements is a no-op.
    ///
    /// # Errors
    ///
    /// If the commit fails.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.open.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

super::forward_connection!(Tx);
