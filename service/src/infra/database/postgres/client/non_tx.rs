//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection},
};

/// Postgres client running each statement on its own, outside of any
/// transaction.
///
/// Leases a pooled [`connection::NonTx`] on the first statement and shares it
/// between concurrent statements until a [`Tx`] client takes it over.
///
/// [`Tx`]: super::Tx
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to lease connections from.
    pub(crate) pool: connection::Pool,

    /// Leased [`connection::NonTx`], if any.
    leased: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client leasing connections from the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            leased: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the leased [`connection::NonTx`], leasing it first if needed.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        let leased = self.leased.read().await;
        let leased = if leased.is_some() {
            leased
        } else {
            drop(leased);

            let mut leased = self.leased.write().await;
            // Another statement may have leased it while we were waiting.
            if leased.is_none() {
                *leased = Some(
                    self.pool
                        .get()
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?,
                );
            }
            leased.downgrade()
        };

        Ok(RwLockReadGuard::map(leased, |conn| {
            conn.as_ref().expect("leased above")
        }))
    }

    /// Gives up the leased [`connection::NonTx`], if any.
    ///
    /// The next statement of this [`NonTx`] client leases a new one.
    pub(crate) async fn release(&self) -> Option<connection::NonTx> {
        self.leased.write().await.take()
    }
}

super::forward_connection!(NonTx);
