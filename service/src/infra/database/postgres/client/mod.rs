//! Postgres database client definitions.

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};

/// Implements [`Connection`] for the provided client by forwarding each
/// statement to the [`Connection`] its `connection()` method leases.
///
/// [`Connection`]: super::Connection
macro_rules! forward_connection {
    ($ty:ty) => {
        impl $crate::infra::database::postgres::Connection for $ty {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Vec<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::query(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Option<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::query_opt(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<u64, ::tracerr::Traced<$crate::infra::database::Error>>
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::exec(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }
        }
    };
}
use forward_connection;
