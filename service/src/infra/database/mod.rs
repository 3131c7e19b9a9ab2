//! [`Database`]-related implementations.

#[cfg(test)]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(test)]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(test)]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(test)]
            Self::Memory(_) => false,
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }

    /// Checks if the error is caused by an already aborted transaction, whose
    /// writes are discarded on its own.
    #[must_use]
    pub fn is_transaction_aborted(&self) -> bool {
        match self {
            #[cfg(test)]
            Self::Memory(e) => matches!(e, memory::Error::Aborted),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_transaction_aborted(),
        }
    }
}
