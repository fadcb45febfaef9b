//! [`Database`]-related implementations.

#[cfg(test)]
pub(crate) mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks whether this [`Error`] is caused by a duplicate of some unique
    /// value.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(None),
        }
    }

    /// Checks whether this [`Error`] is caused by two rows excluding each
    /// other, like two overlapping reservations of the same parking.
    #[must_use]
    pub fn is_exclusion_violation(&self) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_exclusion_violation(None),
        }
    }

    /// Checks whether this [`Error`] is caused by the [`Database`] being
    /// unreachable at the moment, so the operation may be retried later.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unavailable(),
        }
    }
}
