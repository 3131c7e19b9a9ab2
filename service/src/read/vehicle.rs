//! [`Vehicle`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{rental, Vehicle};

/// Indicator whether a [`Vehicle`] is occupied by a [`rental::Status::Active`]
/// rental.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct IsRented(pub bool);

impl PartialEq<bool> for IsRented {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}
