//! [`Query`] collection related to a single [`Rental`].

use common::operations::By;

#[cfg(doc)]
use crate::domain::Vehicle;
use crate::{
    domain::{rental, vehicle, Rental},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Rental`] by its [`rental::Id`].
pub type ById = DatabaseQuery<By<Option<Rental>, rental::Id>>;

/// Queries all the [`read::Live`] [`Rental`]s booking a [`Vehicle`].
pub type Live = DatabaseQuery<By<Vec<read::Live<Rental>>, vehicle::Id>>;
