//! [`Query`] collection related to [`Damage`]s.

use common::operations::By;

#[cfg(doc)]
use crate::domain::Vehicle;
use crate::{
    domain::{damage, vehicle, Damage},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Damage`] by its [`damage::Id`].
pub type ById = DatabaseQuery<By<Option<Damage>, damage::Id>>;

/// Queries all the [`read::Live`] [`Damage`]s of a [`Vehicle`].
pub type Live = DatabaseQuery<By<Vec<read::Live<Damage>>, vehicle::Id>>;
