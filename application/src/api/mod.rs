//! GraphQL API definitions.

pub mod customer;
pub mod damage;
pub mod maintenance;
mod mutation;
mod query;
pub mod rental;
pub mod scalar;
pub mod vehicle;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    customer::Customer, damage::Damage, maintenance::Maintenance,
    mutation::Mutation, query::Query, rental::Rental, vehicle::Vehicle,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
