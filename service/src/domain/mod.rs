//! Domain definitions.

pub mod customer;
pub mod damage;
pub mod maintenance;
mod operator;
pub mod rental;
pub mod vehicle;

pub use self::{
    customer::Customer, damage::Damage, maintenance::Maintenance,
    operator::Operator, rental::Rental, vehicle::Vehicle,
};
