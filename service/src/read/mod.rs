//! Read entities definitions.

pub mod vehicle;

#[cfg(doc)]
use crate::domain::{Damage, Maintenance, Rental};

/// Wrapper around a [`Damage`], a [`Maintenance`] or a [`Rental`] indicating
/// that it still affects its [`Vehicle`].
///
/// [`Vehicle`]: crate::domain::Vehicle
#[derive(Clone, Copy, Debug)]
pub struct Live<T>(pub T);
