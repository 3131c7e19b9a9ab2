//! [`Customer`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer renting vehicles.
#[derive(Clone, Debug)]
pub struct Customer {
    /// ID of this [`Customer`].
    pub id: Id,

    /// [`Name`] of this [`Customer`].
    pub name: Name,

    /// Driving [`LicenseNumber`] of this [`Customer`].
    pub license_number: LicenseNumber,

    /// Contact [`Phone`] of this [`Customer`], if any.
    pub phone: Option<Phone>,

    /// [`DateTime`] when this [`Customer`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Customer`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Full name of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Driving license number of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct LicenseNumber(String);

impl LicenseNumber {
    /// Creates a new [`LicenseNumber`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`LicenseNumber`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number && !number.is_empty() && number.len() <= 64
    }
}

impl FromStr for LicenseNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `LicenseNumber`")
    }
}

/// Contact phone of a [`Customer`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `phone` is valid.
    #[must_use]
    pub fn new(phone: impl Into<String>) -> Option<Self> {
        let phone = phone.into();
        Self::check(&phone).then_some(Self(phone))
    }

    /// Checks whether the given `phone` is a valid [`Phone`].
    fn check(phone: impl AsRef<str>) -> bool {
        let phone = phone.as_ref();
        let digits = phone.strip_prefix('+').unwrap_or(phone);
        (7..=15).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// [`DateTime`] when a [`Customer`] was created.
pub type CreationDateTime = DateTimeOf<(Customer, unit::Creation)>;
