//! [`Damage`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::vehicle;
#[cfg(doc)]
use crate::domain::Vehicle;

/// Damage reported on a [`Vehicle`].
#[derive(Clone, Debug)]
pub struct Damage {
    /// ID of this [`Damage`].
    pub id: Id,

    /// ID of the damaged [`Vehicle`].
    pub vehicle_id: vehicle::Id,

    /// [`Severity`] of this [`Damage`].
    pub severity: Severity,

    /// Repair [`Status`] of this [`Damage`].
    pub status: Status,

    /// [`Description`] of this [`Damage`].
    pub description: Description,

    /// Photos of this [`Damage`].
    pub images: Vec<ImageUrl>,

    /// Cost of repairing this [`Damage`], once estimated.
    pub repair_cost: Option<Money>,

    /// [`InsuranceClaim`] filed for this [`Damage`], if any.
    pub insurance_claim: Option<InsuranceClaim>,

    /// [`DateTime`] when this [`Damage`] was reported.
    pub reported_at: ReportDateTime,
}

impl Damage {
    /// Indicates whether this [`Damage`] still affects its [`Vehicle`].
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

/// ID of a [`Damage`].
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

define_kind! {
    #[doc = "Severity of a [`Damage`]."]
    #[serialize_all = "snake_case"]
    enum Severity {
        #[doc = "Cosmetic, the [`Vehicle`] stays rentable."]
        Minor = 1,

        #[doc = "Noticeable, the [`Vehicle`] stays rentable."]
        Moderate = 2,

        #[doc = "The [`Vehicle`] must not be rented."]
        Severe = 3,
    }
}

define_kind! {
    #[doc = "Repair status of a [`Damage`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "Reported, not yet handled."]
        Reported = 1,

        #[doc = "Being repaired."]
        InRepair = 2,

        #[doc = "Repaired."]
        Repaired = 3,
    }
}

impl Status {
    /// Indicates whether a [`Damage`] in this [`Status`] still affects its
    /// [`Vehicle`].
    #[must_use]
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Repaired)
    }

    /// Indicates whether a [`Damage`] may be moved from this [`Status`] into
    /// the `next` one.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Reported, Self::InRepair | Self::Repaired)
                | (Self::InRepair, Self::Repaired)
        )
    }
}

/// Free-form description of a [`Damage`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Description`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.len() <= 4096
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// URL of an uploaded [`Damage`] photo.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct ImageUrl(String);

impl ImageUrl {
    /// Creates a new [`ImageUrl`] if the given `url` is valid.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        Self::check(&url).then_some(Self(url))
    }

    /// Checks whether the given `url` is a valid [`ImageUrl`].
    fn check(url: impl AsRef<str>) -> bool {
        let url = url.as_ref();
        (url.starts_with("https://") || url.starts_with("http://"))
            && !url.contains(char::is_whitespace)
            && url.len() <= 2048
    }
}

impl FromStr for ImageUrl {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ImageUrl`")
    }
}

/// Insurance claim filed for a [`Damage`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InsuranceClaim {
    /// Number of the claim at the insurer.
    pub number: ClaimNumber,

    /// Claimed amount, if already known.
    pub amount: Option<Money>,
}

/// Number of an [`InsuranceClaim`] at the insurer.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct ClaimNumber(String);

impl ClaimNumber {
    /// Creates a new [`ClaimNumber`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`ClaimNumber`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number && !number.is_empty() && number.len() <= 64
    }
}

impl FromStr for ClaimNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ClaimNumber`")
    }
}

/// [`DateTime`] when a [`Damage`] was reported.
pub type ReportDateTime = DateTimeOf<(Damage, unit::Report)>;

#[cfg(test)]
mod spec {
    use super::{ImageUrl, Status};

    #[test]
    fn repaired_is_final() {
        for status in Status::ALL {
            assert!(!Status::Repaired.can_become(*status), "{status}");
            assert_eq!(status.is_live(), *status != Status::Repaired);
        }
        assert!(Status::Reported.can_become(Status::Repaired));
        assert!(!Status::InRepair.can_become(Status::Reported));
    }

    #[test]
    fn image_url() {
        assert!(ImageUrl::new("https://cdn.example.com/d/1.jpg").is_some());
        assert!(ImageUrl::new("ftp://cdn.example.com/d/1.jpg").is_none());
        assert!(ImageUrl::new("https://cdn.example.com/a b.jpg").is_none());
    }
}
