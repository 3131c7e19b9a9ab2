//! [`Maintenance`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateOf, DateTimeOf, Money, Period};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Rental, Vehicle};
use crate::domain::{rental, vehicle, Operator};

/// Maintenance record of a [`Vehicle`].
#[derive(Clone, Debug)]
pub struct Maintenance {
    /// ID of this [`Maintenance`].
    pub id: Id,

    /// ID of the [`Vehicle`] this [`Maintenance`] belongs to.
    pub vehicle_id: vehicle::Id,

    /// [`ServiceType`] of this [`Maintenance`].
    pub service_type: ServiceType,

    /// [`Description`] of this [`Maintenance`].
    pub description: Description,

    /// Day this [`Maintenance`] is scheduled for.
    pub scheduled_date: ScheduledDate,

    /// [`Status`] of this [`Maintenance`].
    pub status: Status,

    /// Cost of this [`Maintenance`].
    pub cost: Money,

    /// [`Provider`] performing this [`Maintenance`], if known.
    pub provider: Option<Provider>,

    /// Day the next service of the [`Vehicle`] is due, if known.
    pub next_service_due: Option<NextServiceDate>,

    /// [`Cancellation`] details, if this [`Maintenance`] was cancelled.
    pub cancellation: Option<Cancellation>,

    /// [`DateTime`] when this [`Maintenance`] was created.
    pub created_at: CreationDateTime,
}

impl Maintenance {
    /// Indicates whether this [`Maintenance`] still affects its [`Vehicle`].
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Returns the [`Period`] this [`Maintenance`] occupies its [`Vehicle`].
    ///
    /// A [`Maintenance`] currently occupies the single day it's scheduled
    /// for.
    #[must_use]
    pub fn window(&self) -> Period {
        Period::day(self.scheduled_date.coerce())
    }

    /// Indicates whether this [`Maintenance`] is live and overlaps the
    /// provided `period`.
    #[must_use]
    pub fn conflicts_with(&self, period: &Period) -> bool {
        self.is_live() && self.window().overlaps(period)
    }

    /// Indicates whether this [`Maintenance`] keeps its [`Vehicle`] busy as of
    /// `today`: it's either in progress or scheduled for `today` or earlier.
    #[must_use]
    pub fn is_due(&self, today: Date) -> bool {
        match self.status {
            Status::InProgress => true,
            Status::Scheduled => self.scheduled_date.coerce() <= today,
            Status::Completed | Status::Cancelled => false,
        }
    }

    /// Cancels this [`Maintenance`] in favor of a [`Rental`].
    pub fn cancel(&mut self, cancellation: Cancellation) {
        self.status = Status::Cancelled;
        self.cancellation = Some(cancellation);
    }
}

/// ID of a [`Maintenance`].
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

/// Type of service performed during a [`Maintenance`] (oil change, tyre
/// rotation, inspection and so on).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct ServiceType(String);

impl ServiceType {
    /// Creates a new [`ServiceType`] if the given `kind` is valid.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Option<Self> {
        let kind = kind.into();
        Self::check(&kind).then_some(Self(kind))
    }

    /// Checks whether the given `kind` is a valid [`ServiceType`].
    fn check(kind: impl AsRef<str>) -> bool {
        let kind = kind.as_ref();
        kind.trim() == kind && !kind.is_empty() && kind.len() <= 128
    }
}

impl FromStr for ServiceType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ServiceType`")
    }
}

/// Free-form description of a [`Maintenance`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is not too long.
    ///
    /// Empty [`Description`]s are allowed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.len() <= 4096).then_some(Self(text))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Workshop or company performing a [`Maintenance`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Provider(String);

impl Provider {
    /// Creates a new [`Provider`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Provider`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Provider {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Provider`")
    }
}

define_kind! {
    #[doc = "Status of a [`Maintenance`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "Planned for its scheduled date."]
        Scheduled = 1,

        #[doc = "Being performed right now."]
        InProgress = 2,

        #[doc = "Performed."]
        Completed = 3,

        #[doc = "Cancelled in favor of a [`Rental`]."]
        Cancelled = 4,
    }
}

impl Status {
    /// Indicates whether a [`Maintenance`] in this [`Status`] still affects
    /// its [`Vehicle`].
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress)
    }

    /// Indicates whether a [`Maintenance`] may be moved from this [`Status`]
    /// into the `next` one by its management flow.
    ///
    /// [`Status::Cancelled`] is never reachable this way, only by a [`Rental`]
    /// override.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::InProgress | Self::Completed)
                | (Self::InProgress, Self::Completed)
        )
    }
}

/// Details of a [`Maintenance`] cancelled by a [`Rental`] override.
#[derive(Clone, Debug)]
pub struct Cancellation {
    /// ID of the [`Rental`] the [`Maintenance`] was cancelled for.
    pub rental_id: rental::Id,

    /// [`Operator`] who requested the override, if known.
    pub initiator: Option<Operator>,

    /// [`DateTime`] when the [`Maintenance`] was cancelled.
    pub cancelled_at: CancellationDateTime,
}

/// Day a [`Maintenance`] is scheduled for.
pub type ScheduledDate = DateOf<(Maintenance, unit::Schedule)>;

/// Day the next service is due after a [`Maintenance`].
pub type NextServiceDate = DateOf<(Maintenance, unit::Due)>;

/// [`DateTime`] when a [`Maintenance`] was created.
pub type CreationDateTime = DateTimeOf<(Maintenance, unit::Creation)>;

/// [`DateTime`] when a [`Maintenance`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Maintenance, unit::Cancellation)>;
