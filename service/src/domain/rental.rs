//! [`Rental`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money, Period};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Customer, Vehicle};
use crate::domain::{customer, vehicle};

/// Rental of a [`Vehicle`] by a [`Customer`].
#[derive(Clone, Debug)]
pub struct Rental {
    /// ID of this [`Rental`].
    pub id: Id,

    /// ID of the [`Customer`] renting the [`Vehicle`].
    pub customer_id: customer::Id,

    /// ID of the rented [`Vehicle`].
    pub vehicle_id: vehicle::Id,

    /// Days the [`Vehicle`] is rented for, both ends included.
    pub period: Period,

    /// [`Status`] of this [`Rental`].
    pub status: Status,

    /// [`PaymentStatus`] of this [`Rental`].
    pub payment_status: PaymentStatus,

    /// Indicator whether the [`Vehicle`] is rented with a driver.
    pub with_driver: bool,

    /// Indicator whether the insurance is included.
    pub insurance: bool,

    /// Total amount charged for this [`Rental`].
    pub total_amount: Money,

    /// [`DateTime`] when this [`Rental`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Rental`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Rental {
    /// Indicates whether this [`Rental`] currently occupies its [`Vehicle`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Indicates whether this [`Rental`] still books its [`Vehicle`] for its
    /// [`Period`].
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

/// ID of a [`Rental`].
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
    #[doc = "Lifecycle status of a [`Rental`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "Booked, the [`Vehicle`] is not handed over yet."]
        Pending = 1,

        #[doc = "The [`Vehicle`] is with the [`Customer`]."]
        Active = 2,

        #[doc = "The [`Vehicle`] is returned."]
        Completed = 3,

        #[doc = "Called off."]
        Cancelled = 4,
    }
}

impl Status {
    /// Indicates whether a [`Rental`] in this [`Status`] still books its
    /// [`Vehicle`].
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// Indicates whether a [`Rental`] may be moved from this [`Status`] into
    /// the `next` one.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active | Self::Cancelled)
                | (Self::Active, Self::Completed | Self::Cancelled)
        )
    }
}

define_kind! {
    #[doc = "Payment status of a [`Rental`]."]
    #[serialize_all = "snake_case"]
    enum PaymentStatus {
        #[doc = "Not paid yet."]
        Pending = 1,

        #[doc = "Paid in full."]
        Paid = 2,

        #[doc = "Paid and given back."]
        Refunded = 3,
    }
}

impl PaymentStatus {
    /// Indicates whether a [`Rental`] payment may be moved from this
    /// [`PaymentStatus`] into the `next` one.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid) | (Self::Paid, Self::Refunded)
        )
    }
}

/// [`DateTime`] when a [`Rental`] was created.
pub type CreationDateTime = DateTimeOf<(Rental, unit::Creation)>;

/// [`DateTime`] when a [`Rental`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Rental, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::{PaymentStatus, Status};

    #[test]
    fn lifecycle() {
        assert!(Status::Pending.can_become(Status::Active));
        assert!(Status::Pending.can_become(Status::Cancelled));
        assert!(Status::Active.can_become(Status::Completed));
        assert!(Status::Active.can_become(Status::Cancelled));

        assert!(!Status::Pending.can_become(Status::Completed));
        assert!(!Status::Active.can_become(Status::Pending));
        for next in Status::ALL {
            assert!(!Status::Completed.can_become(*next), "{next}");
            assert!(!Status::Cancelled.can_become(*next), "{next}");
        }

        assert!(Status::Pending.is_live());
        assert!(Status::Active.is_live());
        assert!(!Status::Completed.is_live());
        assert!(!Status::Cancelled.is_live());
    }

    #[test]
    fn payment() {
        assert!(PaymentStatus::Pending.can_become(PaymentStatus::Paid));
        assert!(PaymentStatus::Paid.can_become(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Pending.can_become(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_become(PaymentStatus::Paid));
    }
}
