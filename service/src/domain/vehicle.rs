//! [`Vehicle`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{damage, Damage, Maintenance};
#[cfg(doc)]
use crate::domain::Rental;

/// Vehicle of the rental fleet.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// ID of this [`Vehicle`].
    pub id: Id,

    /// [`PlateNumber`] of this [`Vehicle`].
    pub plate_number: PlateNumber,

    /// [`Model`] of this [`Vehicle`].
    pub model: Model,

    /// Last persisted [`Status`] of this [`Vehicle`].
    ///
    /// Derived from the [`Condition`] of this [`Vehicle`], so must never be
    /// assigned directly.
    pub status: Status,

    /// Indicator whether this [`Vehicle`] is withdrawn from service by an
    /// administrator.
    pub is_withdrawn: bool,

    /// [`DateTime`] when this [`Vehicle`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Vehicle`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Registration plate number of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct PlateNumber(String);

impl PlateNumber {
    /// Creates a new [`PlateNumber`] if the given `number` is valid.
    ///
    /// Lowercase letters are uppercased.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into().to_uppercase();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`PlateNumber`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Uppercase letters, digits, spaces and dashes, not starting or
        /// ending with a separator, between 2 and 16 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{Lu}\p{N}][\p{Lu}\p{N} \-]{0,14}[\p{Lu}\p{N}]$")
                .expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for PlateNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `PlateNumber`")
    }
}

/// Make and model of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Model(String);

impl Model {
    /// Creates a new [`Model`] if the given `model` is valid.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Option<Self> {
        let model = model.into();
        Self::check(&model).then_some(Self(model))
    }

    /// Checks whether the given `model` is a valid [`Model`].
    fn check(model: impl AsRef<str>) -> bool {
        let model = model.as_ref();
        model.trim() == model && !model.is_empty() && model.len() <= 128
    }
}

impl FromStr for Model {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Model`")
    }
}

define_kind! {
    #[doc = "Displayed status of a [`Vehicle`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "Ready to be rented."]
        Available = 1,

        #[doc = "Occupied by an active [`Rental`]."]
        Rented = 2,

        #[doc = "Undergoing or due for maintenance."]
        Maintenance = 3,

        #[doc = "Has minor unrepaired damage, still rentable."]
        MinorDamage = 4,

        #[doc = "Has moderate unrepaired damage, still rentable."]
        ModerateDamage = 5,

        #[doc = "Has severe unrepaired damage, never rentable."]
        SevereDamage = 6,

        #[doc = "Withdrawn from service by an administrator."]
        Unavailable = 7,
    }
}

impl Status {
    /// Derives the [`Status`] of a [`Vehicle`] from its damage and
    /// maintenance records, ignoring its occupancy.
    ///
    /// Records that are not live are skipped. The first matching rule wins:
    /// 1. severe damage;
    /// 2. moderate damage;
    /// 3. minor damage;
    /// 4. maintenance in progress or scheduled for `today` or earlier;
    /// 5. available.
    #[must_use]
    pub fn derive<'a>(
        damages: impl IntoIterator<Item = &'a Damage>,
        maintenance: impl IntoIterator<Item = &'a Maintenance>,
        today: Date,
    ) -> Self {
        let worst = damages
            .into_iter()
            .filter(|d| d.is_live())
            .map(|d| d.severity)
            .max_by_key(|s| s.u8());
        match worst {
            Some(damage::Severity::Severe) => return Self::SevereDamage,
            Some(damage::Severity::Moderate) => return Self::ModerateDamage,
            Some(damage::Severity::Minor) => return Self::MinorDamage,
            None => {}
        }

        if maintenance.into_iter().any(|m| m.is_due(today)) {
            return Self::Maintenance;
        }

        Self::Available
    }
}

/// Everything the [`Status`] of a [`Vehicle`] depends on, read at once.
#[derive(Clone, Debug, Default)]
pub struct Condition {
    /// Indicator whether an active [`Rental`] references the [`Vehicle`].
    pub is_rented: bool,

    /// Indicator whether the [`Vehicle`] is withdrawn from service.
    pub is_withdrawn: bool,

    /// Live [`Damage`]s of the [`Vehicle`].
    pub damages: Vec<Damage>,

    /// Live [`Maintenance`]s of the [`Vehicle`].
    pub maintenance: Vec<Maintenance>,
}

impl Condition {
    /// Resolves the authoritative [`Status`] of the [`Vehicle`] in this
    /// [`Condition`].
    ///
    /// An active [`Rental`] always shows the [`Vehicle`] as
    /// [`Status::Rented`], even when it has damage. A withdrawn [`Vehicle`]
    /// is [`Status::Unavailable`]. Otherwise [`Status::derive()`] applies.
    #[must_use]
    pub fn status(&self, today: Date) -> Status {
        if self.is_rented {
            return Status::Rented;
        }
        if self.is_withdrawn {
            return Status::Unavailable;
        }
        Status::derive(&self.damages, &self.maintenance, today)
    }
}

/// [`DateTime`] when a [`Vehicle`] was created.
pub type CreationDateTime = DateTimeOf<(Vehicle, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTime, Money};

    use crate::domain::{damage, maintenance, vehicle, Damage, Maintenance};

    use super::{Condition, PlateNumber, Status};

    fn today() -> Date {
        Date::from_calendar_date(2025, 6, 10).unwrap()
    }

    fn damage(severity: damage::Severity, status: damage::Status) -> Damage {
        Damage {
            id: damage::Id::new(),
            vehicle_id: vehicle::Id::default(),
            severity,
            status,
            description: damage::Description::new("scratch").unwrap(),
            images: vec![],
            repair_cost: None,
            insurance_claim: None,
            reported_at: DateTime::now().coerce(),
        }
    }

    fn maintenance(status: maintenance::Status, days: i64) -> Maintenance {
        Maintenance {
            id: maintenance::Id::new(),
            vehicle_id: vehicle::Id::default(),
            service_type: maintenance::ServiceType::new("oil change")
                .unwrap(),
            description: maintenance::Description::new("").unwrap(),
            scheduled_date: today().add_days(days).unwrap().coerce(),
            status,
            cost: Money::zero(Currency::Usd),
            provider: None,
            next_service_due: None,
            cancellation: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn plate_number() {
        let plate = PlateNumber::new("ab-123-cd").unwrap();
        assert_eq!(AsRef::<str>::as_ref(&plate), "AB-123-CD");
        assert!(PlateNumber::new("DXB 12345").is_some());
        assert!(PlateNumber::new("A").is_none());
        assert!(PlateNumber::new("-AB12").is_none());
        assert!(PlateNumber::new("AB12 ").is_none());
        assert!(PlateNumber::new("AB_12").is_none());
        assert!(PlateNumber::new("A".repeat(17)).is_none());
    }

    #[test]
    fn worst_live_damage_wins() {
        use damage::{Severity as S, Status as D};

        let damages = [
            damage(S::Minor, D::Reported),
            damage(S::Severe, D::InRepair),
            damage(S::Moderate, D::Reported),
        ];
        assert_eq!(Status::derive(&damages, [], today()), Status::SevereDamage);

        let damages = [
            damage(S::Minor, D::Reported),
            damage(S::Severe, D::Repaired),
            damage(S::Moderate, D::InRepair),
        ];
        assert_eq!(
            Status::derive(&damages, [], today()),
            Status::ModerateDamage,
        );

        let damages = [damage(S::Minor, D::InRepair)];
        assert_eq!(Status::derive(&damages, [], today()), Status::MinorDamage);

        let damages = [damage(S::Severe, D::Repaired)];
        assert_eq!(Status::derive(&damages, [], today()), Status::Available);
    }

    #[test]
    fn damage_outranks_maintenance() {
        let damages =
            [damage(damage::Severity::Minor, damage::Status::Reported)];
        let maintenance = [maintenance(maintenance::Status::InProgress, 0)];

        assert_eq!(
            Status::derive(&damages, &maintenance, today()),
            Status::MinorDamage,
        );
    }

    #[test]
    fn maintenance_counts_when_due() {
        use maintenance::Status as M;

        for (status, days, expected) in [
            (M::InProgress, 5, Status::Maintenance),
            (M::InProgress, -5, Status::Maintenance),
            (M::Scheduled, 0, Status::Maintenance),
            (M::Scheduled, -1, Status::Maintenance),
            (M::Scheduled, 1, Status::Available),
            (M::Completed, 0, Status::Available),
            (M::Cancelled, -1, Status::Available),
        ] {
            assert_eq!(
                Status::derive([], &[maintenance(status, days)], today()),
                expected,
                "{status} maintenance in {days} days",
            );
        }
    }

    #[test]
    fn precedence_is_total() {
        for severity in damage::Severity::ALL {
            for damage_status in damage::Status::ALL {
                for maintenance_status in maintenance::Status::ALL {
                    for days in [-1, 0, 1] {
                        let damages = [damage(*severity, *damage_status)];
                        let maintenance =
                            [maintenance(*maintenance_status, days)];

                        let expected = if damage_status.is_live() {
                            match severity {
                                damage::Severity::Minor => Status::MinorDamage,
                                damage::Severity::Moderate => {
                                    Status::ModerateDamage
                                }
                                damage::Severity::Severe => {
                                    Status::SevereDamage
                                }
                            }
                        } else if maintenance_status.is_live()
                            && (*maintenance_status
                                == maintenance::Status::InProgress
                                || days <= 0)
                        {
                            Status::Maintenance
                        } else {
                            Status::Available
                        };

                        let status =
                            Status::derive(&damages, &maintenance, today());
                        assert_eq!(status, expected);
                        assert_eq!(
                            status,
                            Status::derive(&damages, &maintenance, today()),
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn occupancy_and_withdrawal_overlay() {
        let severe = damage(damage::Severity::Severe, damage::Status::Reported);

        let rented = Condition {
            is_rented: true,
            is_withdrawn: true,
            damages: vec![severe.clone()],
            maintenance: vec![],
        };
        assert_eq!(rented.status(today()), Status::Rented);

        let withdrawn = Condition {
            is_rented: false,
            ..rented.clone()
        };
        assert_eq!(withdrawn.status(today()), Status::Unavailable);

        let damaged = Condition {
            is_withdrawn: false,
            ..withdrawn
        };
        assert_eq!(damaged.status(today()), Status::SevereDamage);

        assert_eq!(Condition::default().status(today()), Status::Available);
    }

    #[test]
    fn labels() {
        assert_eq!(Status::SevereDamage.to_string(), "severe_damage");
        assert_eq!(
            "minor_damage".parse::<Status>().unwrap(),
            Status::MinorDamage,
        );
    }
}
