//! [`Damage`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// A damage reported on a `Vehicle`.
#[derive(Clone, Debug, From)]
pub struct Damage(domain::Damage);

/// A damage reported on a `Vehicle`.
#[graphql_object(context = Context)]
impl Damage {
    /// Unique identifier of this `Damage`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Damage.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Damaged `Vehicle`.
    pub fn vehicle(&self) -> api::Vehicle {
        api::Vehicle::by_id(self.0.vehicle_id)
    }

    /// Severity of this `Damage`.
    pub fn severity(&self) -> Severity {
        self.0.severity.into()
    }

    /// Repair status of this `Damage`.
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Description of this `Damage`.
    pub fn description(&self) -> Description {
        self.0.description.clone().into()
    }

    /// Images of this `Damage`.
    pub fn images(&self) -> Vec<ImageUrl> {
        self.0.images.iter().cloned().map(Into::into).collect()
    }

    /// Estimated or actual repair cost of this `Damage`, if known.
    pub fn repair_cost(&self) -> Option<Money> {
        self.0.repair_cost
    }

    /// Insurance claim filed for this `Damage`, if any.
    pub fn insurance_claim(&self) -> Option<InsuranceClaim> {
        self.0.insurance_claim.clone().map(InsuranceClaim)
    }

    /// `DateTime` when this `Damage` was reported.
    pub fn reported_at(&self) -> DateTime {
        self.0.reported_at.coerce()
    }
}

/// An insurance claim filed for a `Damage`.
#[derive(Clone, Debug)]
pub struct InsuranceClaim(domain::damage::InsuranceClaim);

/// An insurance claim filed for a `Damage`.
#[graphql_object(context = Context)]
impl InsuranceClaim {
    /// Number of this claim.
    pub fn number(&self) -> ClaimNumber {
        self.0.number.clone().into()
    }

    /// Claimed amount, if known.
    pub fn amount(&self) -> Option<Money> {
        self.0.amount
    }
}

/// Unique identifier of a `Damage`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::damage::Id)]
#[into(domain::damage::Id)]
#[graphql(name = "DamageId", transparent)]
pub struct Id(Uuid);

/// Description of a `Damage`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DamageDescription",
    with = scalar::Via::<domain::damage::Description>,
)]
pub struct Description(domain::damage::Description);

/// URL of a `Damage` image.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DamageImageUrl",
    with = scalar::Via::<domain::damage::ImageUrl>,
)]
pub struct ImageUrl(domain::damage::ImageUrl);

/// Number of an insurance claim.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "InsuranceClaimNumber",
    with = scalar::Via::<domain::damage::ClaimNumber>,
)]
pub struct ClaimNumber(domain::damage::ClaimNumber);

/// Severity of a `Damage`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "DamageSeverity")]
pub enum Severity {
    /// Cosmetic, the `Vehicle` stays rentable.
    Minor,

    /// Noticeable, the `Vehicle` stays rentable.
    Moderate,

    /// The `Vehicle` must not be rented.
    Severe,
}

impl From<domain::damage::Severity> for Severity {
    fn from(severity: domain::damage::Severity) -> Self {
        use domain::damage::Severity as S;
        match severity {
            S::Minor => Self::Minor,
            S::Moderate => Self::Moderate,
            S::Severe => Self::Severe,
        }
    }
}

impl From<Severity> for domain::damage::Severity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Minor => Self::Minor,
            Severity::Moderate => Self::Moderate,
            Severity::Severe => Self::Severe,
        }
    }
}

/// Repair status of a `Damage`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "DamageStatus")]
pub enum Status {
    /// Reported, not yet handled.
    Reported,

    /// Being repaired.
    InRepair,

    /// Repaired.
    Repaired,
}

impl From<domain::damage::Status> for Status {
    fn from(status: domain::damage::Status) -> Self {
        use domain::damage::Status as S;
        match status {
            S::InRepair => Self::InRepair,
            S::Repaired => Self::Repaired,
            S::Reported => Self::Reported,
        }
    }
}

impl From<Status> for domain::damage::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::InRepair => Self::InRepair,
            Status::Repaired => Self::Repaired,
            Status::Reported => Self::Reported,
        }
    }
}
