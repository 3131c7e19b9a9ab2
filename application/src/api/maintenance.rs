//! [`Maintenance`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    error::Details,
    Context,
};

/// A maintenance record of a `Vehicle`.
#[derive(Clone, Debug, From)]
pub struct Maintenance(domain::Maintenance);

impl Maintenance {
    /// Describes the provided [`domain::Maintenance`] records as
    /// `conflicts` [`Details`] of an [`Error`].
    ///
    /// [`Error`]: crate::Error
    #[must_use]
    pub fn conflicts(records: &[domain::Maintenance]) -> Details {
        Details {
            field: "conflicts",
            entries: records
                .iter()
                .map(|m| {
                    vec![
                        ("id", Some(m.id.to_string())),
                        ("serviceType", Some(m.service_type.to_string())),
                        ("description", Some(m.description.to_string())),
                        (
                            "scheduledDate",
                            Some(m.scheduled_date.to_string()),
                        ),
                        ("status", Some(Status::from(m.status).to_string())),
                        ("cost", Some(m.cost.to_string())),
                        (
                            "provider",
                            m.provider.as_ref().map(ToString::to_string),
                        ),
                    ]
                })
                .collect(),
        }
    }
}

/// A maintenance record of a `Vehicle`.
#[graphql_object(context = Context)]
impl Maintenance {
    /// Unique identifier of this `Maintenance`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Maintenance.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `Vehicle` to be maintained.
    pub fn vehicle(&self) -> api::Vehicle {
        api::Vehicle::by_id(self.0.vehicle_id)
    }

    /// Kind of service performed.
    pub fn service_type(&self) -> ServiceType {
        self.0.service_type.clone().into()
    }

    /// Description of this `Maintenance`.
    pub fn description(&self) -> Description {
        self.0.description.clone().into()
    }

    /// Day this `Maintenance` is scheduled for.
    pub fn scheduled_date(&self) -> Date {
        self.0.scheduled_date.coerce()
    }

    /// Status of this `Maintenance`.
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Cost of this `Maintenance`.
    pub fn cost(&self) -> Money {
        self.0.cost
    }

    /// Provider performing this `Maintenance`, if known.
    pub fn provider(&self) -> Option<Provider> {
        self.0.provider.clone().map(Into::into)
    }

    /// Day the next service of the `Vehicle` is due, if known.
    pub fn next_service_due(&self) -> Option<Date> {
        self.0.next_service_due.map(|d| d.coerce())
    }

    /// Details of the `Rental` override this `Maintenance` was cancelled by,
    /// if any.
    pub fn cancellation(&self) -> Option<Cancellation> {
        self.0.cancellation.clone().map(Cancellation)
    }

    /// `DateTime` when this `Maintenance` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Details of a `Maintenance` cancelled by a `Rental` override.
#[derive(Clone, Debug)]
pub struct Cancellation(domain::maintenance::Cancellation);

/// Details of a `Maintenance` cancelled by a `Rental` override.
#[graphql_object(
    name = "MaintenanceCancellation",
    context = Context,
)]
impl Cancellation {
    /// `Rental` the `Maintenance` was cancelled for.
    pub fn rental_id(&self) -> api::rental::Id {
        self.0.rental_id.into()
    }

    /// Operator who requested the override, if known.
    pub fn initiator(&self) -> Option<api::rental::Operator> {
        self.0.initiator.clone().map(Into::into)
    }

    /// `DateTime` when the `Maintenance` was cancelled.
    pub fn cancelled_at(&self) -> DateTime {
        self.0.cancelled_at.coerce()
    }
}

/// Unique identifier of a `Maintenance`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::maintenance::Id)]
#[into(domain::maintenance::Id)]
#[graphql(name = "MaintenanceId", transparent)]
pub struct Id(Uuid);

/// Kind of service of a `Maintenance`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceServiceType",
    with = scalar::Via::<domain::maintenance::ServiceType>,
)]
pub struct ServiceType(domain::maintenance::ServiceType);

/// Description of a `Maintenance`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceDescription",
    with = scalar::Via::<domain::maintenance::Description>,
)]
pub struct Description(domain::maintenance::Description);

/// Provider performing a `Maintenance`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceProvider",
    with = scalar::Via::<domain::maintenance::Provider>,
)]
pub struct Provider(domain::maintenance::Provider);

/// Status of a `Maintenance`.
#[derive(Clone, Copy, Debug, Display, GraphQLEnum)]
#[graphql(name = "MaintenanceStatus")]
pub enum Status {
    /// Planned for its scheduled date.
    #[display("SCHEDULED")]
    Scheduled,

    /// Being performed.
    #[display("IN_PROGRESS")]
    InProgress,

    /// Performed.
    #[display("COMPLETED")]
    Completed,

    /// Cancelled by a `Rental` override.
    #[display("CANCELLED")]
    Cancelled,
}

impl From<domain::maintenance::Status> for Status {
    fn from(status: domain::maintenance::Status) -> Self {
        use domain::maintenance::Status as S;
        match status {
            S::Cancelled => Self::Cancelled,
            S::Completed => Self::Completed,
            S::InProgress => Self::InProgress,
            S::Scheduled => Self::Scheduled,
        }
    }
}

impl From<Status> for domain::maintenance::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Cancelled => Self::Cancelled,
            Status::Completed => Self::Completed,
            Status::InProgress => Self::InProgress,
            Status::Scheduled => Self::Scheduled,
        }
    }
}
