//! [`Vehicle`]-related definitions.

use std::future;

use common::{DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A vehicle of the fleet.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// ID of this [`Vehicle`].
    id: Id,

    /// Underlying [`domain::Vehicle`].
    vehicle: OnceCell<domain::Vehicle>,
}

impl From<domain::Vehicle> for Vehicle {
    fn from(vehicle: domain::Vehicle) -> Self {
        Self {
            id: vehicle.id.into(),
            vehicle: OnceCell::new_with(Some(vehicle)),
        }
    }
}

impl Vehicle {
    /// Creates a new [`Vehicle`] with the provided ID, loading it on the
    /// first access.
    ///
    /// Accessing the created [`Vehicle`] errors if it doesn't exist.
    #[must_use]
    pub fn by_id(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            vehicle: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Vehicle`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Vehicle`] doesn't exist.
    async fn vehicle(&self, ctx: &Context) -> Result<&domain::Vehicle, Error> {
        let id = self.id.into();
        self.vehicle
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::vehicle::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|v| {
                        future::ready(v.ok_or_else(|| {
                            api::query::VehicleError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A vehicle of the fleet.
#[graphql_object(context = Context)]
impl Vehicle {
    /// Unique identifier of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Plate number of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.plateNumber",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn plate_number(
        &self,
        ctx: &Context,
    ) -> Result<PlateNumber, Error> {
        Ok(self.vehicle(ctx).await?.plate_number.clone().into())
    }

    /// Model of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.model",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn model(&self, ctx: &Context) -> Result<Model, Error> {
        Ok(self.vehicle(ctx).await?.model.clone().into())
    }

    /// Last persisted status of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.vehicle(ctx).await?.status.into())
    }

    /// Indicator whether this `Vehicle` is withdrawn from service.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.isWithdrawn",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_withdrawn(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.vehicle(ctx).await?.is_withdrawn)
    }

    /// Scheduled or in progress `Maintenance` of this `Vehicle`, ordered by
    /// their scheduled date.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.liveMaintenance",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn live_maintenance(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Maintenance>, Error> {
        ctx.service()
            .execute(query::maintenance::Live::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|live| live.into_iter().map(|m| m.0.into()).collect())
    }

    /// Not yet repaired `Damage`s of this `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.liveDamages",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn live_damages(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Damage>, Error> {
        ctx.service()
            .execute(query::damage::Live::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|live| live.into_iter().map(|d| d.0.into()).collect())
    }

    /// Pending or active `Rental`s of this `Vehicle`, ordered by their start
    /// date.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.liveRentals",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn live_rentals(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Rental>, Error> {
        ctx.service()
            .execute(query::rental::Live::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|live| live.into_iter().map(|r| r.0.into()).collect())
    }

    /// `DateTime` when this `Vehicle` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Vehicle.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.vehicle(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Vehicle`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::vehicle::Id)]
#[into(domain::vehicle::Id)]
#[graphql(name = "VehicleId", transparent)]
pub struct Id(Uuid);

/// Plate number of a `Vehicle`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "VehiclePlateNumber",
    with = scalar::Via::<domain::vehicle::PlateNumber>,
)]
pub struct PlateNumber(domain::vehicle::PlateNumber);

/// Model of a `Vehicle`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "VehicleModel", with = scalar::Via::<domain::vehicle::Model>)]
pub struct Model(domain::vehicle::Model);

/// Status of a `Vehicle`, from the most to the least important one.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "VehicleStatus")]
pub enum Status {
    /// Rented out by an active `Rental`.
    Rented,

    /// Withdrawn from service by an administrator.
    Unavailable,

    /// Has a live severe `Damage`, so cannot be rented.
    SevereDamage,

    /// Has a live moderate `Damage`.
    ModerateDamage,

    /// Has a live minor `Damage`.
    MinorDamage,

    /// Has a `Maintenance` in progress or due.
    Maintenance,

    /// Ready to be rented.
    Available,
}

impl From<domain::vehicle::Status> for Status {
    fn from(status: domain::vehicle::Status) -> Self {
        use domain::vehicle::Status as S;
        match status {
            S::Available => Self::Available,
            S::Maintenance => Self::Maintenance,
            S::MinorDamage => Self::MinorDamage,
            S::ModerateDamage => Self::ModerateDamage,
            S::Rented => Self::Rented,
            S::SevereDamage => Self::SevereDamage,
            S::Unavailable => Self::Unavailable,
        }
    }
}
