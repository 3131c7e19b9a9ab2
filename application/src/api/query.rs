//! GraphQL [`Query`]s definitions.

use common::{Date, Period};
use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Vehicle` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the `Vehicle` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "vehicle",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn vehicle(
        id: api::vehicle::Id,
        ctx: &Context,
    ) -> Result<api::Vehicle, Error> {
        ctx.service()
            .execute(query::vehicle::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| VehicleError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Rental` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "rental",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental(
        id: api::rental::Id,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(query::rental::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| RentalError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Customer` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CUSTOMER_NOT_EXISTS` - the `Customer` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "customer",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn customer(
        id: api::customer::Id,
        ctx: &Context,
    ) -> Result<api::Customer, Error> {
        ctx.service()
            .execute(query::customer::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| CustomerError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Maintenance` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MAINTENANCE_NOT_EXISTS` - the `Maintenance` with the specified ID
    ///                              does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "maintenance",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn maintenance(
        id: api::maintenance::Id,
        ctx: &Context,
    ) -> Result<api::Maintenance, Error> {
        ctx.service()
            .execute(query::maintenance::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| MaintenanceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Damage` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DAMAGE_NOT_EXISTS` - the `Damage` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "damage",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn damage(
        id: api::damage::Id,
        ctx: &Context,
    ) -> Result<api::Damage, Error> {
        ctx.service()
            .execute(query::damage::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| DamageError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the scheduled or in progress `Maintenance` records of the
    /// specified `Vehicle` which collide with renting it from `startDate`
    /// to `endDate` inclusively.
    ///
    /// An unknown `Vehicle` has no conflicts.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RENTAL_PERIOD` - the `startDate` is after the `endDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "maintenanceConflicts",
            otel.name = Self::SPAN_NAME,
            start_date = %start_date,
            vehicle_id = %vehicle_id,
        ),
    )]
    pub async fn maintenance_conflicts(
        vehicle_id: api::vehicle::Id,
        start_date: Date,
        end_date: Date,
        ctx: &Context,
    ) -> Result<Vec<api::Maintenance>, Error> {
        let period = Period::new(start_date, end_date)
            .ok_or_else(|| PeriodError::Invalid.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::maintenance::Conflicts {
                vehicle_id: vehicle_id.into(),
                period,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|conflicts| conflicts.into_iter().map(Into::into).collect())
    }

    /// Resolves the status the specified `Vehicle` should have right now,
    /// without persisting it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the `Vehicle` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "vehicleStatus",
            otel.name = Self::SPAN_NAME,
            vehicle_id = %vehicle_id,
        ),
    )]
    pub async fn vehicle_status(
        vehicle_id: api::vehicle::Id,
        ctx: &Context,
    ) -> Result<api::vehicle::Status, Error> {
        ctx.service()
            .execute(query::vehicle::Status {
                vehicle_id: vehicle_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| VehicleError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum CustomerError {
        #[code = "CUSTOMER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Customer` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum DamageError {
        #[code = "DAMAGE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Damage` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum MaintenanceError {
        #[code = "MAINTENANCE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Maintenance` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PeriodError {
        #[code = "INVALID_RENTAL_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "Start date must not be after the end date"]
        Invalid,
    }
}

define_error! {
    enum RentalError {
        #[code = "RENTAL_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Rental` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum VehicleError {
        #[code = "VEHICLE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Vehicle` with the specified ID does not exist"]
        NotExists,
    }
}
