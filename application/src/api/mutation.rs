//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{command, domain, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `Vehicle` in the fleet.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PLATE_NUMBER_OCCUPIED` - provided `VehiclePlateNumber` is occupied
    ///                             by another `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createVehicle",
            model = %model,
            otel.name = Self::SPAN_NAME,
            plate_number = %plate_number,
        ),
    )]
    pub async fn create_vehicle(
        plate_number: api::vehicle::PlateNumber,
        model: api::vehicle::Model,
        ctx: &Context,
    ) -> Result<api::Vehicle, Error> {
        ctx.service()
            .execute(command::CreateVehicle {
                plate_number: plate_number.into(),
                model: model.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Registers a new `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createCustomer",
            license_number = %license_number,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_customer(
        name: api::customer::Name,
        license_number: api::customer::LicenseNumber,
        phone: Option<api::customer::Phone>,
        ctx: &Context,
    ) -> Result<api::Customer, Error> {
        ctx.service()
            .execute(command::CreateCustomer {
                name: name.into(),
                license_number: license_number.into(),
                phone: phone.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Books the specified `Vehicle` for the `Customer` from `startDate` to
    /// `endDate` inclusively.
    ///
    /// Scheduled or in progress `Maintenance` of the `Vehicle` falling into
    /// the requested dates rejects the booking, unless `overrideConflict` is
    /// set, in which case such `Maintenance` is cancelled.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RENTAL_PERIOD` - the `startDate` is after the `endDate`;
    /// - `CUSTOMER_NOT_EXISTS` - the specified `Customer` does not exist;
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist;
    /// - `VEHICLE_SEVERELY_DAMAGED` - the `Vehicle` has a severe `Damage`;
    /// - `NEGATIVE_TOTAL_AMOUNT` - the `totalAmount` is below zero;
    /// - `VEHICLE_ALREADY_BOOKED` - another pending or active `Rental` of
    ///                              the `Vehicle` overlaps the requested
    ///                              dates, listed in the `bookings` extension
    ///                              of the error, regardless of
    ///                              `overrideConflict`;
    /// - `MAINTENANCE_CONFLICT` - the `Vehicle` has `Maintenance` in the
    ///                            requested dates, listed in the `conflicts`
    ///                            extension of the error.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_id = %customer_id,
            end_date = %end_date,
            gql.name = "createRental",
            initiator = ?initiator.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            override_conflict = ?override_conflict,
            start_date = %start_date,
            vehicle_id = %vehicle_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_rental(
        customer_id: api::customer::Id,
        vehicle_id: api::vehicle::Id,
        start_date: Date,
        end_date: Date,
        total_amount: Money,
        payment_status: Option<api::rental::PaymentStatus>,
        with_driver: Option<bool>,
        insurance: Option<bool>,
        override_conflict: Option<bool>,
        initiator: Option<api::rental::Operator>,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::SubmitRental {
                rental_id: None,
                customer_id: customer_id.into(),
                vehicle_id: vehicle_id.into(),
                start_date,
                end_date,
                payment_status: payment_status
                    .map_or(domain::rental::PaymentStatus::Pending, Into::into),
                with_driver: with_driver.unwrap_or_default(),
                insurance: insurance.unwrap_or_default(),
                total_amount,
                override_conflict: override_conflict.unwrap_or_default(),
                initiator: initiator.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Edits the specified `Rental`.
    ///
    /// Moving the `Rental` to another `Vehicle` or other dates is checked
    /// against other `Rental`s and `Maintenance` the same way `createRental`
    /// does.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the specified `Rental` does not exist;
    /// - `INVALID_RENTAL_PERIOD` - the `startDate` is after the `endDate`;
    /// - `CUSTOMER_NOT_EXISTS` - the specified `Customer` does not exist;
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist;
    /// - `VEHICLE_SEVERELY_DAMAGED` - the new `Vehicle` has a severe `Damage`;
    /// - `NEGATIVE_TOTAL_AMOUNT` - the `totalAmount` is below zero;
    /// - `VEHICLE_ALREADY_BOOKED` - another pending or active `Rental` of
    ///                              the `Vehicle` overlaps the requested
    ///                              dates, listed in the `bookings` extension
    ///                              of the error, regardless of
    ///                              `overrideConflict`;
    /// - `MAINTENANCE_CONFLICT` - the `Vehicle` has `Maintenance` in the
    ///                            requested dates, listed in the `conflicts`
    ///                            extension of the error.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_id = %customer_id,
            end_date = %end_date,
            gql.name = "updateRental",
            id = %id,
            initiator = ?initiator.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            override_conflict = ?override_conflict,
            start_date = %start_date,
            vehicle_id = %vehicle_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn update_rental(
        id: api::rental::Id,
        customer_id: api::customer::Id,
        vehicle_id: api::vehicle::Id,
        start_date: Date,
        end_date: Date,
        total_amount: Money,
        payment_status: api::rental::PaymentStatus,
        with_driver: bool,
        insurance: bool,
        override_conflict: Option<bool>,
        initiator: Option<api::rental::Operator>,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::SubmitRental {
                rental_id: Some(id.into()),
                customer_id: customer_id.into(),
                vehicle_id: vehicle_id.into(),
                start_date,
                end_date,
                payment_status: payment_status.into(),
                with_driver,
                insurance,
                total_amount,
                override_conflict: override_conflict.unwrap_or_default(),
                initiator: initiator.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the specified `Rental` into the provided `RentalStatus`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the specified `Rental` does not exist;
    /// - `FORBIDDEN_RENTAL_STATUS_TRANSITION` - the `Rental` cannot be moved
    ///                                          into the provided status;
    /// - `VEHICLE_ALREADY_RENTED` - another `Rental` of the `Vehicle` is
    ///                              active;
    /// - `VEHICLE_SEVERELY_DAMAGED` - the `Rental` is activated while its
    ///                                `Vehicle` has a severe `Damage`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "changeRentalStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn change_rental_status(
        id: api::rental::Id,
        status: api::rental::Status,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::ChangeRentalStatus {
                rental_id: id.into(),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the specified `Rental` into the provided
    /// `RentalPaymentStatus`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the specified `Rental` does not exist;
    /// - `FORBIDDEN_PAYMENT_STATUS_TRANSITION` - the `Rental` payment cannot
    ///                                           be moved into the provided
    ///                                           status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "changeRentalPaymentStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            payment_status = ?payment_status,
        ),
    )]
    pub async fn change_rental_payment_status(
        id: api::rental::Id,
        payment_status: api::rental::PaymentStatus,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::ChangeRentalPaymentStatus {
                rental_id: id.into(),
                payment_status: payment_status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reports a new `Damage` of the specified `Vehicle`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist;
    /// - `NEGATIVE_REPAIR_COST` - the `repairCost` is below zero.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "reportDamage",
            otel.name = Self::SPAN_NAME,
            severity = ?severity,
            vehicle_id = %vehicle_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn report_damage(
        vehicle_id: api::vehicle::Id,
        severity: api::damage::Severity,
        description: api::damage::Description,
        images: Option<Vec<api::damage::ImageUrl>>,
        repair_cost: Option<Money>,
        claim_number: Option<api::damage::ClaimNumber>,
        claim_amount: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Damage, Error> {
        ctx.service()
            .execute(command::ReportDamage {
                vehicle_id: vehicle_id.into(),
                severity: severity.into(),
                description: description.into(),
                images: images
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                repair_cost,
                insurance_claim: claim_number.map(|number| {
                    domain::damage::InsuranceClaim {
                        number: number.into(),
                        amount: claim_amount,
                    }
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the specified `Damage` into the provided `DamageStatus`,
    /// optionally updating its `repairCost`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DAMAGE_NOT_EXISTS` - the specified `Damage` does not exist;
    /// - `FORBIDDEN_DAMAGE_STATUS_TRANSITION` - the `Damage` cannot be moved
    ///                                          into the provided status;
    /// - `NEGATIVE_REPAIR_COST` - the `repairCost` is below zero.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateDamageStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_damage_status(
        id: api::damage::Id,
        status: api::damage::Status,
        repair_cost: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Damage, Error> {
        ctx.service()
            .execute(command::UpdateDamageStatus {
                damage_id: id.into(),
                status: status.into(),
                repair_cost,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Schedules a new `Maintenance` of the specified `Vehicle`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist;
    /// - `NEGATIVE_MAINTENANCE_COST` - the `cost` is below zero;
    /// - `NEXT_SERVICE_BEFORE_SCHEDULED` - the `nextServiceDue` is before the
    ///                                     `scheduledDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "scheduleMaintenance",
            otel.name = Self::SPAN_NAME,
            scheduled_date = %scheduled_date,
            service_type = %service_type,
            vehicle_id = %vehicle_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn schedule_maintenance(
        vehicle_id: api::vehicle::Id,
        service_type: api::maintenance::ServiceType,
        description: api::maintenance::Description,
        scheduled_date: Date,
        cost: Money,
        provider: Option<api::maintenance::Provider>,
        next_service_due: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Maintenance, Error> {
        ctx.service()
            .execute(command::ScheduleMaintenance {
                vehicle_id: vehicle_id.into(),
                service_type: service_type.into(),
                description: description.into(),
                scheduled_date: scheduled_date.coerce(),
                cost,
                provider: provider.map(Into::into),
                next_service_due: next_service_due.map(Date::coerce),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the specified `Maintenance` into the provided
    /// `MaintenanceStatus`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MAINTENANCE_NOT_EXISTS` - the specified `Maintenance` does not
    ///                              exist;
    /// - `MAINTENANCE_CANCELLATION_FORBIDDEN` - `Maintenance` can only be
    ///                                          cancelled by a `Rental`
    ///                                          override;
    /// - `FORBIDDEN_MAINTENANCE_STATUS_TRANSITION` - the `Maintenance`
    ///                                               cannot be moved into
    ///                                               the provided status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateMaintenanceStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_maintenance_status(
        id: api::maintenance::Id,
        status: api::maintenance::Status,
        ctx: &Context,
    ) -> Result<api::Maintenance, Error> {
        ctx.service()
            .execute(command::UpdateMaintenanceStatus {
                maintenance_id: id.into(),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Withdraws the specified `Vehicle` from service, or returns it back.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "withdrawVehicle",
            id = %id,
            otel.name = Self::SPAN_NAME,
            withdrawn = withdrawn,
        ),
    )]
    pub async fn withdraw_vehicle(
        id: api::vehicle::Id,
        withdrawn: bool,
        ctx: &Context,
    ) -> Result<api::Vehicle, Error> {
        _ = ctx
            .service()
            .execute(command::WithdrawVehicle {
                vehicle_id: id.into(),
                withdrawn,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        Ok(api::Vehicle::by_id(id))
    }

    /// Resolves the status of the specified `Vehicle` out of its current
    /// `Rental`s, `Damage`s and `Maintenance`, and persists it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VEHICLE_NOT_EXISTS` - the specified `Vehicle` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "resolveVehicleStatus",
            otel.name = Self::SPAN_NAME,
            vehicle_id = %vehicle_id,
        ),
    )]
    pub async fn resolve_vehicle_status(
        vehicle_id: api::vehicle::Id,
        ctx: &Context,
    ) -> Result<api::vehicle::Status, Error> {
        ctx.service()
            .execute(command::ResolveVehicleStatus {
                vehicle_id: vehicle_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum TransitionError {
        #[code = "FORBIDDEN_DAMAGE_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`Damage` cannot be moved into the provided status"]
        Damage,

        #[code = "FORBIDDEN_MAINTENANCE_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`Maintenance` cannot be moved into the provided status"]
        Maintenance,

        #[code = "FORBIDDEN_PAYMENT_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`Rental` payment cannot be moved into the provided \
                     status"]
        Payment,

        #[code = "FORBIDDEN_RENTAL_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`Rental` cannot be moved into the provided status"]
        Rental,
    }
}

define_error! {
    enum RepairCostError {
        #[code = "NEGATIVE_REPAIR_COST"]
        #[status = BAD_REQUEST]
        #[message = "`Damage` repair cost cannot be negative"]
        Negative,
    }
}

impl AsError for command::resolve_vehicle_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::VehicleNotExists(_) => {
                Some(api::query::VehicleError::NotExists.into())
            }
        }
    }
}

impl AsError for command::create_vehicle::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PLATE_NUMBER_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`VehiclePlateNumber` is occupied by another \
                             `Vehicle`"]
                PlateNumberOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PlateNumberOccupied(_) => {
                Some(Error::PlateNumberOccupied.into())
            }
        }
    }
}

impl AsError for command::submit_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "MAINTENANCE_CONFLICT"]
                #[status = CONFLICT]
                #[message = "`Vehicle` has `Maintenance` scheduled within the \
                             requested dates"]
                MaintenanceConflict,

                #[code = "NEGATIVE_TOTAL_AMOUNT"]
                #[status = BAD_REQUEST]
                #[message = "`Rental` total amount cannot be negative"]
                NegativeTotalAmount,

                #[code = "VEHICLE_ALREADY_BOOKED"]
                #[status = CONFLICT]
                #[message = "`Vehicle` is already booked by another `Rental` \
                             within the requested dates"]
                VehicleAlreadyBooked,

                #[code = "VEHICLE_SEVERELY_DAMAGED"]
                #[status = CONFLICT]
                #[message = "`Vehicle` is severely damaged and cannot be \
                             rented"]
                VehicleSeverelyDamaged,
            }
        }

        match self {
            Self::CustomerNotExists(_) => {
                Some(api::query::CustomerError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } => {
                Some(api::query::PeriodError::Invalid.into())
            }
            Self::MaintenanceConflict { conflicts, .. } => Some(
                crate::Error::from(Error::MaintenanceConflict)
                    .with_details(api::Maintenance::conflicts(conflicts)),
            ),
            Self::NegativeTotalAmount(_) => {
                Some(Error::NegativeTotalAmount.into())
            }
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
            Self::VehicleAlreadyBooked { bookings, .. } => Some(
                crate::Error::from(Error::VehicleAlreadyBooked)
                    .with_details(api::Rental::bookings(bookings)),
            ),
            Self::VehicleNotExists(_) => {
                Some(api::query::VehicleError::NotExists.into())
            }
            Self::VehicleSeverelyDamaged(_) => {
                Some(Error::VehicleSeverelyDamaged.into())
            }
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::change_rental_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "VEHICLE_ALREADY_RENTED"]
                #[status = CONFLICT]
                #[message = "`Vehicle` is already rented by another `Rental`"]
                VehicleAlreadyRented,

                #[code = "VEHICLE_SEVERELY_DAMAGED"]
                #[status = CONFLICT]
                #[message = "`Vehicle` is severely damaged and cannot be \
                             rented"]
                VehicleSeverelyDamaged,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ForbiddenTransition { .. } => {
                Some(TransitionError::Rental.into())
            }
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
            Self::VehicleAlreadyRented(_) => {
                Some(Error::VehicleAlreadyRented.into())
            }
            Self::VehicleSeverelyDamaged(_) => {
                Some(Error::VehicleSeverelyDamaged.into())
            }
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::change_rental_payment_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ForbiddenTransition { .. } => {
                Some(TransitionError::Payment.into())
            }
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
        }
    }
}

impl AsError for command::report_damage::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeRepairCost => Some(RepairCostError::Negative.into()),
            Self::VehicleNotExists(_) => {
                Some(api::query::VehicleError::NotExists.into())
            }
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_damage_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::DamageNotExists(_) => {
                Some(api::query::DamageError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::ForbiddenTransition { .. } => {
                Some(TransitionError::Damage.into())
            }
            Self::NegativeRepairCost => Some(RepairCostError::Negative.into()),
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::schedule_maintenance::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NEGATIVE_MAINTENANCE_COST"]
                #[status = BAD_REQUEST]
                #[message = "`Maintenance` cost cannot be negative"]
                NegativeCost,

                #[code = "NEXT_SERVICE_BEFORE_SCHEDULED"]
                #[status = BAD_REQUEST]
                #[message = "Next service cannot be due before the scheduled \
                             date of the `Maintenance`"]
                NextServiceBeforeScheduled,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeCost(_) => Some(Error::NegativeCost.into()),
            Self::NextServiceBeforeScheduled => {
                Some(Error::NextServiceBeforeScheduled.into())
            }
            Self::VehicleNotExists(_) => {
                Some(api::query::VehicleError::NotExists.into())
            }
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_maintenance_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "MAINTENANCE_CANCELLATION_FORBIDDEN"]
                #[status = CONFLICT]
                #[message = "`Maintenance` can only be cancelled by a \
                             `Rental` override"]
                CancellationForbidden,
            }
        }

        match self {
            Self::CancellationForbidden(_) => {
                Some(Error::CancellationForbidden.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::ForbiddenTransition { .. } => {
                Some(TransitionError::Maintenance.into())
            }
            Self::MaintenanceNotExists(_) => {
                Some(api::query::MaintenanceError::NotExists.into())
            }
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::withdraw_vehicle::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::VehicleNotExists(_) => {
                Some(api::query::VehicleError::NotExists.into())
            }
            Self::VehicleStatus(e) => e.try_as_error(),
        }
    }
}
