//! [`Command`] for creating or updating a [`Rental`].

use std::collections::BTreeSet;

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, DateTime, Money, Period,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{resolve_vehicle_status, ResolveVehicleStatus},
    domain::{
        customer, damage, maintenance, rental, vehicle, Customer, Damage,
        Maintenance, Operator, Rental, Vehicle,
    },
    infra::{database, Database},
    query, read, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Rental`] or updating an existing one.
///
/// The [`Vehicle`] must not have any live [`damage::Severity::Severe`]
/// [`Damage`], nor another live [`Rental`] overlapping the rented [`Period`].
/// Live [`Maintenance`] records scheduled within the rented [`Period`] reject
/// the [`Command`], unless the `override_conflict` is requested, in which
/// case they're cancelled in favor of the [`Rental`].
#[derive(Clone, Debug)]
pub struct SubmitRental {
    /// ID of the [`Rental`] to update.
    ///
    /// [`None`] creates a new [`Rental`].
    pub rental_id: Option<rental::Id>,

    /// ID of the [`Customer`] renting the [`Vehicle`].
    pub customer_id: customer::Id,

    /// ID of the [`Vehicle`] to rent.
    pub vehicle_id: vehicle::Id,

    /// First day of the [`Rental`].
    pub start_date: Date,

    /// Last day of the [`Rental`], included.
    pub end_date: Date,

    /// [`rental::PaymentStatus`] of the [`Rental`].
    pub payment_status: rental::PaymentStatus,

    /// Indicator whether the [`Vehicle`] is rented with a driver.
    pub with_driver: bool,

    /// Indicator whether the insurance is included.
    pub insurance: bool,

    /// Total amount charged for the [`Rental`].
    pub total_amount: Money,

    /// Indicator whether conflicting [`Maintenance`] records should be
    /// cancelled instead of rejecting this [`Command`].
    pub override_conflict: bool,

    /// [`Operator`] submitting the [`Rental`], if known.
    pub initiator: Option<Operator>,
}

impl<Db> Command<SubmitRental> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::Live<Damage>>, vehicle::Id>>,
            Ok = Vec<read::Live<Damage>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>,
            Ok = Vec<read::Live<Maintenance>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::Live<Rental>>, vehicle::Id>>,
            Ok = Vec<read::Live<Rental>>,
            Err = Traced<database::Error>,
        > + Database<Update<Maintenance>, Err = Traced<database::Error>>
        + Database<Insert<Rental>, Err = Traced<database::Error>>
        + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ResolveVehicleStatus,
        Ok = vehicle::Status,
        Err = Traced<resolve_vehicle_status::ExecutionError>,
    >,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    #[expect(clippy::too_many_lines, reason = "sequential steps")]
    async fn execute(&self, cmd: SubmitRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitRental {
            rental_id,
            customer_id,
            vehicle_id,
            start_date,
            end_date,
            payment_status,
            with_driver,
            insurance,
            total_amount,
            override_conflict,
            initiator,
        } = cmd;

        let period = Period::new(start_date, end_date)
            .ok_or(E::InvalidPeriod {
                start: start_date,
                end: end_date,
            })
            .map_err(tracerr::wrap!())?;
        if total_amount.is_negative() {
            return Err(tracerr::new!(E::NegativeTotalAmount(total_amount)));
        }

        self.database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        self.database()
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let mut vehicles_to_lock = BTreeSet::from([vehicle_id]);
        if let Some(id) = rental_id {
            let existing = self
                .database()
                .execute(Select(By::<Option<Rental>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::RentalNotExists(id))
                .map_err(tracerr::wrap!())?;
            _ = vehicles_to_lock.insert(existing.vehicle_id);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Vehicle`s. Locks are taken
        // in order, so concurrent moves between two `Vehicle`s can't
        // deadlock.
        for id in vehicles_to_lock {
            tx.execute(Lock(By::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        let existing = match rental_id {
            Some(id) => Some(
                tx.execute(Select(By::<Option<Rental>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::RentalNotExists(id))
                    .map_err(tracerr::wrap!())?,
            ),
            None => None,
        };
        let is_moved = existing
            .as_ref()
            .map_or(true, |r| r.vehicle_id != vehicle_id);
        let is_rescheduled =
            existing.as_ref().map_or(true, |r| r.period != period);

        if is_moved {
            let is_severely_damaged = tx
                .execute(Select(By::<Vec<read::Live<Damage>>, _>::new(
                    vehicle_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .iter()
                .any(|read::Live(d)| d.severity == damage::Severity::Severe);
            if is_severely_damaged {
                return Err(tracerr::new!(E::VehicleSeverelyDamaged(
                    vehicle_id
                )));
            }
        }

        let id = rental_id.unwrap_or_else(rental::Id::new);

        if is_moved || is_rescheduled {
            let booked = tx
                .execute(Select(By::<Vec<read::Live<Rental>>, _>::new(
                    vehicle_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .into_iter()
                .filter_map(|read::Live(r)| {
                    (r.id != id && r.period.overlaps(&period)).then_some(r)
                })
                .collect::<Vec<_>>();
            if !booked.is_empty() {
                log::debug!(
                    "`Rental(id: {id})` for `Vehicle(id: {vehicle_id})` in \
                     {period} is rejected due to {} overlapping `Rental`s",
                    booked.len(),
                );
                return Err(tracerr::new!(E::VehicleAlreadyBooked {
                    vehicle_id,
                    bookings: booked,
                }));
            }
        }

        let mut cancelled = Vec::new();
        if is_moved || is_rescheduled {
            let live = tx
                .execute(Select(By::<Vec<read::Live<Maintenance>>, _>::new(
                    vehicle_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let conflicts =
                query::maintenance::Conflicts { vehicle_id, period }
                    .among(live);

            if !conflicts.is_empty() {
                if !override_conflict {
                    log::debug!(
                        "`Rental(id: {id})` for `Vehicle(id: {vehicle_id})` \
                         in {period} is rejected due to {} conflicting \
                         `Maintenance`s",
                        conflicts.len(),
                    );
                    return Err(tracerr::new!(E::MaintenanceConflict {
                        vehicle_id,
                        conflicts,
                    }));
                }

                log::info!(
                    "`Rental(id: {id})` for `Vehicle(id: {vehicle_id})` in \
                     {period} overrides {} `Maintenance`s, initiated by {}",
                    conflicts.len(),
                    initiator
                        .as_ref()
                        .map_or_else(|| "unknown".into(), ToString::to_string),
                );
                let cancelled_at = DateTime::now().coerce();
                for original in conflicts {
                    let mut record = original.clone();
                    record.cancel(maintenance::Cancellation {
                        rental_id: id,
                        initiator: initiator.clone(),
                        cancelled_at,
                    });
                    if let Err(e) = tx.execute(Update(record)).await {
                        restore(&tx, cancelled).await;
                        return Err(e)
                            .map_err(tracerr::map_from_and_wrap!(=> E));
                    }
                    cancelled.push(original);
                }
            }
        }

        let now = DateTime::now();
        let written = if let Some(mut rental) = existing.clone() {
            rental.customer_id = customer_id;
            rental.vehicle_id = vehicle_id;
            rental.period = period;
            rental.payment_status = payment_status;
            rental.with_driver = with_driver;
            rental.insurance = insurance;
            rental.total_amount = total_amount;
            rental.updated_at = now.coerce();
            tx.execute(Update(rental.clone())).await.map(|_| rental)
        } else {
            let rental = Rental {
                id,
                customer_id,
                vehicle_id,
                period,
                status: rental::Status::Pending,
                payment_status,
                with_driver,
                insurance,
                total_amount,
                created_at: now.coerce(),
                updated_at: now.coerce(),
            };
            tx.execute(Insert(rental.clone())).await.map(|_| rental)
        };
        let rental = match written {
            Ok(rental) => rental,
            Err(e) => {
                restore(&tx, cancelled).await;
                return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
            }
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .execute(ResolveVehicleStatus { vehicle_id })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(previous) = existing.filter(|r| r.vehicle_id != vehicle_id)
        {
            _ = self
                .execute(ResolveVehicleStatus {
                    vehicle_id: previous.vehicle_id,
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        Ok(rental)
    }
}

/// Writes the provided `originals` of the cancelled [`Maintenance`] records
/// back, so no record stays cancelled for a [`Rental`] which wasn't written.
///
/// Stops as soon as the `tx` reports itself aborted, since its rollback
/// discards the cancellations already. Other failures are logged only, as
/// the caller is already failing.
async fn restore<Tx>(tx: &Tx, originals: Vec<Maintenance>)
where
    Tx: Database<Update<Maintenance>, Err = Traced<database::Error>>,
{
    for record in originals {
        let id = record.id;
        match tx.execute(Update(record)).await {
            Ok(_) => {}
            Err(e) if e.as_ref().is_transaction_aborted() => {
                log::debug!(
                    "cancelled `Maintenance`s are left to the transaction \
                     rollback: {e}",
                );
                return;
            }
            Err(e) => log::error!(
                "failed to restore cancelled `Maintenance(id: {id})`: {e}",
            ),
        }
    }
}

/// Error of [`SubmitRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Start of the [`Rental`] is after its end.
    #[display("`Rental` cannot start on {start} and end on {end}")]
    InvalidPeriod {
        /// Requested first day of the [`Rental`].
        start: Date,

        /// Requested last day of the [`Rental`].
        end: Date,
    },

    /// Live [`Maintenance`] records are scheduled within the [`Rental`].
    #[display(
        "`Vehicle(id: {vehicle_id})` has {} conflicting `Maintenance`s",
        conflicts.len(),
    )]
    MaintenanceConflict {
        /// ID of the [`Vehicle`] the [`Maintenance`] records belong to.
        vehicle_id: vehicle::Id,

        /// Conflicting [`Maintenance`] records.
        conflicts: Vec<Maintenance>,
    },

    /// Total amount of the [`Rental`] is negative.
    #[display("`Rental` total amount cannot be negative: {_0}")]
    NegativeTotalAmount(#[error(not(source))] Money),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),

    /// Live [`Rental`]s of the [`Vehicle`] overlap the requested [`Period`].
    #[display(
        "`Vehicle(id: {vehicle_id})` is already booked by {} `Rental`s",
        bookings.len(),
    )]
    VehicleAlreadyBooked {
        /// ID of the booked [`Vehicle`].
        vehicle_id: vehicle::Id,

        /// Overlapping [`Rental`]s.
        bookings: Vec<Rental>,
    },

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] has live [`damage::Severity::Severe`] [`Damage`].
    #[display("`Vehicle(id: {_0})` is severely damaged")]
    VehicleSeverelyDamaged(#[error(not(source))] vehicle::Id),

    /// Resolving the [`vehicle::Status`] after the [`Rental`] was written
    /// failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{ChangeRentalStatus, SubmitRental},
        domain::{customer, damage, maintenance, rental, vehicle, Operator},
        fixture::{self, date},
        query, Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn rejects_conflict_without_override() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let m =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-10")).await;
        let writes = svc.database().writes();

        let err = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-08",
                "2025-06-12",
            ))
            .await
            .unwrap_err();

        let E::MaintenanceConflict {
            vehicle_id,
            conflicts,
        } = err.as_ref()
        else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(*vehicle_id, vehicle.id);
        assert_eq!(conflicts.iter().map(|m| m.id).collect::<Vec<_>>(), [m.id]);
        assert_eq!(svc.database().writes(), writes, "nothing is written");
        assert!(svc.database().rentals().is_empty());
        assert_eq!(
            svc.database().maintenance(m.id).unwrap().status,
            maintenance::Status::Scheduled,
        );
    }

    #[tokio::test]
    async fn override_cancels_conflicts_and_rents() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let m =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-10")).await;

        let rental = svc
            .execute(SubmitRental {
                override_conflict: true,
                initiator: Operator::new("dispatcher.kim"),
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-08",
                    "2025-06-12",
                )
            })
            .await
            .unwrap();

        assert_eq!(rental.status, rental::Status::Pending);
        assert_eq!(svc.database().rentals().len(), 1);
        let m = svc.database().maintenance(m.id).unwrap();
        assert_eq!(m.status, maintenance::Status::Cancelled);
        let cancellation = m.cancellation.unwrap();
        assert_eq!(cancellation.rental_id, rental.id);
        assert_eq!(cancellation.initiator, Operator::new("dispatcher.kim"));
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );

        _ = svc
            .execute(ChangeRentalStatus {
                rental_id: rental.id,
                status: rental::Status::Active,
            })
            .await
            .unwrap();
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Rented,
        );

        _ = svc
            .execute(ChangeRentalStatus {
                rental_id: rental.id,
                status: rental::Status::Completed,
            })
            .await
            .unwrap();
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );
    }

    #[tokio::test]
    async fn override_cancels_only_conflicting_records() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let other = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let first =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-08")).await;
        let last =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-12")).await;
        let after =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-13")).await;
        let foreign =
            fixture::maintenance(&svc, other.id, date("2025-06-10")).await;

        _ = svc
            .execute(SubmitRental {
                override_conflict: true,
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-08",
                    "2025-06-12",
                )
            })
            .await
            .unwrap();

        for (m, status) in [
            (first.id, maintenance::Status::Cancelled),
            (last.id, maintenance::Status::Cancelled),
            (after.id, maintenance::Status::Scheduled),
            (foreign.id, maintenance::Status::Scheduled),
        ] {
            assert_eq!(svc.database().maintenance(m).unwrap().status, status);
        }
        assert_eq!(svc.database().maintenance_writes(after.id), 1);
        assert_eq!(svc.database().maintenance_writes(foreign.id), 1);
    }

    #[tokio::test]
    async fn restores_cancelled_records_when_rental_write_fails() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let m =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-10")).await;
        svc.database().fail_rental_writes();

        let err = svc
            .execute(SubmitRental {
                override_conflict: true,
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-08",
                    "2025-06-12",
                )
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::Db(_)), "unexpected error: {err}");
        assert!(svc.database().rentals().is_empty());
        let restored = svc.database().maintenance(m.id).unwrap();
        assert_eq!(restored.status, maintenance::Status::Scheduled);
        assert!(restored.cancellation.is_none());
    }

    #[tokio::test]
    async fn severe_damage_is_never_rentable() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        _ = fixture::damage(&svc, vehicle.id, damage::Severity::Severe).await;

        for override_conflict in [false, true] {
            let err = svc
                .execute(SubmitRental {
                    override_conflict,
                    ..fixture::rental(
                        customer.id,
                        vehicle.id,
                        "2025-06-08",
                        "2025-06-12",
                    )
                })
                .await
                .unwrap_err();

            assert!(
                matches!(
                    err.as_ref(),
                    E::VehicleSeverelyDamaged(id) if *id == vehicle.id,
                ),
                "unexpected error: {err}",
            );
        }
        assert!(svc.database().rentals().is_empty());
    }

    #[tokio::test]
    async fn moderate_damage_is_rentable() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        _ = fixture::damage(&svc, vehicle.id, damage::Severity::Moderate).await;

        let status = svc
            .execute(query::vehicle::Status {
                vehicle_id: vehicle.id,
            })
            .await
            .unwrap();
        assert_eq!(status, Some(vehicle::Status::ModerateDamage));

        _ = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-08",
                "2025-06-12",
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn validates_draft() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;

        let err = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-12",
                "2025-06-08",
            ))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::InvalidPeriod { .. }),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(fixture::rental(
                customer::Id::new(),
                vehicle.id,
                "2025-06-08",
                "2025-06-12",
            ))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::CustomerNotExists(_)),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(fixture::rental(
                customer.id,
                vehicle::Id::new(),
                "2025-06-08",
                "2025-06-12",
            ))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::VehicleNotExists(_)),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(SubmitRental {
                rental_id: Some(rental::Id::new()),
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-08",
                    "2025-06-12",
                )
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::RentalNotExists(_)),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(SubmitRental {
                total_amount: "-1USD".parse().unwrap(),
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-08",
                    "2025-06-12",
                )
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::NegativeTotalAmount(_)),
            "unexpected error: {err}",
        );

        assert!(svc.database().rentals().is_empty());
    }

    #[tokio::test]
    async fn update_rechecks_only_changed_range() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let rental = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-07-01",
                "2025-07-05",
            ))
            .await
            .unwrap();

        // Scheduled after the `Rental` was made, so it isn't rechecked unless
        // the `Rental` is rescheduled.
        let inside =
            fixture::maintenance(&svc, vehicle.id, date("2025-07-03")).await;
        let later =
            fixture::maintenance(&svc, vehicle.id, date("2025-07-10")).await;

        let updated = svc
            .execute(SubmitRental {
                rental_id: Some(rental.id),
                with_driver: true,
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-07-01",
                    "2025-07-05",
                )
            })
            .await
            .unwrap();
        assert!(updated.with_driver);
        assert_eq!(updated.created_at, rental.created_at);

        let err = svc
            .execute(SubmitRental {
                rental_id: Some(rental.id),
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-07-08",
                    "2025-07-12",
                )
            })
            .await
            .unwrap_err();
        let E::MaintenanceConflict { conflicts, .. } = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(
            conflicts.iter().map(|m| m.id).collect::<Vec<_>>(),
            [later.id],
        );
        assert_eq!(
            svc.database().maintenance(inside.id).unwrap().status,
            maintenance::Status::Scheduled,
        );
    }

    #[tokio::test]
    async fn update_rechecks_new_vehicle() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let damaged = fixture::vehicle(&svc).await;
        let busy = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        _ = fixture::damage(&svc, damaged.id, damage::Severity::Severe).await;
        let m = fixture::maintenance(&svc, busy.id, date("2025-07-02")).await;
        let rental = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-07-01",
                "2025-07-05",
            ))
            .await
            .unwrap();

        let err = svc
            .execute(SubmitRental {
                rental_id: Some(rental.id),
                ..fixture::rental(
                    customer.id,
                    damaged.id,
                    "2025-07-01",
                    "2025-07-05",
                )
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::VehicleSeverelyDamaged(_)),
            "unexpected error: {err}",
        );

        let moved = svc
            .execute(SubmitRental {
                rental_id: Some(rental.id),
                override_conflict: true,
                ..fixture::rental(
                    customer.id,
                    busy.id,
                    "2025-07-01",
                    "2025-07-05",
                )
            })
            .await
            .unwrap();
        assert_eq!(moved.id, rental.id);
        assert_eq!(moved.vehicle_id, busy.id);
        assert_eq!(
            svc.database().maintenance(m.id).unwrap().status,
            maintenance::Status::Cancelled,
        );
    }

    #[tokio::test]
    async fn skips_restore_in_aborted_transaction() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let first =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-09")).await;
        let second =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-11")).await;
        svc.database().abort_on_rental_write();

        let err = svc
            .execute(SubmitRental {
                override_conflict: true,
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-08",
                    "2025-06-12",
                )
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), E::Db(e) if !e.is_transaction_aborted()),
            "unexpected error: {err}",
        );
        assert!(svc.database().rentals().is_empty());
        // The first restore hits the aborted transaction, no more are tried.
        assert_eq!(svc.database().rejected_writes(), 1);
        assert_eq!(svc.database().maintenance_writes(first.id), 2);
        assert_eq!(svc.database().maintenance_writes(second.id), 2);
    }

    #[tokio::test]
    async fn rejects_overlapping_rental() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let booked = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-08",
                "2025-06-12",
            ))
            .await
            .unwrap();

        for override_conflict in [false, true] {
            let err = svc
                .execute(SubmitRental {
                    override_conflict,
                    ..fixture::rental(
                        customer.id,
                        vehicle.id,
                        "2025-06-12",
                        "2025-06-15",
                    )
                })
                .await
                .unwrap_err();

            let E::VehicleAlreadyBooked {
                vehicle_id,
                bookings,
            } = err.as_ref()
            else {
                panic!("unexpected error: {err}");
            };
            assert_eq!(*vehicle_id, vehicle.id);
            assert_eq!(
                bookings.iter().map(|r| r.id).collect::<Vec<_>>(),
                [booked.id],
            );
        }
        assert_eq!(svc.database().rentals().len(), 1);

        _ = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-13",
                "2025-06-15",
            ))
            .await
            .unwrap();

        let shifted = svc
            .execute(SubmitRental {
                rental_id: Some(booked.id),
                ..fixture::rental(
                    customer.id,
                    vehicle.id,
                    "2025-06-07",
                    "2025-06-11",
                )
            })
            .await
            .unwrap();
        assert_eq!(shifted.period.start(), date("2025-06-07"));

        _ = svc
            .execute(ChangeRentalStatus {
                rental_id: booked.id,
                status: rental::Status::Cancelled,
            })
            .await
            .unwrap();
        _ = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-08",
                "2025-06-10",
            ))
            .await
            .unwrap();
        assert_eq!(svc.database().rentals().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_submits_never_double_book() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;

        let (first, second) = tokio::join!(
            svc.execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-08",
                "2025-06-12",
            )),
            svc.execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-10",
                "2025-06-14",
            )),
        );

        let (winner, err) = match (first, second) {
            (Ok(r), Err(e)) | (Err(e), Ok(r)) => (r, e),
            (first, second) => {
                panic!("exactly one must succeed: {first:?}, {second:?}")
            }
        };
        let E::VehicleAlreadyBooked { bookings, .. } = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(
            bookings.iter().map(|r| r.id).collect::<Vec<_>>(),
            [winner.id],
        );
        let rentals = svc.database().rentals();
        assert_eq!(rentals.len(), 1);
        assert_eq!(rentals[0].id, winner.id);
    }

    #[tokio::test]
    async fn serializes_concurrent_overrides() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let m =
            fixture::maintenance(&svc, vehicle.id, date("2025-06-10")).await;
        let submit = |start, end| SubmitRental {
            override_conflict: true,
            ..fixture::rental(customer.id, vehicle.id, start, end)
        };

        let (first, second) = tokio::join!(
            svc.execute(submit("2025-06-08", "2025-06-12")),
            svc.execute(submit("2025-06-09", "2025-06-10")),
        );

        let (winner, err) = match (first, second) {
            (Ok(r), Err(e)) | (Err(e), Ok(r)) => (r, e),
            (first, second) => {
                panic!("exactly one must succeed: {first:?}, {second:?}")
            }
        };
        assert!(
            matches!(err.as_ref(), E::VehicleAlreadyBooked { .. }),
            "unexpected error: {err}",
        );
        // Inserted once and cancelled once, by the winner only.
        assert_eq!(svc.database().maintenance_writes(m.id), 2);
        let cancellation =
            svc.database().maintenance(m.id).unwrap().cancellation.unwrap();
        assert_eq!(cancellation.rental_id, winner.id);
        assert_eq!(svc.database().rentals().len(), 1);
    }
}
