//! [`Command`] for moving a [`Rental`] through its lifecycle.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::{resolve_vehicle_status, ResolveVehicleStatus},
    domain::{damage, rental, vehicle, Damage, Rental, Vehicle},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for changing the [`rental::Status`] of a [`Rental`].
///
/// Activating a [`Rental`] makes its [`Vehicle`] [`vehicle::Status::Rented`],
/// while completing or cancelling an active one releases the [`Vehicle`].
/// A [`Vehicle`] with live [`damage::Severity::Severe`] [`Damage`] is never
/// handed over.
#[derive(Clone, Copy, Debug)]
pub struct ChangeRentalStatus {
    /// ID of the [`Rental`] to change the [`rental::Status`] of.
    pub rental_id: rental::Id,

    /// New [`rental::Status`] of the [`Rental`].
    pub status: rental::Status,
}

impl<Db> Command<ChangeRentalStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
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
            Select<By<read::vehicle::IsRented, vehicle::Id>>,
            Ok = read::vehicle::IsRented,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::Live<Damage>>, vehicle::Id>>,
            Ok = Vec<read::Live<Damage>>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ResolveVehicleStatus,
        Ok = vehicle::Status,
        Err = Traced<resolve_vehicle_status::ExecutionError>,
    >,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ChangeRentalStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ChangeRentalStatus { rental_id, status } = cmd;

        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Vehicle`.
        tx.execute(Lock(By::new(rental.vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut rental = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;
        if !rental.status.can_become(status) {
            return Err(tracerr::new!(E::ForbiddenTransition {
                from: rental.status,
                to: status,
            }));
        }

        if status == rental::Status::Active {
            let is_rented = tx
                .execute(Select(By::<read::vehicle::IsRented, _>::new(
                    rental.vehicle_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if *is_rented {
                return Err(tracerr::new!(E::VehicleAlreadyRented(
                    rental.vehicle_id
                )));
            }

            let is_severely_damaged = tx
                .execute(Select(By::<Vec<read::Live<Damage>>, _>::new(
                    rental.vehicle_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .iter()
                .any(|read::Live(d)| d.severity == damage::Severity::Severe);
            if is_severely_damaged {
                return Err(tracerr::new!(E::VehicleSeverelyDamaged(
                    rental.vehicle_id
                )));
            }
        }

        rental.status = status;
        rental.updated_at = DateTime::now().coerce();
        tx.execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .execute(ResolveVehicleStatus {
                vehicle_id: rental.vehicle_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(rental)
    }
}

/// Error of [`ChangeRentalStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] cannot be moved into the requested [`rental::Status`].
    #[display("`Rental` cannot become `{to}` from `{from}`")]
    ForbiddenTransition {
        /// Current [`rental::Status`] of the [`Rental`].
        from: rental::Status,

        /// Requested [`rental::Status`] of the [`Rental`].
        to: rental::Status,
    },

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),

    /// [`Vehicle`] is already occupied by another active [`Rental`].
    #[display("`Vehicle(id: {_0})` is already rented")]
    VehicleAlreadyRented(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] has live [`damage::Severity::Severe`] [`Damage`].
    #[display("`Vehicle(id: {_0})` is severely damaged")]
    VehicleSeverelyDamaged(#[error(not(source))] vehicle::Id),

    /// Resolving the [`vehicle::Status`] after the [`Rental`] was changed
    /// failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::ChangeRentalStatus,
        domain::{damage, rental, vehicle},
        fixture, Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn refuses_second_active_rental() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let first = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-01",
                "2025-06-05",
            ))
            .await
            .unwrap();
        let second = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-06",
                "2025-06-09",
            ))
            .await
            .unwrap();
        _ = svc
            .execute(ChangeRentalStatus {
                rental_id: first.id,
                status: rental::Status::Active,
            })
            .await
            .unwrap();

        let err = svc
            .execute(ChangeRentalStatus {
                rental_id: second.id,
                status: rental::Status::Active,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                E::VehicleAlreadyRented(id) if *id == vehicle.id,
            ),
            "unexpected error: {err}",
        );
        let stored = svc
            .database()
            .rentals()
            .into_iter()
            .find(|r| r.id == second.id)
            .unwrap();
        assert_eq!(stored.status, rental::Status::Pending);
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Rented,
        );
    }

    #[tokio::test]
    async fn refuses_forbidden_transition() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let rental = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-01",
                "2025-06-05",
            ))
            .await
            .unwrap();

        let err = svc
            .execute(ChangeRentalStatus {
                rental_id: rental.id,
                status: rental::Status::Completed,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                E::ForbiddenTransition {
                    from: rental::Status::Pending,
                    to: rental::Status::Completed,
                },
            ),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(ChangeRentalStatus {
                rental_id: rental::Id::new(),
                status: rental::Status::Active,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::RentalNotExists(_)),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn refuses_to_hand_over_severely_damaged_vehicle() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let rental = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-01",
                "2025-06-05",
            ))
            .await
            .unwrap();
        _ = fixture::damage(&svc, vehicle.id, damage::Severity::Severe).await;

        let err = svc
            .execute(ChangeRentalStatus {
                rental_id: rental.id,
                status: rental::Status::Active,
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
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::SevereDamage,
        );

        _ = svc
            .execute(ChangeRentalStatus {
                rental_id: rental.id,
                status: rental::Status::Cancelled,
            })
            .await
            .unwrap();
    }
}
