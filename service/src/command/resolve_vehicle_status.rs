//! [`Command`] for resolving and persisting the [`vehicle::Status`] of a
//! [`Vehicle`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{vehicle, Damage, Maintenance, Vehicle},
    infra::{database, Database},
    query, read, Service,
};

use super::Command;

/// [`Command`] for resolving the [`vehicle::Status`] of a [`Vehicle`] out of
/// its fresh condition and persisting it, if changed.
#[derive(Clone, Copy, Debug)]
pub struct ResolveVehicleStatus {
    /// ID of the [`Vehicle`] to resolve the [`vehicle::Status`] of.
    pub vehicle_id: vehicle::Id,
}

impl<Db> Command<ResolveVehicleStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::vehicle::IsRented, vehicle::Id>>,
            Ok = read::vehicle::IsRented,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::Live<Damage>>, vehicle::Id>>,
            Ok = Vec<read::Live<Damage>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>,
            Ok = Vec<read::Live<Maintenance>>,
            Err = Traced<database::Error>,
        > + Database<Update<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = vehicle::Status;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ResolveVehicleStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ResolveVehicleStatus { vehicle_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Vehicle`.
        tx.execute(Lock(By::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut vehicle = tx
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())?;

        let status = query::vehicle::condition(&tx, &vehicle)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .status(self.today());
        if vehicle.status == status {
            return Ok(status);
        }

        log::info!(
            "`Vehicle(id: {vehicle_id})` status changes: {} -> {status}",
            vehicle.status,
        );
        vehicle.status = status;
        tx.execute(Update(vehicle))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(status)
    }
}

/// Error of [`ResolveVehicleStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Update;

    use crate::{
        command::{
            ChangeRentalStatus, ResolveVehicleStatus, UpdateDamageStatus,
            WithdrawVehicle,
        },
        domain::{damage, rental, vehicle, Vehicle},
        fixture, query, Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn persists_only_changed_status() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        svc.database()
            .execute(Update(Vehicle {
                status: vehicle::Status::Maintenance,
                ..vehicle.clone()
            }))
            .await
            .unwrap();

        let writes = svc.database().writes();
        let status = svc
            .execute(ResolveVehicleStatus {
                vehicle_id: vehicle.id,
            })
            .await
            .unwrap();
        assert_eq!(status, vehicle::Status::Available);
        assert_eq!(svc.database().writes(), writes + 1);

        let status = svc
            .execute(ResolveVehicleStatus {
                vehicle_id: vehicle.id,
            })
            .await
            .unwrap();
        assert_eq!(status, vehicle::Status::Available);
        assert_eq!(svc.database().writes(), writes + 1, "nothing is written");
    }

    #[tokio::test]
    async fn maintenance_due_today_takes_vehicle_out() {
        let svc = fixture::service();
        let due = fixture::vehicle(&svc).await;
        let later = fixture::vehicle(&svc).await;
        let today = svc.today();
        _ = fixture::maintenance(&svc, due.id, today).await;
        _ = fixture::maintenance(&svc, later.id, today.add_days(1).unwrap())
            .await;

        for (id, expected) in [
            (due.id, vehicle::Status::Maintenance),
            (later.id, vehicle::Status::Available),
        ] {
            let status = svc
                .execute(query::vehicle::Status { vehicle_id: id })
                .await
                .unwrap();
            assert_eq!(status, Some(expected));
            assert_eq!(svc.database().vehicle(id).unwrap().status, expected);
        }
    }

    #[tokio::test]
    async fn withdrawn_vehicle_is_unavailable() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        _ = fixture::damage(&svc, vehicle.id, damage::Severity::Minor).await;

        let status = svc
            .execute(WithdrawVehicle {
                vehicle_id: vehicle.id,
                withdrawn: true,
            })
            .await
            .unwrap();
        assert_eq!(status, vehicle::Status::Unavailable);

        let status = svc
            .execute(WithdrawVehicle {
                vehicle_id: vehicle.id,
                withdrawn: false,
            })
            .await
            .unwrap();
        assert_eq!(status, vehicle::Status::MinorDamage);
    }

    #[tokio::test]
    async fn active_rental_outranks_damage() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let customer = fixture::customer(&svc).await;
        let d =
            fixture::damage(&svc, vehicle.id, damage::Severity::Moderate).await;
        let rental = svc
            .execute(fixture::rental(
                customer.id,
                vehicle.id,
                "2025-06-08",
                "2025-06-12",
            ))
            .await
            .unwrap();

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
            vehicle::Status::ModerateDamage,
        );

        _ = svc
            .execute(UpdateDamageStatus {
                damage_id: d.id,
                status: damage::Status::Repaired,
                repair_cost: None,
            })
            .await
            .unwrap();
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );
    }

    #[tokio::test]
    async fn unknown_vehicle() {
        let svc = fixture::service();
        let id = vehicle::Id::new();

        let err = svc
            .execute(ResolveVehicleStatus { vehicle_id: id })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::VehicleNotExists(v) if *v == id),
            "unexpected error: {err}",
        );

        let status = svc
            .execute(query::vehicle::Status { vehicle_id: id })
            .await
            .unwrap();
        assert_eq!(status, None);
    }
}
