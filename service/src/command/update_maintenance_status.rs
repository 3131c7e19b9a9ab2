//! [`Command`] for moving a [`Maintenance`] through its lifecycle.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::{resolve_vehicle_status, ResolveVehicleStatus},
    domain::{maintenance, vehicle, Maintenance, Vehicle},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::{command::SubmitRental, domain::Rental};

use super::Command;

/// [`Command`] for changing the [`maintenance::Status`] of a [`Maintenance`].
///
/// [`maintenance::Status::Cancelled`] is never accepted here, as only a
/// [`Rental`] override (see [`SubmitRental`]) cancels a [`Maintenance`].
#[derive(Clone, Copy, Debug)]
pub struct UpdateMaintenanceStatus {
    /// ID of the [`Maintenance`] to change the [`maintenance::Status`] of.
    pub maintenance_id: maintenance::Id,

    /// New [`maintenance::Status`] of the [`Maintenance`].
    pub status: maintenance::Status,
}

impl<Db> Command<UpdateMaintenanceStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Maintenance>, maintenance::Id>>,
            Ok = Option<Maintenance>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Maintenance>, maintenance::Id>>,
            Ok = Option<Maintenance>,
            Err = Traced<database::Error>,
        > + Database<Update<Maintenance>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ResolveVehicleStatus,
        Ok = vehicle::Status,
        Err = Traced<resolve_vehicle_status::ExecutionError>,
    >,
{
    type Ok = Maintenance;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateMaintenanceStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateMaintenanceStatus {
            maintenance_id,
            status,
        } = cmd;

        if status == maintenance::Status::Cancelled {
            return Err(tracerr::new!(E::CancellationForbidden(
                maintenance_id
            )));
        }

        let maintenance = self
            .database()
            .execute(Select(By::<Option<Maintenance>, _>::new(maintenance_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::MaintenanceNotExists(maintenance_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Vehicle`.
        tx.execute(Lock(By::new(maintenance.vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut maintenance = tx
            .execute(Select(By::<Option<Maintenance>, _>::new(maintenance_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::MaintenanceNotExists(maintenance_id))
            .map_err(tracerr::wrap!())?;
        if !maintenance.status.can_become(status) {
            return Err(tracerr::new!(E::ForbiddenTransition {
                from: maintenance.status,
                to: status,
            }));
        }

        maintenance.status = status;
        tx.execute(Update(maintenance.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .execute(ResolveVehicleStatus {
                vehicle_id: maintenance.vehicle_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(maintenance)
    }
}

/// Error of [`UpdateMaintenanceStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Maintenance`] cannot be cancelled directly.
    #[display("`Maintenance(id: {_0})` can only be cancelled by a `Rental`")]
    CancellationForbidden(#[error(not(source))] maintenance::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Maintenance`] cannot be moved into the requested
    /// [`maintenance::Status`].
    #[display("`Maintenance` cannot become `{to}` from `{from}`")]
    ForbiddenTransition {
        /// Current [`maintenance::Status`] of the [`Maintenance`].
        from: maintenance::Status,

        /// Requested [`maintenance::Status`] of the [`Maintenance`].
        to: maintenance::Status,
    },

    /// [`Maintenance`] with the provided ID does not exist.
    #[display("`Maintenance(id: {_0})` does not exist")]
    MaintenanceNotExists(#[error(not(source))] maintenance::Id),

    /// Resolving the [`vehicle::Status`] after the [`Maintenance`] was
    /// changed failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::UpdateMaintenanceStatus,
        domain::{maintenance, vehicle},
        fixture, Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn refuses_direct_cancellation() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let day = fixture::date("2099-01-01");
        let m = fixture::maintenance(&svc, vehicle.id, day).await;
        let writes = svc.database().writes();

        let err = svc
            .execute(UpdateMaintenanceStatus {
                maintenance_id: m.id,
                status: maintenance::Status::Cancelled,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                E::CancellationForbidden(id) if *id == m.id,
            ),
            "unexpected error: {err}",
        );
        assert_eq!(svc.database().writes(), writes, "nothing is written");
        assert_eq!(
            svc.database().maintenance(m.id).unwrap().status,
            maintenance::Status::Scheduled,
        );
    }

    #[tokio::test]
    async fn recomputes_vehicle_status() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let day = fixture::date("2099-01-01");
        let m = fixture::maintenance(&svc, vehicle.id, day).await;
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );

        _ = svc
            .execute(UpdateMaintenanceStatus {
                maintenance_id: m.id,
                status: maintenance::Status::InProgress,
            })
            .await
            .unwrap();
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Maintenance,
        );

        let done = svc
            .execute(UpdateMaintenanceStatus {
                maintenance_id: m.id,
                status: maintenance::Status::Completed,
            })
            .await
            .unwrap();
        assert_eq!(done.status, maintenance::Status::Completed);
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );

        let err = svc
            .execute(UpdateMaintenanceStatus {
                maintenance_id: m.id,
                status: maintenance::Status::InProgress,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::ForbiddenTransition { .. }),
            "unexpected error: {err}",
        );
    }
}
