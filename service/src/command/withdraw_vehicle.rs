//! [`Command`] for withdrawing a [`Vehicle`] from service or returning it
//! back.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::{resolve_vehicle_status, ResolveVehicleStatus},
    domain::{vehicle, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for withdrawing a [`Vehicle`] from service, making it
/// [`vehicle::Status::Unavailable`], or returning it back to service.
#[derive(Clone, Copy, Debug)]
pub struct WithdrawVehicle {
    /// ID of the [`Vehicle`] to withdraw or return.
    pub vehicle_id: vehicle::Id,

    /// Indicator whether the [`Vehicle`] is withdrawn (`true`) or returned
    /// back to service (`false`).
    pub withdrawn: bool,
}

impl<Db> Command<WithdrawVehicle> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<Update<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ResolveVehicleStatus,
        Ok = vehicle::Status,
        Err = Traced<resolve_vehicle_status::ExecutionError>,
    >,
{
    type Ok = vehicle::Status;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: WithdrawVehicle,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let WithdrawVehicle {
            vehicle_id,
            withdrawn,
        } = cmd;

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

        if vehicle.is_withdrawn != withdrawn {
            vehicle.is_withdrawn = withdrawn;
            tx.execute(Update(vehicle))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        // Release the `Vehicle` lock before resolving its status.
        drop(tx);

        self.execute(ResolveVehicleStatus { vehicle_id })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`WithdrawVehicle`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),

    /// Resolving the [`vehicle::Status`] of the [`Vehicle`] failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}
