//! [`Command`] for reporting a new [`Damage`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::{resolve_vehicle_status, ResolveVehicleStatus},
    domain::{damage, vehicle, Damage, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for reporting a new [`Damage`] of a [`Vehicle`].
#[derive(Clone, Debug)]
pub struct ReportDamage {
    /// ID of the damaged [`Vehicle`].
    pub vehicle_id: vehicle::Id,

    /// [`damage::Severity`] of a new [`Damage`].
    pub severity: damage::Severity,

    /// [`damage::Description`] of a new [`Damage`].
    pub description: damage::Description,

    /// Photos of a new [`Damage`], already uploaded.
    pub images: Vec<damage::ImageUrl>,

    /// Estimated repair cost of a new [`Damage`].
    pub repair_cost: Option<Money>,

    /// [`damage::InsuranceClaim`] filed for a new [`Damage`].
    pub insurance_claim: Option<damage::InsuranceClaim>,
}

impl<Db> Command<ReportDamage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Damage>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ResolveVehicleStatus,
        Ok = vehicle::Status,
        Err = Traced<resolve_vehicle_status::ExecutionError>,
    >,
{
    type Ok = Damage;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReportDamage) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReportDamage {
            vehicle_id,
            severity,
            description,
            images,
            repair_cost,
            insurance_claim,
        } = cmd;

        if repair_cost.as_ref().is_some_and(Money::is_negative) {
            return Err(tracerr::new!(E::NegativeRepairCost));
        }

        self.database()
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let damage = Damage {
            id: damage::Id::new(),
            vehicle_id,
            severity,
            status: damage::Status::Reported,
            description,
            images,
            repair_cost,
            insurance_claim,
            reported_at: DateTime::now().coerce(),
        };

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

        tx.execute(Insert(damage.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .execute(ResolveVehicleStatus { vehicle_id })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(damage)
    }
}

/// Error of [`ReportDamage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Repair cost of the [`Damage`] is negative.
    #[display("`Damage` repair cost cannot be negative")]
    NegativeRepairCost,

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),

    /// Resolving the [`vehicle::Status`] after the [`Damage`] was reported
    /// failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}
