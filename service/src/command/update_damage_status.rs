//! [`Command`] for moving a [`Damage`] through its repair.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
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

/// [`Command`] for changing the repair [`damage::Status`] of a [`Damage`].
#[derive(Clone, Copy, Debug)]
pub struct UpdateDamageStatus {
    /// ID of the [`Damage`] to change the [`damage::Status`] of.
    pub damage_id: damage::Id,

    /// New [`damage::Status`] of the [`Damage`].
    pub status: damage::Status,

    /// Actual repair cost of the [`Damage`], if known by now.
    pub repair_cost: Option<Money>,
}

impl<Db> Command<UpdateDamageStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Damage>, damage::Id>>,
            Ok = Option<Damage>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Damage>, damage::Id>>,
            Ok = Option<Damage>,
            Err = Traced<database::Error>,
        > + Database<Update<Damage>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ResolveVehicleStatus,
        Ok = vehicle::Status,
        Err = Traced<resolve_vehicle_status::ExecutionError>,
    >,
{
    type Ok = Damage;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateDamageStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateDamageStatus {
            damage_id,
            status,
            repair_cost,
        } = cmd;

        if repair_cost.as_ref().is_some_and(Money::is_negative) {
            return Err(tracerr::new!(E::NegativeRepairCost));
        }

        let damage = self
            .database()
            .execute(Select(By::<Option<Damage>, _>::new(damage_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DamageNotExists(damage_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Vehicle`.
        tx.execute(Lock(By::new(damage.vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut damage = tx
            .execute(Select(By::<Option<Damage>, _>::new(damage_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DamageNotExists(damage_id))
            .map_err(tracerr::wrap!())?;
        if !damage.status.can_become(status) {
            return Err(tracerr::new!(E::ForbiddenTransition {
                from: damage.status,
                to: status,
            }));
        }

        damage.status = status;
        if repair_cost.is_some() {
            damage.repair_cost = repair_cost;
        }
        tx.execute(Update(damage.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .execute(ResolveVehicleStatus {
                vehicle_id: damage.vehicle_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(damage)
    }
}

/// Error of [`UpdateDamageStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Damage`] with the provided ID does not exist.
    #[display("`Damage(id: {_0})` does not exist")]
    DamageNotExists(#[error(not(source))] damage::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Damage`] cannot be moved into the requested [`damage::Status`].
    #[display("`Damage` cannot become `{to}` from `{from}`")]
    ForbiddenTransition {
        /// Current [`damage::Status`] of the [`Damage`].
        from: damage::Status,

        /// Requested [`damage::Status`] of the [`Damage`].
        to: damage::Status,
    },

    /// Repair cost of the [`Damage`] is negative.
    #[display("`Damage` repair cost cannot be negative")]
    NegativeRepairCost,

    /// Resolving the [`vehicle::Status`] after the [`Damage`] was changed
    /// failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::UpdateDamageStatus,
        domain::{damage, vehicle},
        fixture, Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn recomputes_vehicle_status() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let d =
            fixture::damage(&svc, vehicle.id, damage::Severity::Severe).await;

        _ = svc
            .execute(UpdateDamageStatus {
                damage_id: d.id,
                status: damage::Status::InRepair,
                repair_cost: None,
            })
            .await
            .unwrap();
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::SevereDamage,
        );

        let repaired = svc
            .execute(UpdateDamageStatus {
                damage_id: d.id,
                status: damage::Status::Repaired,
                repair_cost: Some("900USD".parse().unwrap()),
            })
            .await
            .unwrap();
        assert_eq!(repaired.repair_cost, Some("900USD".parse().unwrap()));
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );
    }

    #[tokio::test]
    async fn refuses_invalid_update() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let d =
            fixture::damage(&svc, vehicle.id, damage::Severity::Minor).await;
        _ = svc
            .execute(UpdateDamageStatus {
                damage_id: d.id,
                status: damage::Status::Repaired,
                repair_cost: None,
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateDamageStatus {
                damage_id: d.id,
                status: damage::Status::InRepair,
                repair_cost: None,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                E::ForbiddenTransition {
                    from: damage::Status::Repaired,
                    to: damage::Status::InRepair,
                },
            ),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(UpdateDamageStatus {
                damage_id: d.id,
                status: damage::Status::Repaired,
                repair_cost: Some("-1USD".parse().unwrap()),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::NegativeRepairCost),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(UpdateDamageStatus {
                damage_id: damage::Id::new(),
                status: damage::Status::InRepair,
                repair_cost: None,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::DamageNotExists(_)),
            "unexpected error: {err}",
        );
    }
}
