//! [`Command`] for scheduling a new [`Maintenance`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::{resolve_vehicle_status, ResolveVehicleStatus},
    domain::{maintenance, vehicle, Maintenance, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for scheduling a new [`Maintenance`] of a [`Vehicle`].
#[derive(Clone, Debug)]
pub struct ScheduleMaintenance {
    /// ID of the [`Vehicle`] to be maintained.
    pub vehicle_id: vehicle::Id,

    /// [`maintenance::ServiceType`] of a new [`Maintenance`].
    pub service_type: maintenance::ServiceType,

    /// [`maintenance::Description`] of a new [`Maintenance`].
    pub description: maintenance::Description,

    /// Day a new [`Maintenance`] is scheduled for.
    pub scheduled_date: maintenance::ScheduledDate,

    /// Cost of a new [`Maintenance`].
    pub cost: Money,

    /// [`maintenance::Provider`] performing a new [`Maintenance`].
    pub provider: Option<maintenance::Provider>,

    /// Day the next service of the [`Vehicle`] is due.
    pub next_service_due: Option<maintenance::NextServiceDate>,
}

impl<Db> Command<ScheduleMaintenance> for Service<Db>
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
        > + Database<Insert<Maintenance>, Err = Traced<database::Error>>
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
        cmd: ScheduleMaintenance,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ScheduleMaintenance {
            vehicle_id,
            service_type,
            description,
            scheduled_date,
            cost,
            provider,
            next_service_due,
        } = cmd;

        if cost.is_negative() {
            return Err(tracerr::new!(E::NegativeCost(cost)));
        }
        if next_service_due
            .is_some_and(|due| due.coerce::<()>() < scheduled_date.coerce())
        {
            return Err(tracerr::new!(E::NextServiceBeforeScheduled));
        }

        self.database()
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let maintenance = Maintenance {
            id: maintenance::Id::new(),
            vehicle_id,
            service_type,
            description,
            scheduled_date,
            status: maintenance::Status::Scheduled,
            cost,
            provider,
            next_service_due,
            cancellation: None,
            created_at: DateTime::now().coerce(),
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

        tx.execute(Insert(maintenance.clone()))
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

        Ok(maintenance)
    }
}

/// Error of [`ScheduleMaintenance`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Cost of the [`Maintenance`] is negative.
    #[display("`Maintenance` cost cannot be negative: {_0}")]
    NegativeCost(#[error(not(source))] Money),

    /// Next service is due before the [`Maintenance`] itself.
    #[display("Next service cannot be due before the `Maintenance`")]
    NextServiceBeforeScheduled,

    /// [`Vehicle`] with the provided ID does not exist.
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),

    /// Resolving the [`vehicle::Status`] after the [`Maintenance`] was
    /// scheduled failed.
    #[display("Failed to resolve `Vehicle` status: {_0}")]
    #[from]
    VehicleStatus(resolve_vehicle_status::ExecutionError),
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};

    use crate::{
        command::ScheduleMaintenance,
        domain::{maintenance, vehicle},
        fixture, Command as _,
    };

    use super::ExecutionError as E;

    fn oil_change(vehicle_id: vehicle::Id, day: Date) -> ScheduleMaintenance {
        ScheduleMaintenance {
            vehicle_id,
            service_type: maintenance::ServiceType::new("Oil change").unwrap(),
            description: maintenance::Description::new("5W-30").unwrap(),
            scheduled_date: day.coerce(),
            cost: Money::zero(Currency::Usd),
            provider: None,
            next_service_due: None,
        }
    }

    #[tokio::test]
    async fn takes_vehicle_out_when_due() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let today = svc.today();

        let later = svc
            .execute(oil_change(vehicle.id, today.add_days(3).unwrap()))
            .await
            .unwrap();
        assert_eq!(later.status, maintenance::Status::Scheduled);
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Available,
        );

        _ = svc.execute(oil_change(vehicle.id, today)).await.unwrap();
        assert_eq!(
            svc.database().vehicle(vehicle.id).unwrap().status,
            vehicle::Status::Maintenance,
        );
    }

    #[tokio::test]
    async fn validates_draft() {
        let svc = fixture::service();
        let vehicle = fixture::vehicle(&svc).await;
        let day = fixture::date("2025-06-10");
        let writes = svc.database().writes();

        let err = svc
            .execute(ScheduleMaintenance {
                cost: "-5USD".parse().unwrap(),
                ..oil_change(vehicle.id, day)
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::NegativeCost(_)),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(ScheduleMaintenance {
                next_service_due: Some(fixture::date("2025-06-09").coerce()),
                ..oil_change(vehicle.id, day)
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::NextServiceBeforeScheduled),
            "unexpected error: {err}",
        );

        let err = svc
            .execute(oil_change(vehicle::Id::new(), day))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), E::VehicleNotExists(_)),
            "unexpected error: {err}",
        );

        assert_eq!(svc.database().writes(), writes, "nothing is written");
    }
}
