//! [`Query`] collection related to a single [`Vehicle`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{vehicle, Damage, Maintenance, Vehicle},
    infra::{database, Database},
    read, Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Vehicle`] by its [`vehicle::Id`].
pub type ById = DatabaseQuery<By<Option<Vehicle>, vehicle::Id>>;

/// [`Query`] resolving the [`vehicle::Status`] a [`Vehicle`] should have
/// right now, without persisting it.
///
/// Resolves to [`None`] if the [`Vehicle`] doesn't exist.
#[derive(Clone, Copy, Debug)]
pub struct Status {
    /// ID of the [`Vehicle`] to resolve the [`vehicle::Status`] of.
    pub vehicle_id: vehicle::Id,
}

impl<Db> Query<Status> for Service<Db>
where
    Db: Database<
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
        >,
{
    type Ok = Option<vehicle::Status>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: Status) -> Result<Self::Ok, Self::Err> {
        let Some(vehicle) = self
            .database()
            .execute(Select(By::<Option<Vehicle>, _>::new(query.vehicle_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let condition = condition(self.database(), &vehicle)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Some(condition.status(self.today())))
    }
}

/// Reads the fresh [`vehicle::Condition`] of the provided [`Vehicle`] from
/// the provided [`Database`].
pub(crate) async fn condition<Db>(
    db: &Db,
    vehicle: &Vehicle,
) -> Result<vehicle::Condition, Traced<database::Error>>
where
    Db: Database<
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
        >,
{
    let is_rented = db
        .execute(Select(By::<read::vehicle::IsRented, _>::new(vehicle.id)))
        .await
        .map_err(tracerr::wrap!())?;
    let damages = db
        .execute(Select(By::<Vec<read::Live<Damage>>, _>::new(vehicle.id)))
        .await
        .map_err(tracerr::wrap!())?;
    let maintenance = db
        .execute(Select(By::<Vec<read::Live<Maintenance>>, _>::new(
            vehicle.id,
        )))
        .await
        .map_err(tracerr::wrap!())?;

    Ok(vehicle::Condition {
        is_rented: *is_rented,
        is_withdrawn: vehicle.is_withdrawn,
        damages: damages.into_iter().map(|read::Live(d)| d).collect(),
        maintenance: maintenance.into_iter().map(|read::Live(m)| m).collect(),
    })
}
