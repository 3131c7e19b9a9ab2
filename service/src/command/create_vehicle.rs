//! [`Command`] for creating a new [`Vehicle`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{vehicle, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// Unique constraint of [`vehicle::PlateNumber`]s in the [`Database`].
const PLATE_NUMBER_KEY: &str = "vehicles_plate_number_key";

/// [`Command`] for creating a new [`Vehicle`] in the fleet.
///
/// A new [`Vehicle`] is [`vehicle::Status::Available`], as nothing can
/// reference it yet.
#[derive(Clone, Debug)]
pub struct CreateVehicle {
    /// [`vehicle::PlateNumber`] of a new [`Vehicle`].
    pub plate_number: vehicle::PlateNumber,

    /// [`vehicle::Model`] of a new [`Vehicle`].
    pub model: vehicle::Model,
}

impl<Db> Command<CreateVehicle> for Service<Db>
where
    Db: Database<
            Select<By<Option<Vehicle>, vehicle::PlateNumber>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vehicle>, Err = Traced<database::Error>>,
{
    type Ok = Vehicle;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateVehicle) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateVehicle {
            plate_number,
            model,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::<Option<Vehicle>, _>::new(
                plate_number.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::PlateNumberOccupied(plate_number)));
        }

        let vehicle = Vehicle {
            id: vehicle::Id::new(),
            plate_number,
            model,
            status: vehicle::Status::Available,
            is_withdrawn: false,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(vehicle.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(PLATE_NUMBER_KEY)) {
                    tracerr::new!(E::PlateNumberOccupied(
                        vehicle.plate_number.clone(),
                    ))
                } else {
                    (tracerr::map_from_and_wrap!(=> E))(e)
                }
            })
            .map(drop)?;

        Ok(vehicle)
    }
}

/// Error of [`CreateVehicle`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Vehicle`] with the provided [`vehicle::PlateNumber`] already exists.
    #[display("`Vehicle(plate_number: {_0})` already exists")]
    PlateNumberOccupied(#[error(not(source))] vehicle::PlateNumber),
}
