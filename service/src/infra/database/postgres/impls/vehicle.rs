//! [`Vehicle`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{rental, vehicle, Vehicle},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C, IDs> Database<Select<By<HashMap<vehicle::Id, Vehicle>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[vehicle::Id]>,
{
    type Ok = HashMap<vehicle::Id, Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<vehicle::Id, Vehicle>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // `UUID[]` is bound from a slice only.
        let ids: &[vehicle::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, plate_number, model, status, is_withdrawn, \
                   created_at \
            FROM vehicles \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Vehicle {
                        id,
                        plate_number: row.get("plate_number"),
                        model: row.get("model"),
                        status: row.get("status"),
                        is_withdrawn: row.get("is_withdrawn"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Vehicle>, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<vehicle::Id, Vehicle>, [vehicle::Id; 1]>>,
        Ok = HashMap<vehicle::Id, Vehicle>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Vehicle>, vehicle::PlateNumber>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Vehicle>, vehicle::Id>>,
        Ok = Option<Vehicle>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::PlateNumber>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `UUID[]` is bound from a slice only.
        let plate_number: vehicle::PlateNumber = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM vehicles \
            WHERE plate_number = $1::VARCHAR \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&plate_number])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Vehicle>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Vehicle>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(vehicle): Insert<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(vehicle)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Vehicle>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        let Vehicle {
            id,
            plate_number,
            model,
            status,
            is_withdrawn,
            created_at,
        } = vehicle;

        const SQL: &str = "\
            INSERT INTO vehicles (\
                id, plate_number, model, status, is_withdrawn, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::INT2, $5::BOOLEAN, \
                $6::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET plate_number = EXCLUDED.plate_number, \
                model = EXCLUDED.model, \
                status = EXCLUDED.status, \
                is_withdrawn = EXCLUDED.is_withdrawn, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &plate_number,
                &model,
                &status,
                &is_withdrawn,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Vehicle, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vehicle, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `UUID[]` is bound from a slice only.
        let id: vehicle::Id = by.into_inner();

        // Updating the existing row holds its lock until the transaction
        // ends.
        const SQL: &str = "\
            INSERT INTO vehicles_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::vehicle::IsRented, vehicle::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::vehicle::IsRented;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::vehicle::IsRented, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `UUID[]` is bound from a slice only.
        let vehicle_id: vehicle::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM rentals \
            WHERE vehicle_id = $1::UUID \
              AND status = $2::INT2 \
            LIMIT 1";
        self.query_opt(SQL, &[&vehicle_id, &rental::Status::Active])
            .await
            .map_err(tracerr::wrap!())
            .map(|r| read::vehicle::IsRented(r.is_some()))
    }
}
