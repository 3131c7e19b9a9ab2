//! [`Maintenance`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{maintenance, vehicle, Maintenance},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`Maintenance`] row, as expected by [`from_row()`].
const COLUMNS: &str = "\
    id, vehicle_id, service_type, description, \
    scheduled_date, status, \
    cost, cost_currency, \
    provider, next_service_due, \
    cancelled_for, cancelled_by, cancelled_at, \
    created_at";

/// Reads a [`Maintenance`] out of the provided [`Row`].
fn from_row(row: &Row) -> Maintenance {
    Maintenance {
        id: row.get("id"),
        vehicle_id: row.get("vehicle_id"),
        service_type: row.get("service_type"),
        description: row.get("description"),
        scheduled_date: row.get("scheduled_date"),
        status: row.get("status"),
        cost: Money {
            amount: row.get("cost"),
            currency: row.get("cost_currency"),
        },
        provider: row.get("provider"),
        next_service_due: row.get("next_service_due"),
        cancellation: row.get::<_, Option<_>>("cancelled_for").map(
            |rental_id| maintenance::Cancellation {
                rental_id,
                initiator: row.get("cancelled_by"),
                cancelled_at: row.get("cancelled_at"),
            },
        ),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<maintenance::Id, Maintenance>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[maintenance::Id]>,
{
    type Ok = HashMap<maintenance::Id, Maintenance>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<maintenance::Id, Maintenance>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // `UUID[]` is bound from a slice only.
        let ids: &[maintenance::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM maintenance \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let m = from_row(row);
                (m.id, m)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Maintenance>, maintenance::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<
            By<HashMap<maintenance::Id, Maintenance>, [maintenance::Id; 1]>,
        >,
        Ok = HashMap<maintenance::Id, Maintenance>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Maintenance>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Maintenance>, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::Live<Maintenance>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Live<Maintenance>>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `UUID[]` is bound from a slice only.
        let vehicle_id: vehicle::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM maintenance \
             WHERE vehicle_id = $1::UUID \
               AND status IN ($2::INT2, $3::INT2) \
             ORDER BY scheduled_date ASC, id ASC",
        );
        Ok(self
            .query(
                &sql,
                &[
                    &vehicle_id,
                    &maintenance::Status::Scheduled,
                    &maintenance::Status::InProgress,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| read::Live(from_row(row)))
            .collect())
    }
}

impl<C> Database<Insert<Maintenance>> for Postgres<C>
where
    C: Connection,
    Self:
        Database<Update<Maintenance>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(maintenance): Insert<Maintenance>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(maintenance))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Maintenance>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(maintenance): Update<Maintenance>,
    ) -> Result<Self::Ok, Self::Err> {
        let Maintenance {
            id,
            vehicle_id,
            service_type,
            description,
            scheduled_date,
            status,
            cost,
            provider,
            next_service_due,
            cancellation,
            created_at,
        } = maintenance;

        let (cancelled_for, cancelled_by, cancelled_at) =
            cancellation.map_or((None, None, None), |c| {
                (Some(c.rental_id), c.initiator, Some(c.cancelled_at))
            });

        const SQL: &str = "\
            INSERT INTO maintenance (\
                id, vehicle_id, service_type, description, \
                scheduled_date, status, \
                cost, cost_currency, \
                provider, next_service_due, \
                cancelled_for, cancelled_by, cancelled_at, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::TEXT, \
                $5::DATE, $6::INT2, \
                $7::NUMERIC, $8::INT2, \
                $9::VARCHAR, $10::DATE, \
                $11::UUID, $12::VARCHAR, $13::TIMESTAMPTZ, \
                $14::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET vehicle_id = EXCLUDED.vehicle_id, \
                service_type = EXCLUDED.service_type, \
                description = EXCLUDED.description, \
                scheduled_date = EXCLUDED.scheduled_date, \
                status = EXCLUDED.status, \
                cost = EXCLUDED.cost, \
                cost_currency = EXCLUDED.cost_currency, \
                provider = EXCLUDED.provider, \
                next_service_due = EXCLUDED.next_service_due, \
                cancelled_for = EXCLUDED.cancelled_for, \
                cancelled_by = EXCLUDED.cancelled_by, \
                cancelled_at = EXCLUDED.cancelled_at, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &vehicle_id,
                &service_type,
                &description,
                &scheduled_date,
                &status,
                &cost.amount,
                &cost.currency,
                &provider,
                &next_service_due,
                &cancelled_for,
                &cancelled_by,
                &cancelled_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
