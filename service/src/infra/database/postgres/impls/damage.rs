//! [`Damage`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{damage, vehicle, Damage},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`Damage`] row, as expected by [`from_row()`].
const COLUMNS: &str = "\
    id, vehicle_id, severity, status, description, images, \
    repair_cost, repair_cost_currency, \
    claim_number, claim_amount, claim_amount_currency, \
    reported_at";

/// Reads a [`Damage`] out of the provided [`Row`].
fn from_row(row: &Row) -> Damage {
    let money = |amount: &str, currency: &str| {
        row.get::<_, Option<_>>(amount).map(|amount| Money {
            amount,
            currency: row.get(currency),
        })
    };
    Damage {
        id: row.get("id"),
        vehicle_id: row.get("vehicle_id"),
        severity: row.get("severity"),
        status: row.get("status"),
        description: row.get("description"),
        images: row.get("images"),
        repair_cost: money("repair_cost", "repair_cost_currency"),
        insurance_claim: row.get::<_, Option<_>>("claim_number").map(
            |number| damage::InsuranceClaim {
                number,
                amount: money("claim_amount", "claim_amount_currency"),
            },
        ),
        reported_at: row.get("reported_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<damage::Id, Damage>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[damage::Id]>,
{
    type Ok = HashMap<damage::Id, Damage>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<damage::Id, Damage>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // `UUID[]` is bound from a slice only.
        let ids: &[damage::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM damages \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let d = from_row(row);
                (d.id, d)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Damage>, damage::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<damage::Id, Damage>, [damage::Id; 1]>>,
        Ok = HashMap<damage::Id, Damage>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Damage>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Damage>, damage::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<read::Live<Damage>>, vehicle::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::Live<Damage>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Live<Damage>>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `UUID[]` is bound from a slice only.
        let vehicle_id: vehicle::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM damages \
             WHERE vehicle_id = $1::UUID \
               AND status IN ($2::INT2, $3::INT2) \
             ORDER BY reported_at ASC, id ASC",
        );
        Ok(self
            .query(
                &sql,
                &[
                    &vehicle_id,
                    &damage::Status::Reported,
                    &damage::Status::InRepair,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| read::Live(from_row(row)))
            .collect())
    }
}

impl<C> Database<Insert<Damage>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Damage>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(damage): Insert<Damage>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(damage)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Damage>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(damage): Update<Damage>,
    ) -> Result<Self::Ok, Self::Err> {
        let Damage {
            id,
            vehicle_id,
            severity,
            status,
            description,
            images,
            repair_cost,
            insurance_claim,
            reported_at,
        } = damage;

        let (claim_number, claim_amount) = insurance_claim
            .map_or((None, None), |c| (Some(c.number), c.amount));

        const SQL: &str = "\
            INSERT INTO damages (\
                id, vehicle_id, severity, status, description, images, \
                repair_cost, repair_cost_currency, \
                claim_number, claim_amount, claim_amount_currency, \
                reported_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT2, $4::INT2, $5::TEXT, \
                $6::TEXT[], \
                $7::NUMERIC, $8::INT2, \
                $9::VARCHAR, $10::NUMERIC, $11::INT2, \
                $12::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET vehicle_id = EXCLUDED.vehicle_id, \
                severity = EXCLUDED.severity, \
                status = EXCLUDED.status, \
                description = EXCLUDED.description, \
                images = EXCLUDED.images, \
                repair_cost = EXCLUDED.repair_cost, \
                repair_cost_currency = EXCLUDED.repair_cost_currency, \
                claim_number = EXCLUDED.claim_number, \
                claim_amount = EXCLUDED.claim_amount, \
                claim_amount_currency = EXCLUDED.claim_amount_currency, \
                reported_at = EXCLUDED.reported_at";
        self.exec(
            SQL,
            &[
                &id,
                &vehicle_id,
                &severity,
                &status,
                &description,
                &images,
                &repair_cost.map(|m| m.amount),
                &repair_cost.map(|m| m.currency),
                &claim_number,
                &claim_amount.map(|m| m.amount),
                &claim_amount.map(|m| m.currency),
                &reported_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
