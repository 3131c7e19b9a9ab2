//! [`Rental`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Select, Update},
    Money, Period,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{rental, vehicle, Rental},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`Rental`] row, as expected by [`from_row()`].
const COLUMNS: &str = "\
    id, customer_id, vehicle_id, \
    start_date, end_date, \
    status, payment_status, \
    with_driver, insurance, \
    total_amount, total_amount_currency, \
    created_at, updated_at";

/// Reads a [`Rental`] out of the provided [`Row`].
fn from_row(row: &Row) -> Rental {
    Rental {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        vehicle_id: row.get("vehicle_id"),
        period: Period::new(row.get("start_date"), row.get("end_date"))
            .expect("`rentals_period_check` constraint"),
        status: row.get("status"),
        payment_status: row.get("payment_status"),
        with_driver: row.get("with_driver"),
        insurance: row.get("insurance"),
        total_amount: Money {
            amount: row.get("total_amount"),
            currency: row.get("total_amount_currency"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<rental::Id, Rental>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[rental::Id]>,
{
    type Ok = HashMap<rental::Id, Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<rental::Id, Rental>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // `UUID[]` is bound from a slice only.
        let ids: &[rental::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rentals \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let rental = from_row(row);
                (rental.id, rental)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Rental>, rental::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<rental::Id, Rental>, [rental::Id; 1]>>,
        Ok = HashMap<rental::Id, Rental>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<read::Live<Rental>>, vehicle::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::Live<Rental>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::Live<Rental>>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let vehicle_id: vehicle::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rentals \
             WHERE vehicle_id = $1::UUID \
               AND status IN ($2::INT2, $3::INT2) \
             ORDER BY start_date ASC, id ASC",
        );
        Ok(self
            .query(
                &sql,
                &[
                    &vehicle_id,
                    &rental::Status::Pending,
                    &rental::Status::Active,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| read::Live(from_row(row)))
            .collect())
    }
}

impl<C> Database<Insert<Rental>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Rental>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(rental)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Rental>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        let Rental {
            id,
            customer_id,
            vehicle_id,
            period,
            status,
            payment_status,
            with_driver,
            insurance,
            total_amount,
            created_at,
            updated_at,
        } = rental;

        let (start_date, end_date) = (period.start(), period.end());

        const SQL: &str = "\
            INSERT INTO rentals (\
                id, customer_id, vehicle_id, \
                start_date, end_date, \
                status, payment_status, \
                with_driver, insurance, \
                total_amount, total_amount_currency, \
                created_at, updated_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::DATE, \
                $6::INT2, $7::INT2, \
                $8::BOOLEAN, $9::BOOLEAN, \
                $10::NUMERIC, $11::INT2, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET customer_id = EXCLUDED.customer_id, \
                vehicle_id = EXCLUDED.vehicle_id, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                status = EXCLUDED.status, \
                payment_status = EXCLUDED.payment_status, \
                with_driver = EXCLUDED.with_driver, \
                insurance = EXCLUDED.insurance, \
                total_amount = EXCLUDED.total_amount, \
                total_amount_currency = EXCLUDED.total_amount_currency, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &customer_id,
                &vehicle_id,
                &start_date,
                &end_date,
                &status,
                &payment_status,
                &with_driver,
                &insurance,
                &total_amount.amount,
                &total_amount.currency,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
