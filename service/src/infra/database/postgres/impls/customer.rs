//! [`Customer`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{customer, Customer},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<customer::Id, Customer>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[customer::Id]>,
{
    type Ok = HashMap<customer::Id, Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<customer::Id, Customer>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // `UUID[]` is bound from a slice only.
        let ids: &[customer::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, name, license_number, phone, created_at \
            FROM customers \
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
                    Customer {
                        id,
                        name: row.get("name"),
                        license_number: row.get("license_number"),
                        phone: row.get("phone"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Customer>, customer::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<customer::Id, Customer>, [customer::Id; 1]>>,
        Ok = HashMap<customer::Id, Customer>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Customer>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Customer>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(customer): Insert<Customer>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(customer))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Customer>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(customer): Update<Customer>,
    ) -> Result<Self::Ok, Self::Err> {
        let Customer {
            id,
            name,
            license_number,
            phone,
            created_at,
        } = customer;

        const SQL: &str = "\
            INSERT INTO customers (\
                id, name, license_number, phone, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                license_number = EXCLUDED.license_number, \
                phone = EXCLUDED.phone, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[&id, &name, &license_number, &phone, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
