//! [`Command`] for creating a new [`Customer`].

use common::{operations::Insert, DateTime};
use tracerr::Traced;

use crate::{
    domain::{customer, Customer},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Customer`].
#[derive(Clone, Debug)]
pub struct CreateCustomer {
    /// [`customer::Name`] of a new [`Customer`].
    pub name: customer::Name,

    /// [`customer::LicenseNumber`] of a new [`Customer`].
    pub license_number: customer::LicenseNumber,

    /// [`customer::Phone`] of a new [`Customer`].
    pub phone: Option<customer::Phone>,
}

impl<Db> Command<CreateCustomer> for Service<Db>
where
    Db: Database<Insert<Customer>, Err = Traced<database::Error>>,
{
    type Ok = Customer;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateCustomer,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateCustomer {
            name,
            license_number,
            phone,
        } = cmd;

        let customer = Customer {
            id: customer::Id::new(),
            name,
            license_number,
            phone,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(customer.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(customer)
    }
}

/// Error of [`CreateCustomer`] [`Command`] execution.
pub type ExecutionError = database::Error;
