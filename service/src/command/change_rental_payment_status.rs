//! [`Command`] for changing the payment status of a [`Rental`].

use common::{
    operations::{By, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{rental, Rental},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the [`rental::PaymentStatus`] of a [`Rental`].
#[derive(Clone, Copy, Debug)]
pub struct ChangeRentalPaymentStatus {
    /// ID of the [`Rental`] to change the [`rental::PaymentStatus`] of.
    pub rental_id: rental::Id,

    /// New [`rental::PaymentStatus`] of the [`Rental`].
    pub payment_status: rental::PaymentStatus,
}

impl<Db> Command<ChangeRentalPaymentStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Err = Traced<database::Error>>,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ChangeRentalPaymentStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ChangeRentalPaymentStatus {
            rental_id,
            payment_status,
        } = cmd;

        let mut rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;
        if !rental.payment_status.can_become(payment_status) {
            return Err(tracerr::new!(E::ForbiddenTransition {
                from: rental.payment_status,
                to: payment_status,
            }));
        }

        rental.payment_status = payment_status;
        rental.updated_at = DateTime::now().coerce();
        self.database()
            .execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(rental)
    }
}

/// Error of [`ChangeRentalPaymentStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] payment cannot be moved into the requested
    /// [`rental::PaymentStatus`].
    #[display("`Rental` payment cannot become `{to}` from `{from}`")]
    ForbiddenTransition {
        /// Current [`rental::PaymentStatus`] of the [`Rental`].
        from: rental::PaymentStatus,

        /// Requested [`rental::PaymentStatus`] of the [`Rental`].
        to: rental::PaymentStatus,
    },

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
