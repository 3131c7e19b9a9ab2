//! [`Rental`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    error::Details,
    AsError, Context, Error,
};

/// A rental of a `Vehicle` by a `Customer`.
#[derive(Clone, Debug)]
pub struct Rental {
    /// ID of this [`Rental`].
    id: Id,

    /// Underlying [`domain::Rental`].
    rental: OnceCell<domain::Rental>,
}

impl From<domain::Rental> for Rental {
    fn from(rental: domain::Rental) -> Self {
        Self {
            id: rental.id.into(),
            rental: OnceCell::new_with(Some(rental)),
        }
    }
}

impl Rental {
    /// Creates a new [`Rental`] with the provided ID, loading it on the
    /// first access.
    #[must_use]
    pub fn by_id(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            rental: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Rental`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Rental`] doesn't exist.
    async fn rental(&self, ctx: &Context) -> Result<&domain::Rental, Error> {
        let id = self.id.into();
        self.rental
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::rental::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|r| {
                        future::ready(r.ok_or_else(|| {
                            api::query::RentalError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Describes the provided [`domain::Rental`]s as `bookings` [`Details`]
    /// of an [`Error`].
    #[must_use]
    pub fn bookings(rentals: &[domain::Rental]) -> Details {
        Details {
            field: "bookings",
            entries: rentals
                .iter()
                .map(|r| {
                    vec![
                        ("id", Some(r.id.to_string())),
                        ("startDate", Some(r.period.start().to_string())),
                        ("endDate", Some(r.period.end().to_string())),
                        ("status", Some(Status::from(r.status).to_string())),
                    ]
                })
                .collect(),
        }
    }
}

/// A rental of a `Vehicle` by a `Customer`.
#[graphql_object(context = Context)]
impl Rental {
    /// Unique identifier of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Customer` renting the `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.customer",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn customer(
        &self,
        ctx: &Context,
    ) -> Result<api::Customer, Error> {
        Ok(api::Customer::by_id(self.rental(ctx).await?.customer_id))
    }

    /// Rented `Vehicle`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.vehicle",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn vehicle(&self, ctx: &Context) -> Result<api::Vehicle, Error> {
        Ok(api::Vehicle::by_id(self.rental(ctx).await?.vehicle_id))
    }

    /// First day of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.startDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn start_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.rental(ctx).await?.period.start())
    }

    /// Last day of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.endDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn end_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.rental(ctx).await?.period.end())
    }

    /// Lifecycle status of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.rental(ctx).await?.status.into())
    }

    /// Payment status of this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.paymentStatus",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_status(
        &self,
        ctx: &Context,
    ) -> Result<PaymentStatus, Error> {
        Ok(self.rental(ctx).await?.payment_status.into())
    }

    /// Indicator whether this `Rental` includes a driver.
    pub async fn with_driver(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.rental(ctx).await?.with_driver)
    }

    /// Indicator whether this `Rental` includes an insurance.
    pub async fn insurance(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.rental(ctx).await?.insurance)
    }

    /// Total amount to be paid for this `Rental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rental.totalAmount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn total_amount(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.rental(ctx).await?.total_amount)
    }

    /// `DateTime` when this `Rental` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.rental(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Rental` was last modified.
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.rental(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Rental`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::rental::Id)]
#[into(domain::rental::Id)]
#[graphql(name = "RentalId", transparent)]
pub struct Id(Uuid);

/// Back-office staff member performing an action.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "Operator", with = scalar::Via::<domain::Operator>)]
pub struct Operator(domain::Operator);

/// Lifecycle status of a `Rental`.
#[derive(Clone, Copy, Debug, Display, GraphQLEnum)]
#[graphql(name = "RentalStatus")]
pub enum Status {
    /// Booked, the `Vehicle` is not handed over yet.
    #[display("PENDING")]
    Pending,

    /// The `Vehicle` is with the `Customer`.
    #[display("ACTIVE")]
    Active,

    /// The `Vehicle` is returned.
    #[display("COMPLETED")]
    Completed,

    /// Called off.
    #[display("CANCELLED")]
    Cancelled,
}

impl From<domain::rental::Status> for Status {
    fn from(status: domain::rental::Status) -> Self {
        use domain::rental::Status as S;
        match status {
            S::Active => Self::Active,
            S::Cancelled => Self::Cancelled,
            S::Completed => Self::Completed,
            S::Pending => Self::Pending,
        }
    }
}

impl From<Status> for domain::rental::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => Self::Active,
            Status::Cancelled => Self::Cancelled,
            Status::Completed => Self::Completed,
            Status::Pending => Self::Pending,
        }
    }
}

/// Payment status of a `Rental`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentalPaymentStatus")]
pub enum PaymentStatus {
    /// Not paid yet.
    Pending,

    /// Paid in full.
    Paid,

    /// Paid and given back.
    Refunded,
}

impl From<domain::rental::PaymentStatus> for PaymentStatus {
    fn from(status: domain::rental::PaymentStatus) -> Self {
        use domain::rental::PaymentStatus as S;
        match status {
            S::Paid => Self::Paid,
            S::Pending => Self::Pending,
            S::Refunded => Self::Refunded,
        }
    }
}

impl From<PaymentStatus> for domain::rental::PaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Paid => Self::Paid,
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Refunded => Self::Refunded,
        }
    }
}
