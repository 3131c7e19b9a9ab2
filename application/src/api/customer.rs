//! [`Customer`]-related definitions.

use std::future;

use common::{DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A customer renting `Vehicle`s.
#[derive(Clone, Debug)]
pub struct Customer {
    /// ID of this [`Customer`].
    id: Id,

    /// Underlying [`domain::Customer`].
    customer: OnceCell<domain::Customer>,
}

impl From<domain::Customer> for Customer {
    fn from(customer: domain::Customer) -> Self {
        Self {
            id: customer.id.into(),
            customer: OnceCell::new_with(Some(customer)),
        }
    }
}

impl Customer {
    /// Creates a new [`Customer`] with the provided ID, loading it on the
    /// first access.
    #[must_use]
    pub fn by_id(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            customer: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Customer`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Customer`] doesn't exist.
    async fn customer(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Customer, Error> {
        let id = self.id.into();
        self.customer
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::customer::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(c.ok_or_else(|| {
                            api::query::CustomerError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A customer renting `Vehicle`s.
#[graphql_object(context = Context)]
impl Customer {
    /// Unique identifier of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.customer(ctx).await?.name.clone().into())
    }

    /// Driving license number of this `Customer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Customer.licenseNumber",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn license_number(
        &self,
        ctx: &Context,
    ) -> Result<LicenseNumber, Error> {
        Ok(self.customer(ctx).await?.license_number.clone().into())
    }

    /// Phone number of this `Customer`, if any.
    pub async fn phone(&self, ctx: &Context) -> Result<Option<Phone>, Error> {
        Ok(self.customer(ctx).await?.phone.clone().map(Into::into))
    }

    /// `DateTime` when this `Customer` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.customer(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Customer`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::customer::Id)]
#[into(domain::customer::Id)]
#[graphql(name = "CustomerId", transparent)]
pub struct Id(Uuid);

/// Name of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "CustomerName", with = scalar::Via::<domain::customer::Name>)]
pub struct Name(domain::customer::Name);

/// Driving license number of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerLicenseNumber",
    with = scalar::Via::<domain::customer::LicenseNumber>,
)]
pub struct LicenseNumber(domain::customer::LicenseNumber);

/// Phone number of a `Customer`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerPhone",
    with = scalar::Via::<domain::customer::Phone>,
)]
pub struct Phone(domain::customer::Phone);
