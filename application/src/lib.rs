//! HTTP server exposing the vehicle rental fleet [`Service`] through a
//! GraphQL API.

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    Extension, Json,
};
use derive_more::Debug;
use juniper::{http::GraphQLBatchResponse, DefaultScalarValue, ScalarValue};
use juniper_axum::extract::JuniperRequest;
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::Context,
    error::{AsError, Error},
};

/// [`Service`] backed by the Postgres fleet database.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// HTTP response carrying the result of a GraphQL request.
///
/// Successful results are always served with `200 OK`, while failed ones use
/// the status code of the error that failed them.
#[derive(Debug)]
pub struct JuniperResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// Status code used if the GraphQL request failed.
    pub status_code: http::StatusCode,

    /// Result of the GraphQL request.
    #[debug(skip)]
    pub response: GraphQLBatchResponse<S>,
}

impl<S> IntoResponse for JuniperResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let status_code = if self.response.is_ok() {
            http::StatusCode::OK
        } else {
            self.status_code
        };
        (status_code, Json(self.response)).into_response()
    }
}

/// Executes a GraphQL request against the fleet [`api::Schema`].
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    ctx: Context,
    JuniperRequest(req): JuniperRequest,
) -> JuniperResponse {
    let response = req.execute(&*schema, &ctx).await;
    JuniperResponse {
        status_code: ctx.error_status_code(),
        response,
    }
}
