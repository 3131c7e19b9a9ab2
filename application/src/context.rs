//! [`Context`]-related definitions.

use std::sync::atomic::{AtomicU16, Ordering};

use axum::{async_trait, extract::FromRequestParts};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};

use crate::{Error, JuniperResponse, Service};

/// Per-request context of the GraphQL API.
#[derive(Debug)]
pub struct Context {
    /// Fleet [`Service`] serving the request.
    service: Service,

    /// Status code to respond with if the request fails.
    ///
    /// Defaults to `500 Internal Server Error` until an [`Error`] is
    /// reported via [`Context::error()`].
    status_code: AtomicU16,
}

impl Context {
    /// Creates a new [`Context`] serving requests with the provided
    /// [`Service`].
    #[must_use]
    pub fn new(service: Service) -> Self {
        Self {
            service,
            status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
        }
    }

    /// Returns the fleet [`Service`] of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the status code to respond with if the request fails.
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(self.status_code.load(Ordering::Relaxed))
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns a [`Result::map_err()`] callback remembering the status code
    /// of the [`Error`] it passes through.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.status_code
                .store(err.status_code.as_u16(), Ordering::Relaxed);
            err
        }
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let Some(service) = parts.extensions.get::<Service>() else {
            let err = Error::internal(&"`Service` is not attached to request");
            return Err(JuniperResponse {
                status_code: err.status_code,
                response: GraphQLBatchResponse::Single(GraphQLResponse::error(
                    err.into_field_error(),
                )),
            });
        };
        Ok(Self::new(service.clone()))
    }
}
