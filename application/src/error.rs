//! [`Error`]-related definitions.

use std::fmt;

use derive_more::Error as StdError;
use juniper::{IntoFieldError, Value};
use service::infra::database;
use tracerr::{Trace, Traced};

/// Defines an enum of API errors, mapping each variant to its error code,
/// HTTP status and message.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// API errors.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                            details: None,
                        },
                    )*
                }
            }
        }
    };
}

/// GraphQL API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,

    /// Structured [`Details`] of this [`Error`], if any.
    pub details: Option<Details>,
}

/// Structured details of an [`Error`], exposed as a list in its GraphQL
/// extensions.
#[derive(Clone, Debug)]
pub struct Details {
    /// Name of the extension field holding these [`Details`].
    pub field: &'static str,

    /// Listed entries, each one being a set of named values.
    pub entries: Vec<Vec<(&'static str, Option<String>)>>,
}

impl Error {
    /// Creates a new `INTERNAL_SERVER_ERROR` [`Error`] with the provided
    /// message.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
            details: None,
        }
    }

    /// Attaches the provided [`Details`] to this [`Error`].
    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.code, self.message)?;
        if let Some(trace) = &self.backtrace {
            write!(f, "{trace}")?;
        }
        Ok(())
    }
}

impl Details {
    /// Converts these [`Details`] into a GraphQL list of objects.
    fn into_value<S: From<String>>(self) -> Value<S> {
        Value::list(
            self.entries
                .into_iter()
                .map(|values| {
                    let fields = values.into_iter().map(|(name, v)| {
                        (name, v.map_or_else(Value::null, Value::scalar))
                    });
                    Value::object(fields.collect())
                })
                .collect(),
        )
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
            details,
        } = self;

        let frames = backtrace
            .iter()
            .flat_map(|trace| trace.iter())
            .map(|frame| Value::scalar(frame.to_string()))
            .collect();

        let mut ext = juniper::Object::with_capacity(3);
        _ = ext.add_field("code", Value::scalar(code.to_owned()));
        _ = ext.add_field("backtrace", Value::list(frames));
        if let Some(details) = details {
            _ = ext.add_field(details.field, details.into_value());
        }

        juniper::FieldError::new(message, Value::object(ext))
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}
