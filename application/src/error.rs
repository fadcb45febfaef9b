//! [`Error`]-related definitions.

use std::{fmt, num::TryFromIntError};

use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use juniper::IntoFieldError;
use service::infra::database;
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
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
        /// Error type.
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
}

impl Error {
    /// Creates a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Indicates whether this [`Error`] is caused by the client, rather than
    /// by the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code.is_client_error()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let mut ext = juniper::Object::with_capacity(3);
        _ = ext.add_field("code", juniper::Value::scalar(self.code.to_owned()));
        _ = ext.add_field(
            "status",
            juniper::Value::scalar(self.status_code.as_u16().to_string()),
        );
        _ = ext.add_field(
            "backtrace",
            juniper::Value::list(
                self.backtrace
                    .iter()
                    .flat_map(|trace| trace.iter())
                    .map(|frame| juniper::Value::scalar(frame.to_string()))
                    .collect(),
            ),
        );
        juniper::FieldError::new(self.message, juniper::Value::object(ext))
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
    ///
    /// Unexpected errors are logged and reported as internal ones.
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error().unwrap_or_else(|| {
            log::error!("unexpected error: {self}");
            Error::internal(&self)
        })
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

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "BAD_REQUEST",
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        self.is_unavailable().then(|| Error {
            code: "SERVICE_UNAVAILABLE",
            status_code: http::StatusCode::SERVICE_UNAVAILABLE,
            message: "Storage is temporarily unavailable, retry later"
                .to_owned(),
            backtrace: None,
        })
    }
}

impl AsError for TryFromIntError {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, IntoFieldError};
    use service::domain::booking;

    use super::{AsError, Error};

    define_error! {
        enum ParkingError {
            #[code = "PARKING_FULL"]
            #[status = CONFLICT]
            #[message = "Parking is full"]
            Full,
        }
    }

    #[test]
    fn defined_error_carries_code_and_status() {
        let err = Error::from(ParkingError::Full);

        assert_eq!(err.code, "PARKING_FULL");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.message, "Parking is full");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "[PARKING_FULL]: Parking is full");
    }

    #[test]
    fn traced_error_keeps_backtrace() {
        let traced = tracerr::new!(booking::TransitionError::TooLate);

        let err = traced.as_error();

        assert_eq!(err.code, "TOO_LATE");
        assert!(err.backtrace.is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn unknown_error_becomes_internal() {
        let err = std::num::NonZeroU8::try_from(0_u8)
            .map(|_| ())
            .map_err(AsError::into_error)
            .unwrap_err();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert!(!err.is_client_error());
    }

    #[test]
    fn field_error_exposes_code() {
        let field = IntoFieldError::<DefaultScalarValue>::into_field_error(
            Error::from(ParkingError::Full),
        );

        assert_eq!(field.message(), "Parking is full");
        let ext = field.extensions().as_object_value().unwrap();
        assert_eq!(
            ext.get_field_value("code").and_then(|v| v.as_string_value()),
            Some("PARKING_FULL"),
        );
        assert_eq!(
            ext.get_field_value("status").and_then(|v| v.as_string_value()),
            Some("409"),
        );
    }
}
