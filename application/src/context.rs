//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::{
    command::{self, Command as _},
    domain::user::session,
};
use tokio::sync::OnceCell;

#[cfg(doc)]
use crate::api::User;
use crate::{api, define_error, AsError, Error, JuniperResponse, Service};

/// Context of a single GraphQL request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] serving the request.
    service: Service,

    /// [`http::StatusCode`] of the response, if it contains errors.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Outcome of authenticating the request, resolved lazily.
    session: OnceCell<Result<Session, Error>>,
}

impl Context {
    /// Returns the [`Service`] serving the request.
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`http::StatusCode`] of the response if it contains errors.
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Sets the [`http::StatusCode`] of the response if it contains errors.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Authenticates the rest of the request with the provided [`Session`],
    /// unless it has been authenticated already.
    pub fn set_current_session(&self, session: Session) {
        _ = self.session.set(Ok(session));
    }

    /// Returns the current [`Session`], if the request is authorized.
    ///
    /// # Errors
    ///
    /// If the provided authentication token is invalid.
    pub async fn try_current_session(&self) -> Result<Option<Session>, Error> {
        match self.current_session().await {
            Ok(s) => Ok(Some(s)),
            Err(e)
                if e.code
                    == Error::from(AuthError::AuthorizationRequired).code =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the current [`Session`].
    ///
    /// # Errors
    ///
    /// If:
    /// - the request is not authorized;
    /// - the provided authentication token is invalid or expired.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.session
            .get_or_init(|| self.authenticate())
            .await
            .clone()
            .map_err(self.error())
    }

    /// Authenticates the request by its `Authorization: Bearer` header.
    async fn authenticate(&self) -> Result<Session, Error> {
        let TypedHeader(Authorization(bearer)) = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })?;

        #[expect(unsafe_code, reason = "validated by the `Service`")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        let output = self
            .service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map_err(AsError::into_error)?;

        Ok(Session {
            user_id: output.user.id.into(),
            is_host: output.user.is_host,
            token,
            expires_at: output.session.expires_at.coerce(),
        })
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
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal(&"missing `Service` extension")
                                .into_field_error(),
                        ),
                    ),
                }
            })?;

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            session: OnceCell::new(),
        })
    }
}

/// Authenticated session of a [`User`].
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the authenticated [`User`].
    pub user_id: api::user::Id,

    /// Indicator whether the authenticated [`User`] hosts parking spots.
    pub is_host: bool,

    /// Authentication token.
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::InvalidToken.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Authentication token is invalid or expired"]
        InvalidToken,
    }
}
