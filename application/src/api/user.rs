//! [`User`]-related definitions.

use std::future;

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A [`User`] of the marketplace.
#[derive(Clone, Debug, From)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`domain::User`] representing this [`User`].
    user: OnceCell<domain::User>,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id.into(),
            user: OnceCell::new_with(Some(user)),
        }
    }
}

impl User {
    /// Creates a new [`User`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`User`] with the provided ID exists,
    /// otherwise accessing this [`User`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            user: OnceCell::new(),
        }
    }

    /// Returns the [`domain::User`] representing this [`User`].
    ///
    /// # Errors
    ///
    /// Error if the [`domain::User`] doesn't exist.
    async fn user(&self, ctx: &Context) -> Result<&domain::User, Error> {
        let id = self.id.into();
        self.user
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::user::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|u| {
                        future::ready(u.ok_or_else(|| {
                            api::query::UserError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Checks whether this [`User`] is the currently authenticated one.
    async fn is_current(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(ctx
            .try_current_session()
            .await?
            .is_some_and(|s| s.user_id == self.id))
    }

    /// Ensures this [`User`] is the currently authenticated one.
    ///
    /// # Errors
    ///
    /// Errors with [`api::PrivilegeError::Forbidden`] otherwise.
    async fn ensure_current(&self, ctx: &Context) -> Result<(), Error> {
        if ctx.current_session().await?.user_id == self.id {
            Ok(())
        } else {
            Err(ctx.error()(api::PrivilegeError::Forbidden.into()))
        }
    }
}

/// A `User` of the marketplace.
#[graphql_object(context = Context)]
impl User {
    /// Unique identifier of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.user(ctx).await?.name.clone().into())
    }

    /// Email of this `User`.
    ///
    /// Visible to this `User` only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.email",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn email(&self, ctx: &Context) -> Result<Option<Email>, Error> {
        Ok(if self.is_current(ctx).await? {
            Some(self.user(ctx).await?.email.clone().into())
        } else {
            None
        })
    }

    /// Phone of this `User`.
    ///
    /// Visible to this `User` only.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Option<Phone>, Error> {
        Ok(if self.is_current(ctx).await? {
            self.user(ctx).await?.phone.clone().map(Into::into)
        } else {
            None
        })
    }

    /// Indicator whether this `User` lists parking spots.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.isHost",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_host(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.user(ctx).await?.is_host)
    }

    /// `Listing`s hosted by this `User`, latest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.listings",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn listings(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Listing>, Error> {
        ctx.service()
            .execute(query::listings::ByHost::by(read::listing::HostedBy(
                self.id.into(),
            )))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ls| ls.into_iter().map(Into::into).collect())
    }

    /// `Listing`s marked as favorite by this `User`, latest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.favorites",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn favorites(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Listing>, Error> {
        self.ensure_current(ctx).await?;

        ctx.service()
            .execute(query::listings::FavoritesOf::by(
                read::listing::FavoredBy(self.id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ls| ls.into_iter().map(Into::into).collect())
    }

    /// `Booking`s made by this `User`, latest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.bookings",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn bookings(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Booking>, Error> {
        self.ensure_current(ctx).await?;

        ctx.service()
            .execute(query::bookings::ByUser::by(read::booking::History(
                self.id.into(),
            )))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|bs| bs.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `User` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.user(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Name of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserName",
    with = scalar::Via::<domain::user::Name>,
)]
pub struct Name(domain::user::Name);

/// Password of a `User`.
#[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPassword",
    with = scalar::Via::<domain::user::Password>,
)]
pub struct Password(domain::user::Password);

/// Email of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserEmail",
    with = scalar::Via::<domain::user::Email>,
)]
pub struct Email(domain::user::Email);

/// Phone of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPhone",
    with = scalar::Via::<domain::user::Phone>,
)]
pub struct Phone(domain::user::Phone);

pub mod session {
    //! [`Session`]-related definitions.
    //!
    //! [`Session`]: crate::Session

    use common::DateTime;
    use derive_more::{AsRef, From, Into};
    use juniper::{GraphQLObject, GraphQLScalar};
    use service::{command, domain};

    use crate::{
        api::{self, scalar},
        Context,
    };

    /// `Session` access token.
    #[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "UserAuthToken",
        with = scalar::Via::<domain::user::session::Token>,
    )]
    pub struct Token(domain::user::session::Token);

    /// Result of a `Session` creation.
    #[derive(Clone, Debug, From, GraphQLObject)]
    #[graphql(context = Context, name = "CreateSessionResult")]
    pub struct CreateResult {
        /// Access token of the created `Session`.
        pub token: Token,

        /// `User` associated with the created `Session`.
        pub user: api::User,

        /// `DateTime` when the created `Session` expires.
        pub expires_at: DateTime,
    }

    impl From<command::create_user_session::Output> for CreateResult {
        fn from(output: command::create_user_session::Output) -> Self {
            let command::create_user_session::Output {
                token,
                user,
                expires_at,
            } = output;
            Self {
                token: token.into(),
                user: user.into(),
                expires_at: expires_at.coerce(),
            }
        }
    }
}
