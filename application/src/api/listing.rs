//! [`Listing`]-related definitions.

use std::future;

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use rust_decimal::Decimal;
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A parking spot listed by a host.
#[derive(Clone, Debug, From)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// Underlying [`domain::Listing`].
    listing: OnceCell<domain::Listing>,
}

impl From<domain::Listing> for Listing {
    fn from(listing: domain::Listing) -> Self {
        Self {
            id: listing.id.into(),
            listing: OnceCell::new_with(Some(listing)),
        }
    }
}

impl Listing {
    /// Creates a new [`Listing`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Listing`] with the provided ID exists,
    /// otherwise accessing this [`Listing`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            listing: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Listing`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Listing`] doesn't exist.
    async fn listing(&self, ctx: &Context) -> Result<&domain::Listing, Error> {
        let id = self.id.into();
        self.listing
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::listing::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|l| {
                        future::ready(l.ok_or_else(|| {
                            api::query::ListingError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A parking spot listed by a host.
#[graphql_object(context = Context)]
impl Listing {
    /// Unique identifier of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `User` hosting this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.host",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn host(&self, ctx: &Context) -> Result<api::User, Error> {
        let host_id = self.listing(ctx).await?.host_id;
        #[expect(unsafe_code, reason = "`host_id` is a foreign key")]
        Ok(unsafe { api::User::new_unchecked(host_id) })
    }

    /// Title of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.title",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.listing(ctx).await?.title.clone().into())
    }

    /// Human-readable location of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.location",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn location(&self, ctx: &Context) -> Result<Location, Error> {
        Ok(self.listing(ctx).await?.location.clone().into())
    }

    /// Description of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.description",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Option<Description>, Error> {
        Ok(self.listing(ctx).await?.description.clone().map(Into::into))
    }

    /// Price of a single hour of parking at this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.hourlyRate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn hourly_rate(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.listing(ctx).await?.hourly_rate)
    }

    /// Latitude of this `Listing`, in degrees.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.latitude",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn latitude(&self, ctx: &Context) -> Result<Option<f64>, Error> {
        Ok(self
            .listing(ctx)
            .await?
            .coordinates
            .map(|c| c.latitude.degrees()))
    }

    /// Longitude of this `Listing`, in degrees.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.longitude",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn longitude(
        &self,
        ctx: &Context,
    ) -> Result<Option<f64>, Error> {
        Ok(self
            .listing(ctx)
            .await?
            .coordinates
            .map(|c| c.longitude.degrees()))
    }

    /// `Amenity`s offered by this `Listing`, ordered by name.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.amenities",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn amenities(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Amenity>, Error> {
        let ids = self.listing(ctx).await?.amenities.clone();
        let mut amenities = ctx
            .service()
            .execute(query::amenities::ByIds::by(ids))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_values()
            .collect::<Vec<_>>();
        amenities.sort_by(|a, b| {
            AsRef::<str>::as_ref(&a.name).cmp(b.name.as_ref())
        });
        Ok(amenities.into_iter().map(Into::into).collect())
    }

    /// `Review`s of this `Listing`, latest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.reviews",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reviews(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::reviews::ByListing::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rs| rs.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Listing` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.listing(ctx).await?.created_at.coerce())
    }
}

/// [`Listing`] found near some point.
#[derive(Clone, Debug)]
pub struct Nearby(domain::geo::Nearby<domain::Listing>);

impl From<domain::geo::Nearby<domain::Listing>> for Nearby {
    fn from(nearby: domain::geo::Nearby<domain::Listing>) -> Self {
        Self(nearby)
    }
}

/// `Listing` found near some point.
#[graphql_object(name = "NearbyListing", context = Context)]
impl Nearby {
    /// Found `Listing`.
    #[must_use]
    pub fn listing(&self) -> Listing {
        self.0.item.clone().into()
    }

    /// Distance from the point to the found `Listing`, in kilometers.
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.0.distance.value()
    }
}

/// Result of a `Listing`s search.
#[derive(Clone, Debug, From)]
pub struct SearchResult(query::listings::SearchResult);

/// Result of a `Listing`s search.
#[graphql_object(name = "ListingSearchResult", context = Context)]
impl SearchResult {
    /// Found `Listing`s, latest first.
    #[must_use]
    pub fn listings(&self) -> Vec<Listing> {
        self.0.listings.iter().cloned().map(Into::into).collect()
    }

    /// Indicator whether more than a half of the found `Listing`s are
    /// occupied at the moment.
    #[must_use]
    pub fn high_traffic(&self) -> bool {
        self.0.high_traffic
    }

    /// Traffic in the searched location, if it names a known `TrafficArea`.
    #[must_use]
    pub fn traffic(&self) -> Option<api::traffic::Congestion> {
        self.0.traffic.clone().map(Into::into)
    }
}

/// Unique identifier of a `Listing`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::listing::Id)]
#[into(domain::listing::Id)]
#[graphql(name = "ListingId", transparent)]
pub struct Id(Uuid);

/// Title of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingTitle",
    with = scalar::Via::<domain::listing::Title>,
)]
pub struct Title(domain::listing::Title);

/// Human-readable location of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingLocation",
    with = scalar::Via::<domain::listing::Location>,
)]
pub struct Location(domain::listing::Location);

/// Description of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingDescription",
    with = scalar::Via::<domain::listing::Description>,
)]
pub struct Description(domain::listing::Description);

/// Amount of a `Listing` hourly rate, regardless of its currency.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "ListingRateAmount", with = scalar::Via::<Decimal>)]
pub struct RateAmount(Decimal);
