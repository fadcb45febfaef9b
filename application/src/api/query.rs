//! GraphQL [`Query`]s definitions.

use common::DateTime;
use juniper::graphql_object;
use service::{domain, query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        Self::user(my_id, ctx).await
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Listing` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - the `Listing` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "listing",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn listing(
        id: api::listing::Id,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        ctx.service()
            .execute(query::listing::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ListingError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Searches `Listing`s and estimates the traffic in the searched
    /// location.
    ///
    /// All the provided criteria must be satisfied. Rate bounds are
    /// inclusive and compared regardless of the rate currency.
    #[tracing::instrument(
        skip_all,
        fields(
            amenities = ?amenities,
            gql.name = "searchListings",
            location = ?location,
            max_rate = ?max_rate,
            min_rate = ?min_rate,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn search_listings(
        location: Option<String>,
        min_rate: Option<api::listing::RateAmount>,
        max_rate: Option<api::listing::RateAmount>,
        amenities: Option<Vec<api::amenity::Id>>,
        ctx: &Context,
    ) -> Result<api::listing::SearchResult, Error> {
        ctx.service()
            .execute(query::listings::Search {
                filter: read::listing::Filter {
                    location: location.filter(|l| !l.trim().is_empty()),
                    min_rate: min_rate.map(Into::into),
                    max_rate: max_rate.map(Into::into),
                    amenities: amenities
                        .unwrap_or_default()
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                },
                now: DateTime::now().coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Ranks `Listing`s nearby the specified point by their distance.
    ///
    /// Reservations of the `Listing`s are not taken into account.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MISSING_COORDINATES` - either `latitude` or `longitude` is not
    ///                           provided;
    /// - `INVALID_COORDINATES` - the provided coordinates are out of range;
    /// - `INVALID_RADIUS` - the provided `radiusKm` is negative;
    /// - `INVALID_LIMIT` - the provided `limit` is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "nearbyListings",
            latitude = ?latitude,
            limit = ?limit,
            longitude = ?longitude,
            otel.name = Self::SPAN_NAME,
            radius_km = ?radius_km,
        ),
    )]
    pub async fn nearby_listings(
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: Option<f64>,
        limit: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::listing::Nearby>, Error> {
        let radius = radius_km
            .map(|r| {
                domain::geo::Kilometers::new(r)
                    .ok_or_else(|| NearbyError::InvalidRadius.into())
            })
            .transpose()
            .map_err(ctx.error())?;
        let limit = limit
            .map(|l| {
                usize::try_from(l)
                    .map_err(|_| NearbyError::InvalidLimit.into())
            })
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::listings::Nearby {
                latitude,
                longitude,
                radius,
                limit,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ls| ls.into_iter().map(Into::into).collect())
    }

    /// Returns the whole catalog of `Amenity`s, ordered by name.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "amenities",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn amenities(ctx: &Context) -> Result<Vec<api::Amenity>, Error> {
        ctx.service()
            .execute(query::amenities::All::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|a| a.into_iter().map(Into::into).collect())
    }

    /// Returns the current congestion `TrafficStatus` of the `TrafficArea`
    /// with the specified name.
    ///
    /// `UNKNOWN` status is returned if there is no such `TrafficArea`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "trafficStatus",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn traffic_status(
        name: String,
        ctx: &Context,
    ) -> Result<api::traffic::Status, Error> {
        ctx.service()
            .execute(query::traffic::StatusByName(name))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Booking` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the specified ID does not
    ///                          exist or is made by another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "booking",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(query::booking::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|b| api::user::Id::from(b.user_id) == my_id)
            .ok_or_else(|| BookingError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the dashboard of the currently authenticated host `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` is not a host.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "hostDashboard",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn host_dashboard(
        ctx: &Context,
    ) -> Result<api::report::Dashboard, Error> {
        let session = ctx.current_session().await?;
        if !session.is_host {
            return Err(ctx.error()(api::PrivilegeError::Forbidden.into()));
        }

        ctx.service()
            .execute(query::report::HostEarnings(session.user_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for query::listings::NearbyError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidCoordinates => NearbyError::InvalidCoordinates.into(),
            Self::MissingCoordinates => NearbyError::MissingCoordinates.into(),
        })
    }
}

define_error! {
    enum NearbyError {
        #[code = "INVALID_COORDINATES"]
        #[status = BAD_REQUEST]
        #[message = "Coordinates are out of range"]
        InvalidCoordinates,

        #[code = "INVALID_LIMIT"]
        #[status = BAD_REQUEST]
        #[message = "Limit must not be negative"]
        InvalidLimit,

        #[code = "INVALID_RADIUS"]
        #[status = BAD_REQUEST]
        #[message = "Radius must be a non-negative number of kilometers"]
        InvalidRadius,

        #[code = "MISSING_COORDINATES"]
        #[status = BAD_REQUEST]
        #[message = "Both latitude and longitude must be provided"]
        MissingCoordinates,
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ListingError {
        #[code = "LISTING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Listing` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
