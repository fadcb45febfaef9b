//! GraphQL [`Mutation`]s definitions.

use common::{DateTime, Money};
use juniper::graphql_object;
use service::{command, domain, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided credentials and contact info.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied by another
    ///                      `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUser",
            is_host = is_host,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        email: api::user::Email,
        password: api::user::Password,
        phone: Option<api::user::Phone>,
        is_host: bool,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                phone: phone.map(Into::into),
                is_host,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            is_host: output.user.is_host,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        });

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        email: api::user::Email,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            is_host: output.user.is_host,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        });

        Ok(output.into())
    }

    /// Lists a new parking spot of the authenticated host `User`.
    ///
    /// Either both `latitude` and `longitude` are provided, or none of them.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_HOST` - the authenticated `User` is not a host;
    /// - `NON_POSITIVE_RATE` - provided `hourlyRate` is not positive;
    /// - `AMENITY_NOT_EXISTS` - one of the provided `Amenity`s does not exist;
    /// - `MISSING_COORDINATES` - only one of the coordinates is provided;
    /// - `INVALID_COORDINATES` - provided coordinates are out of range.
    #[tracing::instrument(
        skip_all,
        fields(
            amenities = ?amenities,
            gql.name = "createListing",
            hourly_rate = %hourly_rate,
            latitude = ?latitude,
            location = %location,
            longitude = ?longitude,
            otel.name = Self::SPAN_NAME,
            title = %title,
        ),
    )]
    pub async fn create_listing(
        title: api::listing::Title,
        location: api::listing::Location,
        description: Option<api::listing::Description>,
        hourly_rate: Money,
        latitude: Option<f64>,
        longitude: Option<f64>,
        amenities: Option<Vec<api::amenity::Id>>,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let coordinates = match (latitude, longitude) {
            (None, None) => None,
            (Some(lat), Some(lon)) => Some(
                domain::geo::Coordinates::new(lat, lon)
                    .ok_or_else(|| CoordinatesError::Invalid.into())
                    .map_err(ctx.error())?,
            ),
            (Some(_), None) | (None, Some(_)) => {
                return Err(ctx.error()(CoordinatesError::Missing.into()));
            }
        };

        ctx.service()
            .execute(command::CreateListing {
                host_id: my_id.into(),
                title: title.into(),
                location: location.into(),
                description: description.map(Into::into),
                hourly_rate,
                coordinates,
                amenities: amenities
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Listing` of the authenticated host `User` along with
    /// its `Booking`s, `Review`s and favorite marks.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - the `Listing` does not exist;
    /// - `FORBIDDEN` - the `Listing` is hosted by another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteListing",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_listing(
        listing_id: api::listing::Id,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteListing {
                listing_id: listing_id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the `Listing` as favorite of the authenticated `User`, or
    /// unmarks it if it's already marked.
    ///
    /// Returns whether the `Listing` is favorite after the toggle.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - the `Listing` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "toggleFavoriteListing",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn toggle_favorite_listing(
        listing_id: api::listing::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ToggleFavoriteListing {
                user_id: my_id.into(),
                listing_id: listing_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Reserves the `Listing` for the authenticated `User` within the
    /// `[startTime, endTime)` period.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_INTERVAL` - `startTime` is not before `endTime`;
    /// - `PAST_BOOKING` - `startTime` is in the past;
    /// - `BOOKING_CONFLICT` - the period overlaps another `Booking`;
    /// - `LISTING_NOT_EXISTS` - the `Listing` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            end_time = %end_time.to_rfc3339(),
            gql.name = "createBooking",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
            start_time = %start_time.to_rfc3339(),
        ),
    )]
    pub async fn create_booking(
        listing_id: api::listing::Id,
        start_time: DateTime,
        end_time: DateTime,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CreateBooking {
                listing_id: listing_id.into(),
                user_id: my_id.into(),
                start: start_time.coerce(),
                end: end_time.coerce(),
                now: DateTime::now().coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms the payment of the authenticated `User`'s pending `Booking`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` does not exist;
    /// - `FORBIDDEN` - the `Booking` is made by another `User`;
    /// - `INVALID_STATE` - the `Booking` is not pending.
    #[tracing::instrument(
        skip_all,
        fields(
            booking_id = %booking_id,
            gql.name = "confirmBookingPayment",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_booking_payment(
        booking_id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::ConfirmBookingPayment {
                booking_id: booking_id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the authenticated `User`'s `Booking` which hasn't started
    /// yet, refunding it if paid.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` does not exist;
    /// - `FORBIDDEN` - the `Booking` is made by another `User`;
    /// - `TOO_LATE` - the `Booking` has already started;
    /// - `INVALID_STATE` - the `Booking` is already cancelled.
    #[tracing::instrument(
        skip_all,
        fields(
            booking_id = %booking_id,
            gql.name = "cancelBooking",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_booking(
        booking_id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::CancelBooking {
                booking_id: booking_id.into(),
                user_id: my_id.into(),
                now: DateTime::now().coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reviews the `Listing` on behalf of the authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RATING` - `rating` is not within `1..=5`;
    /// - `LISTING_NOT_EXISTS` - the `Listing` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createReview",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
            rating = rating,
        ),
    )]
    pub async fn create_review(
        listing_id: api::listing::Id,
        rating: i32,
        comment: Option<api::review::Comment>,
        ctx: &Context,
    ) -> Result<api::Review, Error> {
        let my_id = ctx.current_session().await?.user_id;

        let rating = u8::try_from(rating)
            .ok()
            .and_then(domain::review::Rating::new)
            .ok_or_else(|| ReviewError::InvalidRating.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateReview {
                listing_id: listing_id.into(),
                author_id: my_id.into(),
                rating,
                comment: comment.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Starts monitoring a new empty `TrafficArea`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRAFFIC_AREA_NAME_OCCUPIED` - provided name is occupied by another
    ///                                  `TrafficArea`;
    /// - `ZERO_CAPACITY` - provided `maxCapacity` is not positive;
    /// - `INVALID_COORDINATES` - provided coordinates are out of range.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createTrafficArea",
            latitude = latitude,
            longitude = longitude,
            max_capacity = max_capacity,
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_traffic_area(
        name: api::traffic::Name,
        latitude: f64,
        longitude: f64,
        max_capacity: i32,
        ctx: &Context,
    ) -> Result<api::traffic::Area, Error> {
        _ = ctx.current_session().await?;

        let coordinates = domain::geo::Coordinates::new(latitude, longitude)
            .ok_or_else(|| CoordinatesError::Invalid.into())
            .map_err(ctx.error())?;
        let max_capacity = u32::try_from(max_capacity)
            .map_err(|_| TrafficError::ZeroCapacity.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateTrafficArea {
                name: name.into(),
                coordinates,
                max_capacity,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Changes the current occupancy of the `TrafficArea` by the provided
    /// `delta`, which is negative for departures.
    ///
    /// Occupancy may exceed the capacity, but never drops below zero.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRAFFIC_AREA_NOT_EXISTS` - the `TrafficArea` does not exist;
    /// - `NEGATIVE_OCCUPANCY` - the occupancy would become negative;
    /// - `OCCUPANCY_OVERFLOW` - the occupancy would become too large.
    #[tracing::instrument(
        skip_all,
        fields(
            delta = delta,
            gql.name = "adjustTrafficOccupancy",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn adjust_traffic_occupancy(
        name: api::traffic::Name,
        delta: i32,
        ctx: &Context,
    ) -> Result<api::traffic::Area, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::AdjustTrafficOccupancy {
                name: name.into(),
                delta,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum CoordinatesError {
        #[code = "INVALID_COORDINATES"]
        #[status = BAD_REQUEST]
        #[message = "Coordinates are out of range"]
        Invalid,

        #[code = "MISSING_COORDINATES"]
        #[status = BAD_REQUEST]
        #[message = "Both latitude and longitude must be provided"]
        Missing,
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the provided ID does not exist"]
        NotExists,

        #[code = "INVALID_STATE"]
        #[status = CONFLICT]
        #[message = "`Booking` status doesn't allow the operation"]
        InvalidState,

        #[code = "TOO_LATE"]
        #[status = CONFLICT]
        #[message = "`Booking` has already started"]
        TooLate,
    }
}

define_error! {
    enum ListingError {
        #[code = "LISTING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Listing` with the provided ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ReviewError {
        #[code = "INVALID_RATING"]
        #[status = BAD_REQUEST]
        #[message = "Rating must be from 1 to 5 stars"]
        InvalidRating,
    }
}

define_error! {
    enum TrafficError {
        #[code = "TRAFFIC_AREA_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`TrafficArea` with the provided name does not exist"]
        NotExists,

        #[code = "ZERO_CAPACITY"]
        #[status = BAD_REQUEST]
        #[message = "`TrafficArea` capacity must be positive"]
        ZeroCapacity,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is occupied by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "AMENITY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Amenity` with the provided ID does not exist"]
                AmenityNotExists,

                #[code = "NON_POSITIVE_RATE"]
                #[status = BAD_REQUEST]
                #[message = "Hourly rate must be positive"]
                NonPositiveRate,

                #[code = "NOT_HOST"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` must be a host"]
                NotHost,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::AmenityNotExists(_) => Error::AmenityNotExists.into(),
            Self::NonPositiveRate(_) => Error::NonPositiveRate.into(),
            Self::NotHost(_) => Error::NotHost.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for command::delete_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ListingNotExists(_) => ListingError::NotExists.into(),
            Self::NotOwner(_) => api::PrivilegeError::Forbidden.into(),
        })
    }
}

impl AsError for command::toggle_favorite_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => Some(ListingError::NotExists.into()),
        }
    }
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_CONFLICT"]
                #[status = CONFLICT]
                #[message = "`Listing` is already booked within the provided \
                             period"]
                Conflict,

                #[code = "INVALID_INTERVAL"]
                #[status = BAD_REQUEST]
                #[message = "Start time must be before end time"]
                InvalidInterval,

                #[code = "PAST_BOOKING"]
                #[status = BAD_REQUEST]
                #[message = "Start time must not be in the past"]
                PastBooking,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Conflict(_) => Error::Conflict.into(),
            Self::InvalidInterval => Error::InvalidInterval.into(),
            Self::ListingNotExists(_) => ListingError::NotExists.into(),
            Self::PastBooking => Error::PastBooking.into(),
            Self::UserNotExists(_) => return None,
        })
    }
}

impl AsError for domain::booking::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::InvalidState(_) => BookingError::InvalidState.into(),
            Self::TooLate => BookingError::TooLate.into(),
        })
    }
}

impl AsError for command::confirm_booking_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::BookingNotExists(_) => BookingError::NotExists.into(),
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::Transition(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::cancel_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::BookingNotExists(_) => BookingError::NotExists.into(),
            Self::Forbidden(_) => api::PrivilegeError::Forbidden.into(),
            Self::Transition(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::create_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => Some(ListingError::NotExists.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::create_traffic_area::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "TRAFFIC_AREA_NAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`TrafficArea` name is occupied by another one"]
                NameOccupied,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NameOccupied(_) => Error::NameOccupied.into(),
            Self::ZeroCapacity => TrafficError::ZeroCapacity.into(),
        })
    }
}

impl AsError for command::adjust_traffic_occupancy::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NEGATIVE_OCCUPANCY"]
                #[status = CONFLICT]
                #[message = "`TrafficArea` occupancy cannot become negative"]
                NegativeOccupancy,

                #[code = "OCCUPANCY_OVERFLOW"]
                #[status = BAD_REQUEST]
                #[message = "`TrafficArea` occupancy is too large"]
                OccupancyOverflow,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::AreaNotExists(_) => TrafficError::NotExists.into(),
            Self::NegativeOccupancy(_) => Error::NegativeOccupancy.into(),
            Self::OccupancyOverflow(_) => Error::OccupancyOverflow.into(),
        })
    }
}
