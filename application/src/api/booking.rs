//! [`Booking`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, Context};

/// Reservation of a `Listing` for some period.
#[derive(Clone, Debug, From, Into)]
pub struct Booking(domain::Booking);

/// Reservation of a `Listing` for some period.
#[graphql_object(context = Context)]
impl Booking {
    /// Unique identifier of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Reserved `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.listing",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn listing(&self) -> api::Listing {
        #[expect(unsafe_code, reason = "`listing_id` is a foreign key")]
        unsafe {
            api::Listing::new_unchecked(self.0.listing_id)
        }
    }

    /// `User` who made this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.user",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn user(&self) -> api::User {
        #[expect(unsafe_code, reason = "`user_id` is a foreign key")]
        unsafe {
            api::User::new_unchecked(self.0.user_id)
        }
    }

    /// `DateTime` when this `Booking` starts, inclusively.
    #[must_use]
    pub fn start_time(&self) -> DateTime {
        self.0.interval.start().coerce()
    }

    /// `DateTime` when this `Booking` ends, exclusively.
    #[must_use]
    pub fn end_time(&self) -> DateTime {
        self.0.interval.end().coerce()
    }

    /// Lifecycle status of this `Booking`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Payment status of this `Booking`.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.0.payment_status.into()
    }

    /// Price of the whole reserved period.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.0.total_price
    }

    /// `DateTime` when this `Booking` was made.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Booking`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::booking::Id)]
#[into(domain::booking::Id)]
#[graphql(name = "BookingId", transparent)]
pub struct Id(Uuid);

/// Lifecycle status of a `Booking`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "BookingStatus")]
pub enum Status {
    /// Awaits its payment.
    Pending,

    /// Paid and confirmed.
    Confirmed,

    /// Cancelled, the period is free again.
    Cancelled,
}

impl From<domain::booking::Status> for Status {
    fn from(status: domain::booking::Status) -> Self {
        use domain::booking::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Confirmed => Self::Confirmed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

/// Payment status of a `Booking`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "BookingPaymentStatus")]
pub enum PaymentStatus {
    /// Not paid yet.
    Unpaid,

    /// Paid.
    Paid,

    /// Payment is returned.
    Refunded,
}

impl From<domain::booking::PaymentStatus> for PaymentStatus {
    fn from(status: domain::booking::PaymentStatus) -> Self {
        use domain::booking::PaymentStatus as S;
        match status {
            S::Unpaid => Self::Unpaid,
            S::Paid => Self::Paid,
            S::Refunded => Self::Refunded,
        }
    }
}
