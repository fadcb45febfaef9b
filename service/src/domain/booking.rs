//! [`Booking`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{listing, user};
#[cfg(doc)]
use crate::domain::{Listing, User};

/// Reservation of a [`Listing`] made by a [`User`] for some [`Interval`].
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the reserved [`Listing`].
    pub listing_id: listing::Id,

    /// ID of the [`User`] who made this [`Booking`].
    pub user_id: user::Id,

    /// [`Interval`] reserved by this [`Booking`].
    pub interval: Interval,

    /// [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`PaymentStatus`] of this [`Booking`].
    pub payment_status: PaymentStatus,

    /// Price of the whole [`Interval`], fixed at the moment of creation.
    pub total_price: Money,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

impl Booking {
    /// Calculates the total price of reserving the provided [`Interval`] at
    /// the provided hourly rate.
    #[must_use]
    pub fn total_price(hourly_rate: Money, interval: &Interval) -> Money {
        (hourly_rate * interval.hours()).round()
    }

    /// Indicates whether this [`Booking`] still holds its [`Interval`].
    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.status != Status::Cancelled
    }

    /// Indicates whether this [`Booking`] prevents the provided [`Interval`]
    /// of the same [`Listing`] from being reserved.
    #[must_use]
    pub fn conflicts_with(&self, interval: &Interval) -> bool {
        self.is_holding() && self.interval.overlaps(interval)
    }

    /// Indicates whether this [`Booking`] occupies its [`Listing`] at the
    /// provided moment.
    #[must_use]
    pub fn is_active_at(&self, at: PeriodDateTime) -> bool {
        self.is_holding() && self.interval.contains(at)
    }

    /// Confirms the payment of this [`Booking`].
    ///
    /// # Errors
    ///
    /// With [`TransitionError::InvalidState`] if this [`Booking`] is not
    /// [`Status::Pending`] anymore.
    pub fn confirm_payment(&mut self) -> Result<(), TransitionError> {
        if self.status != Status::Pending {
            return Err(TransitionError::InvalidState(self.status));
        }
        self.status = Status::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        Ok(())
    }

    /// Cancels this [`Booking`] at the provided moment, refunding it
    /// unconditionally.
    ///
    /// # Errors
    ///
    /// - With [`TransitionError::TooLate`] if the [`Interval`] has already
    ///   started at `now`.
    /// - With [`TransitionError::InvalidState`] if this [`Booking`] is
    ///   [`Status::Cancelled`] already.
    pub fn cancel(
        &mut self,
        now: PeriodDateTime,
    ) -> Result<(), TransitionError> {
        if self.interval.start() <= now {
            return Err(TransitionError::TooLate);
        }
        if self.status == Status::Cancelled {
            return Err(TransitionError::InvalidState(self.status));
        }
        self.status = Status::Cancelled;
        self.payment_status = PaymentStatus::Refunded;
        Ok(())
    }
}

/// Error of a [`Booking`] lifecycle transition.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq)]
pub enum TransitionError {
    /// [`Booking`] is not in a [`Status`] allowing the transition.
    #[display("`Booking` is `{_0}`")]
    InvalidState(#[error(not(source))] Status),

    /// [`Booking`] has already started.
    #[display("`Booking` has already started")]
    TooLate,
}

/// ID of a [`Booking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Half-open `[start, end)` time interval reserved by a [`Booking`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval {
    /// [`DateTime`] this [`Interval`] starts at, inclusively.
    start: PeriodDateTime,

    /// [`DateTime`] this [`Interval`] ends at, exclusively.
    end: PeriodDateTime,
}

impl Interval {
    /// Creates a new [`Interval`] if the `start` is strictly before the `end`.
    #[must_use]
    pub fn new(start: PeriodDateTime, end: PeriodDateTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Creates a new [`Interval`] without checking its bounds.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the `start` is strictly before the `end`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(
        start: PeriodDateTime,
        end: PeriodDateTime,
    ) -> Self {
        Self { start, end }
    }

    /// Returns the inclusive start of this [`Interval`].
    #[must_use]
    pub const fn start(&self) -> PeriodDateTime {
        self.start
    }

    /// Returns the exclusive end of this [`Interval`].
    #[must_use]
    pub const fn end(&self) -> PeriodDateTime {
        self.end
    }

    /// Indicates whether this [`Interval`] shares any moment with the
    /// `other` one.
    ///
    /// Touching endpoints do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        other.end > self.start && other.start < self.end
    }

    /// Indicates whether the provided moment lies within this [`Interval`].
    #[must_use]
    pub fn contains(&self, at: PeriodDateTime) -> bool {
        self.start <= at && at < self.end
    }

    /// Returns the [`Duration`] of this [`Interval`].
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns the exact number of hours this [`Interval`] lasts.
    #[must_use]
    pub fn hours(&self) -> Decimal {
        let duration = self.duration();
        let micros = Decimal::from(duration.as_secs())
            * Decimal::from(1_000_000)
            + Decimal::from(duration.subsec_micros());
        micros / Decimal::from(3_600_000_000_u64)
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Booking`]."]
    enum Status {
        #[doc = "[`Booking`] awaits its payment."]
        Pending = 1,

        #[doc = "[`Booking`] is paid and confirmed."]
        Confirmed = 2,

        #[doc = "[`Booking`] is cancelled."]
        Cancelled = 3,
    }
}

define_kind! {
    #[doc = "Payment status of a [`Booking`]."]
    enum PaymentStatus {
        #[doc = "[`Booking`] is not paid yet."]
        Unpaid = 1,

        #[doc = "[`Booking`] is paid."]
        Paid = 2,

        #[doc = "Payment of a [`Booking`] is returned."]
        Refunded = 3,
    }
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

/// [`DateTime`] bounding an [`Interval`].
pub type PeriodDateTime = DateTimeOf<Interval>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime, Money};
    use rust_decimal::Decimal;

    use super::{
        Booking, Id, Interval, PaymentStatus, PeriodDateTime, Status,
        TransitionError,
    };
    use crate::domain::{listing, user};

    fn at(s: &str) -> PeriodDateTime {
        DateTime::parse(s).unwrap().coerce()
    }

    fn interval(start: &str, end: &str) -> Interval {
        Interval::new(at(start), at(end)).unwrap()
    }

    fn usd(amount: i64) -> Money {
        Money::new(Decimal::from(amount), Currency::Usd)
    }

    fn booking(interval: Interval) -> Booking {
        Booking {
            id: Id::new(),
            listing_id: listing::Id::new(),
            user_id: user::Id::new(),
            interval,
            status: Status::Pending,
            payment_status: PaymentStatus::Unpaid,
            total_price: Booking::total_price(usd(10), &interval),
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn interval_requires_start_before_end() {
        let t = at("2030-01-01T09:00");
        assert!(Interval::new(t, t).is_none());
        assert!(Interval::new(at("2030-01-01T10:00"), t).is_none());
        assert!(Interval::new(t, at("2030-01-01T09:01")).is_some());
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let first = interval("2030-01-01T09:00", "2030-01-01T11:00");
        let second = interval("2030-01-01T11:00", "2030-01-01T12:00");

        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn overlap_is_symmetric() {
        let first = interval("2030-01-01T09:00", "2030-01-01T11:00");
        for (start, end) in [
            ("2030-01-01T10:30", "2030-01-01T12:00"),
            ("2030-01-01T08:00", "2030-01-01T09:01"),
            ("2030-01-01T09:30", "2030-01-01T10:00"),
            ("2030-01-01T08:00", "2030-01-01T12:00"),
        ] {
            let other = interval(start, end);
            assert!(first.overlaps(&other), "{start}..{end}");
            assert!(other.overlaps(&first), "{start}..{end}");
        }
    }

    #[test]
    fn prices_by_hours() {
        let b = booking(interval("2030-01-01T09:00", "2030-01-01T11:00"));

        assert_eq!(b.total_price, usd(20));
        assert_eq!(b.status, Status::Pending);
        assert_eq!(b.payment_status, PaymentStatus::Unpaid);

        let rate = Money::new(Decimal::new(999, 2), Currency::Usd);
        let twenty_minutes =
            interval("2030-01-01T09:00", "2030-01-01T09:20");
        assert_eq!(
            Booking::total_price(rate, &twenty_minutes).amount,
            Decimal::new(333, 2),
        );
    }

    #[test]
    fn conflicts_ignore_cancelled() {
        let mut b = booking(interval("2030-01-01T09:00", "2030-01-01T11:00"));
        let requested = interval("2030-01-01T10:30", "2030-01-01T12:00");
        assert!(b.conflicts_with(&requested));

        b.cancel(at("2029-12-31T00:00")).unwrap();
        assert!(!b.conflicts_with(&requested));
    }

    #[test]
    fn confirms_payment_once() {
        let mut b = booking(interval("2030-01-01T09:00", "2030-01-01T11:00"));

        b.confirm_payment().unwrap();
        assert_eq!(b.status, Status::Confirmed);
        assert_eq!(b.payment_status, PaymentStatus::Paid);

        assert_eq!(
            b.confirm_payment(),
            Err(TransitionError::InvalidState(Status::Confirmed)),
        );
        assert_eq!(b.status, Status::Confirmed);
        assert_eq!(b.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn cancels_and_refunds() {
        let mut b = booking(interval("2030-01-01T09:00", "2030-01-01T11:00"));
        b.confirm_payment().unwrap();

        b.cancel(at("2030-01-01T08:59")).unwrap();
        assert_eq!(b.status, Status::Cancelled);
        assert_eq!(b.payment_status, PaymentStatus::Refunded);

        assert_eq!(
            b.cancel(at("2030-01-01T08:59")),
            Err(TransitionError::InvalidState(Status::Cancelled)),
        );
        assert_eq!(
            b.confirm_payment(),
            Err(TransitionError::InvalidState(Status::Cancelled)),
        );
    }

    #[test]
    fn cannot_cancel_started() {
        let mut b = booking(interval("2030-01-01T09:00", "2030-01-01T11:00"));

        for now in ["2030-01-01T09:00", "2030-01-01T10:00", "2030-01-02T00:00"]
        {
            assert_eq!(b.cancel(at(now)), Err(TransitionError::TooLate));
            assert_eq!(b.status, Status::Pending);
            assert_eq!(b.payment_status, PaymentStatus::Unpaid);
        }
    }

    #[test]
    fn active_within_interval_only() {
        let b = booking(interval("2030-01-01T09:00", "2030-01-01T11:00"));

        assert!(!b.is_active_at(at("2030-01-01T08:59")));
        assert!(b.is_active_at(at("2030-01-01T09:00")));
        assert!(b.is_active_at(at("2030-01-01T10:59")));
        assert!(!b.is_active_at(at("2030-01-01T11:00")));
    }
}
