//! [`Command`] for reserving a [`Listing`] with a new [`Booking`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{booking, listing, user, Booking, Listing, User},
    infra::{database, Database},
    read::booking::Overlapping,
    Service,
};

use super::Command;

/// [`Command`] for reserving a [`Listing`] with a new [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct CreateBooking {
    /// ID of the [`Listing`] to be reserved.
    pub listing_id: listing::Id,

    /// ID of the [`User`] who reserves the [`Listing`].
    pub user_id: user::Id,

    /// Inclusive start of the reservation.
    pub start: booking::PeriodDateTime,

    /// Exclusive end of the reservation.
    pub end: booking::PeriodDateTime,

    /// Current moment the reservation is requested at.
    pub now: booking::PeriodDateTime,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Booking>, Overlapping>>,
            Ok = Vec<Booking>,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            listing_id,
            user_id,
            start,
            end,
            now,
        } = cmd;

        let interval = booking::Interval::new(start, end)
            .ok_or(E::InvalidInterval)
            .map_err(tracerr::wrap!())?;
        if interval.start() < now {
            return Err(tracerr::new!(E::PastBooking));
        }

        drop(
            self.database()
                .execute(Select(By::<Option<User>, _>::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        );

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize reservations of the same `Listing`.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        let overlapping = tx
            .execute(Select(By::new(Overlapping {
                listing_id,
                interval,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if overlapping.iter().any(|b| b.conflicts_with(&interval)) {
            return Err(tracerr::new!(E::Conflict(listing_id)));
        }

        let booking = Booking {
            id: booking::Id::new(),
            listing_id,
            user_id,
            interval,
            status: booking::Status::Pending,
            payment_status: booking::PaymentStatus::Unpaid,
            total_price: Booking::total_price(listing.hourly_rate, &interval),
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(booking.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_exclusion_violation() {
                    tracerr::new!(E::Conflict(listing_id))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            booking.id = %booking.id,
            listing.id = %listing_id,
            total_price = %booking.total_price,
            "`Booking` created",
        );

        Ok(booking)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Listing`] is already reserved for an overlapping interval.
    #[display("`Listing(id: {_0})` is already booked for the interval")]
    Conflict(#[error(not(source))] listing::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Reservation doesn't end after it starts.
    #[display("Booking must end after it starts")]
    InvalidInterval,

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Reservation starts in the past.
    #[display("Booking cannot start in the past")]
    PastBooking,

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{booking, listing, user},
        infra::database::memory::{self, at, usd},
        Command as _,
    };

    use super::{CreateBooking, ExecutionError};

    fn request(
        listing_id: listing::Id,
        user_id: user::Id,
        start: &str,
        end: &str,
    ) -> CreateBooking {
        CreateBooking {
            listing_id,
            user_id,
            start: at(start),
            end: at(end),
            now: at("2030-01-01T08:00"),
        }
    }

    #[tokio::test]
    async fn prices_pending_booking() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let booking = service
            .execute(request(
                listing.id,
                guest.id,
                "2030-01-01T09:00",
                "2030-01-01T11:00",
            ))
            .await
            .unwrap();

        assert_eq!(booking.total_price, usd(20));
        assert_eq!(booking.status, booking::Status::Pending);
        assert_eq!(booking.payment_status, booking::PaymentStatus::Unpaid);
        assert!(service.database().store().bookings.contains_key(&booking.id));
    }

    #[tokio::test]
    async fn rejects_overlapping_booking() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        _ = service
            .execute(request(
                listing.id,
                guest.id,
                "2030-01-01T09:00",
                "2030-01-01T11:00",
            ))
            .await
            .unwrap();

        let err = service
            .execute(request(
                listing.id,
                guest.id,
                "2030-01-01T10:30",
                "2030-01-01T12:00",
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Conflict(id) if *id == listing.id,
        ));
        assert_eq!(service.database().store().bookings.len(), 1);
    }

    #[tokio::test]
    async fn allows_touching_and_cancelled_overlaps() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        let first = service
            .execute(request(
                listing.id,
                guest.id,
                "2030-01-01T09:00",
                "2030-01-01T11:00",
            ))
            .await
            .unwrap();

        let touching = service
            .execute(request(
                listing.id,
                guest.id,
                "2030-01-01T11:00",
                "2030-01-01T12:00",
            ))
            .await;
        assert!(touching.is_ok(), "{touching:?}");

        service
            .database()
            .store()
            .bookings
            .get_mut(&first.id)
            .unwrap()
            .status = booking::Status::Cancelled;
        let replacing = service
            .execute(request(
                listing.id,
                guest.id,
                "2030-01-01T10:00",
                "2030-01-01T11:00",
            ))
            .await;
        assert!(replacing.is_ok(), "{replacing:?}");
    }

    #[tokio::test]
    async fn validates_interval() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let err = service
            .execute(request(
                listing.id,
                host.id,
                "2030-01-01T11:00",
                "2030-01-01T11:00",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidInterval));

        let err = service
            .execute(request(
                listing.id,
                host.id,
                "2030-01-01T07:00",
                "2030-01-01T09:00",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PastBooking));
    }

    #[tokio::test]
    async fn requires_existing_parties() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let stranger = user::Id::new();
        let err = service
            .execute(request(
                listing.id,
                stranger,
                "2030-01-01T09:00",
                "2030-01-01T10:00",
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::UserNotExists(id) if *id == stranger,
        ));

        let missing = listing::Id::new();
        let err = service
            .execute(request(
                missing,
                host.id,
                "2030-01-01T09:00",
                "2030-01-01T10:00",
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ListingNotExists(id) if *id == missing,
        ));
    }

    #[tokio::test]
    async fn concurrent_overlaps_admit_one() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let (alice, bob) = (
            memory::user(&service, false),
            memory::user(&service, false),
        );
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);

        let (first, second) = tokio::join!(
            service.execute(request(
                listing.id,
                alice.id,
                "2030-01-01T09:00",
                "2030-01-01T11:00",
            )),
            service.execute(request(
                listing.id,
                bob.id,
                "2030-01-01T10:00",
                "2030-01-01T12:00",
            )),
        );

        assert!(first.is_ok() ^ second.is_ok(), "{first:?} {second:?}");
        let err = first.err().or(second.err()).unwrap();
        assert!(matches!(err.as_ref(), ExecutionError::Conflict(_)));
        assert_eq!(service.database().store().bookings.len(), 1);
    }
}
