//! [`Command`] for cancelling a [`Booking`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{booking, user, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`Booking`] before it starts.
///
/// The [`Booking`] is refunded regardless of whether it was paid.
#[derive(Clone, Copy, Debug)]
pub struct CancelBooking {
    /// ID of the [`Booking`] to be cancelled.
    pub booking_id: booking::Id,

    /// ID of the [`User`] who cancels the [`Booking`].
    pub user_id: user::Id,

    /// Current moment the cancellation is requested at.
    pub now: booking::PeriodDateTime,
}

impl<Db> Command<CancelBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelBooking {
            booking_id,
            user_id,
            now,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent transitions of the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;
        if booking.user_id != user_id {
            return Err(tracerr::new!(E::Forbidden(user_id)));
        }

        booking.cancel(now).map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(booking.id = %booking.id, "`Booking` cancelled");

        Ok(booking)
    }
}

/// Error of [`CancelBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] doesn't own the [`Booking`].
    #[display("`User(id: {_0})` doesn't own the `Booking`")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] user::Id),

    /// [`Booking`] has already started or is cancelled already.
    #[display("Cannot cancel: {_0}")]
    Transition(booking::TransitionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{booking, user},
        infra::database::memory::{self, at, usd},
        Command as _,
    };

    use super::{CancelBooking, ExecutionError};

    #[tokio::test]
    async fn refunds_cancelled_booking() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        let booking = memory::booking(
            &service,
            &listing,
            guest.id,
            ("2030-01-01T09:00", "2030-01-01T11:00"),
        );

        let cancelled = service
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: guest.id,
                now: at("2030-01-01T08:00"),
            })
            .await
            .unwrap();

        assert_eq!(cancelled.status, booking::Status::Cancelled);
        assert_eq!(cancelled.payment_status, booking::PaymentStatus::Refunded);

        let err = service
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: guest.id,
                now: at("2030-01-01T08:30"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(booking::TransitionError::InvalidState(
                booking::Status::Cancelled,
            )),
        ));
    }

    #[tokio::test]
    async fn started_booking_is_too_late() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        let booking = memory::booking(
            &service,
            &listing,
            guest.id,
            ("2030-01-01T09:00", "2030-01-01T11:00"),
        );

        let err = service
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: guest.id,
                now: at("2030-01-01T09:30"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(booking::TransitionError::TooLate),
        ));
        let stored = service.database().store().bookings[&booking.id].clone();
        assert_eq!(stored.status, booking::Status::Pending);
        assert_eq!(stored.payment_status, booking::PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn only_owner_cancels() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let listing =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        let booking = memory::booking(
            &service,
            &listing,
            guest.id,
            ("2030-01-01T09:00", "2030-01-01T11:00"),
        );

        let err = service
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: host.id,
                now: at("2030-01-01T08:00"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Forbidden(id) if *id == host.id,
        ));

        let missing = booking::Id::new();
        let err = service
            .execute(CancelBooking {
                booking_id: missing,
                user_id: user::Id::new(),
                now: at("2030-01-01T08:00"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::BookingNotExists(id) if *id == missing,
        ));
    }
}
