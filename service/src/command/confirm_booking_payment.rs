//! [`Command`] for confirming a [`Booking`] payment.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{booking::Status, User};
use crate::{
    domain::{booking, user, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for confirming a [`Booking`] payment.
///
/// No real payment is processed, the [`Booking`] is just marked as paid.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmBookingPayment {
    /// ID of the [`Booking`] to be confirmed.
    pub booking_id: booking::Id,

    /// ID of the [`User`] who pays for the [`Booking`].
    pub user_id: user::Id,
}

impl<Db> Command<ConfirmBookingPayment> for Service<Db>
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

    async fn execute(
        &self,
        cmd: ConfirmBookingPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmBookingPayment {
            booking_id,
            user_id,
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

        booking
            .confirm_payment()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(booking.id = %booking.id, "`Booking` paid");

        Ok(booking)
    }
}

/// Error of [`ConfirmBookingPayment`] [`Command`] execution.
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

    /// [`Booking`] is not [`Status::Pending`].
    #[display("Cannot confirm: {_0}")]
    Transition(booking::TransitionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::booking,
        infra::database::memory::{self, usd},
        Command as _,
    };

    use super::{ConfirmBookingPayment, ExecutionError};

    #[tokio::test]
    async fn confirms_only_once() {
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
        let cmd = ConfirmBookingPayment {
            booking_id: booking.id,
            user_id: guest.id,
        };

        let confirmed = service.execute(cmd).await.unwrap();
        assert_eq!(confirmed.status, booking::Status::Confirmed);
        assert_eq!(confirmed.payment_status, booking::PaymentStatus::Paid);

        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(booking::TransitionError::InvalidState(
                booking::Status::Confirmed,
            )),
        ));
    }

    #[tokio::test]
    async fn only_owner_confirms() {
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
            .execute(ConfirmBookingPayment {
                booking_id: booking.id,
                user_id: host.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
        assert_eq!(
            service.database().store().bookings[&booking.id].status,
            booking::Status::Pending,
        );
    }
}
