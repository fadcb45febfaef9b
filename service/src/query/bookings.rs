//! [`Query`] collection related to the multiple [`Booking`]s.

use common::operations::By;

use crate::{domain::Booking, read::booking::History};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries the [`Booking`]s history of a [`User`], latest start first.
pub type ByUser = DatabaseQuery<By<Vec<Booking>, History>>;
