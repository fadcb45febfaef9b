//! [`Amenity`] definitions.

use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Listing;

/// Feature a [`Listing`] may offer (EV charging, CCTV, etc).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Amenity {
    /// ID of this [`Amenity`].
    pub id: Id,

    /// [`Name`] of this [`Amenity`].
    pub name: Name,
}

/// ID of an [`Amenity`].
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

/// Name of an [`Amenity`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(str, String)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        (name.trim() == name && !name.is_empty() && name.len() <= 64)
            .then_some(Self(name))
    }
}
