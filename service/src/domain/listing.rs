//! [`Listing`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{amenity, geo::Coordinates, user};
#[cfg(doc)]
use crate::domain::{Amenity, Booking, Review, User};

/// Parking spot offered by a host.
///
/// Owns its [`Booking`]s and [`Review`]s, so they are removed along with it.
#[derive(Clone, Debug)]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// ID of the host [`User`] owning this [`Listing`].
    pub host_id: user::Id,

    /// [`Title`] of this [`Listing`].
    pub title: Title,

    /// [`Location`] of this [`Listing`].
    pub location: Location,

    /// [`Description`] of this [`Listing`], if any.
    pub description: Option<Description>,

    /// Price of a single hour of parking.
    ///
    /// Always positive.
    pub hourly_rate: Money,

    /// Geographic [`Coordinates`] of this [`Listing`], if known.
    pub coordinates: Option<Coordinates>,

    /// IDs of the [`Amenity`]s this [`Listing`] offers.
    pub amenities: Vec<amenity::Id>,

    /// [`DateTime`] when this [`Listing`] was created.
    pub created_at: CreationDateTime,
}

impl Listing {
    /// Indicates whether the provided [`User`] owns this [`Listing`].
    #[must_use]
    pub fn is_owned_by(&self, user_id: user::Id) -> bool {
        self.host_id == user_id
    }
}

/// ID of a [`Listing`].
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

/// Title of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(str, String)]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `title` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title && !title.is_empty() && title.len() <= 100
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Human-readable location (address, district, landmark) of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(str, String)]
pub struct Location(String);

impl Location {
    /// Creates a new [`Location`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `location` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Creates a new [`Location`] if the given `location` is valid.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Option<Self> {
        let location = location.into();
        Self::check(&location).then_some(Self(location))
    }

    /// Checks whether the given `location` is a valid [`Location`].
    fn check(location: impl AsRef<str>) -> bool {
        let location = location.as_ref();
        location.trim() == location
            && !location.is_empty()
            && location.len() <= 200
    }
}

impl FromStr for Location {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Location`")
    }
}

/// Free-form description of a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(str, String)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Description`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.len() <= 4096
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Mark of a [`User`] keeping a [`Listing`] among favorites.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Favorite {
    /// ID of the [`User`] who favors the [`Listing`].
    pub user_id: user::Id,

    /// ID of the favored [`Listing`].
    pub listing_id: Id,
}

/// [`DateTime`] when a [`Listing`] was created.
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;
