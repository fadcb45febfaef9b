//! [`Review`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{listing, user};
#[cfg(doc)]
use crate::domain::{Listing, User};

/// Feedback left by a [`User`] on a [`Listing`].
///
/// Reviews are never updated once created.
#[derive(Clone, Debug)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: Id,

    /// ID of the reviewed [`Listing`].
    pub listing_id: listing::Id,

    /// ID of the [`User`] who authored this [`Review`].
    pub author_id: user::Id,

    /// [`Rating`] given by this [`Review`].
    pub rating: Rating,

    /// [`Comment`] of this [`Review`], if any.
    pub comment: Option<Comment>,

    /// [`DateTime`] when this [`Review`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Review`].
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
    PartialEq,
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

/// Rating of a [`Review`], from `1` to `5` stars.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rating(u8);

impl Rating {
    /// Lowest possible [`Rating`].
    pub const MIN: u8 = 1;

    /// Highest possible [`Rating`].
    pub const MAX: u8 = 5;

    /// Creates a new [`Rating`] if the given `stars` are within
    /// [`Rating::MIN`]`..=`[`Rating::MAX`].
    #[must_use]
    pub fn new(stars: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&stars).then_some(Self(stars))
    }

    /// Returns the number of stars of this [`Rating`].
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl FromStr for Rating {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Rating`")
    }
}

/// Comment of a [`Review`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(str, String)]
pub struct Comment(String);

impl Comment {
    /// Creates a new [`Comment`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Comment`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.len() <= 2048
    }
}

impl FromStr for Comment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Comment`")
    }
}

/// [`DateTime`] when a [`Review`] was created.
pub type CreationDateTime = DateTimeOf<(Review, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Comment, Rating};

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert_eq!(Rating::new(1).map(Rating::stars), Some(1));
        assert_eq!(Rating::new(5).map(Rating::stars), Some(5));
        assert!(Rating::new(6).is_none());
        assert!("3".parse::<Rating>().is_ok());
        assert!("9".parse::<Rating>().is_err());
    }

    #[test]
    fn comment_must_not_be_blank() {
        assert!(Comment::new("Great spot").is_some());
        assert!(Comment::new("   ").is_none());
        assert!(Comment::new("").is_none());
    }
}
