//! Traffic [`Area`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Percent};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::geo::Coordinates;

/// Public parking area with a tracked occupancy.
#[derive(Clone, Debug)]
pub struct Area {
    /// ID of this [`Area`].
    pub id: Id,

    /// Unique [`Name`] of this [`Area`].
    pub name: Name,

    /// [`Coordinates`] of this [`Area`].
    pub coordinates: Coordinates,

    /// Number of vehicles this [`Area`] is designed for.
    pub max_capacity: u32,

    /// Number of vehicles currently parked in this [`Area`].
    ///
    /// May exceed the [`Area::max_capacity`].
    pub current_occupancy: u32,

    /// [`DateTime`] when this [`Area`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when the occupancy of this [`Area`] was last changed.
    pub updated_at: ModificationDateTime,
}

impl Area {
    /// Classifies the current congestion [`Status`] of this [`Area`].
    #[must_use]
    pub fn status(&self) -> Status {
        Status::classify(self.current_occupancy, self.max_capacity)
    }

    /// Indicates whether drivers heading to this [`Area`] should be
    /// suggested another parking.
    #[must_use]
    pub fn should_reroute(&self) -> bool {
        self.status().should_reroute()
    }

    /// Returns the occupancy of this [`Area`] after applying the provided
    /// `delta` of vehicles.
    ///
    /// Occupancy above the [`Area::max_capacity`] is allowed.
    ///
    /// # Errors
    ///
    /// - With [`AdjustmentError::Negative`] if the occupancy would drop below
    ///   zero.
    /// - With [`AdjustmentError::Overflow`] if the occupancy would exceed
    ///   [`u32::MAX`].
    pub fn adjusted_occupancy(
        &self,
        delta: i32,
    ) -> Result<u32, AdjustmentError> {
        self.current_occupancy.checked_add_signed(delta).ok_or(
            if delta < 0 {
                AdjustmentError::Negative
            } else {
                AdjustmentError::Overflow
            },
        )
    }
}

/// Error of adjusting an [`Area`] occupancy.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum AdjustmentError {
    /// Occupancy would become negative.
    #[display("occupancy cannot become negative")]
    Negative,

    /// Occupancy would exceed the representable maximum.
    #[display("occupancy cannot exceed `{}`", u32::MAX)]
    Overflow,
}

/// Congestion status of an [`Area`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Status {
    /// Congestion [`Level`].
    pub level: Level,

    /// [`Color`] the [`Level`] is displayed with.
    pub color: Color,

    /// Occupied share of the capacity.
    pub percentage: Percent,

    /// Indicates whether the capacity is exhausted.
    pub is_full: bool,
}

impl Status {
    /// [`Percent`] at which an [`Area`] is considered [`Level::Medium`].
    pub const MEDIUM: u8 = 50;

    /// [`Percent`] at which an [`Area`] is considered [`Level::High`].
    pub const HIGH: u8 = 80;

    /// [`Percent`] at which an [`Area`] is considered [`Level::Blocked`].
    pub const BLOCKED: u8 = 100;

    /// [`Percent`] starting from which drivers are suggested another
    /// parking.
    pub const REROUTE: u8 = 75;

    /// Classifies the provided `occupancy` of the provided `capacity`.
    ///
    /// Zero `capacity` is classified as an empty [`Level::Low`] one.
    #[must_use]
    pub fn classify(occupancy: u32, capacity: u32) -> Self {
        let percentage = Percent::of(occupancy, capacity);
        let level = if percentage.reaches(Self::BLOCKED) {
            Level::Blocked
        } else if percentage.reaches(Self::HIGH) {
            Level::High
        } else if percentage.reaches(Self::MEDIUM) {
            Level::Medium
        } else {
            Level::Low
        };
        Self {
            level,
            color: level.color(),
            percentage,
            is_full: percentage.reaches(Self::BLOCKED),
        }
    }

    /// Returns the [`Status`] of an [`Area`] nothing is known about.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            level: Level::Unknown,
            color: Color::Gray,
            percentage: Percent::ZERO,
            is_full: false,
        }
    }

    /// Indicates whether drivers should be suggested another parking.
    ///
    /// Triggers before the [`Level::Blocked`] one is reached.
    #[must_use]
    pub fn should_reroute(&self) -> bool {
        self.percentage.reaches(Self::REROUTE) || self.is_full
    }
}

define_kind! {
    #[doc = "Congestion level of an [`Area`]."]
    enum Level {
        #[doc = "Less than a half of the capacity is occupied."]
        Low = 1,

        #[doc = "At least a half of the capacity is occupied."]
        Medium = 2,

        #[doc = "Most of the capacity is occupied."]
        High = 3,

        #[doc = "The whole capacity is occupied."]
        Blocked = 4,

        #[doc = "Nothing is known about the [`Area`]."]
        Unknown = 5,
    }
}

impl Level {
    /// Returns the [`Color`] this [`Level`] is displayed with.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Low => Color::Green,
            Self::Medium => Color::Yellow,
            Self::High => Color::Orange,
            Self::Blocked => Color::Red,
            Self::Unknown => Color::Gray,
        }
    }
}

define_kind! {
    #[doc = "Display color of a congestion [`Level`]."]
    enum Color {
        #[doc = "[`Level::Low`] color."]
        Green = 1,

        #[doc = "[`Level::Medium`] color."]
        Yellow = 2,

        #[doc = "[`Level::High`] color."]
        Orange = 3,

        #[doc = "[`Level::Blocked`] color."]
        Red = 4,

        #[doc = "[`Level::Unknown`] color."]
        Gray = 5,
    }
}

/// ID of an [`Area`].
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

/// Name of an [`Area`], unique regardless of its case.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Indicates whether this [`Name`] denotes the same [`Area`] as the
    /// provided `other` one.
    #[must_use]
    pub fn matches(&self, other: impl AsRef<str>) -> bool {
        self.0.to_lowercase() == other.as_ref().trim().to_lowercase()
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 100
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// [`DateTime`] when an [`Area`] was created.
pub type CreationDateTime = DateTimeOf<(Area, unit::Creation)>;

/// [`DateTime`] when an [`Area`] occupancy was changed.
pub type ModificationDateTime = DateTimeOf<(Area, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{AdjustmentError, Area, Color, Id, Level, Name, Status};
    use crate::domain::geo::Coordinates;

    fn area(max_capacity: u32, current_occupancy: u32) -> Area {
        Area {
            id: Id::new(),
            name: Name::new("Harbor").unwrap(),
            coordinates: Coordinates::new(40.7, -74.0).unwrap(),
            max_capacity,
            current_occupancy,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn adjusts_occupancy_within_bounds() {
        let a = area(10, 3);

        assert_eq!(a.adjusted_occupancy(9), Ok(12));
        assert_eq!(a.adjusted_occupancy(-3), Ok(0));
        assert_eq!(a.adjusted_occupancy(-4), Err(AdjustmentError::Negative));

        let full = area(10, u32::MAX - 1);
        assert_eq!(full.adjusted_occupancy(1), Ok(u32::MAX));
        assert_eq!(full.adjusted_occupancy(2), Err(AdjustmentError::Overflow));
    }

    #[test]
    fn classifies_by_thresholds() {
        for (occupancy, level, color) in [
            (0, Level::Low, Color::Green),
            (49, Level::Low, Color::Green),
            (50, Level::Medium, Color::Yellow),
            (79, Level::Medium, Color::Yellow),
            (80, Level::High, Color::Orange),
            (99, Level::High, Color::Orange),
            (100, Level::Blocked, Color::Red),
            (130, Level::Blocked, Color::Red),
        ] {
            let status = Status::classify(occupancy, 100);
            assert_eq!(status.level, level, "occupancy: {occupancy}");
            assert_eq!(status.color, color, "occupancy: {occupancy}");
            assert_eq!(status.is_full, occupancy >= 100);
        }
    }

    #[test]
    fn high_occupancy_reroutes() {
        let status = Status::classify(85, 100);

        assert_eq!(status.level, Level::High);
        assert_eq!(status.color, Color::Orange);
        assert_eq!(status.percentage.to_string(), "85");
        assert!(!status.is_full);
        assert!(status.should_reroute());
    }

    #[test]
    fn reroutes_from_three_quarters() {
        assert!(!Status::classify(74, 100).should_reroute());
        assert!(Status::classify(75, 100).should_reroute());
        assert!(Status::classify(3, 4).should_reroute());
        assert!(!Status::classify(2, 3).should_reroute());
    }

    #[test]
    fn zero_capacity_is_low() {
        let status = Status::classify(10, 0);

        assert_eq!(status.level, Level::Low);
        assert_eq!(status.color, Color::Green);
        assert_eq!(status.percentage.to_string(), "0");
        assert!(!status.is_full);
        assert!(!status.should_reroute());
    }

    #[test]
    fn unknown_is_gray() {
        let status = Status::unknown();

        assert_eq!(status.level, Level::Unknown);
        assert_eq!(status.color, Color::Gray);
        assert_eq!(status.percentage.to_string(), "0");
        assert!(!status.is_full);
        assert!(!status.should_reroute());
    }

    #[test]
    fn classification_is_pure() {
        assert_eq!(Status::classify(42, 60), Status::classify(42, 60));
        assert_eq!(Status::classify(7, 10), Status::classify(70, 100));
    }
}
