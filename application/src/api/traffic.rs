//! Traffic-related definitions.

use common::{DateTime, Percent};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Monitored area with a limited parking capacity.
#[derive(Clone, Debug, From, Into)]
pub struct Area(domain::traffic::Area);

/// Monitored area with a limited parking capacity.
#[graphql_object(name = "TrafficArea", context = Context)]
impl Area {
    /// Unique identifier of this `TrafficArea`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Unique name of this `TrafficArea`.
    #[must_use]
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Latitude of this `TrafficArea` center, in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.0.coordinates.latitude.degrees()
    }

    /// Longitude of this `TrafficArea` center, in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.0.coordinates.longitude.degrees()
    }

    /// Number of vehicles this `TrafficArea` fits.
    ///
    /// # Errors
    ///
    /// If the capacity doesn't fit into GraphQL `Int`.
    pub fn max_capacity(&self, ctx: &Context) -> Result<i32, Error> {
        i32::try_from(self.0.max_capacity)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Number of vehicles currently parked in this `TrafficArea`.
    ///
    /// # Errors
    ///
    /// If the occupancy doesn't fit into GraphQL `Int`.
    pub fn current_occupancy(&self, ctx: &Context) -> Result<i32, Error> {
        i32::try_from(self.0.current_occupancy)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Current congestion `TrafficStatus` of this `TrafficArea`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status().into()
    }

    /// `DateTime` when the occupancy of this `TrafficArea` was last changed.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Congestion status of a traffic area.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Status(domain::traffic::Status);

/// Congestion status of a `TrafficArea`.
#[graphql_object(name = "TrafficStatus", context = Context)]
impl Status {
    /// Congestion level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.0.level.into()
    }

    /// Color the congestion level is displayed with.
    #[must_use]
    pub fn color(&self) -> Color {
        self.0.color.into()
    }

    /// Occupied share of the capacity.
    #[must_use]
    pub fn percentage(&self) -> Percent {
        self.0.percentage
    }

    /// Indicator whether the capacity is exhausted.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.is_full
    }

    /// Indicator whether drivers should be suggested another parking.
    #[must_use]
    pub fn should_reroute(&self) -> bool {
        self.0.should_reroute()
    }
}

/// Traffic in a searched location.
#[derive(Clone, Debug, From, Into)]
pub struct Congestion(query::listings::Traffic);

/// Traffic in a location of a `Listing`s search.
#[graphql_object(name = "LocationTraffic", context = Context)]
impl Congestion {
    /// `TrafficArea` matched by the searched location.
    #[must_use]
    pub fn area(&self) -> Area {
        self.0.area.clone().into()
    }

    /// Current `TrafficStatus` of the matched `TrafficArea`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `Listing`s nearby the matched `TrafficArea` to park at instead.
    ///
    /// Empty unless the `TrafficStatus` suggests rerouting.
    #[must_use]
    pub fn suggestions(&self) -> Vec<api::listing::Nearby> {
        self.0.suggestions.iter().cloned().map(Into::into).collect()
    }
}

/// Unique identifier of a `TrafficArea`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::traffic::Id)]
#[into(domain::traffic::Id)]
#[graphql(name = "TrafficAreaId", transparent)]
pub struct Id(Uuid);

/// Unique name of a `TrafficArea`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TrafficAreaName",
    with = scalar::Via::<domain::traffic::Name>,
)]
pub struct Name(domain::traffic::Name);

/// Congestion level of a `TrafficArea`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "TrafficLevel")]
pub enum Level {
    /// Less than a half of the capacity is occupied.
    Low,

    /// At least a half of the capacity is occupied.
    Medium,

    /// Most of the capacity is occupied.
    High,

    /// The whole capacity is occupied.
    Blocked,

    /// Nothing is known about the area.
    Unknown,
}

impl From<domain::traffic::Level> for Level {
    fn from(level: domain::traffic::Level) -> Self {
        use domain::traffic::Level as L;
        match level {
            L::Low => Self::Low,
            L::Medium => Self::Medium,
            L::High => Self::High,
            L::Blocked => Self::Blocked,
            L::Unknown => Self::Unknown,
        }
    }
}

/// Display color of a `TrafficLevel`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "TrafficColor")]
pub enum Color {
    /// `LOW` level color.
    Green,

    /// `MEDIUM` level color.
    Yellow,

    /// `HIGH` level color.
    Orange,

    /// `BLOCKED` level color.
    Red,

    /// `UNKNOWN` level color.
    Gray,
}

impl From<domain::traffic::Color> for Color {
    fn from(color: domain::traffic::Color) -> Self {
        use domain::traffic::Color as C;
        match color {
            C::Green => Self::Green,
            C::Yellow => Self::Yellow,
            C::Orange => Self::Orange,
            C::Red => Self::Red,
            C::Gray => Self::Gray,
        }
    }
}
