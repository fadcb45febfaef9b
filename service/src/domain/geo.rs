//! Geographic definitions.

use std::{cmp::Ordering, str::FromStr};

use derive_more::Display;
use geo::{Distance as _, HaversineMeasure, Point};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Mean radius of the Earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude in degrees.
#[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Latitude(f64);

impl Latitude {
    /// Creates a new [`Latitude`] if the given `degrees` lie within
    /// `-90..=90`.
    #[must_use]
    pub fn new(degrees: f64) -> Option<Self> {
        (-90.0..=90.0).contains(&degrees).then_some(Self(degrees))
    }

    /// Creates a new [`Latitude`] without checking its range.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `degrees` lie within `-90..=90`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(degrees: f64) -> Self {
        Self(degrees)
    }

    /// Returns the degrees of this [`Latitude`].
    #[must_use]
    pub const fn degrees(self) -> f64 {
        self.0
    }
}

impl FromStr for Latitude {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Latitude`")
    }
}

/// Longitude in degrees.
#[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Longitude(f64);

impl Longitude {
    /// Creates a new [`Longitude`] if the given `degrees` lie within
    /// `-180..=180`.
    #[must_use]
    pub fn new(degrees: f64) -> Option<Self> {
        (-180.0..=180.0).contains(&degrees).then_some(Self(degrees))
    }

    /// Creates a new [`Longitude`] without checking its range.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `degrees` lie within
    /// `-180..=180`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(degrees: f64) -> Self {
        Self(degrees)
    }

    /// Returns the degrees of this [`Longitude`].
    #[must_use]
    pub const fn degrees(self) -> f64 {
        self.0
    }
}

impl FromStr for Longitude {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Longitude`")
    }
}

/// Point on the Earth surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    /// [`Latitude`] of this point.
    pub latitude: Latitude,

    /// [`Longitude`] of this point.
    pub longitude: Longitude,
}

impl Coordinates {
    /// Creates new [`Coordinates`] out of raw degrees, if they are in range.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        Some(Self {
            latitude: Latitude::new(latitude)?,
            longitude: Longitude::new(longitude)?,
        })
    }

    /// Calculates the great-circle distance to the `other` point using the
    /// haversine formula over a sphere of [`EARTH_RADIUS_KM`].
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> Kilometers {
        let meters = HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0)
            .distance(Point::from(*self), Point::from(*other));
        Kilometers(meters / 1000.0)
    }
}

impl From<Coordinates> for Point {
    fn from(c: Coordinates) -> Self {
        Self::new(c.longitude.degrees(), c.latitude.degrees())
    }
}

/// Non-negative distance in kilometers.
#[derive(Clone, Copy, Debug, Display, PartialEq, PartialOrd)]
pub struct Kilometers(f64);

impl Kilometers {
    /// Radius used to look for nearby parking by default.
    pub const DEFAULT_RADIUS: Self = Self(5.0);

    /// Creates new [`Kilometers`] if the given `value` is finite and not
    /// negative.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    /// Returns the raw value of these [`Kilometers`].
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Compares these [`Kilometers`] with the `other` ones, treating them as
    /// totally ordered.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl FromStr for Kilometers {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Kilometers`")
    }
}

/// Item found near some point.
#[derive(Clone, Debug)]
pub struct Nearby<T> {
    /// Found item.
    pub item: T,

    /// Distance from the point to the found item.
    pub distance: Kilometers,
}

/// Ranks the `candidates` by their distance from the `origin`.
///
/// Candidates farther than the `radius` are skipped. Equidistant ones are
/// ordered by their `key` ascending. At most `limit` items are returned.
pub fn nearest<K, T>(
    origin: &Coordinates,
    candidates: impl IntoIterator<Item = (K, Coordinates, T)>,
    radius: Kilometers,
    limit: usize,
) -> Vec<Nearby<T>>
where
    K: Ord,
{
    let mut found = candidates
        .into_iter()
        .map(|(key, at, item)| (key, origin.distance_to(&at), item))
        .filter(|(_, distance, _)| *distance <= radius)
        .collect::<Vec<_>>();
    found.sort_by(|(k1, d1, _), (k2, d2, _)| {
        d1.total_cmp(d2).then_with(|| k1.cmp(k2))
    });
    found
        .into_iter()
        .take(limit)
        .map(|(_, distance, item)| Nearby { item, distance })
        .collect()
}

#[cfg(test)]
mod spec {
    use super::{nearest, Coordinates, Kilometers};

    fn point(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    /// Returns a point located `km` kilometers north of the given one.
    fn north_of(origin: Coordinates, km: f64) -> Coordinates {
        let delta = (km / super::EARTH_RADIUS_KM).to_degrees();
        point(
            origin.latitude.degrees() + delta,
            origin.longitude.degrees(),
        )
    }

    fn km(value: f64) -> Kilometers {
        Kilometers::new(value).unwrap()
    }

    #[test]
    fn validates_ranges() {
        assert!(Coordinates::new(90.0, 180.0).is_some());
        assert!(Coordinates::new(-90.0, -180.0).is_some());
        assert!(Coordinates::new(90.1, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
        assert!(Kilometers::new(-1.0).is_none());
        assert!(Kilometers::new(f64::INFINITY).is_none());
    }

    #[test]
    fn haversine_distance() {
        let nyc = point(40.7128, -74.0060);
        let london = point(51.5074, -0.1278);

        let d = nyc.distance_to(&london).value();
        assert!((d - 5570.2).abs() < 1.0, "distance: {d}");
        assert!((nyc.distance_to(&nyc).value()).abs() < f64::EPSILON);

        let symmetric = london.distance_to(&nyc).value();
        assert!((d - symmetric).abs() < 1e-9);
    }

    #[test]
    fn uses_mean_earth_radius() {
        let d = point(0.0, 0.0).distance_to(&point(0.0, 1.0)).value();
        let arc = super::EARTH_RADIUS_KM * 1.0_f64.to_radians();
        assert!((d - arc).abs() < 1e-9, "distance: {d}");
    }

    #[test]
    fn antipodal_distance_is_half_circumference() {
        let d = point(0.0, 0.0).distance_to(&point(0.0, 180.0)).value();
        let half = std::f64::consts::PI * super::EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1e-6, "distance: {d}");
    }

    #[test]
    fn filters_by_radius() {
        let origin = point(40.7128, -74.0060);
        let found = nearest(
            &origin,
            [
                (1, north_of(origin, 2.0), "near"),
                (2, north_of(origin, 6.0), "far"),
            ],
            km(5.0),
            10,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item, "near");
        assert!((found[0].distance.value() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn orders_by_distance_then_key() {
        let origin = point(10.0, 10.0);
        let found = nearest(
            &origin,
            [
                (3, north_of(origin, 3.0), "c"),
                (2, north_of(origin, 1.0), "b2"),
                (1, north_of(origin, 1.0), "b1"),
                (0, origin, "a"),
            ],
            km(10.0),
            10,
        );

        assert_eq!(
            found.iter().map(|n| n.item).collect::<Vec<_>>(),
            ["a", "b1", "b2", "c"],
        );
        assert!(found
            .windows(2)
            .all(|w| w[0].distance.value() <= w[1].distance.value()));
    }

    #[test]
    fn truncates_to_limit() {
        let origin = point(-33.8688, 151.2093);
        let found = nearest(
            &origin,
            (0..20).map(|i| (i, north_of(origin, f64::from(i) / 10.0), i)),
            km(5.0),
            10,
        );

        assert_eq!(found.len(), 10);
        assert_eq!(
            found.iter().map(|n| n.item).collect::<Vec<_>>(),
            (0..10).collect::<Vec<_>>(),
        );

        assert!(nearest(&origin, [(0, origin, ())], km(1.0), 0).is_empty());
    }

    #[test]
    fn radius_is_inclusive() {
        let origin = point(0.0, 0.0);
        let at = north_of(origin, 5.0);
        let exact = origin.distance_to(&at);

        let found = nearest(&origin, [(0, at, ())], exact, 10);
        assert_eq!(found.len(), 1);
    }
}
