//! [`Query`] collection related to the multiple [`Listing`]s.

use std::collections::HashSet;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        booking,
        geo::{self, Coordinates, Kilometers},
        listing, traffic, Listing,
    },
    infra::{database, Database},
    read::{
        booking::ActiveAt,
        listing::{FavoredBy, Filter, HostedBy, Located},
    },
    Query, Service,
};

use super::DatabaseQuery;

/// Queries the [`Listing`]s of a host, latest first.
pub type ByHost = DatabaseQuery<By<Vec<Listing>, HostedBy>>;

/// Queries the favorite [`Listing`]s of a user, latest first.
pub type FavoritesOf = DatabaseQuery<By<Vec<Listing>, FavoredBy>>;

/// Ranks the `listings` having [`Coordinates`] by their distance from the
/// `origin`.
fn rank(
    origin: &Coordinates,
    listings: Vec<Listing>,
    radius: Kilometers,
    limit: usize,
) -> Vec<geo::Nearby<Listing>> {
    geo::nearest(
        origin,
        listings
            .into_iter()
            .filter_map(|l| l.coordinates.map(|at| (l.id, at, l))),
        radius,
        limit,
    )
}

/// [`Query`] searching [`Listing`]s and estimating the traffic around them.
#[derive(Clone, Debug)]
pub struct Search {
    /// [`Filter`] of the [`Listing`]s.
    pub filter: Filter,

    /// Current moment to estimate the traffic at.
    pub now: booking::PeriodDateTime,
}

/// Output of the [`Search`] [`Query`].
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Found [`Listing`]s, latest first.
    pub listings: Vec<Listing>,

    /// Indicates whether more than a half of the found [`Listing`]s are
    /// occupied at the moment.
    pub high_traffic: bool,

    /// [`Traffic`] in the searched location, if it names a known
    /// [`traffic::Area`].
    pub traffic: Option<Traffic>,
}

/// Traffic in a [`traffic::Area`] matched by the [`Search`] location.
#[derive(Clone, Debug)]
pub struct Traffic {
    /// Matched [`traffic::Area`].
    pub area: traffic::Area,

    /// Current [`traffic::Status`] of the [`Traffic::area`].
    pub status: traffic::Status,

    /// [`Listing`]s nearby the [`Traffic::area`] to park at instead.
    ///
    /// Empty unless the [`Traffic::status`] suggests rerouting.
    pub suggestions: Vec<geo::Nearby<Listing>>,
}

impl<Db> Query<Search> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Listing>, Filter>>,
            Ok = Vec<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Listing>, Located>>,
            Ok = Vec<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashSet<listing::Id>, ActiveAt>>,
            Ok = HashSet<listing::Id>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<traffic::Area>, &'l traffic::Name>>,
            Ok = Option<traffic::Area>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = SearchResult;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Search { filter, now }: Search,
    ) -> Result<Self::Ok, Self::Err> {
        let area_name = filter
            .location
            .as_deref()
            .and_then(|l| traffic::Name::new(l.trim()));

        let listings = self
            .database()
            .execute(Select(By::<Vec<Listing>, _>::new(filter)))
            .await
            .map_err(tracerr::wrap!())?;

        let high_traffic = if listings.is_empty() {
            false
        } else {
            let occupied = self
                .database()
                .execute(Select(By::new(ActiveAt {
                    listing_ids: listings.iter().map(|l| l.id).collect(),
                    at: now,
                })))
                .await
                .map_err(tracerr::wrap!())?;
            occupied.len() * 2 > listings.len()
        };

        let mut traffic = None;
        if let Some(name) = area_name {
            let area = self
                .database()
                .execute(Select(By::new(&name)))
                .await
                .map_err(tracerr::wrap!())?;
            if let Some(area) = area {
                let status = area.status();
                let suggestions = if status.should_reroute() {
                    let located = self
                        .database()
                        .execute(Select(By::<Vec<Listing>, _>::new(Located)))
                        .await
                        .map_err(tracerr::wrap!())?;
                    let reroute = self.config().reroute;
                    rank(
                        &area.coordinates,
                        located,
                        reroute.radius,
                        reroute.limit,
                    )
                } else {
                    vec![]
                };
                log::debug!(
                    area.name = %area.name,
                    level = %status.level,
                    suggestions = suggestions.len(),
                    "traffic area matched by search",
                );
                traffic = Some(Traffic {
                    area,
                    status,
                    suggestions,
                });
            }
        }

        Ok(SearchResult {
            listings,
            high_traffic,
            traffic,
        })
    }
}

/// [`Query`] ranking [`Listing`]s nearby some point by their distance.
///
/// Reservations of the [`Listing`]s are not taken into account.
#[derive(Clone, Copy, Debug, Default)]
pub struct Nearby {
    /// Latitude of the point, in degrees.
    pub latitude: Option<f64>,

    /// Longitude of the point, in degrees.
    pub longitude: Option<f64>,

    /// Radius to search within.
    ///
    /// Configured default is used if [`None`].
    pub radius: Option<Kilometers>,

    /// Maximum number of [`Listing`]s to return.
    ///
    /// Configured default is used if [`None`].
    pub limit: Option<usize>,
}

impl<Db> Query<Nearby> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Listing>, Located>>,
        Ok = Vec<Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<geo::Nearby<Listing>>;
    type Err = Traced<NearbyError>;

    async fn execute(&self, query: Nearby) -> Result<Self::Ok, Self::Err> {
        use NearbyError as E;

        let Nearby {
            latitude,
            longitude,
            radius,
            limit,
        } = query;

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return Err(tracerr::new!(E::MissingCoordinates));
        };
        let origin = Coordinates::new(latitude, longitude)
            .ok_or(E::InvalidCoordinates)
            .map_err(tracerr::wrap!())?;

        let located = self
            .database()
            .execute(Select(By::new(Located)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let defaults = self.config().reroute;
        Ok(rank(
            &origin,
            located,
            radius.unwrap_or(defaults.radius),
            limit.unwrap_or(defaults.limit),
        ))
    }
}

/// Error of [`Nearby`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum NearbyError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Coordinates are out of range.
    #[display("Coordinates are out of range")]
    InvalidCoordinates,

    /// Latitude or longitude is not provided.
    #[display("Both latitude and longitude must be provided")]
    MissingCoordinates,
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{geo::Kilometers, traffic},
        infra::database::memory::{self, at, usd},
        read::listing::Filter,
        Query as _,
    };

    use super::{Nearby, NearbyError, Search};

    #[tokio::test]
    async fn nearby_within_radius() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let near = memory::listing(
            &service,
            host.id,
            "Lower Manhattan",
            usd(10),
            Some((40.7308, -74.0060)),
        );
        _ = memory::listing(
            &service,
            host.id,
            "Midtown",
            usd(10),
            Some((40.7668, -74.0060)),
        );
        _ = memory::listing(&service, host.id, "Unknown", usd(10), None);

        let found = service
            .execute(Nearby {
                latitude: Some(40.7128),
                longitude: Some(-74.0060),
                radius: Kilometers::new(5.0),
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item.id, near.id);
        assert!((found[0].distance.value() - 2.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn nearby_requires_coordinates() {
        let service = memory::service();

        let err = service
            .execute(Nearby {
                latitude: Some(40.7128),
                ..Nearby::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), NearbyError::MissingCoordinates));

        let err = service
            .execute(Nearby {
                latitude: Some(91.0),
                longitude: Some(0.0),
                ..Nearby::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), NearbyError::InvalidCoordinates));
    }

    #[tokio::test]
    async fn search_detects_high_traffic() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let guest = memory::user(&service, false);
        let first =
            memory::listing(&service, host.id, "Downtown", usd(10), None);
        let second =
            memory::listing(&service, host.id, "downtown east", usd(20), None);
        _ = memory::listing(&service, host.id, "Uptown", usd(10), None);
        let search = |now| Search {
            filter: Filter {
                location: Some("Downtown".into()),
                ..Filter::default()
            },
            now: at(now),
        };

        _ = memory::booking(
            &service,
            &first,
            guest.id,
            ("2030-01-01T09:00", "2030-01-01T11:00"),
        );
        let found =
            service.execute(search("2030-01-01T10:00")).await.unwrap();
        assert_eq!(found.listings.len(), 2);
        assert!(!found.high_traffic);
        assert!(found.traffic.is_none());

        _ = memory::booking(
            &service,
            &second,
            guest.id,
            ("2030-01-01T09:30", "2030-01-01T10:30"),
        );
        let found =
            service.execute(search("2030-01-01T10:00")).await.unwrap();
        assert!(found.high_traffic);

        let found =
            service.execute(search("2030-01-01T11:00")).await.unwrap();
        assert!(!found.high_traffic);
    }

    #[tokio::test]
    async fn search_suggests_rerouting_from_congested_area() {
        let service = memory::service();
        let host = memory::user(&service, true);
        let near = memory::listing(
            &service,
            host.id,
            "Harbor side",
            usd(10),
            Some((40.7308, -74.0060)),
        );
        let area =
            memory::area(&service, "Harbor", (40.7128, -74.0060), 100, 85);
        let search = Search {
            filter: Filter {
                location: Some(" harbor ".into()),
                ..Filter::default()
            },
            now: at("2030-01-01T10:00"),
        };

        let found = service.execute(search.clone()).await.unwrap();

        let traffic = found.traffic.unwrap();
        assert_eq!(traffic.area.id, area.id);
        assert_eq!(traffic.status.level, traffic::Level::High);
        assert_eq!(traffic.suggestions.len(), 1);
        assert_eq!(traffic.suggestions[0].item.id, near.id);

        service
            .database()
            .store()
            .areas
            .get_mut(&area.id)
            .unwrap()
            .current_occupancy = 10;
        let found = service.execute(search).await.unwrap();
        let traffic = found.traffic.unwrap();
        assert_eq!(traffic.status.level, traffic::Level::Low);
        assert!(traffic.suggestions.is_empty());
    }
}
