//! In-memory [`Database`] implementation used in tests.

use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use common::{
    money::Currency,
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    DateTime, Money,
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        amenity, booking,
        geo::Coordinates,
        listing, traffic,
        user::{self, Password, PasswordHash},
        Amenity, Booking, Listing, Review, User,
    },
    infra::{database, Database},
    read::{
        booking::{ActiveAt, History, Overlapping},
        listing::{Filter, Located},
    },
    Config, Reroute, Service,
};

/// Key of a row [`Lock`]ed until the end of a transaction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Key {
    /// [`Booking`] row.
    Booking(booking::Id),

    /// [`Listing`] row.
    Listing(listing::Id),

    /// Traffic [`traffic::Area`] row.
    Area(traffic::Id),
}

/// Stored rows.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) users: HashMap<user::Id, User>,
    pub(crate) amenities: HashMap<amenity::Id, Amenity>,
    pub(crate) listings: HashMap<listing::Id, Listing>,
    pub(crate) favorites: HashSet<listing::Favorite>,
    pub(crate) bookings: HashMap<booking::Id, Booking>,
    pub(crate) reviews: Vec<Review>,
    pub(crate) areas: HashMap<traffic::Id, traffic::Area>,
}

/// In-memory [`Database`].
///
/// Writes are visible immediately, while [`Lock`]s are held until the
/// [`Commit`] of the [`Transact`]ion they were taken in.
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory {
    /// Rows of this [`Memory`].
    store: Arc<Mutex<Store>>,

    /// Row locks shared between transactions.
    locks: Arc<Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>>,

    /// Row locks held by the current transaction.
    held: Arc<Mutex<Vec<OwnedMutexGuard<()>>>>,
}

impl Memory {
    /// Returns the [`Store`] of this [`Memory`].
    pub(crate) fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    /// Locks the row with the provided [`Key`] until the transaction ends.
    async fn lock(&self, key: Key) {
        let row = Arc::clone(
            self.locks.lock().unwrap().entry(key).or_default(),
        );
        let guard = row.lock_owned().await;
        self.held.lock().unwrap().push(guard);
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            held: Arc::default(),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.held.lock().unwrap().clear();
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.store().users.get(&by.into_inner()).cloned())
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email: &str = by.into_inner().as_ref();
        tokio::task::yield_now().await;
        Ok(self
            .store()
            .users
            .values()
            .find(|u| {
                AsRef::<str>::as_ref(&u.email).eq_ignore_ascii_case(email)
            })
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().users.insert(user.id, user);
        Ok(())
    }
}

impl Database<Select<By<HashMap<amenity::Id, Amenity>, Vec<amenity::Id>>>>
    for Memory
{
    type Ok = HashMap<amenity::Id, Amenity>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Self::Ok, Vec<amenity::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let store = self.store();
        Ok(by
            .into_inner()
            .into_iter()
            .filter_map(|id| store.amenities.get(&id).cloned())
            .map(|a| (a.id, a))
            .collect())
    }
}

impl Database<Select<By<Option<Listing>, listing::Id>>> for Memory {
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.store().listings.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Listing>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().listings.insert(listing.id, listing);
        Ok(())
    }
}

impl Database<Lock<By<Listing, listing::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Listing(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Delete<By<Listing, listing::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut store = self.store();
        _ = store.listings.remove(&id);
        store.bookings.retain(|_, b| b.listing_id != id);
        store.reviews.retain(|r| r.listing_id != id);
        store.favorites.retain(|f| f.listing_id != id);
        Ok(())
    }
}

impl Database<Select<By<Vec<Listing>, Filter>>> for Memory {
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Filter {
            location,
            min_rate,
            max_rate,
            amenities,
        } = by.into_inner();
        let location = location.map(|l| l.trim().to_lowercase());

        tokio::task::yield_now().await;
        let mut found = self
            .store()
            .listings
            .values()
            .filter(|l| {
                location.as_ref().map_or(true, |loc| {
                    l.location.to_string().to_lowercase().contains(loc)
                }) && min_rate.map_or(true, |r| l.hourly_rate.amount >= r)
                    && max_rate.map_or(true, |r| l.hourly_rate.amount <= r)
                    && amenities.iter().all(|a| l.amenities.contains(a))
            })
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|l| (Reverse(l.created_at), l.id));
        Ok(found)
    }
}

impl Database<Select<By<Vec<Listing>, Located>>> for Memory {
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Listing>, Located>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self
            .store()
            .listings
            .values()
            .filter(|l| l.coordinates.is_some())
            .cloned()
            .collect())
    }
}

impl Database<Select<By<bool, listing::Favorite>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<bool, listing::Favorite>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.store().favorites.contains(&by.into_inner()))
    }
}

impl Database<Insert<listing::Favorite>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(favorite): Insert<listing::Favorite>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().favorites.insert(favorite);
        Ok(())
    }
}

impl Database<Delete<listing::Favorite>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(favorite): Delete<listing::Favorite>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().favorites.remove(&favorite);
        Ok(())
    }
}

impl Database<Insert<Review>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        self.store().reviews.push(review);
        Ok(())
    }
}

impl Database<Select<By<Option<Booking>, booking::Id>>> for Memory {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.store().bookings.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().bookings.insert(booking.id, booking);
        Ok(())
    }
}

impl Database<Update<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().bookings.insert(booking.id, booking);
        Ok(())
    }
}

impl Database<Lock<By<Booking, booking::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Booking(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Select<By<Vec<Booking>, Overlapping>>> for Memory {
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, Overlapping>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Overlapping {
            listing_id,
            interval,
        } = by.into_inner();

        tokio::task::yield_now().await;
        Ok(self
            .store()
            .bookings
            .values()
            .filter(|b| {
                b.listing_id == listing_id && b.conflicts_with(&interval)
            })
            .cloned()
            .collect())
    }
}

impl Database<Select<By<HashSet<listing::Id>, ActiveAt>>> for Memory {
    type Ok = HashSet<listing::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashSet<listing::Id>, ActiveAt>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ActiveAt { listing_ids, at } = by.into_inner();

        Ok(self
            .store()
            .bookings
            .values()
            .filter(|b| listing_ids.contains(&b.listing_id))
            .filter(|b| b.is_active_at(at))
            .map(|b| b.listing_id)
            .collect())
    }
}

impl Database<Select<By<Vec<Booking>, History>>> for Memory {
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, History>>,
    ) -> Result<Self::Ok, Self::Err> {
        let History(user_id) = by.into_inner();

        let mut found = self
            .store()
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|b| (Reverse(b.interval.start()), b.id));
        Ok(found)
    }
}

impl Database<Select<By<Option<traffic::Area>, traffic::Id>>> for Memory {
    type Ok = Option<traffic::Area>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<traffic::Area>, traffic::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        tokio::task::yield_now().await;
        Ok(self.store().areas.get(&by.into_inner()).cloned())
    }
}

impl<'n> Database<Select<By<Option<traffic::Area>, &'n traffic::Name>>>
    for Memory
{
    type Ok = Option<traffic::Area>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<traffic::Area>, &'n traffic::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();
        tokio::task::yield_now().await;
        Ok(self
            .store()
            .areas
            .values()
            .find(|a| a.name.matches(name))
            .cloned())
    }
}

impl Database<Insert<traffic::Area>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(area): Insert<traffic::Area>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().areas.insert(area.id, area);
        Ok(())
    }
}

impl Database<Update<traffic::Area>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(area): Update<traffic::Area>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.store().areas.insert(area.id, area);
        Ok(())
    }
}

impl Database<Lock<By<traffic::Area, traffic::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<traffic::Area, traffic::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Area(by.into_inner())).await;
        Ok(())
    }
}

/// Creates a new [`Service`] backed by an empty [`Memory`].
pub(crate) fn service() -> Service<Memory> {
    Service::new(
        Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(b"test"),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(b"test"),
            session_ttl: Duration::from_secs(3600),
            reroute: Reroute::default(),
        },
        Memory::default(),
    )
}

/// Parses the provided `input` as a [`DateTime`] of any kind.
pub(crate) fn at<Of: ?Sized>(input: &str) -> common::DateTimeOf<Of> {
    DateTime::parse(input).unwrap().coerce()
}

/// Creates a new amount of US dollars.
pub(crate) fn usd(amount: i64) -> Money {
    Money::new(Decimal::from(amount), Currency::Usd)
}

/// Stores a new [`User`] in the provided [`Service`].
pub(crate) fn user(service: &Service<Memory>, is_host: bool) -> User {
    let id = user::Id::new();
    let user = User {
        id,
        name: user::Name::new("Jane Doe").unwrap(),
        email: user::Email::new(format!("{id}@example.com")).unwrap(),
        password_hash: PasswordHash::new(&Password::new("secret").unwrap()),
        phone: None,
        is_host,
        created_at: DateTime::now().coerce(),
    };
    _ = service.database().store().users.insert(id, user.clone());
    user
}

/// Stores a new [`Listing`] of the provided host in the provided
/// [`Service`].
pub(crate) fn listing(
    service: &Service<Memory>,
    host_id: user::Id,
    location: &str,
    hourly_rate: Money,
    coordinates: Option<(f64, f64)>,
) -> Listing {
    let id = listing::Id::new();
    let listing = Listing {
        id,
        host_id,
        title: listing::Title::new(format!("Spot {id}")).unwrap(),
        location: listing::Location::new(location).unwrap(),
        description: None,
        hourly_rate,
        coordinates: coordinates
            .map(|(lat, lon)| Coordinates::new(lat, lon).unwrap()),
        amenities: vec![],
        created_at: DateTime::now().coerce(),
    };
    _ = service.database().store().listings.insert(id, listing.clone());
    listing
}

/// Stores a new traffic [`traffic::Area`] in the provided [`Service`].
pub(crate) fn area(
    service: &Service<Memory>,
    name: &str,
    (latitude, longitude): (f64, f64),
    max_capacity: u32,
    current_occupancy: u32,
) -> traffic::Area {
    let area = traffic::Area {
        id: traffic::Id::new(),
        name: traffic::Name::new(name).unwrap(),
        coordinates: Coordinates::new(latitude, longitude).unwrap(),
        max_capacity,
        current_occupancy,
        created_at: DateTime::now().coerce(),
        updated_at: DateTime::now().coerce(),
    };
    _ = service.database().store().areas.insert(area.id, area.clone());
    area
}

/// Stores a new [`booking::Status::Pending`] [`Booking`] in the provided
/// [`Service`].
pub(crate) fn booking(
    service: &Service<Memory>,
    listing: &Listing,
    user_id: user::Id,
    (start, end): (&str, &str),
) -> Booking {
    let interval = booking::Interval::new(at(start), at(end)).unwrap();
    let booking = Booking {
        id: booking::Id::new(),
        listing_id: listing.id,
        user_id,
        interval,
        status: booking::Status::Pending,
        payment_status: booking::PaymentStatus::Unpaid,
        total_price: Booking::total_price(listing.hourly_rate, &interval),
        created_at: DateTime::now().coerce(),
    };
    _ = service
        .database()
        .store()
        .bookings
        .insert(booking.id, booking.clone());
    booking
}
