//! [`Query`] collection related to the multiple [`Amenity`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::domain::{amenity, Amenity};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries the whole catalog of [`Amenity`]s, ordered by name.
pub type All = DatabaseQuery<By<Vec<Amenity>, ()>>;

/// Queries multiple [`Amenity`]s by their [`amenity::Id`]s.
pub type ByIds =
    DatabaseQuery<By<HashMap<amenity::Id, Amenity>, Vec<amenity::Id>>>;
