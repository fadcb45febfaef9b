//! Marker types distinguishing [`DateTime`]s of an entity.
//!
//! [`DateTime`]: crate::DateTime

/// Marker of an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker of the last modification of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker of an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
