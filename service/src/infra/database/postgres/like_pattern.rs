//! [`LikePattern`] definition.

use derive_more::Display;
use postgres_types::{FromSql, ToSql};

/// SQL `LIKE` pattern matching any text containing the given input.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct LikePattern(String);

impl LikePattern {
    /// Creates a new [`LikePattern`] searching for the given `input` as a
    /// substring.
    ///
    /// Wildcards of the `input` are matched literally.
    #[must_use]
    pub fn containing(input: &str) -> Self {
        let escaped = input
            .trim()
            .replace('\\', r"\\")
            .replace('%', r"\%")
            .replace('_', r"\_");
        Self(format!("%{escaped}%"))
    }
}

#[cfg(test)]
mod spec {
    use super::LikePattern;

    #[test]
    fn escapes_wildcards() {
        assert_eq!(
            LikePattern::containing(" Down town ").to_string(),
            "%Down town%",
        );
        assert_eq!(
            LikePattern::containing(r"50%_off\").to_string(),
            r"%50\%\_off\\%",
        );
    }
}
