//! [`Percent`]-related definitions.

use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Non-negative floating-point percentage.
///
/// May exceed `100` whenever a part overflows its whole.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of decimal places used to display a [`Percent`].
    const DISPLAY_PRECISION: u32 = 2;

    /// Creates a new [`Percent`] by checking the provided value is not
    /// negative.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        if val < Decimal::ZERO {
            None
        } else {
            #[expect(
                clippy::allow_attributes,
                reason = "TODO: Remove once clippy is fixed"
            )]
            #[allow(unsafe_code, reason = "invariants checked already")]
            Some(unsafe { Self::new_unchecked(val) })
        }
    }

    /// Creates a new [`Percent`] without performing any validation.
    ///
    /// # Safety
    ///
    /// The provided value must not be negative.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(val: Decimal) -> Self {
        Self(val)
    }

    /// Calculates which [`Percent`] the `part` is of the `whole`.
    ///
    /// Zero `whole` results in [`Percent::ZERO`].
    #[must_use]
    pub fn of(part: u32, whole: u32) -> Self {
        if whole == 0 {
            return Self::ZERO;
        }
        Self(Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
    }

    /// Returns the exact [`Decimal`] value of this [`Percent`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Percent`] is at least the provided integer
    /// threshold.
    #[must_use]
    pub fn reaches(self, threshold: u8) -> bool {
        self.0 >= Decimal::from(threshold)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0.round_dp(Self::DISPLAY_PRECISION).normalize(),
        )
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative floating-point percentage, rounded to 2 decimal places
    /// on output.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Percent;

    #[test]
    fn of() {
        assert_eq!(Percent::of(85, 100).to_string(), "85");
        assert_eq!(Percent::of(1, 3).to_string(), "33.33");
        assert_eq!(Percent::of(2, 3).to_string(), "66.67");
        assert_eq!(Percent::of(150, 100).to_string(), "150");
        assert_eq!(Percent::of(10, 0), Percent::ZERO);
        assert_eq!(Percent::of(0, 10), Percent::ZERO);
    }

    #[test]
    fn reaches_uses_exact_value() {
        assert!(Percent::of(80, 100).reaches(80));
        assert!(!Percent::of(79, 100).reaches(80));
        // 79.996% is displayed as 80 but is still below the threshold.
        assert!(!Percent::of(19_999, 25_000).reaches(80));
        assert_eq!(Percent::of(19_999, 25_000).to_string(), "80");
    }

    #[test]
    fn from_str() {
        assert!(Percent::from_str("0").is_ok());
        assert!(Percent::from_str("12.5").is_ok());
        assert!(Percent::from_str("250").is_ok());
        assert!(Percent::from_str("-1").is_err());
        assert!(Percent::from_str("abc").is_err());
    }
}
