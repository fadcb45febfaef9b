//! [`Money`]-related definitions.

use std::{fmt, ops, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of decimal places in minor units of any [`Currency`].
    pub const MINOR_UNITS: u32 = 2;

    /// Creates a new [`Money`] amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Indicates whether this [`Money`] amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Rounds this [`Money`] to [`Money::MINOR_UNITS`], with midpoints
    /// rounded away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                Self::MINOR_UNITS,
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }
}

impl ops::Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self {
            amount: self.amount * rhs,
            currency: self.currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Russian Ruble."]
        Rub = 3,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );

        assert_eq!(
            Money::from_str("123.45EUR").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Eur,
            },
        );

        assert_eq!(
            Money::from_str("123.45RUB").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Rub,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());

        assert!(Money::from_str("123.00USD").is_ok());
        assert!(Money::from_str("123.0USD").is_ok());
        assert!(Money::from_str("123USD").is_ok());
    }

    #[test]
    fn multiplies_and_rounds() {
        let rate = Money::new(decimal("10"), Currency::Usd);

        assert_eq!((rate * decimal("2")).to_string(), "20USD");
        assert_eq!(
            (rate * decimal("1.5")).round(),
            Money::new(decimal("15"), Currency::Usd),
        );

        let rate = Money::new(decimal("7.25"), Currency::Eur);
        assert_eq!(
            (rate * decimal("0.25")).round(),
            Money::new(decimal("1.81"), Currency::Eur),
        );
        assert_eq!(
            (Money::new(decimal("0.005"), Currency::Usd)).round(),
            Money::new(decimal("0.01"), Currency::Usd),
        );
    }

    #[test]
    fn positivity() {
        assert!(Money::new(decimal("0.01"), Currency::Usd).is_positive());
        assert!(!Money::new(decimal("0"), Currency::Usd).is_positive());
        assert!(!Money::new(decimal("-1"), Currency::Usd).is_positive());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123.45USD",
        );

        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Eur,
            }
            .to_string(),
            "123.45EUR",
        );

        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Rub,
            }
            .to_string(),
            "123.45RUB",
        );

        assert_eq!(
            Money {
                amount: decimal("123.00"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123USD",
        );
        assert_eq!(
            Money {
                amount: decimal("123.0"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123USD",
        );
        assert_eq!(
            Money {
                amount: decimal("123"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123USD",
        );
    }
}
