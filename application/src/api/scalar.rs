//! GraphQL scalar definitions.

use std::{borrow::Cow, fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Outputs the target type as a string formatted via [`Display`] impl of `As`
/// type, and parses it back via [`FromStr`] impl of `As` type. Numeric input
/// literals are accepted as well, so amounts like `2.5` may be passed either
/// as numbers or as strings.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from the scalar [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the input value:
    /// - is neither a string nor a number;
    /// - cannot be parsed into `As` type;
    /// - cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or_default();

        let raw = input
            .as_scalar()
            .and_then(|v| {
                v.as_str().map(Cow::Borrowed).or_else(|| {
                    v.as_int()
                        .map(|i| i.to_string())
                        .or_else(|| v.as_float().map(|f| f.to_string()))
                        .map(Cow::Owned)
                })
            })
            .ok_or_else(|| {
                format!(
                    "Cannot parse input scalar `{name}`: expected string or \
                     number input value, found: {input}",
                )
            })?;

        raw.parse::<As>()
            .map_err(|e| {
                format!(
                    "Cannot parse input scalar `{name}` from \"{raw}\": {e}",
                )
            })?
            .try_into()
            .map_err(|e| format!("Cannot parse input scalar `{name}`: {e}"))
    }

    /// Parses the provided [`ScalarToken`], keeping numeric literals as
    /// numbers.
    ///
    /// # Errors
    ///
    /// If the token is malformed.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        match value {
            ScalarToken::Int(_) => {
                <i32 as ParseScalarValue<S>>::from_str(value)
            }
            ScalarToken::Float(_) => {
                <f64 as ParseScalarValue<S>>::from_str(value)
            }
            ScalarToken::String(_) => {
                <String as ParseScalarValue<S>>::from_str(value)
            }
        }
    }
}
