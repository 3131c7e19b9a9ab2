//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// String-backed scalar codec, used as `#[graphql(with = Via::<As>)]`.
///
/// A scalar goes through its `As` representation in both directions:
/// - it's output as the [`Display`] of its [`AsRef<As>`] view;
/// - it's input by parsing `As` with [`FromStr`] and converting the result
///   with [`TryFrom<As>`], so domain validation is applied to the input.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Outputs the provided `value` as a GraphQL string.
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::scalar(value.as_ref().to_string())
    }

    /// Inputs the target scalar from the provided GraphQL string.
    ///
    /// # Errors
    ///
    /// If the `input` is not a string, is not a valid `As`, or is rejected by
    /// the target scalar.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let scalar = T::name(&()).unwrap_or_default();
        let Some(s) = input.as_string_value() else {
            return Err(format!(
                "`{scalar}` scalar expects a string, found: {input}",
            ));
        };
        let repr = s.parse::<As>().map_err(|e| {
            format!("`{scalar}` scalar cannot be parsed from \"{s}\": {e}")
        })?;
        T::try_from(repr)
            .map_err(|e| format!("`{scalar}` scalar is invalid: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a string.
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}
