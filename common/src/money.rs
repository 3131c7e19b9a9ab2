//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

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
    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Indicates whether this [`Money`] amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{}{currency}", amount.normalize()),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
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
    #[serialize_all = "SCREAMING_SNAKE_CASE"]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Pound Sterling."]
        Gbp = 3,

        #[doc = "UAE Dirham."]
        Aed = 4,
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

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            money("89.90EUR"),
            Money {
                amount: "89.90".parse().unwrap(),
                currency: Currency::Eur,
            },
        );
        assert_eq!(money("1200AED").currency, Currency::Aed);
        assert_eq!(money("0GBP"), Money::zero(Currency::Gbp));

        assert!(Money::from_str("89.90").is_err());
        assert!(Money::from_str("89.90Eu").is_err());
        assert!(Money::from_str("89.90euros").is_err());
        assert!(Money::from_str("eightyUSD").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("89.90EUR").to_string(), "89.9EUR");
        assert_eq!(money("150.00USD").to_string(), "150USD");
        assert_eq!(money("150USD").to_string(), "150USD");
        assert_eq!(
            Money {
                amount: Decimal::new(-2550, 2),
                currency: Currency::Gbp,
            }
            .to_string(),
            "-25.5GBP",
        );
    }

    #[test]
    fn negativity() {
        assert!(money("-0.01USD").is_negative());
        assert!(!money("0USD").is_negative());
        assert!(!money("-0USD").is_negative());
        assert!(!money("35.10USD").is_negative());
    }
}
