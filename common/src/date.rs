//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, marker::PhantomData, str::FromStr};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::FormatItem, macros::format_description};

/// Format of a [`Date`] in its textual representation (`YYYY-MM-DD`).
const FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date without a time component.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar_date(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from)
    }

    /// Returns the current [`Date`] in the provided [`time::UtcOffset`].
    #[must_use]
    pub fn today(offset: time::UtcOffset) -> Self {
        time::OffsetDateTime::now_utc().to_offset(offset).date().into()
    }

    /// Returns the [`Date`] the provided number of days after this one.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn add_days(self, days: i64) -> Option<Self> {
        self.inner
            .checked_add(time::Duration::days(days))
            .map(Self::from)
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Error of parsing [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid `Date`, expected `YYYY-MM-DD`: {_0}")]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, FORMAT).map(Self::from).map_err(ParseError)
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.inner.format(FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> std::hash::Hash for DateOf<Of> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

/// Inclusive closed range of [`Date`]s.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("[{start}, {end}]")]
pub struct Period {
    /// First day of this [`Period`].
    start: Date,

    /// Last day of this [`Period`].
    end: Date,
}

impl Period {
    /// Creates a new [`Period`] if `start` is not after `end`.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Creates a new [`Period`] consisting of the single provided `day`.
    #[must_use]
    pub fn day(day: Date) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Returns the first day of this [`Period`].
    #[must_use]
    pub fn start(&self) -> Date {
        self.start
    }

    /// Returns the last day of this [`Period`].
    #[must_use]
    pub fn end(&self) -> Date {
        self.end
    }

    /// Indicates whether this [`Period`] shares at least one day with the
    /// `other` one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Indicates whether the provided `day` lies within this [`Period`].
    #[must_use]
    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use super::DateOf;

    impl<Of: ?Sized> Serialize for DateOf<Of> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(self)
        }
    }

    impl<'de, Of: ?Sized> Deserialize<'de> for DateOf<Of> {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            Self::from_str(&s).map_err(D::Error::custom)
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in a `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = crate::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}
