//! Macros for defining kind enums.

/// Macro for defining a closed enumeration stored as a small integer.
///
/// The textual representation (used by [`Display`], [`FromStr`] and, with the
/// `serde` feature, by serialization) follows the provided `serialize_all`
/// case.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
///
/// define_kind! {
///     #[doc = "Shape kind."]
///     #[serialize_all = "snake_case"]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = 1,
///
///         #[doc = "A sphere"]
///         Sphere = 2,
///     }
/// }
/// ```
///
/// [`Display`]: std::fmt::Display
/// [`FromStr`]: std::str::FromStr
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        #[serialize_all = $case:tt]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = $case),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = $case)]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(v: u8) -> Result<Self, Self::Error> {
                Self::ALL.iter().copied().find(|k| k.u8() == v).ok_or(v)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let v = u8::try_from(i16::from_sql(ty, raw)?)?;
                Self::try_from(v).map_err(|v| {
                    ::std::format!(
                        "invalid `{}` value: {v}",
                        ::core::stringify!($name),
                    )
                    .into()
                })
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}

#[cfg(test)]
mod spec {
    crate::define_kind! {
        #[doc = "Light."]
        #[serialize_all = "snake_case"]
        enum Light {
            #[doc = "Stop."]
            Red = 1,

            #[doc = "Go."]
            Green = 3,
        }
    }

    #[test]
    fn converts_from_u8() {
        assert_eq!(Light::try_from(3), Ok(Light::Green));
        assert_eq!(Light::try_from(2), Err(2));
    }

    #[test]
    fn parses_and_displays_in_case() {
        assert_eq!(Light::Green.to_string(), "green");
        assert_eq!("red".parse::<Light>(), Ok(Light::Red));
        assert!("Red".parse::<Light>().is_err());
    }
}
