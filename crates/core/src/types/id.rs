//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Ids arrive both in
//! JSON bodies and in URL query strings, so every id also implements
//! [`FromStr`](core::str::FromStr).

/// Error returned when an id cannot be parsed from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {input:?}")]
pub struct IdParseError {
    /// Name of the id type that failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
/// - `FromStr` accepting positive integers (surrounding whitespace ignored)
///
/// # Example
///
/// ```rust
/// # use gallery_checkout_core::define_id;
/// define_id!(InvoiceId);
/// define_id!(ShipmentId);
///
/// let invoice_id = InvoiceId::new(1);
/// let shipment_id: ShipmentId = "7".parse().unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: InvoiceId = shipment_id;
/// # let _ = (invoice_id, shipment_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(id) if id > 0 => Ok(Self(id)),
                    _ => Err($crate::types::id::IdParseError {
                        kind: stringify!($name),
                        input: s.to_owned(),
                    }),
                }
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Backend primary keys
define_id!(OrderId);
define_id!(PaymentId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_query_value() {
        let id: OrderId = "42".parse().unwrap();
        assert_eq!(id.as_i64(), 42);

        let id: OrderId = " 7 ".parse().unwrap();
        assert_eq!(id, OrderId::new(7));
    }

    #[test]
    fn test_parse_rejects_non_positive_and_garbage() {
        assert!("0".parse::<OrderId>().is_err());
        assert!("-3".parse::<OrderId>().is_err());
        assert!("null".parse::<OrderId>().is_err());
        assert!("".parse::<PaymentId>().is_err());
    }

    #[test]
    fn test_parse_error_names_the_type() {
        let err = "abc".parse::<PaymentId>().unwrap_err();
        assert_eq!(err.kind, "PaymentId");
        assert_eq!(err.to_string(), "invalid PaymentId: \"abc\"");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id: OrderId = serde_json::from_str("42").unwrap();
        assert_eq!(id, OrderId::new(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderId::new(42).to_string(), "42");
    }
}
