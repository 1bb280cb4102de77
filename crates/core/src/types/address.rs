//! Shipping and billing addresses collected on the checkout form.
//!
//! Form inputs are named `<kind>_<field>` (for example `shipping_line1` or
//! `billing_postal_code`), so an address is read by looking fields up under
//! its kind's prefix.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building an [`Address`] from form fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is missing or blank after trimming.
    #[error("{kind} address is missing {field}")]
    MissingField {
        /// Which address was being read.
        kind: AddressKind,
        /// Field name without the kind prefix.
        field: &'static str,
    },
}

/// Which of the two checkout addresses a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Shipping,
    Billing,
}

impl AddressKind {
    /// Form input name prefix, including the trailing underscore.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Shipping => "shipping_",
            Self::Billing => "billing_",
        }
    }

    /// Full input name of `field` for this address kind.
    #[must_use]
    pub fn input_name(self, field: &str) -> String {
        format!("{}{field}", self.prefix())
    }
}

impl core::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Shipping => "shipping",
            Self::Billing => "billing",
        })
    }
}

/// A postal address as sent to the order API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_type: AddressKind,
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Address {
    /// Fields that must be non-empty for an address to be usable.
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["full_name", "line1", "city", "postal_code", "country"];

    /// Fields that may be left blank.
    pub const OPTIONAL_FIELDS: [&'static str; 3] = ["line2", "region", "phone"];

    /// Read an address of `kind` using `lookup` to fetch raw input values by
    /// full input name.
    ///
    /// Values are trimmed. Blank optional fields become `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingField`] naming the first required field
    /// that is absent or blank.
    pub fn from_fields<'a, F>(kind: AddressKind, lookup: F) -> Result<Self, AddressError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let read = |field: &str| {
            lookup(&kind.input_name(field))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        let required = |field: &'static str| {
            read(field).ok_or(AddressError::MissingField { kind, field })
        };

        Ok(Self {
            address_type: kind,
            full_name: required("full_name")?,
            line1: required("line1")?,
            line2: read("line2"),
            city: required("city")?,
            region: read("region"),
            postal_code: required("postal_code")?,
            country: required("country")?,
            phone: read("phone"),
        })
    }

    /// Whether `field` (without prefix) is one of the optional fields.
    #[must_use]
    pub fn is_optional_field(field: &str) -> bool {
        Self::OPTIONAL_FIELDS.contains(&field)
    }
}
