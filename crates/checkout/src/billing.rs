//! Billing-address co-pilot.
//!
//! Two behaviors that stay active for the whole page lifetime, independent
//! of checkout mode:
//! - the "same as shipping" toggle hides or reveals the billing section and
//!   adjusts which billing inputs are required;
//! - while the toggle is checked, every shipping edit is mirrored into the
//!   billing input with the same suffix.

use gallery_checkout_core::{Address, AddressKind};
use tracing::trace;

use crate::page::Document;

/// Apply a change of the "same as shipping" checkbox.
///
/// Checking hides the billing section, clears every billing input and
/// drops their `required` flag. Unchecking reveals the section and marks
/// every billing input except `line2`, `region` and `phone` required; it
/// never copies shipping values across.
pub fn set_same_address(document: &mut Document, checked: bool) {
    document.same_address = checked;
    document.billing_hidden = checked;

    let prefix = AddressKind::Billing.prefix();
    for (name, field) in document.form.fields_with_prefix_mut(prefix) {
        if checked {
            field.required = false;
            field.value.clear();
        } else if name
            .strip_prefix(prefix)
            .is_some_and(|suffix| !Address::is_optional_field(suffix))
        {
            field.required = true;
        }
    }
}

/// Mirror the current value of shipping input `name` into its billing
/// counterpart, when "same as shipping" is checked.
///
/// Returns `true` when a billing input was updated.
pub fn mirror_shipping_input(document: &mut Document, name: &str) -> bool {
    if !document.same_address {
        return false;
    }
    let Some(suffix) = name.strip_prefix(AddressKind::Shipping.prefix()) else {
        return false;
    };
    let Some(value) = document.form.value(name).map(str::to_owned) else {
        return false;
    };

    let billing_name = AddressKind::Billing.input_name(suffix);
    let mirrored = document.form.set_value(&billing_name, &value);
    if mirrored {
        trace!(from = name, to = %billing_name, "Mirrored shipping input");
    }
    mirrored
}
