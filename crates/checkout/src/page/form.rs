use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of form control backing a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Input,
    Select,
    Hidden,
}

/// One named form control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub value: String,
    pub required: bool,
    pub kind: FieldKind,
}

/// The checkout form's named inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Form {
    fields: BTreeMap<String, Field>,
}

impl Form {
    /// Add or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) {
        self.fields.insert(name.into(), field);
    }

    /// Builder-style [`Form::insert`] for an input with `value`.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(
            name,
            Field {
                value: value.into(),
                ..Field::default()
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Current value of `name`, if the field is rendered.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }

    /// Set the value of an existing field. Returns `false` when no field
    /// named `name` is rendered.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        self.fields.get_mut(name).is_some_and(|field| {
            value.clone_into(&mut field.value);
            true
        })
    }

    /// Mutable access to every field whose name starts with `prefix`.
    pub fn fields_with_prefix_mut<'a>(
        &'a mut self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a mut Field)> + 'a {
        self.fields
            .iter_mut()
            .filter(move |(name, _)| name.starts_with(prefix))
            .map(|(name, field)| (name.as_str(), field))
    }

    /// Iterate over all fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }
}
