//! Untrusted form input and shape-level validation.
//!
//! [`FormInput`] holds the raw submission. [`validate`] checks it against a
//! parameter schema and produces either [`ValidatedParams`] or every
//! [`FieldError`] found, so the caller can report all problems at once.

mod validator;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use self::validator::{FieldError, FieldErrors, ValidatedParams, validate};

/// One submitted field: a single string or the values of a repeated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// A single submitted value.
    Single(String),
    /// The values of a repeated key, in submission order.
    Multi(Vec<String>),
}

impl FormValue {
    /// Returns every submitted value.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        }
    }

    /// Returns the value when exactly one was submitted.
    #[must_use]
    pub fn single(&self) -> Option<&str> {
        match self.values() {
            [value] => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns `true` when nothing but whitespace was submitted.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.values().iter().all(|value| value.trim().is_empty())
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                let first = std::mem::take(first);
                *self = Self::Multi(vec![first, value]);
            }
            Self::Multi(values) => values.push(value),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for FormValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Raw, untrusted form submission keyed by field name.
///
/// # Example
///
/// ```
/// use armory_plugins::FormInput;
///
/// let form = FormInput::parse_urlencoded("data=hello&params%5Bmode%5D=url");
/// assert_eq!(form.get("data").and_then(|v| v.single()), Some("hello"));
///
/// let params = form.nested("params");
/// assert_eq!(params.get("mode").and_then(|v| v.single()), Some("url"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInput {
    fields: HashMap<String, FormValue>,
}

impl FormInput {
    /// Creates an empty submission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a submission from key/value pairs; repeated keys accumulate.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = Self::new();
        for (key, value) in pairs {
            form.append(key, value);
        }
        form
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn parse_urlencoded(body: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body.as_bytes()))
    }

    /// Appends a value, turning the field into a list on repetition.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.fields.entry(key.into()) {
            std::collections::hash_map::Entry::Occupied(mut entry) => entry.get_mut().push(value),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(FormValue::Single(value));
            }
        }
    }

    /// Replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FormValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.fields.get(key)
    }

    /// Iterates over submitted field names in no particular order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of submitted fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when nothing was submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extracts the `prefix[name]` sub-form, keyed by `name`.
    ///
    /// A trailing `[]` (array notation) is accepted and stripped.
    #[must_use]
    pub fn nested(&self, prefix: &str) -> Self {
        let mut nested = Self::new();
        for (key, value) in &self.fields {
            let Some(name) = nested_name(key, prefix) else {
                continue;
            };
            for item in value.values() {
                nested.append(name, item.clone());
            }
        }
        nested
    }
}

fn nested_name<'k>(key: &'k str, prefix: &str) -> Option<&'k str> {
    let bracketed = key.strip_prefix(prefix)?.strip_prefix('[')?;
    let scalar = bracketed.strip_suffix("[]").unwrap_or(bracketed);
    let name = scalar.strip_suffix(']')?;
    (!name.is_empty() && !name.contains(['[', ']'])).then_some(name)
}

impl<K, V> FromIterator<(K, V)> for FormInput
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
