//! Shape-level validation of form input against a parameter schema.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use super::{FormInput, FormValue};
use crate::schema::{ParamKind, ParamSpec, Scalar};
use crate::value::ParamValue;

const FORM_TARGET: &str = "armory_plugins::form";

/// Boolean tokens accepted as `true`, compared ASCII case-insensitively.
const TRUE_TOKENS: [&str; 4] = ["true", "yes", "on", "1"];
/// Boolean tokens accepted as `false`, compared ASCII case-insensitively.
const FALSE_TOKENS: [&str; 4] = ["false", "no", "off", "0"];

/// One field-level problem with a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    /// A required field without a default was not submitted.
    #[error("{field} is required")]
    MissingRequired {
        /// Field name.
        field: String,
    },

    /// A value could not be converted to the field's kind.
    #[error("{field}: '{value}' is not a valid {expected}")]
    InvalidFormat {
        /// Field name.
        field: String,
        /// Offending raw value.
        value: String,
        /// What the field expects.
        expected: String,
    },

    /// A converted value violates a declared constraint.
    #[error("{field}: '{value}' must satisfy {constraint}")]
    ConstraintViolation {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// The violated constraint.
        constraint: String,
    },
}

impl FieldError {
    /// Returns the field the error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequired { field }
            | Self::InvalidFormat { field, .. }
            | Self::ConstraintViolation { field, .. } => field,
        }
    }
}

/// Every field error found in one submission, in schema order.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Wraps a list of errors, returning `None` when it is empty.
    #[must_use]
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self(errors))
    }

    /// Wraps a single error.
    #[must_use]
    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    /// Returns the errors.
    #[must_use]
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the errors.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Returns the errors reported for `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.0.iter().filter(move |error| error.field() == field)
    }

    /// Appends the errors of another submission.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Consumes the collection.
    #[must_use]
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parameters accepted by [`validate`], in schema order.
///
/// Holds only names present in the schema. Optional fields that were not
/// submitted are absent rather than null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParams {
    entries: Vec<(String, ParamValue)>,
}

impl ValidatedParams {
    /// Parameter set with nothing accepted, for runs that take no arguments.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the value accepted for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns `true` if a value was accepted for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over accepted names and values in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of accepted values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns the value for `name`.
    pub(crate) fn take(&mut self, name: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Converts the accepted values into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for ValidatedParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Validates a submission against a schema.
///
/// Every spec is checked before returning, so the error list covers the whole
/// form. Fields not named by the schema are dropped. Blank submissions count
/// as absent, as do list submissions holding only separators.
///
/// # Errors
///
/// Returns [`FieldErrors`] listing each missing, malformed, or out-of-bounds
/// field in schema order.
///
/// # Example
///
/// ```
/// use armory_plugins::form::{self, FieldError, FormInput};
/// use armory_plugins::schema::derive_declarations;
/// use armory_plugins::{DeclaredType, ParamDecl};
///
/// let specs = derive_declarations(
///     "example",
///     &[ParamDecl::new("port", DeclaredType::Integer).required()],
/// )
/// .expect("schema derives");
///
/// let errors = form::validate(&FormInput::new(), &specs).expect_err("port is missing");
/// assert_eq!(
///     errors.as_slice(),
///     [FieldError::MissingRequired { field: "port".into() }]
/// );
/// ```
pub fn validate(input: &FormInput, specs: &[ParamSpec]) -> Result<ValidatedParams, FieldErrors> {
    let mut accepted = ValidatedParams::empty();
    let mut errors = Vec::new();

    for spec in specs {
        match input.get(spec.name()).filter(|value| is_present(spec, value)) {
            None if spec.needs_input() => errors.push(FieldError::MissingRequired {
                field: spec.name().to_owned(),
            }),
            None => {}
            Some(raw) => match convert(spec, raw) {
                Ok(value) => accepted.entries.push((spec.name().to_owned(), value)),
                Err(error) => errors.push(error),
            },
        }
    }

    for unknown in input
        .field_names()
        .filter(|name| !specs.iter().any(|spec| spec.name() == *name))
    {
        debug!(target: FORM_TARGET, field = unknown, "dropping undeclared form field");
    }

    match FieldErrors::from_vec(errors) {
        None => Ok(accepted),
        Some(errors) => Err(errors),
    }
}

fn convert(spec: &ParamSpec, raw: &FormValue) -> Result<ParamValue, FieldError> {
    match spec.kind() {
        ParamKind::List { element } => {
            let scalar = element.scalar();
            raw.values()
                .iter()
                .flat_map(|value| split_list(value))
                .map(|piece| convert_checked(spec, scalar, piece))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::List)
        }
        kind => {
            let Some(scalar) = kind.scalar() else {
                return Err(invalid_format(spec, &raw.values().join(","), "value"));
            };
            let Some(text) = raw.single() else {
                return Err(invalid_format(
                    spec,
                    &raw.values().join(","),
                    &format!("single {}", scalar.name()),
                ));
            };
            convert_checked(spec, scalar, text)
        }
    }
}

fn is_present(spec: &ParamSpec, value: &FormValue) -> bool {
    match spec.kind() {
        ParamKind::List { .. } => value
            .values()
            .iter()
            .any(|piece| split_list(piece).next().is_some()),
        _ => !value.is_blank(),
    }
}

/// Splits a list submission on commas and runs of whitespace.
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|piece| !piece.is_empty())
}

fn convert_checked(
    spec: &ParamSpec,
    scalar: Scalar<'_>,
    text: &str,
) -> Result<ParamValue, FieldError> {
    let value = convert_scalar(spec, scalar, text)?;
    match spec.constraints().violation(&value) {
        None => Ok(value),
        Some(constraint) => Err(FieldError::ConstraintViolation {
            field: spec.name().to_owned(),
            value: text.to_owned(),
            constraint,
        }),
    }
}

fn convert_scalar(
    spec: &ParamSpec,
    scalar: Scalar<'_>,
    text: &str,
) -> Result<ParamValue, FieldError> {
    let trimmed = text.trim();
    match scalar {
        Scalar::String => Ok(ParamValue::String(text.to_owned())),
        Scalar::Integer => trimmed
            .parse::<i64>()
            .map(ParamValue::Integer)
            .map_err(|_| invalid_format(spec, text, scalar.name())),
        Scalar::Boolean => parse_bool(trimmed)
            .map(ParamValue::Boolean)
            .ok_or_else(|| invalid_format(spec, text, scalar.name())),
        Scalar::Enum(choices) => {
            if choices.iter().any(|choice| choice == trimmed) {
                Ok(ParamValue::String(trimmed.to_owned()))
            } else {
                Err(FieldError::ConstraintViolation {
                    field: spec.name().to_owned(),
                    value: text.to_owned(),
                    constraint: format!("one of: {}", choices.join(", ")),
                })
            }
        }
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    if TRUE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(true)
    } else if FALSE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(false)
    } else {
        None
    }
}

fn invalid_format(spec: &ParamSpec, value: &str, expected: &str) -> FieldError {
    FieldError::InvalidFormat {
        field: spec.name().to_owned(),
        value: value.to_owned(),
        expected: expected.to_owned(),
    }
}
