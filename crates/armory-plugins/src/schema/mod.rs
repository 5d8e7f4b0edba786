//! Parameter schemas derived from plugin declarations.
//!
//! [`derive`] is a pure function from a class's [`ParamDecl`]s to the ordered
//! [`ParamSpec`]s the form validator works with. It preserves declaration
//! order so forms render stably, and it fails closed: a declaration the
//! validator cannot handle is a [`SchemaError`], never a silent coercion.

mod declaration;

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::class::PluginClass;
use crate::error::SchemaError;
use crate::value::ParamValue;

pub use self::declaration::{DeclaredType, ParamDecl};

/// Element kind of a list parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// Free text.
    String,
    /// Signed integer.
    Integer,
    /// Boolean flag.
    Boolean,
    /// One choice from a fixed set.
    Enum {
        /// Accepted choices.
        choices: Vec<String>,
    },
}

/// Validated kind of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    /// Free text.
    String,
    /// Signed integer.
    Integer,
    /// Boolean flag.
    Boolean,
    /// One choice from a fixed set.
    Enum {
        /// Accepted choices.
        choices: Vec<String>,
    },
    /// Comma or whitespace separated list of scalars.
    List {
        /// Element kind.
        element: ElementKind,
    },
}

/// Borrowed view of a scalar kind, shared by scalar and list conversion.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scalar<'a> {
    String,
    Integer,
    Boolean,
    Enum(&'a [String]),
}

impl Scalar<'_> {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Enum(_) => "choice",
        }
    }
}

impl ElementKind {
    pub(crate) fn scalar(&self) -> Scalar<'_> {
        match self {
            Self::String => Scalar::String,
            Self::Integer => Scalar::Integer,
            Self::Boolean => Scalar::Boolean,
            Self::Enum { choices } => Scalar::Enum(choices),
        }
    }
}

impl ParamKind {
    /// Returns the scalar view, or `None` for lists.
    pub(crate) fn scalar(&self) -> Option<Scalar<'_>> {
        match self {
            Self::String => Some(Scalar::String),
            Self::Integer => Some(Scalar::Integer),
            Self::Boolean => Some(Scalar::Boolean),
            Self::Enum { choices } => Some(Scalar::Enum(choices)),
            Self::List { .. } => None,
        }
    }

    const fn takes_integers(&self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::List {
                    element: ElementKind::Integer
                }
        )
    }

    const fn takes_strings(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::List {
                    element: ElementKind::String
                }
        )
    }

    fn accepts(&self, value: &ParamValue) -> bool {
        match (self.scalar(), self, value) {
            (Some(scalar), _, _) => scalar_accepts(scalar, value),
            (None, Self::List { element }, ParamValue::List(items)) => {
                items.iter().all(|item| scalar_accepts(element.scalar(), item))
            }
            (None, _, _) => false,
        }
    }
}

fn scalar_accepts(scalar: Scalar<'_>, value: &ParamValue) -> bool {
    match (scalar, value) {
        (Scalar::String, ParamValue::String(_))
        | (Scalar::Integer, ParamValue::Integer(_))
        | (Scalar::Boolean, ParamValue::Boolean(_)) => true,
        (Scalar::Enum(choices), ParamValue::String(choice)) => choices.contains(choice),
        _ => false,
    }
}

/// Inclusive integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntRange {
    min: i64,
    max: i64,
}

impl IntRange {
    /// Returns the lower bound.
    #[must_use]
    pub const fn min(self) -> i64 {
        self.min
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn max(self) -> i64 {
        self.max
    }

    /// Returns `true` if `value` lies within the bounds.
    #[must_use]
    pub const fn contains(self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range {}..={}", self.min, self.max)
    }
}

/// Regular expression that must match a whole value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    /// Returns the pattern as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.source.as_str()
    }

    /// Returns `true` if the whole of `value` matches.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern /{}/", self.source)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Value constraints beyond the kind itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<IntRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<Pattern>,
}

impl Constraints {
    /// Returns the integer range, if any.
    #[must_use]
    pub const fn range(&self) -> Option<IntRange> {
        self.range
    }

    /// Returns the pattern, if any.
    #[must_use]
    pub const fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Checks one scalar value, returning the violated constraint.
    pub(crate) fn violation(&self, value: &ParamValue) -> Option<String> {
        match value {
            ParamValue::Integer(number) => self
                .range
                .filter(|range| !range.contains(*number))
                .map(|range| range.to_string()),
            ParamValue::String(text) => self
                .pattern
                .as_ref()
                .filter(|pattern| !pattern.matches(text))
                .map(ToString::to_string),
            ParamValue::Boolean(_) | ParamValue::List(_) => None,
        }
    }
}

/// Shape of one parameter, as the form validator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<ParamValue>,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    constraints: Constraints,
}

impl ParamSpec {
    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the validated kind.
    #[must_use]
    pub const fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Returns `true` when the parameter is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value.
    #[must_use]
    pub const fn default(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    /// Returns the help text.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the value constraints.
    #[must_use]
    pub const fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Returns `true` when a missing submission is an error.
    #[must_use]
    pub const fn needs_input(&self) -> bool {
        self.required && self.default.is_none()
    }
}

/// Derives the parameter schema of a plugin class.
///
/// # Errors
///
/// Returns [`SchemaError::UnsupportedParamKind`] for declared kinds the
/// validator cannot handle and [`SchemaError::InvalidDeclaration`] for
/// inconsistent declarations.
pub fn derive(class: &PluginClass) -> Result<Vec<ParamSpec>, SchemaError> {
    derive_declarations(class.identifier().as_str(), class.params())
}

/// Derives a schema from declarations owned by `owner`.
///
/// Used for plugin classes and for the static job forms.
///
/// # Errors
///
/// See [`derive`].
pub fn derive_declarations(
    owner: &str,
    decls: &[ParamDecl],
) -> Result<Vec<ParamSpec>, SchemaError> {
    let mut seen = HashSet::with_capacity(decls.len());
    decls
        .iter()
        .map(|decl| {
            if !seen.insert(decl.name()) {
                return Err(invalid(owner, decl, "declared more than once"));
            }
            derive_one(owner, decl)
        })
        .collect()
}

fn derive_one(owner: &str, decl: &ParamDecl) -> Result<ParamSpec, SchemaError> {
    if decl.name().trim().is_empty() {
        return Err(invalid(owner, decl, "name must not be empty"));
    }
    let kind = param_kind(owner, decl)?;
    let constraints = constraints(owner, decl, &kind)?;

    if let Some(default) = decl.default() {
        let fits = kind.accepts(default) && default_within(&constraints, default);
        if !fits {
            return Err(invalid(
                owner,
                decl,
                &format!("default {default} does not satisfy {}", decl.declared()),
            ));
        }
    }

    Ok(ParamSpec {
        name: decl.name().to_owned(),
        kind,
        required: decl.is_required(),
        default: decl.default().cloned(),
        description: decl.description().to_owned(),
        constraints,
    })
}

fn default_within(constraints: &Constraints, value: &ParamValue) -> bool {
    match value {
        ParamValue::List(items) => items.iter().all(|item| constraints.violation(item).is_none()),
        scalar => constraints.violation(scalar).is_none(),
    }
}

fn param_kind(owner: &str, decl: &ParamDecl) -> Result<ParamKind, SchemaError> {
    match decl.declared() {
        DeclaredType::String => Ok(ParamKind::String),
        DeclaredType::Integer => Ok(ParamKind::Integer),
        DeclaredType::Boolean => Ok(ParamKind::Boolean),
        DeclaredType::Enum { choices } => Ok(ParamKind::Enum {
            choices: enum_choices(owner, decl, choices)?,
        }),
        DeclaredType::List { element } => {
            let element = match element.as_ref() {
                DeclaredType::String => ElementKind::String,
                DeclaredType::Integer => ElementKind::Integer,
                DeclaredType::Boolean => ElementKind::Boolean,
                DeclaredType::Enum { choices } => ElementKind::Enum {
                    choices: enum_choices(owner, decl, choices)?,
                },
                DeclaredType::List { .. }
                | DeclaredType::Float
                | DeclaredType::Map
                | DeclaredType::Other { .. } => return Err(unsupported(owner, decl)),
            };
            Ok(ParamKind::List { element })
        }
        DeclaredType::Float | DeclaredType::Map | DeclaredType::Other { .. } => {
            Err(unsupported(owner, decl))
        }
    }
}

fn enum_choices(
    owner: &str,
    decl: &ParamDecl,
    choices: &[String],
) -> Result<Vec<String>, SchemaError> {
    if choices.is_empty() {
        return Err(invalid(owner, decl, "enum declares no choices"));
    }
    let mut unique = HashSet::with_capacity(choices.len());
    if let Some(duplicate) = choices.iter().find(|choice| !unique.insert(choice.as_str())) {
        return Err(invalid(
            owner,
            decl,
            &format!("enum choice '{duplicate}' is repeated"),
        ));
    }
    Ok(choices.to_vec())
}

fn constraints(
    owner: &str,
    decl: &ParamDecl,
    kind: &ParamKind,
) -> Result<Constraints, SchemaError> {
    let range = match decl.range() {
        None => None,
        Some(_) if !kind.takes_integers() => {
            return Err(invalid(owner, decl, "range constraint requires an integer kind"));
        }
        Some((min, max)) if min > max => {
            return Err(invalid(owner, decl, &format!("range {min}..={max} is empty")));
        }
        Some((min, max)) => Some(IntRange { min, max }),
    };

    let pattern = match decl.pattern() {
        None => None,
        Some(_) if !kind.takes_strings() => {
            return Err(invalid(owner, decl, "pattern constraint requires a string kind"));
        }
        Some(source) => Some(Pattern::compile(source).map_err(|error| {
            invalid(owner, decl, &format!("pattern does not compile: {error}"))
        })?),
    };

    Ok(Constraints { range, pattern })
}

fn unsupported(owner: &str, decl: &ParamDecl) -> SchemaError {
    SchemaError::UnsupportedParamKind {
        owner: owner.to_owned(),
        param: decl.name().to_owned(),
        declared: decl.declared().to_string(),
    }
}

fn invalid(owner: &str, decl: &ParamDecl, reason: &str) -> SchemaError {
    SchemaError::InvalidDeclaration {
        owner: owner.to_owned(),
        param: decl.name().to_owned(),
        reason: reason.to_owned(),
    }
}
