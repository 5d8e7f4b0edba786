//! Parameter declarations as plugins write them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// Parameter type as declared by a plugin.
///
/// The declaration vocabulary is wider than what the form validator accepts;
/// [`derive`](super::derive) rejects the kinds it cannot validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeclaredType {
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
    /// Comma or whitespace separated list.
    List {
        /// Element type.
        element: Box<DeclaredType>,
    },
    /// Floating-point number.
    Float,
    /// Key/value mapping.
    Map,
    /// A library-specific type with no form representation.
    Other {
        /// Type name as declared.
        name: String,
    },
}

impl DeclaredType {
    /// Shorthand for an enum declaration.
    #[must_use]
    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Shorthand for a list declaration.
    #[must_use]
    pub fn list_of(element: Self) -> Self {
        Self::List {
            element: Box::new(element),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Boolean => f.write_str("boolean"),
            Self::Enum { .. } => f.write_str("enum"),
            Self::List { element } => write!(f, "list<{element}>"),
            Self::Float => f.write_str("float"),
            Self::Map => f.write_str("map"),
            Self::Other { name } => f.write_str(name),
        }
    }
}

/// Declaration of one plugin parameter.
///
/// # Example
///
/// ```
/// use armory_plugins::{DeclaredType, ParamDecl, ParamValue};
///
/// let port = ParamDecl::new("port", DeclaredType::Integer)
///     .required()
///     .with_range(1, 65_535)
///     .describe("Port to connect back to");
/// assert!(port.is_required());
///
/// let shell = ParamDecl::new("shell", DeclaredType::choices(["sh", "bash"]))
///     .with_default(ParamValue::from("sh"));
/// assert_eq!(shell.default(), Some(&ParamValue::from("sh")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    name: String,
    #[serde(rename = "type")]
    declared: DeclaredType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<ParamValue>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    range: Option<(i64, i64)>,
    #[serde(default)]
    pattern: Option<String>,
}

impl ParamDecl {
    /// Declares an optional parameter with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared,
            required: false,
            default: None,
            description: String::new(),
            range: None,
            pattern: None,
        }
    }

    /// Marks the parameter as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: ParamValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts integers to an inclusive range.
    #[must_use]
    pub const fn with_range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Restricts strings to a full match of a regular expression.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    /// Returns `true` when the parameter must be set before invocation.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the declared default.
    #[must_use]
    pub const fn default(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    /// Returns the help text.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the declared inclusive range.
    #[must_use]
    pub const fn range(&self) -> Option<(i64, i64)> {
        self.range
    }

    /// Returns the declared pattern source.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}
