//! Validation and import error types.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::path::Path;

/// A constraint that a correctly typed value can still violate.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// String must match a regular expression.
    Pattern(String),
    /// Minimum string length in characters.
    MinLength(usize),
    /// Maximum string length in characters.
    MaxLength(usize),
    /// Inclusive lower bound.
    Minimum(f64),
    /// Inclusive upper bound.
    Maximum(f64),
    /// Number must be integral.
    Integer,
    /// Value must be one of a closed literal set.
    OneOf(Vec<Value>),
    /// Minimum number of array elements.
    MinItems(usize),
    /// Maximum number of array elements.
    MaxItems(usize),
    /// Array elements must not repeat the value under this key.
    UniqueBy(String),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Pattern(p) => write!(f, "must match pattern {p}"),
            Constraint::MinLength(n) => write!(f, "must be at least {n} characters long"),
            Constraint::MaxLength(n) => write!(f, "must be at most {n} characters long"),
            Constraint::Minimum(n) => write!(f, "must be greater than or equal to {n}"),
            Constraint::Maximum(n) => write!(f, "must be less than or equal to {n}"),
            Constraint::Integer => f.write_str("must be an integer"),
            Constraint::OneOf(values) => {
                let list = values
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "must be one of: {list}")
            }
            Constraint::MinItems(n) => write!(f, "must contain at least {n} item(s)"),
            Constraint::MaxItems(n) => write!(f, "must contain at most {n} item(s)"),
            Constraint::UniqueBy(key) => write!(f, "must have a unique '{key}'"),
        }
    }
}

/// Coarse classification of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing field, wrong JSON type or undeclared property.
    Shape,
    /// Correct type, but a length/range/pattern/enum/count rule failed.
    Constraint,
    /// Union value whose tag or shape selects no variant.
    Discriminator,
    /// A schema reference that could not be resolved.
    Reference,
}

/// A single validation failure, located by its path in the input document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{path}: required field is missing")]
    Missing { path: Path },

    #[error("{path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: Path,
        expected: String,
        actual: Value,
    },

    #[error("{path}: {message}")]
    Constraint {
        path: Path,
        constraint: Constraint,
        message: String,
        actual: Value,
    },

    #[error("{path}: unknown property")]
    UnknownProperty { path: Path, actual: Value },

    #[error("{path}: unknown type: {tag}")]
    UnknownVariant {
        path: Path,
        discriminator: String,
        tag: String,
    },

    #[error("{path}: value does not match any allowed variant")]
    NoMatchingVariant { path: Path, actual: Value },

    #[error("{path}: unresolved schema reference '{name}'")]
    UnresolvedReference { path: Path, name: String },
}

impl ValidationError {
    pub fn path(&self) -> &Path {
        match self {
            ValidationError::Missing { path }
            | ValidationError::TypeMismatch { path, .. }
            | ValidationError::Constraint { path, .. }
            | ValidationError::UnknownProperty { path, .. }
            | ValidationError::UnknownVariant { path, .. }
            | ValidationError::NoMatchingVariant { path, .. }
            | ValidationError::UnresolvedReference { path, .. } => path,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::Missing { .. }
            | ValidationError::TypeMismatch { .. }
            | ValidationError::UnknownProperty { .. } => ErrorCategory::Shape,
            ValidationError::Constraint { .. } => ErrorCategory::Constraint,
            ValidationError::UnknownVariant { .. } | ValidationError::NoMatchingVariant { .. } => {
                ErrorCategory::Discriminator
            }
            ValidationError::UnresolvedReference { .. } => ErrorCategory::Reference,
        }
    }

    /// Human-readable description of what the failing location expected.
    pub fn expected(&self) -> String {
        match self {
            ValidationError::Missing { .. } => "a value".to_string(),
            ValidationError::TypeMismatch { expected, .. } => expected.clone(),
            ValidationError::Constraint { constraint, .. } => constraint.to_string(),
            ValidationError::UnknownProperty { .. } => "no undeclared properties".to_string(),
            ValidationError::UnknownVariant { discriminator, .. } => {
                format!("a registered '{discriminator}' value")
            }
            ValidationError::NoMatchingVariant { .. } => "one of the union variants".to_string(),
            ValidationError::UnresolvedReference { name, .. } => format!("definition '{name}'"),
        }
    }

    /// The offending raw value, when there is one.
    pub fn actual(&self) -> Option<&Value> {
        match self {
            ValidationError::TypeMismatch { actual, .. }
            | ValidationError::Constraint { actual, .. }
            | ValidationError::UnknownProperty { actual, .. }
            | ValidationError::NoMatchingVariant { actual, .. } => Some(actual),
            _ => None,
        }
    }
}

/// All failures found while validating one document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    /// The first failure encountered.
    pub fn first(&self) -> &ValidationError {
        &self.0[0]
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Whether any failure is located exactly at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path() == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors raised while reading an external JSON Schema document.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{pointer}: unsupported schema: {reason}")]
    Unsupported { pointer: String, reason: String },

    #[error("{pointer}: invalid keyword '{keyword}': {reason}")]
    InvalidKeyword {
        pointer: String,
        keyword: String,
        reason: String,
    },

    #[error("{pointer}: invalid pattern: {source}")]
    Pattern {
        pointer: String,
        #[source]
        source: regex::Error,
    },

    #[error("{pointer}: unresolved reference '{reference}'")]
    UnresolvedReference { pointer: String, reference: String },
}
