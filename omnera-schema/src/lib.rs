//! # omnera-schema
//!
//! Composable schema nodes for validating structured configuration, with
//! path-precise errors and JSON Schema interchange.
//!
//! ## Features
//!
//! - Primitive validators: strings (length, pattern), numbers and integers
//!   (inclusive range), booleans, closed literal sets
//! - Composite builders: structs, arrays, records, unions, discriminated
//!   unions, optional fields with defaults
//! - Every failure carries the dotted/bracketed path of the offending input
//! - Export to JSON Schema and TypeScript declarations; import back from
//!   JSON Schema with the same accepted set of values
//!
//! ## Quick Start
//!
//! ```rust
//! use omnera_schema::{SchemaNode, to_json_schema, from_json_schema};
//! use serde_json::json;
//!
//! let app = SchemaNode::structure([
//!     ("name", SchemaNode::string().pattern("^[a-z][a-z0-9-]*$")),
//!     ("version", SchemaNode::string().optional()),
//! ]);
//!
//! let tree = app.validate(&json!({"name": "todo-app"})).unwrap();
//! assert_eq!(tree, json!({"name": "todo-app"}));
//!
//! let err = app.validate(&json!({"name": "Invalid App Name"})).unwrap_err();
//! assert_eq!(err.first().path().to_string(), "name");
//!
//! let imported = from_json_schema(&to_json_schema(&app)).unwrap();
//! assert!(imported.is_valid(&json!({"name": "todo-app", "version": "1.0.0"})));
//! ```
//!
//! ## Modules
//!
//! - [`node`] - Schema nodes, factories and builder methods
//! - [`error`] - Validation and import errors
//! - [`path`] - Locations inside a validated document
//! - [`export`] - JSON Schema and TypeScript export
//! - [`import`] - JSON Schema import

#[macro_use]
extern crate log;

/// Validation and import error types.
pub mod error;

/// Interchange exports.
pub mod export;

/// JSON Schema reader.
pub mod import;

/// Schema nodes, factories and builder methods.
pub mod node;

/// Document paths.
pub mod path;

mod validate;

pub use error::{Constraint, ErrorCategory, ImportError, ValidationError, ValidationErrors};
pub use export::{to_json_schema, to_typescript};
pub use import::from_json_schema;
pub use node::{Annotations, SchemaKind, SchemaNode};
pub use path::Path;
pub use serde_json::Value;

/// Largest integer a double-precision float represents exactly (2^53 - 1).
///
/// Identifier schemas are bounded by it so ids survive JSON number round-trips.
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;
