//! Interchange exports of schema nodes.
//!
//! - [`json_schema`] - JSON Schema (draft 2020-12) documents
//! - [`typescript`] - TypeScript type declarations for static-typing consumers

/// JSON Schema document export.
pub mod json_schema;

/// TypeScript declaration export.
pub mod typescript;

pub use json_schema::to_json_schema;
pub use typescript::to_typescript;
