//! # omnera-config
//!
//! The Omnera application model: every feature (tables, pages, automations,
//! connections, blocks) contributes schemas to a [`SchemaRegistry`], which
//! validates configuration documents into a typed [`AppConfig`].
//!
//! ## Quick Start
//!
//! ```rust
//! use omnera_config::SchemaRegistry;
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::standard().unwrap();
//! let app = registry
//!     .validate_app(&json!({"name": "todo-app", "version": "1.0.0"}))
//!     .unwrap();
//! assert_eq!(app.name, "todo-app");
//!
//! let err = registry.validate_app(&json!({"name": "Invalid App Name"})).unwrap_err();
//! assert!(err.validation().unwrap().has_path("name"));
//! ```
//!
//! Features only expose aggregate schemas; variant schemas stay private to
//! their module and are reachable through the aggregate union.

#[macro_use]
extern crate log;

pub mod app;
pub mod automations;
pub mod blocks;
pub mod common;
pub mod connections;
pub mod error;
pub mod pages;
pub mod registry;
pub mod tables;

pub use app::AppConfig;
pub use blocks::{BlockDefinition, BlockLibrary, BlockReference, Component, VarValue, Vars, resolve_block};
pub use error::{ConfigError, RegistryError};
pub use registry::{FeatureRegistry, SchemaRegistry};
