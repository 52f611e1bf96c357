//! # omnera
//!
//! Command line host for Omnera application configs.
//!
//! ## Commands
//!
//! - `omnera validate <config>` - validate a `.json` or `.toml` config
//! - `omnera resolve <config> <block> --var key=value` - expand one block
//! - `omnera pages <config>` - expand every page's sections
//! - `omnera export [--out <dir>]` - write `app.schema.json`, `types.d.ts`
//!   and `settings.schema.json` under a versioned directory
//!
//! ## Modules
//!
//! - [`ctx`] - Workspace paths, settings and the schema registry
//! - [`settings`] - `.omnera.toml`
//! - [`commands`] - Subcommand implementations

pub mod commands;

/// Application context and document loading.
pub mod ctx;

/// CLI settings.
pub mod settings;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
