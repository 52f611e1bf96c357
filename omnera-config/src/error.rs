//! Error types for registries and configuration validation.

use omnera_schema::ValidationErrors;
use thiserror::Error;

/// Errors raised while assembling schema registries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("{feature}: variant tag '{tag}' is registered twice")]
    DuplicateTag { feature: String, tag: String },

    #[error("{feature}: variant has no literal string '{discriminator}' field")]
    MissingTag {
        feature: String,
        discriminator: String,
    },

    #[error("schema '{name}' is registered twice")]
    DuplicateSchema { name: String },

    #[error("schema '{name}' is not registered")]
    MissingSchema { name: String },
}

/// Errors raised while validating a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("validated '{schema}' tree does not decode: {source}")]
    Decode {
        schema: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("no identifiers left below the maximum safe integer")]
    IdExhausted,
}

impl ConfigError {
    /// The validation failures, when this error is one.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            ConfigError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}
