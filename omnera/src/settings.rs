//! CLI settings read from `.omnera.toml`.
//!
//! ```toml
//! [export]
//! dir = "${workspaceFolder}/schemas"
//! typescript = true
//!
//! [limits]
//! max_depth = 64
//! ```

use std::path::Path;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// File name looked up in the workspace root.
pub const SETTINGS_FILE: &str = ".omnera.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Where and what `omnera export` writes.
    pub export: ExportSettings,
    /// Limits applied to incoming configuration documents.
    pub limits: Limits,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    /// Output directory; a `<version>` subdirectory is created inside it.
    /// `${workspaceFolder}` expands to the workspace root.
    pub dir: String,
    /// Whether to write `types.d.ts` next to the JSON Schema.
    pub typescript: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir: "schemas".into(),
            typescript: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct Limits {
    /// Maximum nesting depth of a configuration document.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

impl Settings {
    /// Reads settings from `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, using default settings", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// JSON Schema for the settings file.
    pub fn json_schema() -> anyhow::Result<serde_json::Value> {
        let schema = schemars::schema_for!(Settings);
        Ok(serde_json::to_value(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: Settings = toml::from_str("[limits]\nmax_depth = 8\n").unwrap();
        assert_eq!(settings.limits.max_depth, 8);
        assert_eq!(settings.export, ExportSettings::default());
    }

    #[test]
    fn test_settings_schema() {
        let schema = Settings::json_schema().unwrap();
        assert!(schema["properties"]["export"].is_object());
    }
}
