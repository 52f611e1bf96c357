//! Application context shared by every command.
//!
//! [`AppContext`] holds the workspace root, the settings loaded from
//! `.omnera.toml` and the schema registry, which is built once per process.

use std::path::{Path, PathBuf};

use anyhow::Context;
use omnera_config::SchemaRegistry;
use serde_json::Value;

use crate::settings::{SETTINGS_FILE, Settings};

pub struct AppContext {
    /// Workspace root; relative paths and `${workspaceFolder}` resolve here.
    pub workspace: PathBuf,
    pub settings: Settings,
    pub registry: SchemaRegistry,
}

impl AppContext {
    /// Loads settings from `<workspace>/.omnera.toml` and builds the registry.
    pub async fn new(workspace: PathBuf) -> anyhow::Result<Self> {
        let settings = Settings::load(&workspace.join(SETTINGS_FILE)).await?;
        Self::with_settings(workspace, settings)
    }

    pub fn with_settings(workspace: PathBuf, settings: Settings) -> anyhow::Result<Self> {
        let registry = SchemaRegistry::standard().context("Failed to build the schema registry")?;
        Ok(Self {
            workspace,
            settings,
            registry,
        })
    }

    /// Resolves `path` against the workspace unless it is absolute.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = PathBuf::from(self.value_replace_with_var(path.as_ref().as_os_str()));
        if path.is_absolute() {
            path
        } else {
            self.workspace.join(path)
        }
    }

    /// Replaces `${workspaceFolder}` with the workspace directory.
    pub fn value_replace_with_var<S>(&self, value: S) -> String
    where
        S: AsRef<std::ffi::OsStr>,
    {
        let raw = value.as_ref().to_string_lossy();
        raw.replace(
            "${workspaceFolder}",
            format!("{}", self.workspace.display()).as_ref(),
        )
    }

    /// Directory `omnera export` writes into when `--out` is not given.
    pub fn export_dir(&self) -> PathBuf {
        self.resolve_path(&self.settings.export.dir)
    }

    /// Reads a `.json` or `.toml` document and checks its nesting depth.
    pub async fn load_document(&self, path: impl AsRef<Path>) -> anyhow::Result<Value> {
        let path = self.resolve_path(path);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("can not open config file: {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let value: Value = match ext {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
            "toml" => {
                let v: toml::Value = toml::from_str(&content)
                    .with_context(|| format!("Invalid TOML in {}", path.display()))?;
                serde_json::to_value(v)?
            }
            _ => bail!("Unsupported config file extension: {ext:?}"),
        };

        let max_depth = self.settings.limits.max_depth;
        if exceeds_depth(&value, max_depth) {
            bail!(
                "{} nests deeper than the limit of {max_depth} levels",
                path.display()
            );
        }
        debug!("loaded {}", path.display());
        Ok(value)
    }
}

/// Whether `value` has more than `max` levels of arrays and objects.
pub fn exceeds_depth(value: &Value, max: usize) -> bool {
    let children: Box<dyn Iterator<Item = &Value>> = match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(map) => Box::new(map.values()),
        _ => return false,
    };
    if max == 0 {
        return true;
    }
    children.into_iter().any(|child| exceeds_depth(child, max - 1))
}
