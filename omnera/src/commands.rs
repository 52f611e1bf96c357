//! Implementations of the `omnera` subcommands.
//!
//! Each command returns its result instead of printing it, so the binary
//! decides how to render and tests can inspect the outcome.

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use omnera_config::{
    AppConfig, Component, ConfigError, VarValue, Vars,
    pages::ResolvedSection,
};
use omnera_schema::Value;

use crate::{ctx::AppContext, settings::Settings};

/// Loads and validates the application config at `config`.
pub async fn validate(ctx: &AppContext, config: &Path) -> anyhow::Result<AppConfig> {
    let document = ctx.load_document(config).await?;
    let app = ctx
        .registry
        .validate_app(&document)
        .with_context(|| format!("{} is not a valid application config", config.display()))?;
    info!("{} is valid", config.display());
    Ok(app)
}

/// One-line counts of what a validated app declares.
pub fn summary(app: &AppConfig) -> String {
    format!(
        "{} {}: {} table(s), {} page(s), {} automation(s), {} connection(s), {} block(s)",
        app.name,
        app.version.as_deref().unwrap_or("(unversioned)"),
        app.tables.len(),
        app.pages.len(),
        app.automations.len(),
        app.connections.len(),
        app.blocks.len(),
    )
}

/// Parses a `key=value` variable. Numbers and booleans keep their type.
pub fn parse_var(s: &str) -> anyhow::Result<(String, VarValue)> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        bail!("variable name is empty in '{s}'");
    }
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Bool(b)) => VarValue::Bool(b),
        Ok(Value::Number(n)) => VarValue::Number(n),
        _ => VarValue::String(raw.to_string()),
    };
    Ok((key.to_string(), value))
}

/// Resolves block `name` of the app at `config` with `vars`.
pub async fn resolve(
    ctx: &AppContext,
    config: &Path,
    name: &str,
    vars: Vec<(String, VarValue)>,
) -> anyhow::Result<Component> {
    let app = validate(ctx, config).await?;
    let vars: Vars = vars.into_iter().collect();
    app.resolve_block(name, Some(&vars))
        .ok_or_else(|| anyhow!("no block named '{name}' in {}", config.display()))
}

/// Resolves every page's sections, in page order.
pub async fn pages(
    ctx: &AppContext,
    config: &Path,
) -> anyhow::Result<Vec<(String, Vec<ResolvedSection>)>> {
    let app = validate(ctx, config).await?;
    let library = app.block_library();
    Ok(app
        .pages
        .iter()
        .map(|page| (page.path.clone(), page.resolve_sections(&library)))
        .collect())
}

/// Writes the interchange artifacts under `<out>/<version>/`.
///
/// Returns the written paths.
pub async fn export(
    ctx: &AppContext,
    out: Option<&Path>,
    version: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    let dir = match out {
        Some(out) => ctx.resolve_path(out),
        None => ctx.export_dir(),
    }
    .join(version);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut artifacts = vec![(
        dir.join("app.schema.json"),
        serde_json::to_string_pretty(&ctx.registry.json_schema("App")?)?,
    )];
    if ctx.settings.export.typescript {
        artifacts.push((dir.join("types.d.ts"), ctx.registry.typescript("App")?));
    }
    artifacts.push((
        dir.join("settings.schema.json"),
        serde_json::to_string_pretty(&Settings::json_schema()?)?,
    ));

    let mut written = Vec::with_capacity(artifacts.len());
    for (path, content) in artifacts {
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Prints `err`, listing each validation failure with its path.
pub fn report_error(err: &anyhow::Error) {
    eprintln!("{} {err}", "error:".red().bold());
    let failures = err
        .chain()
        .find_map(|e| e.downcast_ref::<ConfigError>())
        .and_then(ConfigError::validation);
    if let Some(failures) = failures {
        for failure in failures.iter() {
            eprintln!("  {} {}", failure.path().to_string().yellow(), failure);
        }
    }
}

/// Renders resolved sections for the terminal.
pub fn render_sections(path: &str, sections: &[ResolvedSection]) -> anyhow::Result<String> {
    let mut out = format!("{}\n", path.bold());
    for (i, section) in sections.iter().enumerate() {
        let line = match section {
            ResolvedSection::Component(c) => serde_json::to_string(c)?,
            ResolvedSection::Form(f) => serde_json::to_string(f)?,
            ResolvedSection::Missing { name } => {
                format!("missing block '{name}'").yellow().to_string()
            }
        };
        out += &format!("  [{i}] {line}\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("title=Hello world").unwrap(),
            ("title".to_string(), VarValue::from("Hello world"))
        );
        assert_eq!(parse_var("n=3").unwrap().1, VarValue::from(3));
        assert_eq!(parse_var("on=true").unwrap().1, VarValue::from(true));
        assert_eq!(parse_var("v=a=b").unwrap().1, VarValue::from("a=b"));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }
}
