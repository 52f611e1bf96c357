//! The application root composing every feature.

use serde::{Deserialize, Serialize};

use omnera_schema::SchemaNode;

use crate::{
    automations::Automation,
    blocks::{BlockDefinition, BlockLibrary, Component, Vars, resolve_block},
    common,
    connections::Connection,
    error::RegistryError,
    pages::Page,
    registry::SchemaRegistry,
    tables::Table,
};

/// A validated application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub automations: Vec<Automation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockDefinition>,
}

impl AppConfig {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn block_library(&self) -> BlockLibrary<'_> {
        BlockLibrary::new(&self.blocks)
    }

    /// Resolves one of this app's blocks. `None` when no block has `name`.
    pub fn resolve_block(&self, name: &str, vars: Option<&Vars>) -> Option<Component> {
        resolve_block(name, Some(&self.blocks), vars)
    }
}

fn app_schema(registry: &SchemaRegistry) -> Result<SchemaNode, RegistryError> {
    Ok(SchemaNode::structure([
        ("name", common::app_name()),
        ("version", common::version().optional()),
        ("description", common::description().optional()),
        (
            "tables",
            SchemaNode::array(registry.require("Table")?)
                .unique_by("id")
                .unique_by("name")
                .optional(),
        ),
        (
            "pages",
            SchemaNode::array(registry.require("Page")?)
                .unique_by("name")
                .unique_by("path")
                .optional(),
        ),
        (
            "automations",
            SchemaNode::array(registry.require("Automation")?)
                .unique_by("name")
                .optional(),
        ),
        (
            "connections",
            SchemaNode::array(registry.require("Connection")?)
                .unique_by("id")
                .unique_by("name")
                .optional(),
        ),
        (
            "blocks",
            SchemaNode::array(registry.require("Block")?)
                .unique_by("name")
                .optional(),
        ),
    ])
    .title("Application")
    .description("Complete application configuration")
    .define("App"))
}

pub(crate) fn register(registry: &mut SchemaRegistry) -> Result<(), RegistryError> {
    let app = app_schema(registry)?;
    registry.insert("App", app)
}
