//! Pages: routed component trees assembled from blocks, forms and inline
//! components.

use serde::{Deserialize, Serialize};

use omnera_schema::SchemaNode;

use crate::{
    blocks::{BlockLibrary, BlockReference, Component},
    common,
    error::RegistryError,
    registry::{FeatureRegistry, SchemaRegistry},
};

mod inputs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

/// A form control, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PageInput {
    Text(TextInput),
    Email(TextInput),
    LongText(TextInput),
    Checkbox(CheckboxInput),
    SingleSelect(SelectInput),
}

impl PageInput {
    pub fn name(&self) -> &str {
        match self {
            PageInput::Text(i) | PageInput::Email(i) | PageInput::LongText(i) => &i.name,
            PageInput::Checkbox(i) => &i.name,
            PageInput::SingleSelect(i) => &i.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Form,
}

/// A form section collecting values for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSection {
    #[serde(rename = "type")]
    pub kind: FormKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub inputs: Vec<PageInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,
}

/// One entry of a page's `sections`, in the order the validator tries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageSection {
    Reference(BlockReference),
    Form(FormSection),
    Component(Component),
}

/// A section after block references have been expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSection {
    Component(Component),
    Form(FormSection),
    /// Reference to a block that does not exist.
    Missing { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub sections: Vec<PageSection>,
}

impl Page {
    /// Expands block references against `library`, keeping section order.
    pub fn resolve_sections(&self, library: &BlockLibrary<'_>) -> Vec<ResolvedSection> {
        self.sections
            .iter()
            .map(|section| match section {
                PageSection::Reference(reference) => match library.resolve(reference) {
                    Some(component) => ResolvedSection::Component(component),
                    None => {
                        warn!(
                            "page '{}' references unknown block '{}'",
                            self.name, reference.name
                        );
                        ResolvedSection::Missing {
                            name: reference.name.clone(),
                        }
                    }
                },
                PageSection::Form(form) => ResolvedSection::Form(form.clone()),
                PageSection::Component(component) => ResolvedSection::Component(component.clone()),
            })
            .collect()
    }
}

fn meta_schema() -> SchemaNode {
    SchemaNode::structure([
        (
            "lang",
            SchemaNode::string()
                .pattern("^[a-z]{2}(?:-[A-Z]{2})?$")
                .message("Language must be a code such as 'en' or 'en-US'")
                .optional(),
        ),
        ("title", SchemaNode::string().optional()),
        ("description", SchemaNode::string().optional()),
    ])
    .description("Document metadata rendered into the page head")
}

fn form_schema(input: SchemaNode) -> SchemaNode {
    SchemaNode::structure([
        ("type", SchemaNode::literal("form")),
        ("table", common::name().optional()),
        (
            "inputs",
            SchemaNode::array(input).min_items(1).unique_by("name"),
        ),
        ("submitLabel", SchemaNode::string().optional()),
    ])
    .title("Form Section")
    .define("FormSection")
}

fn page_schema(section: SchemaNode) -> SchemaNode {
    SchemaNode::structure([
        ("id", common::id().optional()),
        ("name", common::name()),
        ("path", common::page_path()),
        ("meta", meta_schema().optional()),
        (
            "sections",
            SchemaNode::array(section).default_value(serde_json::json!([])),
        ),
    ])
    .title("Page")
    .description("A routed page built from sections")
    .define("Page")
}

pub(crate) fn register(registry: &mut SchemaRegistry) -> Result<(), RegistryError> {
    let mut input = FeatureRegistry::new("PageInput", "type")
        .with_description("A form input, selected by its `type`");
    input.register_all(inputs::variants())?;
    let input = registry.insert_feature(input)?;

    let section = SchemaNode::union([
        registry.require("BlockReference")?,
        form_schema(input),
        registry.require("Component")?,
    ])
    .description("A block reference, a form or an inline component")
    .define("PageSection");
    registry.insert("Page", page_schema(section))
}
