//! Reusable component templates ("blocks") and their `$variable` expansion.
//!
//! A [`BlockDefinition`] is a named component tree whose strings may contain
//! `$name` placeholders. Pages refer to blocks with a [`BlockReference`];
//! resolving one substitutes the reference's variables into a fresh
//! [`Component`] and never touches the stored definition.
//!
//! Substitution reaches props, content and children, never the component
//! `type`. Inside a longer string a variable is stringified (`4.0` prints as
//! `4`). A string that is exactly one bound placeholder, such as a prop
//! `"$count"`, takes the variable's typed value instead.

use std::{collections::{BTreeSet, HashMap}, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use omnera_schema::SchemaNode;

use crate::{common, error::RegistryError, registry::SchemaRegistry};

pub mod template;

pub use template::{Token, Vars, substitute, substitute_value, tokenize};

/// Value bound to a block variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    String(String),
    Number(Number),
    Bool(bool),
}

impl VarValue {
    pub fn to_json(&self) -> Value {
        match self {
            VarValue::String(s) => Value::String(s.clone()),
            VarValue::Number(n) => Value::Number(n.clone()),
            VarValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::String(s) => f.write_str(s),
            VarValue::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e15 => {
                    write!(f, "{}", x as i64)
                }
                _ => write!(f, "{n}"),
            },
            VarValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::String(s.to_string())
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::String(s)
    }
}

impl From<bool> for VarValue {
    fn from(b: bool) -> Self {
        VarValue::Bool(b)
    }
}

impl From<i32> for VarValue {
    fn from(n: i32) -> Self {
        VarValue::Number(n.into())
    }
}

impl From<i64> for VarValue {
    fn from(n: i64) -> Self {
        VarValue::Number(n.into())
    }
}

impl From<u64> for VarValue {
    fn from(n: u64) -> Self {
        VarValue::Number(n.into())
    }
}

impl From<f64> for VarValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or_else(|| VarValue::String(n.to_string()), VarValue::Number)
    }
}

/// A node of a page's component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Component>,
}

impl Component {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: Map::new(),
            content: None,
            children: Vec::new(),
        }
    }

    /// A copy with `vars` substituted into the props, content and children
    /// of the tree. Component types are never substituted.
    pub fn substitute(&self, vars: &Vars) -> Component {
        Component {
            kind: self.kind.clone(),
            props: self
                .props
                .iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, vars)))
                .collect(),
            content: self.content.as_deref().map(|c| substitute(c, vars)),
            children: self.children.iter().map(|c| c.substitute(vars)).collect(),
        }
    }

    fn collect_placeholders(&self, out: &mut BTreeSet<String>) {
        let mut add = |s: &str| out.extend(template::placeholders(s).map(str::to_string));
        if let Some(content) = &self.content {
            add(content);
        }
        for value in self.props.values() {
            value_placeholders(value, &mut add);
        }
        for child in &self.children {
            child.collect_placeholders(out);
        }
    }
}

fn value_placeholders(value: &Value, add: &mut impl FnMut(&str)) {
    match value {
        Value::String(s) => add(s),
        Value::Array(items) => {
            for item in items {
                value_placeholders(item, add);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                value_placeholders(item, add);
            }
        }
        _ => {}
    }
}

/// A named, reusable component template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    #[serde(flatten)]
    pub template: Component,
}

impl BlockDefinition {
    /// Placeholder names used anywhere in the template.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.template.collect_placeholders(&mut out);
        out
    }

    pub fn resolve(&self, vars: &Vars) -> Component {
        let unbound: Vec<_> = self
            .variables()
            .into_iter()
            .filter(|v| !vars.contains_key(v))
            .collect();
        if !unbound.is_empty() {
            debug!("block '{}': unbound variables {:?} kept verbatim", self.name, unbound);
        }
        self.template.substitute(vars)
    }
}

/// Use of a block from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReference {
    #[serde(rename = "$ref")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub vars: Vars,
}

/// Resolves the block called `name` with `vars`.
///
/// Returns `None` when there is no block list or no block by that name.
pub fn resolve_block(
    name: &str,
    blocks: Option<&[BlockDefinition]>,
    vars: Option<&Vars>,
) -> Option<Component> {
    let block = blocks?.iter().find(|b| b.name == name)?;
    let empty = Vars::new();
    Some(block.resolve(vars.unwrap_or(&empty)))
}

/// Name-indexed view over an application's block definitions.
#[derive(Debug, Default)]
pub struct BlockLibrary<'a> {
    blocks: HashMap<&'a str, &'a BlockDefinition>,
}

impl<'a> BlockLibrary<'a> {
    pub fn new(blocks: &'a [BlockDefinition]) -> Self {
        let mut map = HashMap::with_capacity(blocks.len());
        for block in blocks {
            if map.contains_key(block.name.as_str()) {
                warn!("duplicate block '{}' ignored; the first definition wins", block.name);
                continue;
            }
            map.insert(block.name.as_str(), block);
        }
        Self { blocks: map }
    }

    pub fn get(&self, name: &str) -> Option<&'a BlockDefinition> {
        self.blocks.get(name).copied()
    }

    pub fn resolve(&self, reference: &BlockReference) -> Option<Component> {
        let Some(block) = self.get(&reference.name) else {
            debug!("no block named '{}'", reference.name);
            return None;
        };
        Some(block.resolve(&reference.vars))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn component_members(component: &SchemaNode) -> [(&'static str, SchemaNode); 4] {
    [
        (
            "type",
            SchemaNode::string()
                .min_length(1)
                .description("Component type, such as 'section' or 'h1'"),
        ),
        (
            "props",
            SchemaNode::record(SchemaNode::any())
                .description("Free-form component properties")
                .optional(),
        ),
        ("content", SchemaNode::string().optional()),
        (
            "children",
            SchemaNode::array(component.clone()).optional(),
        ),
    ]
}

/// The recursive component tree node. `children` refer back to it.
fn component_schema() -> SchemaNode {
    SchemaNode::recursive("Component", |component| {
        SchemaNode::structure(component_members(&component))
            .title("Component")
            .description("A node of a component tree")
    })
}

fn block_schema(component: &SchemaNode) -> SchemaNode {
    let mut node = SchemaNode::structure([("name", common::block_name())]);
    for (name, schema) in component_members(component) {
        node = node.with_field(name, schema);
    }
    node.title("Block")
        .description("Reusable component template; strings may use $variables")
        .define("Block")
}

fn var_value_schema() -> SchemaNode {
    SchemaNode::union([
        SchemaNode::string(),
        SchemaNode::number(),
        SchemaNode::boolean(),
    ])
}

fn block_reference_schema() -> SchemaNode {
    SchemaNode::structure([
        ("$ref", common::block_name()),
        (
            "vars",
            SchemaNode::record(var_value_schema())
                .description("Values substituted for the block's $variables")
                .optional(),
        ),
    ])
    .title("Block Reference")
    .description("Inserts a block, substituting its variables")
    .define("BlockReference")
}

pub(crate) fn register(registry: &mut SchemaRegistry) -> Result<(), RegistryError> {
    let component = component_schema();
    registry.insert("Component", component.clone())?;
    registry.insert("Block", block_schema(&component))?;
    registry.insert("BlockReference", block_reference_schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hero() -> BlockDefinition {
        serde_json::from_value(json!({
            "name": "hero",
            "type": "section",
            "props": {"className": "hero-$theme"},
            "children": [
                {"type": "h1", "content": "$title"},
                {"type": "p", "content": "$subtitle"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            hero().variables().into_iter().collect::<Vec<_>>(),
            ["subtitle", "theme", "title"]
        );
    }

    #[test]
    fn test_resolve_leaves_definition_untouched() {
        let blocks = [hero()];
        let vars: Vars = [("title".to_string(), VarValue::from("Welcome"))].into();
        let resolved = resolve_block("hero", Some(&blocks), Some(&vars)).unwrap();
        assert_eq!(resolved.children[0].content.as_deref(), Some("Welcome"));
        assert_eq!(resolved.children[1].content.as_deref(), Some("$subtitle"));
        assert_eq!(blocks[0], hero());
    }

    #[test]
    fn test_missing_block() {
        let blocks = [hero()];
        assert_eq!(resolve_block("footer", Some(&blocks), None), None);
        assert_eq!(resolve_block("hero", None, None), None);
    }

    #[test]
    fn test_library_first_definition_wins() {
        let mut second = hero();
        second.template.kind = "div".into();
        let blocks = [hero(), second];
        let library = BlockLibrary::new(&blocks);
        assert_eq!(library.len(), 1);
        let reference = BlockReference {
            name: "hero".into(),
            vars: Vars::new(),
        };
        assert_eq!(library.resolve(&reference).unwrap().kind, "section");
    }

    #[test]
    fn test_block_schema_accepts_templates() {
        let block = block_schema(&component_schema());
        let tree = block
            .validate(&json!({
                "name": "hero-section",
                "type": "section",
                "children": [{"type": "h1", "content": "$title"}]
            }))
            .unwrap();
        let parsed: BlockDefinition = serde_json::from_value(tree).unwrap();
        assert_eq!(parsed.variables().len(), 1);

        let err = block
            .validate(&json!({"name": "Hero", "type": "section"}))
            .unwrap_err();
        assert_eq!(err.first().path().to_string(), "name");
    }

    #[test]
    fn test_component_children_reuse_the_component_node() {
        use omnera_schema::SchemaKind;
        use std::sync::Arc;

        fn items(node: &SchemaNode) -> &SchemaNode {
            let children = node.as_struct().unwrap().field("children").unwrap();
            let SchemaKind::Optional(opt) = children.schema.kind() else {
                panic!("children should be optional");
            };
            let SchemaKind::Array(array) = opt.inner.kind() else {
                panic!("children should be an array");
            };
            array.items.as_ref()
        }

        let component = component_schema();
        let SchemaKind::Deferred(root) = component.kind() else {
            panic!("component should be a named recursive node");
        };

        let mut tree = json!({"type": "span", "content": "$label"});
        for _ in 0..200 {
            tree = json!({"type": "div", "children": [tree]});
        }
        assert!(component.is_valid(&tree));

        let mut node = &component;
        for _ in 0..3 {
            let SchemaKind::Deferred(inner) = items(node).kind() else {
                panic!("children should refer back to the component");
            };
            assert!(Arc::ptr_eq(root, inner));
            node = items(node);
        }

        let block = block_schema(&component);
        let SchemaKind::Deferred(from_block) = items(&block).kind() else {
            panic!("block children should refer to the component");
        };
        assert!(Arc::ptr_eq(root, from_block));
    }

    #[test]
    fn test_component_type_is_not_substituted() {
        let block: BlockDefinition = serde_json::from_value(json!({
            "name": "slot",
            "type": "$tag",
            "props": {"count": "$count", "label": "n=$count"},
            "content": "$tag"
        }))
        .unwrap();
        assert_eq!(
            block.variables().into_iter().collect::<Vec<_>>(),
            ["count", "tag"]
        );

        let vars: Vars = [
            ("tag".to_string(), VarValue::from("h2")),
            ("count".to_string(), VarValue::from(4.0)),
        ]
        .into();
        let resolved = block.resolve(&vars);
        assert_eq!(resolved.kind, "$tag");
        assert_eq!(resolved.content.as_deref(), Some("h2"));
        assert_eq!(resolved.props["count"], json!(4.0));
        assert_eq!(resolved.props["label"], json!("n=4"));
    }

    #[test]
    fn test_reference_schema() {
        let node = block_reference_schema();
        assert!(node.is_valid(&json!({"$ref": "hero", "vars": {"n": 1, "on": true}})));
        let err = node
            .validate(&json!({"$ref": "hero", "vars": {"n": [1]}}))
            .unwrap_err();
        assert_eq!(err.first().path().to_string(), "vars.n");
    }
}
