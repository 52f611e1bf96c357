use std::collections::{BTreeMap, BTreeSet};

use crate::node::{SchemaKind, SchemaNode};

/// Renders TypeScript declarations for `node` and every definition it uses.
///
/// The root becomes `export type <root_name> = ...;`, each named or deferred
/// node becomes its own exported alias. A root that is itself shared under
/// `root_name` is declared once.
pub fn to_typescript(root_name: &str, node: &SchemaNode) -> String {
    let mut decls = Declarations::default();
    let named = shared_name(node);
    let root = match named {
        Some(_) => decls.expr(node, 0).0,
        None => decls.body(node, 0).0,
    };
    let root_is_shared = named == Some(root_name) && decls.defs.contains_key(root_name);

    let mut out = String::from("// Generated from the Omnera schema registry. Do not edit.\n\n");
    match decls.defs.get(root_name) {
        Some((doc, body)) if root_is_shared => out += &declaration(root_name, doc.as_deref(), body),
        _ => out += &declaration(root_name, node.annotations().description.as_deref(), &root),
    }
    for (name, (doc, body)) in &decls.defs {
        if root_is_shared && name == root_name {
            continue;
        }
        out.push('\n');
        out += &declaration(name, doc.as_deref(), body);
    }
    out
}

fn shared_name(node: &SchemaNode) -> Option<&str> {
    node.definition().or(match node.kind() {
        SchemaKind::Deferred(d) => Some(d.name()),
        _ => None,
    })
}

fn declaration(name: &str, doc: Option<&str>, body: &str) -> String {
    format!("{}export type {name} = {body};\n", jsdoc(doc, 0))
}

#[derive(Clone, Copy, PartialEq)]
enum Prec {
    Atom,
    Union,
}

#[derive(Default)]
struct Declarations {
    /// name -> (description, body)
    defs: BTreeMap<String, (Option<String>, String)>,
    visiting: BTreeSet<String>,
}

impl Declarations {
    fn named(&mut self, name: &str, node: &SchemaNode) -> (String, Prec) {
        if !self.defs.contains_key(name) && self.visiting.insert(name.to_string()) {
            let body = self.body(node, 0).0;
            self.visiting.remove(name);
            let doc = node.annotations().description.clone();
            self.defs.insert(name.to_string(), (doc, body));
        }
        (name.to_string(), Prec::Atom)
    }

    fn expr(&mut self, node: &SchemaNode, indent: usize) -> (String, Prec) {
        if let Some(name) = node.definition() {
            return self.named(name, node);
        }
        if let SchemaKind::Deferred(d) = node.kind() {
            return match d.get() {
                Some(body) => self.named(d.name(), body),
                None => (d.name().to_string(), Prec::Atom),
            };
        }
        self.body(node, indent)
    }

    fn body(&mut self, node: &SchemaNode, indent: usize) -> (String, Prec) {
        match node.kind() {
            SchemaKind::Any => ("unknown".into(), Prec::Atom),
            SchemaKind::Boolean => ("boolean".into(), Prec::Atom),
            SchemaKind::String(_) => ("string".into(), Prec::Atom),
            SchemaKind::Number(_) => ("number".into(), Prec::Atom),
            SchemaKind::Literal(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                let prec = if parts.len() > 1 { Prec::Union } else { Prec::Atom };
                (parts.join(" | "), prec)
            }
            SchemaKind::Struct(s) => {
                let pad = "  ".repeat(indent + 1);
                let mut out = String::from("{\n");
                for field in &s.fields {
                    let doc = field
                        .schema
                        .annotations()
                        .description
                        .as_deref()
                        .or_else(|| inner_description(&field.schema));
                    out += &jsdoc(doc, indent + 1);
                    let optional = if field.is_required() { "" } else { "?" };
                    let ty = self.expr(&field.schema, indent + 1).0;
                    out += &format!("{pad}{}{optional}: {ty};\n", property_name(&field.name));
                }
                if s.additional_properties {
                    out += &format!("{pad}[key: string]: unknown;\n");
                }
                out += &"  ".repeat(indent);
                out.push('}');
                (out, Prec::Atom)
            }
            SchemaKind::Array(array) => {
                let (item, prec) = self.expr(&array.items, indent);
                let item = if prec == Prec::Union {
                    format!("({item})")
                } else {
                    item
                };
                (format!("{item}[]"), Prec::Atom)
            }
            SchemaKind::Record(values) => {
                let value = self.expr(values, indent).0;
                (format!("Record<string, {value}>"), Prec::Atom)
            }
            SchemaKind::Union(union) => {
                let parts: Vec<String> = union
                    .variants
                    .iter()
                    .map(|v| self.expr(v, indent).0)
                    .collect();
                let prec = if parts.len() > 1 { Prec::Union } else { Prec::Atom };
                (parts.join(" | "), prec)
            }
            SchemaKind::Optional(opt) => self.expr(&opt.inner, indent),
            SchemaKind::Deferred(d) => match d.get() {
                Some(body) => self.body(body, indent),
                None => (d.name().to_string(), Prec::Atom),
            },
        }
    }
}

fn inner_description(node: &SchemaNode) -> Option<&str> {
    match node.kind() {
        SchemaKind::Optional(opt) => opt.inner.annotations().description.as_deref(),
        _ => None,
    }
}

fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        name.to_string()
    } else {
        format!("{name:?}")
    }
}

fn jsdoc(doc: Option<&str>, indent: usize) -> String {
    match doc {
        Some(doc) => format!("{}/** {} */\n", "  ".repeat(indent), doc.replace("*/", "*\\/")),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_declaration() {
        let node = SchemaNode::structure([
            ("name", SchemaNode::string().description("App name")),
            ("version", SchemaNode::string().optional()),
            ("tags", SchemaNode::array(SchemaNode::literals(["a", "b"])).optional()),
            ("kebab-key", SchemaNode::boolean()),
        ]);
        let ts = to_typescript("App", &node);
        assert!(ts.contains("export type App = {\n"));
        assert!(ts.contains("  /** App name */\n  name: string;\n"));
        assert!(ts.contains("  version?: string;\n"));
        assert!(ts.contains("  tags?: (\"a\" | \"b\")[];\n"));
        assert!(ts.contains("  \"kebab-key\": boolean;\n"));
    }

    #[test]
    fn test_definitions_become_aliases() {
        let field = SchemaNode::tagged_union(
            "type",
            [
                SchemaNode::structure([("type", SchemaNode::literal("email"))]).define("EmailField"),
                SchemaNode::structure([("type", SchemaNode::literal("url"))]).define("UrlField"),
            ],
        )
        .define("TableField");
        let node = SchemaNode::structure([("fields", SchemaNode::array(field))]);
        let ts = to_typescript("Table", &node);
        assert!(ts.contains("  fields: TableField[];\n"));
        assert!(ts.contains("export type TableField = EmailField | UrlField;\n"));
        assert!(ts.contains("export type EmailField = {\n  type: \"email\";\n};\n"));
    }

    #[test]
    fn test_recursive_root_is_declared_once() {
        let node = SchemaNode::recursive("Component", |component| {
            SchemaNode::structure([
                ("type", SchemaNode::string()),
                ("children", SchemaNode::array(component).optional()),
            ])
            .description("A node of a component tree")
        });
        let ts = to_typescript("Component", &node);
        assert_eq!(ts.matches("export type Component =").count(), 1);
        assert!(ts.contains("/** A node of a component tree */\nexport type Component = {\n"));
        assert!(ts.contains("  children?: Component[];\n"));

        let ts = to_typescript("Tree", &node);
        assert!(ts.contains("export type Tree = Component;\n"));
        assert_eq!(ts.matches("export type Component =").count(), 1);
    }
}
