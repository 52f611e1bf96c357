use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::node::{SchemaKind, SchemaNode};

/// Dialect written into the `$schema` keyword.
pub const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Extension keyword carrying a node's custom constraint message.
pub const ERROR_MESSAGE_KEYWORD: &str = "x-error-message";

/// Extension keyword carrying an array's unique-by keys.
pub const UNIQUE_BY_KEYWORD: &str = "x-unique-by";

/// Exports `node` as a JSON Schema document.
///
/// Named nodes (see [`SchemaNode::define`]) and deferred nodes are emitted
/// once under `$defs` and referenced with `$ref` everywhere they appear.
pub fn to_json_schema(node: &SchemaNode) -> Value {
    let mut exporter = Exporter::default();
    let body = exporter.inline(node);

    let mut doc = Map::new();
    doc.insert("$schema".into(), DRAFT.into());
    doc.extend(body);
    if !exporter.defs.is_empty() {
        doc.insert("$defs".into(), Value::Object(exporter.defs));
    }
    Value::Object(doc)
}

#[derive(Default)]
struct Exporter {
    defs: Map<String, Value>,
    visiting: BTreeSet<String>,
}

impl Exporter {
    fn emit(&mut self, node: &SchemaNode) -> Value {
        if let Some(name) = node.definition() {
            return self.reference(name, node);
        }
        if let SchemaKind::Deferred(d) = node.kind() {
            return match d.get() {
                Some(body) => self.reference(d.name(), body),
                None => ref_to(d.name()),
            };
        }
        Value::Object(self.inline(node))
    }

    fn reference(&mut self, name: &str, node: &SchemaNode) -> Value {
        if !self.defs.contains_key(name) && self.visiting.insert(name.to_string()) {
            let body = self.inline(node);
            self.visiting.remove(name);
            self.defs.insert(name.to_string(), Value::Object(body));
        }
        ref_to(name)
    }

    fn inline(&mut self, node: &SchemaNode) -> Map<String, Value> {
        let mut out = Map::new();
        annotate(&mut out, node);

        match node.kind() {
            SchemaKind::Any => {}
            SchemaKind::Boolean => {
                out.insert("type".into(), "boolean".into());
            }
            SchemaKind::String(rules) => {
                out.insert("type".into(), "string".into());
                if let Some(n) = rules.min_length {
                    out.insert("minLength".into(), n.into());
                }
                if let Some(n) = rules.max_length {
                    out.insert("maxLength".into(), n.into());
                }
                if let Some(p) = &rules.pattern {
                    out.insert("pattern".into(), p.as_str().into());
                }
            }
            SchemaKind::Number(rules) => {
                let ty = if rules.integer { "integer" } else { "number" };
                out.insert("type".into(), ty.into());
                if let Some(n) = rules.minimum {
                    out.insert("minimum".into(), number(n));
                }
                if let Some(n) = rules.maximum {
                    out.insert("maximum".into(), number(n));
                }
            }
            SchemaKind::Literal(values) => match values.as_slice() {
                [single] => {
                    out.insert("const".into(), single.clone());
                }
                many => {
                    out.insert("enum".into(), Value::Array(many.to_vec()));
                }
            },
            SchemaKind::Struct(s) => {
                out.insert("type".into(), "object".into());
                let mut properties = Map::new();
                for field in &s.fields {
                    properties.insert(field.name.clone(), self.property(&field.schema));
                }
                out.insert("properties".into(), Value::Object(properties));
                let required: Vec<Value> = s.required().map(Value::from).collect();
                if !required.is_empty() {
                    out.insert("required".into(), Value::Array(required));
                }
                out.insert(
                    "additionalProperties".into(),
                    s.additional_properties.into(),
                );
            }
            SchemaKind::Array(array) => {
                out.insert("type".into(), "array".into());
                out.insert("items".into(), self.emit(&array.items));
                if let Some(n) = array.min_items {
                    out.insert("minItems".into(), n.into());
                }
                if let Some(n) = array.max_items {
                    out.insert("maxItems".into(), n.into());
                }
                if !array.unique_by.is_empty() {
                    out.insert(UNIQUE_BY_KEYWORD.into(), json!(array.unique_by));
                }
            }
            SchemaKind::Record(values) => {
                out.insert("type".into(), "object".into());
                out.insert("additionalProperties".into(), self.emit(values));
            }
            SchemaKind::Union(union) => {
                let variants: Vec<Value> = union.variants.iter().map(|v| self.emit(v)).collect();
                match &union.discriminator {
                    Some(disc) => {
                        out.insert("oneOf".into(), Value::Array(variants));
                        out.insert(
                            "discriminator".into(),
                            json!({ "propertyName": disc.field }),
                        );
                    }
                    None => {
                        out.insert("anyOf".into(), Value::Array(variants));
                    }
                }
            }
            SchemaKind::Optional(opt) => {
                let inner = self.property(&opt.inner);
                merge_under(&mut out, inner);
                if let Some(default) = &opt.default {
                    out.insert("default".into(), default.clone());
                }
            }
            SchemaKind::Deferred(d) => {
                if let Some(body) = d.get() {
                    let inner = self.inline(body);
                    merge_under(&mut out, Value::Object(inner));
                }
            }
        }
        out
    }

    /// Emits a struct member. Optional wrappers contribute their default.
    fn property(&mut self, node: &SchemaNode) -> Value {
        let SchemaKind::Optional(opt) = node.kind() else {
            return self.emit(node);
        };
        let mut value = self.property(&opt.inner);
        if let Value::Object(map) = &mut value {
            let mut outer = Map::new();
            annotate(&mut outer, node);
            map.extend(outer);
            if let Some(default) = &opt.default {
                map.insert("default".into(), default.clone());
            }
        }
        value
    }
}

fn annotate(out: &mut Map<String, Value>, node: &SchemaNode) {
    let a = node.annotations();
    if let Some(title) = &a.title {
        out.insert("title".into(), title.clone().into());
    }
    if let Some(description) = &a.description {
        out.insert("description".into(), description.clone().into());
    }
    if !a.examples.is_empty() {
        out.insert("examples".into(), Value::Array(a.examples.clone()));
    }
    if let Some(message) = node.custom_message() {
        out.insert(ERROR_MESSAGE_KEYWORD.into(), message.into());
    }
}

/// Copies `inner`'s keywords into `out` without overriding keys already set.
fn merge_under(out: &mut Map<String, Value>, inner: Value) {
    if let Value::Object(inner) = inner {
        for (k, v) in inner {
            out.entry(k).or_insert(v);
        }
    }
}

fn ref_to(name: &str) -> Value {
    json!({ "$ref": format!("#/$defs/{name}") })
}

/// Integral bounds are written as JSON integers.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
