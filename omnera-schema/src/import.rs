//! Reads JSON Schema documents back into [`SchemaNode`] trees.
//!
//! The reader understands the vocabulary the exporter writes, plus the
//! annotation keywords that never affect validation. Keywords that would
//! change the accepted set of values but have no node equivalent are rejected
//! with [`ImportError::Unsupported`] rather than silently dropped.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde_json::{Map, Value};

use crate::{
    error::ImportError,
    export::json_schema::{ERROR_MESSAGE_KEYWORD, UNIQUE_BY_KEYWORD},
    node::{Deferred, SchemaNode},
};

const ANNOTATION_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$comment",
    "$defs",
    "definitions",
    "title",
    "description",
    "examples",
    "default",
    "deprecated",
    "readOnly",
    "writeOnly",
    "discriminator",
];

/// Builds a node tree from a JSON Schema document.
///
/// `$ref`s of the form `#/$defs/<name>` or `#/definitions/<name>` become
/// deferred nodes, so recursive definitions are supported.
pub fn from_json_schema(document: &Value) -> Result<SchemaNode, ImportError> {
    let mut importer = Importer::new(document);
    let root = importer.node(document, "#")?;
    importer.resolve_pending()?;
    Ok(root)
}

struct Importer<'a> {
    definitions: BTreeMap<String, &'a Value>,
    deferred: HashMap<String, Arc<Deferred>>,
    pending: Vec<String>,
}

impl<'a> Importer<'a> {
    fn new(document: &'a Value) -> Self {
        let mut definitions = BTreeMap::new();
        for key in ["definitions", "$defs"] {
            if let Some(Value::Object(defs)) = document.get(key) {
                for (name, schema) in defs {
                    definitions.insert(name.clone(), schema);
                }
            }
        }
        Self {
            definitions,
            deferred: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn resolve_pending(&mut self) -> Result<(), ImportError> {
        while let Some(name) = self.pending.pop() {
            let pointer = format!("#/$defs/{name}");
            let schema = *self.definitions.get(&name).ok_or_else(|| {
                ImportError::UnresolvedReference {
                    pointer: pointer.clone(),
                    reference: name.clone(),
                }
            })?;
            let node = self.node(schema, &pointer)?.define(name.as_str());
            if let Some(deferred) = self.deferred.get(&name) {
                deferred.resolve_with(node);
            }
        }
        Ok(())
    }

    fn reference(&mut self, reference: &str, pointer: &str) -> Result<SchemaNode, ImportError> {
        let name = reference
            .strip_prefix("#/$defs/")
            .or_else(|| reference.strip_prefix("#/definitions/"))
            .filter(|name| self.definitions.contains_key(*name))
            .ok_or_else(|| ImportError::UnresolvedReference {
                pointer: pointer.to_string(),
                reference: reference.to_string(),
            })?;

        let deferred = self
            .deferred
            .entry(name.to_string())
            .or_insert_with(|| {
                self.pending.push(name.to_string());
                Arc::new(Deferred::unresolved(name))
            })
            .clone();
        Ok(SchemaNode::from_deferred(deferred))
    }

    fn node(&mut self, schema: &Value, pointer: &str) -> Result<SchemaNode, ImportError> {
        let map = match schema {
            Value::Bool(true) => return Ok(SchemaNode::any()),
            Value::Object(map) => map,
            other => {
                return Err(ImportError::Unsupported {
                    pointer: pointer.to_string(),
                    reason: format!("schema must be an object or `true`, got {other}"),
                });
            }
        };

        let node = if let Some(reference) = map.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| invalid(pointer, "$ref", "must be a string"))?;
            self.reference(reference, pointer)?
        } else if let Some(value) = map.get("const") {
            SchemaNode::literal(value.clone())
        } else if let Some(values) = map.get("enum") {
            let values = values
                .as_array()
                .ok_or_else(|| invalid(pointer, "enum", "must be an array"))?;
            SchemaNode::literals(values.iter().cloned())
        } else if let Some(variants) = map.get("anyOf") {
            SchemaNode::union(self.variants(variants, pointer, "anyOf")?)
        } else if let Some(variants) = map.get("oneOf") {
            let variants = self.variants(variants, pointer, "oneOf")?;
            match map
                .get("discriminator")
                .and_then(|d| d.get("propertyName"))
                .and_then(Value::as_str)
            {
                Some(field) => SchemaNode::tagged_union(field, variants),
                None => SchemaNode::union(variants),
            }
        } else {
            match map.get("type") {
                None => SchemaNode::any(),
                Some(Value::String(ty)) => self.typed(ty, map, pointer)?,
                Some(other) => {
                    return Err(ImportError::Unsupported {
                        pointer: pointer.to_string(),
                        reason: format!("type {other} is not supported"),
                    });
                }
            }
        };

        check_keywords(map, pointer)?;
        Ok(annotate(node, map))
    }

    fn variants(
        &mut self,
        variants: &Value,
        pointer: &str,
        keyword: &str,
    ) -> Result<Vec<SchemaNode>, ImportError> {
        let list = variants
            .as_array()
            .ok_or_else(|| invalid(pointer, keyword, "must be an array"))?;
        list.iter()
            .enumerate()
            .map(|(i, v)| self.node(v, &format!("{pointer}/{keyword}/{i}")))
            .collect()
    }

    fn typed(
        &mut self,
        ty: &str,
        map: &Map<String, Value>,
        pointer: &str,
    ) -> Result<SchemaNode, ImportError> {
        let node = match ty {
            "boolean" => SchemaNode::boolean(),
            "string" => {
                let mut node = SchemaNode::string();
                if let Some(n) = usize_keyword(map, "minLength", pointer)? {
                    node = node.min_length(n);
                }
                if let Some(n) = usize_keyword(map, "maxLength", pointer)? {
                    node = node.max_length(n);
                }
                if let Some(p) = map.get("pattern") {
                    let source = p
                        .as_str()
                        .ok_or_else(|| invalid(pointer, "pattern", "must be a string"))?;
                    node = node.try_pattern(source).map_err(|source| ImportError::Pattern {
                        pointer: pointer.to_string(),
                        source,
                    })?;
                }
                node
            }
            "number" | "integer" => {
                let mut node = if ty == "integer" {
                    SchemaNode::integer()
                } else {
                    SchemaNode::number()
                };
                if let Some(n) = f64_keyword(map, "minimum", pointer)? {
                    node = node.minimum(n);
                }
                if let Some(n) = f64_keyword(map, "maximum", pointer)? {
                    node = node.maximum(n);
                }
                node
            }
            "array" => {
                let items = match map.get("items") {
                    Some(items) => self.node(items, &format!("{pointer}/items"))?,
                    None => SchemaNode::any(),
                };
                let mut node = SchemaNode::array(items);
                if let Some(n) = usize_keyword(map, "minItems", pointer)? {
                    node = node.min_items(n);
                }
                if let Some(n) = usize_keyword(map, "maxItems", pointer)? {
                    node = node.max_items(n);
                }
                if let Some(keys) = map.get(UNIQUE_BY_KEYWORD) {
                    let keys = keys
                        .as_array()
                        .ok_or_else(|| invalid(pointer, UNIQUE_BY_KEYWORD, "must be an array"))?;
                    for key in keys {
                        let key = key.as_str().ok_or_else(|| {
                            invalid(pointer, UNIQUE_BY_KEYWORD, "must contain strings")
                        })?;
                        node = node.unique_by(key);
                    }
                }
                node
            }
            "object" => self.object(map, pointer)?,
            other => {
                return Err(ImportError::Unsupported {
                    pointer: pointer.to_string(),
                    reason: format!("type \"{other}\" is not supported"),
                });
            }
        };
        Ok(node)
    }

    fn object(&mut self, map: &Map<String, Value>, pointer: &str) -> Result<SchemaNode, ImportError> {
        let additional = map.get("additionalProperties");
        let properties = map.get("properties");

        // `additionalProperties: <schema>` without declared properties is a record.
        if let (None, Some(values @ Value::Object(_))) = (properties, additional) {
            let values = self.node(values, &format!("{pointer}/additionalProperties"))?;
            return Ok(SchemaNode::record(values));
        }

        let allow_additional = match additional {
            None => true,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ImportError::Unsupported {
                    pointer: pointer.to_string(),
                    reason: "additionalProperties schema alongside properties".to_string(),
                });
            }
        };

        let required: Vec<&str> = match map.get("required") {
            None => Vec::new(),
            Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
            Some(_) => return Err(invalid(pointer, "required", "must be an array")),
        };

        let mut fields = Vec::new();
        if let Some(properties) = properties {
            let properties = properties
                .as_object()
                .ok_or_else(|| invalid(pointer, "properties", "must be an object"))?;
            for (name, schema) in properties {
                let child = self.node(schema, &format!("{pointer}/properties/{name}"))?;
                let child = if required.contains(&name.as_str()) {
                    child
                } else {
                    match schema.get("default") {
                        Some(default) => child.default_value(default.clone()),
                        None => child.optional(),
                    }
                };
                fields.push((name.clone(), child));
            }
        }

        for name in &required {
            if !fields.iter().any(|(f, _)| f == name) {
                return Err(ImportError::Unsupported {
                    pointer: pointer.to_string(),
                    reason: format!("required property '{name}' is not declared"),
                });
            }
        }

        Ok(SchemaNode::structure(fields).additional_properties(allow_additional))
    }
}

fn check_keywords(map: &Map<String, Value>, pointer: &str) -> Result<(), ImportError> {
    const UNDERSTOOD: &[&str] = &[
        "$ref",
        "const",
        "enum",
        "anyOf",
        "oneOf",
        "type",
        "minLength",
        "maxLength",
        "pattern",
        "minimum",
        "maximum",
        "items",
        "minItems",
        "maxItems",
        "properties",
        "required",
        "additionalProperties",
    ];
    for key in map.keys() {
        let known = UNDERSTOOD.contains(&key.as_str())
            || ANNOTATION_KEYWORDS.contains(&key.as_str())
            || key.starts_with("x-");
        if !known {
            return Err(ImportError::Unsupported {
                pointer: pointer.to_string(),
                reason: format!("keyword '{key}' is not supported"),
            });
        }
    }
    Ok(())
}

fn annotate(mut node: SchemaNode, map: &Map<String, Value>) -> SchemaNode {
    if let Some(title) = map.get("title").and_then(Value::as_str) {
        node = node.title(title);
    }
    if let Some(description) = map.get("description").and_then(Value::as_str) {
        node = node.description(description);
    }
    if let Some(Value::Array(examples)) = map.get("examples") {
        for example in examples {
            node = node.example(example.clone());
        }
    }
    if let Some(message) = map.get(ERROR_MESSAGE_KEYWORD).and_then(Value::as_str) {
        node = node.message(message);
    }
    node
}

fn usize_keyword(
    map: &Map<String, Value>,
    keyword: &str,
    pointer: &str,
) -> Result<Option<usize>, ImportError> {
    map.get(keyword)
        .map(|v| {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| invalid(pointer, keyword, "must be a non-negative integer"))
        })
        .transpose()
}

fn f64_keyword(
    map: &Map<String, Value>,
    keyword: &str,
    pointer: &str,
) -> Result<Option<f64>, ImportError> {
    map.get(keyword)
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| invalid(pointer, keyword, "must be a number"))
        })
        .transpose()
}

fn invalid(pointer: &str, keyword: &str, reason: &str) -> ImportError {
    ImportError::InvalidKeyword {
        pointer: pointer.to_string(),
        keyword: keyword.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::json_schema::to_json_schema;
    use serde_json::json;

    #[test]
    fn test_import_struct() {
        let node = from_json_schema(&json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "pattern": "^[a-z]+$"},
                "unique": {"type": "boolean", "default": false}
            },
            "required": ["name"],
            "additionalProperties": false
        }))
        .unwrap();

        assert_eq!(
            node.validate(&json!({"name": "email"})).unwrap(),
            json!({"name": "email", "unique": false})
        );
        assert!(!node.is_valid(&json!({"name": "Email"})));
        assert!(!node.is_valid(&json!({"name": "a", "x": 1})));
    }

    #[test]
    fn test_missing_additional_properties_means_open() {
        let node = from_json_schema(&json!({"type": "object", "properties": {}})).unwrap();
        assert!(node.is_valid(&json!({"anything": 1})));
    }

    #[test]
    fn test_unsupported_keyword_is_rejected() {
        let err = from_json_schema(&json!({"type": "number", "multipleOf": 2})).unwrap_err();
        assert!(matches!(err, ImportError::Unsupported { .. }));

        let err = from_json_schema(&json!({"type": ["string", "null"]})).unwrap_err();
        assert!(matches!(err, ImportError::Unsupported { .. }));
    }

    #[test]
    fn test_unresolved_reference() {
        let err = from_json_schema(&json!({"$ref": "#/$defs/Nope"})).unwrap_err();
        assert!(matches!(err, ImportError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_recursive_reference() {
        let doc = json!({
            "$ref": "#/$defs/Node",
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": {"type": "array", "items": {"$ref": "#/$defs/Node"}}
                    },
                    "additionalProperties": false
                }
            }
        });
        let node = from_json_schema(&doc).unwrap();
        assert!(node.is_valid(&json!({"children": [{"children": []}, {}]})));
        assert!(!node.is_valid(&json!({"children": [{"kids": []}]})));

        // Exporting the imported tree keeps the recursion by reference.
        let again = to_json_schema(&node);
        assert_eq!(
            again["$defs"]["Node"]["properties"]["children"]["items"],
            json!({"$ref": "#/$defs/Node"})
        );
    }

    #[test]
    fn test_tagged_union_import() {
        let node = from_json_schema(&json!({
            "oneOf": [
                {"type": "object", "properties": {"event": {"const": "http.post"}}, "required": ["event"], "additionalProperties": false}
            ],
            "discriminator": {"propertyName": "event"}
        }))
        .unwrap();
        let err = node.validate(&json!({"event": "nope"})).unwrap_err();
        assert_eq!(err.first().to_string(), "event: unknown type: nope");
    }
}
