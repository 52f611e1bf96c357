//! Schema nodes and the factories that build them.
//!
//! A [`SchemaNode`] is an immutable description of one validable type. Nodes
//! are built once with the factory functions and builder methods below, then
//! shared read-only: children are held behind [`Arc`] so that a common node
//! such as an identifier schema can appear in many parents without copying.
//!
//! ```
//! use omnera_schema::SchemaNode;
//! use serde_json::json;
//!
//! let index = SchemaNode::structure([
//!     ("name", SchemaNode::string().pattern("^idx_[a-z_]+$")),
//!     ("fields", SchemaNode::array(SchemaNode::string()).min_items(1)),
//! ]);
//!
//! assert!(index.validate(&json!({"name": "idx_users_email", "fields": ["email"]})).is_ok());
//! assert!(index.validate(&json!({"name": "idx_users_email", "fields": []})).is_err());
//! ```

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use regex::Regex;
use serde_json::Value;

/// Metadata attached to a node. Never affects validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub examples: Vec<Value>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.examples.is_empty()
    }
}

/// A compiled regular expression that remembers its source.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles `source`.
    ///
    /// # Errors
    ///
    /// Returns the [`regex::Error`] if `source` does not compile.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.0.is_match(s)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// String constraints. Lengths count characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
}

/// Numeric constraints. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub integer: bool,
}

/// A named member of a struct schema.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub schema: Arc<SchemaNode>,
}

impl Field {
    /// A field is required unless its schema is an optional wrapper.
    pub fn is_required(&self) -> bool {
        !matches!(self.schema.kind, SchemaKind::Optional(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructSchema {
    /// Declared fields, in declaration order.
    pub fields: Vec<Field>,
    /// Whether undeclared keys are accepted and passed through.
    pub additional_properties: bool,
}

impl StructSchema {
    /// The declared field called `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of required fields, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub items: Arc<SchemaNode>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    /// Object keys whose values must not repeat across elements.
    pub unique_by: Vec<String>,
}

/// Tag field of a discriminated union.
#[derive(Debug, Clone)]
pub struct Discriminator {
    pub field: String,
    index: OnceLock<Vec<(Value, usize)>>,
}

impl Discriminator {
    fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            index: OnceLock::new(),
        }
    }

    /// Position of the variant whose literal tag equals `tag`.
    pub fn variant_for(&self, variants: &[Arc<SchemaNode>], tag: &Value) -> Option<usize> {
        self.index
            .get_or_init(|| {
                let mut index = Vec::new();
                for (i, variant) in variants.iter().enumerate() {
                    match variant.discriminator_values(&self.field) {
                        Some(tags) => index.extend(tags.iter().map(|t| (t.clone(), i))),
                        None => warn!(
                            "union variant #{i} has no literal '{}' field and can never be selected",
                            self.field
                        ),
                    }
                }
                index
            })
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, i)| *i)
    }
}

#[derive(Debug, Clone)]
pub struct UnionSchema {
    pub variants: Vec<Arc<SchemaNode>>,
    pub discriminator: Option<Discriminator>,
}

#[derive(Debug, Clone)]
pub struct OptionalSchema {
    pub inner: Arc<SchemaNode>,
    /// Inserted by struct validation when the field is absent.
    pub default: Option<Value>,
}

/// A named node that other nodes refer to before its body exists.
///
/// Deferred nodes make recursive schemas expressible: a component's
/// `children` refer back to the component schema through the same cell, so
/// the definition is built exactly once however deep a document nests.
pub struct Deferred {
    name: String,
    cell: OnceLock<SchemaNode>,
}

impl Deferred {
    /// Definition name shared by every reference to this node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node body, or `None` while the reference is still unresolved.
    pub fn get(&self) -> Option<&SchemaNode> {
        self.cell.get()
    }

    pub(crate) fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: OnceLock::new(),
        }
    }

    /// Fills the body. Returns `false` if it was already set.
    pub(crate) fn resolve_with(&self, node: SchemaNode) -> bool {
        self.cell.set(node).is_ok()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("name", &self.name)
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}

/// What a node validates.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Any JSON value.
    Any,
    Boolean,
    String(StringRules),
    Number(NumberRules),
    /// One of a closed, ordered list of literal values.
    Literal(Vec<Value>),
    Struct(StructSchema),
    Array(ArraySchema),
    /// Object with arbitrary keys and one value schema.
    Record(Arc<SchemaNode>),
    Union(UnionSchema),
    Optional(OptionalSchema),
    Deferred(Arc<Deferred>),
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Any => "any",
            SchemaKind::Boolean => "boolean",
            SchemaKind::String(_) => "string",
            SchemaKind::Number(r) if r.integer => "integer",
            SchemaKind::Number(_) => "number",
            SchemaKind::Literal(_) => "literal",
            SchemaKind::Struct(_) => "struct",
            SchemaKind::Array(_) => "array",
            SchemaKind::Record(_) => "record",
            SchemaKind::Union(_) => "union",
            SchemaKind::Optional(_) => "optional",
            SchemaKind::Deferred(_) => "deferred",
        }
    }
}

/// An immutable, composable description of a validable type.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) kind: SchemaKind,
    pub(crate) annotations: Annotations,
    pub(crate) message: Option<String>,
    pub(crate) definition: Option<String>,
}

impl From<SchemaKind> for SchemaNode {
    fn from(kind: SchemaKind) -> Self {
        Self {
            kind,
            annotations: Annotations::default(),
            message: None,
            definition: None,
        }
    }
}

// Factories.
impl SchemaNode {
    /// Accepts any JSON value unchanged.
    pub fn any() -> Self {
        SchemaKind::Any.into()
    }

    /// Accepts `true` and `false`.
    pub fn boolean() -> Self {
        SchemaKind::Boolean.into()
    }

    /// Accepts strings. Constrain with [`min_length`](Self::min_length),
    /// [`max_length`](Self::max_length) and [`pattern`](Self::pattern).
    pub fn string() -> Self {
        SchemaKind::String(StringRules::default()).into()
    }

    /// Accepts any JSON number.
    pub fn number() -> Self {
        SchemaKind::Number(NumberRules::default()).into()
    }

    /// Accepts numbers without a fractional part. Integral floats such as
    /// `3.0` are accepted and normalized to integers.
    pub fn integer() -> Self {
        SchemaKind::Number(NumberRules {
            integer: true,
            ..Default::default()
        })
        .into()
    }

    /// Accepts exactly `value`.
    pub fn literal(value: impl Into<Value>) -> Self {
        SchemaKind::Literal(vec![value.into()]).into()
    }

    /// Accepts any of `values`.
    pub fn literals<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        SchemaKind::Literal(values.into_iter().map(Into::into).collect()).into()
    }

    /// A struct with the given fields. Undeclared keys are rejected unless
    /// [`additional_properties`](Self::additional_properties) is enabled.
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, schema)| Field {
                name: name.into(),
                schema: Arc::new(schema),
            })
            .collect();
        SchemaKind::Struct(StructSchema {
            fields,
            additional_properties: false,
        })
        .into()
    }

    /// Accepts arrays whose every element matches `items`. Order is kept.
    pub fn array(items: SchemaNode) -> Self {
        SchemaKind::Array(ArraySchema {
            items: Arc::new(items),
            min_items: None,
            max_items: None,
            unique_by: Vec::new(),
        })
        .into()
    }

    /// Accepts objects with arbitrary keys whose values match `values`.
    pub fn record(values: SchemaNode) -> Self {
        SchemaKind::Record(Arc::new(values)).into()
    }

    /// Accepts the first variant that validates, in declaration order.
    pub fn union<I>(variants: I) -> Self
    where
        I: IntoIterator<Item = SchemaNode>,
    {
        SchemaKind::Union(UnionSchema {
            variants: variants.into_iter().map(Arc::new).collect(),
            discriminator: None,
        })
        .into()
    }

    /// A union whose variant is selected by the literal value of `field`.
    pub fn tagged_union<I>(field: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = SchemaNode>,
    {
        SchemaKind::Union(UnionSchema {
            variants: variants.into_iter().map(Arc::new).collect(),
            discriminator: Some(Discriminator::new(field)),
        })
        .into()
    }

    /// A named node whose body may refer to itself.
    ///
    /// `build` receives a reference to the node being defined and returns the
    /// body. Every occurrence of that reference shares the one body, so
    /// validation never builds further copies.
    ///
    /// ```
    /// use omnera_schema::SchemaNode;
    /// use serde_json::json;
    ///
    /// let tree = SchemaNode::recursive("Tree", |tree| {
    ///     SchemaNode::structure([("children", SchemaNode::array(tree).optional())])
    /// });
    /// assert!(tree.is_valid(&json!({"children": [{"children": [{}]}]})));
    /// ```
    pub fn recursive(name: impl Into<String>, build: impl FnOnce(SchemaNode) -> SchemaNode) -> Self {
        let deferred = Arc::new(Deferred::unresolved(name));
        let body = build(Self::from_deferred(Arc::clone(&deferred)));
        deferred.resolve_with(body);
        Self::from_deferred(deferred)
    }

    pub(crate) fn from_deferred(deferred: Arc<Deferred>) -> Self {
        SchemaKind::Deferred(deferred).into()
    }
}

// Builder methods.
impl SchemaNode {
    /// Short human-readable name, exported as `title`.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.annotations.title = Some(title.into());
        self
    }

    /// Exported as `description` and as JSDoc.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.annotations.description = Some(description.into());
        self
    }

    /// Appends an example value.
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.annotations.examples.push(example.into());
        self
    }

    /// Message reported when a constraint of this node fails.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Names this node so exporters emit it once as a shared definition.
    pub fn define(mut self, name: impl Into<String>) -> Self {
        self.definition = Some(name.into());
        self
    }

    /// Marks the node as optional when used as a struct field.
    pub fn optional(self) -> Self {
        if matches!(self.kind, SchemaKind::Optional(_)) {
            return self;
        }
        SchemaKind::Optional(OptionalSchema {
            inner: Arc::new(self),
            default: None,
        })
        .into()
    }

    /// Optional struct field that takes `value` when absent.
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let mut node = self.optional();
        if let SchemaKind::Optional(opt) = &mut node.kind {
            opt.default = Some(value.into());
        }
        node
    }

    /// Minimum string length in characters.
    pub fn min_length(mut self, n: usize) -> Self {
        match &mut self.kind {
            SchemaKind::String(rules) => rules.min_length = Some(n),
            other => ignored("min_length", other),
        }
        self
    }

    /// Maximum string length in characters.
    pub fn max_length(mut self, n: usize) -> Self {
        match &mut self.kind {
            SchemaKind::String(rules) => rules.max_length = Some(n),
            other => ignored("max_length", other),
        }
        self
    }

    /// Requires string values to match `source`.
    ///
    /// # Panics
    ///
    /// Panics if `source` is not a valid regular expression. Intended for
    /// literal patterns written in code; use [`try_pattern`](Self::try_pattern)
    /// for patterns read at runtime.
    pub fn pattern(self, source: &str) -> Self {
        match self.try_pattern(source) {
            Ok(node) => node,
            Err(e) => panic!("invalid schema pattern {source:?}: {e}"),
        }
    }

    /// Like [`pattern`](Self::pattern) but reports an invalid expression.
    ///
    /// # Errors
    ///
    /// Returns the [`regex::Error`] if `source` does not compile.
    pub fn try_pattern(mut self, source: &str) -> Result<Self, regex::Error> {
        let pattern = Pattern::new(source)?;
        match &mut self.kind {
            SchemaKind::String(rules) => rules.pattern = Some(pattern),
            other => ignored("pattern", other),
        }
        Ok(self)
    }

    /// Inclusive lower bound.
    pub fn minimum(mut self, n: f64) -> Self {
        match &mut self.kind {
            SchemaKind::Number(rules) => rules.minimum = Some(n),
            other => ignored("minimum", other),
        }
        self
    }

    /// Inclusive upper bound.
    pub fn maximum(mut self, n: f64) -> Self {
        match &mut self.kind {
            SchemaKind::Number(rules) => rules.maximum = Some(n),
            other => ignored("maximum", other),
        }
        self
    }

    /// Minimum number of array elements.
    pub fn min_items(mut self, n: usize) -> Self {
        match &mut self.kind {
            SchemaKind::Array(array) => array.min_items = Some(n),
            other => ignored("min_items", other),
        }
        self
    }

    /// Maximum number of array elements.
    pub fn max_items(mut self, n: usize) -> Self {
        match &mut self.kind {
            SchemaKind::Array(array) => array.max_items = Some(n),
            other => ignored("max_items", other),
        }
        self
    }

    /// Requires the value under `key` to be unique across array elements.
    pub fn unique_by(mut self, key: impl Into<String>) -> Self {
        match &mut self.kind {
            SchemaKind::Array(array) => array.unique_by.push(key.into()),
            other => ignored("unique_by", other),
        }
        self
    }

    /// Whether a struct accepts and passes through undeclared keys.
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        match &mut self.kind {
            SchemaKind::Struct(s) => s.additional_properties = allowed,
            other => ignored("additional_properties", other),
        }
        self
    }

    /// Appends a field to a struct node.
    pub fn with_field(mut self, name: impl Into<String>, schema: SchemaNode) -> Self {
        match &mut self.kind {
            SchemaKind::Struct(s) => s.fields.push(Field {
                name: name.into(),
                schema: Arc::new(schema),
            }),
            other => ignored("with_field", other),
        }
        self
    }
}

fn ignored(modifier: &str, kind: &SchemaKind) {
    warn!("`{modifier}` does not apply to a {} schema; ignored", kind.name());
}

// Accessors.
impl SchemaNode {
    /// What this node validates.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Title, description and examples.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Message set with [`message`](Self::message).
    pub fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Definition name set with [`define`](Self::define).
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Follows deferred nodes to the node that carries the actual kind.
    pub fn resolved(&self) -> &SchemaNode {
        match &self.kind {
            SchemaKind::Deferred(d) => d.get().map(SchemaNode::resolved).unwrap_or(self),
            _ => self,
        }
    }

    /// Literal values a struct node requires under `field`, if it declares
    /// that field as a literal. Used to index discriminated unions.
    pub fn discriminator_values(&self, field: &str) -> Option<&[Value]> {
        let SchemaKind::Struct(s) = &self.resolved().kind else {
            return None;
        };
        match &s.field(field)?.schema.kind {
            SchemaKind::Literal(values) => Some(values),
            _ => None,
        }
    }

    /// The struct behind this node, looking through deferred nodes.
    pub fn as_struct(&self) -> Option<&StructSchema> {
        match &self.resolved().kind {
            SchemaKind::Struct(s) => Some(s),
            _ => None,
        }
    }
}
