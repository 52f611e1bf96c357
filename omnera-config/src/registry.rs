//! Registries that assemble feature variants into aggregate schemas.
//!
//! A [`FeatureRegistry`] collects the variants of one discriminated feature
//! (table fields, triggers, actions...) and exposes only the aggregate union.
//! The [`SchemaRegistry`] holds every aggregate by name; it is built once
//! and then only read.

use std::collections::BTreeMap;

use omnera_schema::{SchemaNode, Value, to_json_schema, to_typescript};
use serde::de::DeserializeOwned;

use crate::{
    app::AppConfig,
    error::{ConfigError, RegistryError},
};

/// Variants of one discriminated feature, keyed by their tag.
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    name: String,
    discriminator: String,
    description: Option<String>,
    variants: Vec<(String, SchemaNode)>,
}

impl FeatureRegistry {
    /// An empty feature named `name` whose variants are selected by the
    /// literal value of `discriminator`.
    pub fn new(name: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discriminator: discriminator.into(),
            description: None,
            variants: Vec::new(),
        }
    }

    /// Description carried by the aggregate schema.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a variant. Its tag is the single string literal it declares
    /// under the discriminator field.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingTag`] if the variant declares no such
    /// literal and [`RegistryError::DuplicateTag`] if the tag is taken.
    pub fn register(&mut self, variant: SchemaNode) -> Result<(), RegistryError> {
        let tag = match variant.discriminator_values(&self.discriminator) {
            Some([Value::String(tag)]) => tag.clone(),
            _ => {
                return Err(RegistryError::MissingTag {
                    feature: self.name.clone(),
                    discriminator: self.discriminator.clone(),
                });
            }
        };
        if self.variants.iter().any(|(t, _)| *t == tag) {
            return Err(RegistryError::DuplicateTag {
                feature: self.name.clone(),
                tag,
            });
        }
        debug!("{}: registered variant '{}'", self.name, tag);
        self.variants.push((tag, variant));
        Ok(())
    }

    /// Registers each variant in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_all<I>(&mut self, variants: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = SchemaNode>,
    {
        variants.into_iter().try_for_each(|v| self.register(v))
    }

    /// Feature name, also the definition name of the aggregate.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field whose literal value selects the variant.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(tag, _)| tag.as_str())
    }

    /// The variant registered under `tag`.
    pub fn variant(&self, tag: &str) -> Option<&SchemaNode> {
        self.variants
            .iter()
            .find_map(|(t, node)| (t == tag).then_some(node))
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The aggregate discriminated union, named after the feature.
    pub fn schema(&self) -> SchemaNode {
        let node = SchemaNode::tagged_union(
            self.discriminator.clone(),
            self.variants.iter().map(|(_, node)| node.clone()),
        );
        let node = match &self.description {
            Some(d) => node.description(d.clone()),
            None => node,
        };
        node.define(self.name.clone())
    }
}

/// Every aggregate schema of the application model, by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SchemaNode>,
    features: BTreeMap<String, FeatureRegistry>,
}

impl SchemaRegistry {
    /// The full application model: tables, pages, automations, connections,
    /// blocks and the `App` root composing them.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if two features register the same tag or
    /// schema name, or a feature composes a schema that is not registered.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        crate::blocks::register(&mut registry)?;
        crate::tables::register(&mut registry)?;
        crate::connections::register(&mut registry)?;
        crate::automations::register(&mut registry)?;
        crate::pages::register(&mut registry)?;
        crate::app::register(&mut registry)?;
        info!(
            "schema registry ready: {} schemas, {} features",
            registry.schemas.len(),
            registry.features.len()
        );
        Ok(registry)
    }

    /// Registers `node` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSchema`] if `name` is taken.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) -> Result<(), RegistryError> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(RegistryError::DuplicateSchema { name });
        }
        self.schemas.insert(name, node);
        Ok(())
    }

    /// Stores `feature` and inserts its aggregate schema under the feature
    /// name. Returns the aggregate for further composition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSchema`] if the name is taken.
    pub fn insert_feature(&mut self, feature: FeatureRegistry) -> Result<SchemaNode, RegistryError> {
        let schema = feature.schema();
        self.insert(feature.name().to_string(), schema.clone())?;
        self.features.insert(feature.name().to_string(), feature);
        Ok(schema)
    }

    /// The schema registered as `name`.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    /// Like [`get`](Self::get) but an error when absent. Used while composing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingSchema`] if nothing is registered as
    /// `name`.
    pub fn require(&self, name: &str) -> Result<SchemaNode, RegistryError> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::MissingSchema {
                name: name.to_string(),
            })
    }

    /// The feature registry stored as `name`.
    pub fn feature(&self, name: &str) -> Option<&FeatureRegistry> {
        self.features.get(name)
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn features(&self) -> impl Iterator<Item = &FeatureRegistry> {
        self.features.values()
    }

    /// Validates `value` against the schema registered as `name` and returns
    /// the normalized tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] with every validation error, or
    /// [`ConfigError::Registry`] if `name` is not registered.
    pub fn validate(&self, name: &str, value: &Value) -> Result<Value, ConfigError> {
        let node = self.require(name)?;
        let tree = node.validate(value)?;
        debug!("validated document against '{name}'");
        Ok(tree)
    }

    /// Validates and decodes into the typed tree `T`.
    ///
    /// # Errors
    ///
    /// As [`validate`](Self::validate), plus [`ConfigError::Decode`] if the
    /// normalized tree does not fit `T`.
    pub fn validate_as<T: DeserializeOwned>(&self, name: &str, value: &Value) -> Result<T, ConfigError> {
        let tree = self.validate(name, value)?;
        serde_json::from_value(tree).map_err(|source| ConfigError::Decode {
            schema: name.to_string(),
            source,
        })
    }

    /// Validates a whole application document into an [`AppConfig`].
    ///
    /// # Errors
    ///
    /// See [`validate_as`](Self::validate_as).
    pub fn validate_app(&self, value: &Value) -> Result<AppConfig, ConfigError> {
        self.validate_as("App", value)
    }

    /// JSON Schema document for the registered schema `name`.
    pub fn json_schema(&self, name: &str) -> Result<Value, RegistryError> {
        Ok(to_json_schema(&self.require(name)?))
    }

    /// TypeScript declarations rooted at the registered schema `name`.
    pub fn typescript(&self, name: &str) -> Result<String, RegistryError> {
        Ok(to_typescript(name, &self.require(name)?))
    }
}
