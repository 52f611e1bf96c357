//! Tables: typed fields, indexes and the table definition itself.

use serde::{Deserialize, Serialize};

use omnera_schema::SchemaNode;

use crate::{
    common,
    error::RegistryError,
    registry::{FeatureRegistry, SchemaRegistry},
};

mod fields;

/// Members shared by every field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBase {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecimalField {
    #[serde(flatten)]
    pub number: NumberField,
    #[serde(default = "default_precision")]
    pub precision: u8,
}

fn default_precision() -> u8 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyField {
    #[serde(flatten)]
    pub number: NumberField,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub include_time: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSelectField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleSelectField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub related_table: String,
    pub relation_type: RelationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub relationship_field: String,
    pub related_field: String,
    pub aggregation: Aggregation,
}

/// A table column, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TableField {
    SingleLineText(TextField),
    LongText(TextField),
    PhoneNumber(TextField),
    Email(TextField),
    Url(TextField),
    Integer(NumberField),
    Decimal(DecimalField),
    Currency(CurrencyField),
    Percentage(NumberField),
    Checkbox(CheckboxField),
    Date(DateField),
    SingleSelect(SingleSelectField),
    MultipleSelect(MultipleSelectField),
    Relationship(RelationshipField),
    Rollup(RollupField),
}

impl TableField {
    pub fn base(&self) -> &FieldBase {
        match self {
            TableField::SingleLineText(f)
            | TableField::LongText(f)
            | TableField::PhoneNumber(f)
            | TableField::Email(f)
            | TableField::Url(f) => &f.base,
            TableField::Integer(f) | TableField::Percentage(f) => &f.base,
            TableField::Decimal(f) => &f.number.base,
            TableField::Currency(f) => &f.number.base,
            TableField::Checkbox(f) => &f.base,
            TableField::Date(f) => &f.base,
            TableField::SingleSelect(f) => &f.base,
            TableField::MultipleSelect(f) => &f.base,
            TableField::Relationship(f) => &f.base,
            TableField::Rollup(f) => &f.base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn id(&self) -> u64 {
        self.base().id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: u64,
    pub name: String,
    pub fields: Vec<TableField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<TableIndex>,
}

impl Table {
    pub fn field(&self, name: &str) -> Option<&TableField> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

fn index_schema() -> SchemaNode {
    SchemaNode::structure([
        (
            "name",
            SchemaNode::string()
                .min_length(1)
                .pattern("^idx_[a-z][a-z0-9_]*$")
                .message("Name of the index. Use descriptive names like 'idx_tablename_fieldname'")
                .example("idx_users_email"),
        ),
        (
            "fields",
            SchemaNode::array(common::name())
                .min_items(1)
                .description("Fields covered by the index, in order"),
        ),
        (
            "unique",
            SchemaNode::boolean()
                .description("Whether the index enforces uniqueness")
                .default_value(false),
        ),
    ])
    .title("Table Index")
    .description("Database index over one or more fields")
    .define("TableIndex")
}

fn table_schema(field: SchemaNode, index: SchemaNode) -> SchemaNode {
    SchemaNode::structure([
        ("id", common::id()),
        ("name", common::name()),
        (
            "fields",
            SchemaNode::array(field)
                .min_items(1)
                .unique_by("id")
                .unique_by("name")
                .description("Columns of the table"),
        ),
        (
            "indexes",
            SchemaNode::array(index).unique_by("name").optional(),
        ),
    ])
    .title("Table")
    .description("A data table with typed fields")
    .define("Table")
}

pub(crate) fn register(registry: &mut SchemaRegistry) -> Result<(), RegistryError> {
    let mut field = FeatureRegistry::new("TableField", "type")
        .with_description("A table field, selected by its `type`");
    field.register_all(fields::variants())?;
    let field = registry.insert_feature(field)?;

    let index = index_schema();
    registry.insert("TableIndex", index.clone())?;
    registry.insert("Table", table_schema(field, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_name_message() {
        let err = index_schema()
            .validate(&json!({"name": "email", "fields": ["email"]}))
            .unwrap_err();
        assert_eq!(err.first().path().to_string(), "name");
        assert_eq!(
            err.first().to_string(),
            "name: Name of the index. Use descriptive names like 'idx_tablename_fieldname'"
        );
    }

    #[test]
    fn test_index_needs_fields() {
        let err = index_schema()
            .validate(&json!({"name": "idx_users_email", "fields": []}))
            .unwrap_err();
        assert_eq!(err.first().path().to_string(), "fields");
    }

    #[test]
    fn test_typed_fields() {
        let mut registry = SchemaRegistry::default();
        register(&mut registry).unwrap();
        let table: Table = registry
            .validate_as(
                "Table",
                &json!({
                    "id": 1,
                    "name": "orders",
                    "fields": [
                        {"id": 1, "name": "total", "type": "currency"},
                        {"id": 2, "name": "notes", "type": "long-text", "required": true}
                    ]
                }),
            )
            .unwrap();
        let TableField::Currency(total) = &table.fields[0] else {
            panic!("expected a currency field");
        };
        assert_eq!(total.currency, "USD");
        assert!(table.field("notes").unwrap().base().required);
        assert_eq!(table.field("notes").unwrap().id(), 2);
    }

    #[test]
    fn test_duplicate_field_names() {
        let mut registry = SchemaRegistry::default();
        register(&mut registry).unwrap();
        let err = registry
            .validate(
                "Table",
                &json!({
                    "id": 1,
                    "name": "orders",
                    "fields": [
                        {"id": 1, "name": "total", "type": "integer"},
                        {"id": 2, "name": "total", "type": "integer"}
                    ]
                }),
            )
            .unwrap_err();
        let errors = err.validation().unwrap();
        assert!(errors.has_path("fields[1].name"));
    }
}
