use omnera_schema::SchemaNode;

use crate::common;

fn flag(description: &str) -> SchemaNode {
    SchemaNode::boolean()
        .description(description)
        .default_value(false)
}

/// Members every field variant carries, followed by `extra`.
fn variant<I>(tag: &str, title: &str, description: &str, extra: I) -> SchemaNode
where
    I: IntoIterator<Item = (&'static str, SchemaNode)>,
{
    let base = SchemaNode::structure([
        ("id", common::id()),
        ("name", common::name()),
        ("type", SchemaNode::literal(tag)),
        ("required", flag("Whether a value must be provided")),
        (
            "unique",
            flag("Whether values must be unique across all rows"),
        ),
        (
            "indexed",
            flag("Whether a database index is created for faster queries"),
        ),
    ]);
    extra
        .into_iter()
        .fold(base, |node, (name, schema)| node.with_field(name, schema))
        .title(title)
        .description(description)
        .define(title.replace(' ', ""))
}

fn text(tag: &str, title: &str, description: &str) -> SchemaNode {
    variant(
        tag,
        title,
        description,
        [("default", SchemaNode::string().optional())],
    )
}

fn bounds() -> [(&'static str, SchemaNode); 3] {
    [
        ("min", SchemaNode::number().optional()),
        ("max", SchemaNode::number().optional()),
        ("default", SchemaNode::number().optional()),
    ]
}

pub(super) fn variants() -> Vec<SchemaNode> {
    vec![
        text(
            "single-line-text",
            "Single Line Text Field",
            "Short text on a single line, such as a title or a name",
        ),
        text(
            "long-text",
            "Long Text Field",
            "Multi-line text, such as notes or descriptions",
        ),
        text(
            "phone-number",
            "Phone Number Field",
            "Telephone number stored as text",
        ),
        variant(
            "email",
            "Email Field",
            "Email address",
            [("default", common::email().optional())],
        ),
        variant(
            "url",
            "Url Field",
            "Web address",
            [("default", common::url().optional())],
        ),
        variant(
            "integer",
            "Integer Field",
            "Whole number",
            [
                ("min", SchemaNode::integer().optional()),
                ("max", SchemaNode::integer().optional()),
                ("default", SchemaNode::integer().optional()),
            ],
        ),
        variant("decimal", "Decimal Field", "Number with a fixed precision", bounds())
            .with_field(
                "precision",
                SchemaNode::integer()
                    .minimum(0.0)
                    .maximum(10.0)
                    .description("Digits after the decimal point")
                    .default_value(2),
            ),
        variant("currency", "Currency Field", "Monetary amount", bounds()).with_field(
            "currency",
            SchemaNode::string()
                .pattern("^[A-Z]{3}$")
                .message("Currency must be a three-letter ISO 4217 code, such as 'USD'")
                .description("ISO 4217 currency code")
                .default_value("USD"),
        ),
        variant(
            "percentage",
            "Percentage Field",
            "Percentage value",
            bounds(),
        ),
        variant(
            "checkbox",
            "Checkbox Field",
            "True or false value",
            [("default", SchemaNode::boolean().optional())],
        ),
        variant(
            "date",
            "Date Field",
            "Calendar date, optionally with a time of day",
            [
                (
                    "includeTime",
                    SchemaNode::boolean()
                        .description("Whether a time of day is stored with the date")
                        .default_value(false),
                ),
                ("default", SchemaNode::string().optional()),
            ],
        ),
        variant(
            "single-select",
            "Single Select Field",
            "One option out of a fixed list",
            [
                ("options", options()),
                ("default", SchemaNode::string().optional()),
            ],
        ),
        variant(
            "multiple-select",
            "Multiple Select Field",
            "Any number of options out of a fixed list",
            [
                ("options", options()),
                (
                    "maxSelections",
                    SchemaNode::integer().minimum(1.0).optional(),
                ),
                (
                    "default",
                    SchemaNode::array(SchemaNode::string()).optional(),
                ),
            ],
        ),
        variant(
            "relationship",
            "Relationship Field",
            "Link to rows of another table",
            [
                ("relatedTable", common::name()),
                (
                    "relationType",
                    SchemaNode::literals(["one-to-one", "one-to-many", "many-to-one", "many-to-many"])
                        .description("Cardinality of the link"),
                ),
            ],
        ),
        variant(
            "rollup",
            "Rollup Field",
            "Aggregate of a field across related rows",
            [
                ("relationshipField", common::name()),
                ("relatedField", common::name()),
                (
                    "aggregation",
                    SchemaNode::literals(["count", "sum", "avg", "min", "max"])
                        .description("Aggregate function applied to the related values"),
                ),
            ],
        ),
    ]
}

fn options() -> SchemaNode {
    SchemaNode::array(SchemaNode::string().min_length(1))
        .min_items(1)
        .description("Allowed option labels")
}
