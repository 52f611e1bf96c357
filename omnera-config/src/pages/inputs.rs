use omnera_schema::SchemaNode;

use crate::common;

fn input<I>(tag: &str, title: &str, extra: I) -> SchemaNode
where
    I: IntoIterator<Item = (&'static str, SchemaNode)>,
{
    let base = SchemaNode::structure([
        ("name", common::name()),
        ("type", SchemaNode::literal(tag)),
        ("label", SchemaNode::string().optional()),
    ]);
    extra
        .into_iter()
        .fold(base, |node, (name, schema)| node.with_field(name, schema))
        .title(title)
        .define(title.replace(' ', ""))
}

fn text_members() -> [(&'static str, SchemaNode); 2] {
    [
        ("placeholder", SchemaNode::string().optional()),
        (
            "required",
            SchemaNode::boolean()
                .description("Whether the form refuses to submit without a value")
                .default_value(false),
        ),
    ]
}

pub(super) fn variants() -> Vec<SchemaNode> {
    vec![
        input("text", "Text Input", text_members()),
        input("email", "Email Input", text_members()),
        input("long-text", "Long Text Input", text_members()),
        input(
            "checkbox",
            "Checkbox Input",
            [("default", SchemaNode::boolean().default_value(false))],
        ),
        input(
            "single-select",
            "Single Select Input",
            [
                (
                    "options",
                    SchemaNode::array(SchemaNode::string().min_length(1)).min_items(1),
                ),
                ("required", SchemaNode::boolean().default_value(false)),
            ],
        ),
    ]
}
