use omnera_schema::SchemaNode;

use crate::common;

fn action<I>(tag: &str, title: &str, params: I) -> SchemaNode
where
    I: IntoIterator<Item = (&'static str, SchemaNode)>,
{
    SchemaNode::structure([
        ("action", SchemaNode::literal(tag)),
        ("name", common::name()),
        ("params", SchemaNode::structure(params)),
    ])
    .title(title)
    .define(format!("{}Action", title.replace(' ', "")))
}

fn headers() -> SchemaNode {
    SchemaNode::record(SchemaNode::string())
        .description("Request headers")
        .optional()
}

fn row() -> SchemaNode {
    SchemaNode::record(SchemaNode::any()).description("Field values; strings may reference earlier steps")
}

pub(super) fn variants() -> Vec<SchemaNode> {
    vec![
        action(
            "http.post",
            "Http Post",
            [
                ("url", common::url()),
                ("headers", headers()),
                ("body", SchemaNode::record(SchemaNode::any()).optional()),
            ],
        ),
        action(
            "http.get",
            "Http Get",
            [("url", common::url()), ("headers", headers())],
        ),
        action(
            "database.create-record",
            "Create Record",
            [("table", common::name()), ("fields", row())],
        ),
        action(
            "database.update-record",
            "Update Record",
            [
                ("table", common::name()),
                ("id", SchemaNode::string().min_length(1)),
                ("fields", row()),
            ],
        ),
        action(
            "google-gmail.send-email",
            "Send Email",
            [
                ("connection", common::name()),
                (
                    "to",
                    SchemaNode::array(common::email())
                        .min_items(1)
                        .description("Recipients"),
                ),
                ("subject", SchemaNode::string().min_length(1)),
                ("text", SchemaNode::string().optional()),
                ("html", SchemaNode::string().optional()),
            ],
        ),
        action(
            "code.run-typescript",
            "Run Typescript",
            [
                ("code", SchemaNode::string().min_length(1)),
                (
                    "inputData",
                    SchemaNode::record(SchemaNode::any()).optional(),
                ),
            ],
        ),
        action(
            "filter.only-continue-if",
            "Only Continue If",
            [(
                "conditions",
                SchemaNode::array(SchemaNode::structure([
                    ("field", SchemaNode::string().min_length(1)),
                    (
                        "operator",
                        SchemaNode::literals([
                            "equals",
                            "not-equals",
                            "contains",
                            "greater-than",
                            "less-than",
                            "exists",
                        ]),
                    ),
                    ("value", SchemaNode::any().optional()),
                ]))
                .min_items(1),
            )],
        ),
    ]
}
