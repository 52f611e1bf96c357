use omnera_schema::SchemaNode;

use crate::common;

fn trigger<I>(event: &str, title: &str, description: &str, members: I) -> SchemaNode
where
    I: IntoIterator<Item = (&'static str, SchemaNode)>,
{
    let base = SchemaNode::structure([("event", SchemaNode::literal(event))]);
    members
        .into_iter()
        .fold(base, |node, (name, schema)| node.with_field(name, schema))
        .title(title)
        .description(description)
        .define(format!("{}Trigger", title.replace(' ', "")))
}

fn http_path() -> SchemaNode {
    SchemaNode::string()
        .pattern("^/[a-z0-9_/-]*$")
        .message("Webhook path must start with '/'")
        .description("Path the webhook listens on")
}

pub(super) fn variants() -> Vec<SchemaNode> {
    vec![
        trigger(
            "http.post",
            "Http Post",
            "Runs when a POST request reaches the path",
            [("path", http_path())],
        ),
        trigger(
            "http.get",
            "Http Get",
            "Runs when a GET request reaches the path",
            [("path", http_path())],
        ),
        trigger(
            "database.record-created",
            "Record Created",
            "Runs after a row is inserted",
            [("table", common::name())],
        ),
        trigger(
            "database.record-updated",
            "Record Updated",
            "Runs after a row is updated",
            [
                ("table", common::name()),
                (
                    "fields",
                    SchemaNode::array(common::name())
                        .description("Only fire when one of these fields changed")
                        .optional(),
                ),
            ],
        ),
        trigger(
            "schedule.cron-time",
            "Cron Time",
            "Runs on a cron schedule",
            [
                (
                    "cronTime",
                    SchemaNode::string()
                        .pattern(r"^\S+(?:\s+\S+){4,5}$")
                        .message("Cron expression must have five or six space-separated fields")
                        .example("0 9 * * 1"),
                ),
                ("timeZone", SchemaNode::string().optional()),
            ],
        ),
        trigger(
            "google-gmail.email-received",
            "Email Received",
            "Runs when a Gmail connection receives a message",
            [
                ("connection", common::name()),
                ("label", SchemaNode::string().optional()),
            ],
        ),
    ]
}
