//! Automations: a trigger followed by an ordered list of actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use omnera_schema::SchemaNode;

use crate::{
    common,
    error::RegistryError,
    registry::{FeatureRegistry, SchemaRegistry},
};

mod actions;
mod triggers;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTrigger {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTrigger {
    pub table: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronTrigger {
    pub cron_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailReceivedTrigger {
    pub connection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// What starts an automation, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AutomationTrigger {
    #[serde(rename = "http.post")]
    HttpPost(HttpTrigger),
    #[serde(rename = "http.get")]
    HttpGet(HttpTrigger),
    #[serde(rename = "database.record-created")]
    RecordCreated(RecordTrigger),
    #[serde(rename = "database.record-updated")]
    RecordUpdated(RecordTrigger),
    #[serde(rename = "schedule.cron-time")]
    CronTime(CronTrigger),
    #[serde(rename = "google-gmail.email-received")]
    EmailReceived(EmailReceivedTrigger),
}

/// A named action step with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step<P> {
    pub name: String,
    pub params: P,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpParams {
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordParams {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailParams {
    pub connection: String,
    pub to: Vec<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeParams {
    pub code: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub input_data: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub conditions: Vec<Condition>,
}

/// One step of an automation, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum AutomationAction {
    #[serde(rename = "http.post")]
    HttpPost(Step<HttpParams>),
    #[serde(rename = "http.get")]
    HttpGet(Step<HttpParams>),
    #[serde(rename = "database.create-record")]
    CreateRecord(Step<RecordParams>),
    #[serde(rename = "database.update-record")]
    UpdateRecord(Step<RecordParams>),
    #[serde(rename = "google-gmail.send-email")]
    SendEmail(Step<SendEmailParams>),
    #[serde(rename = "code.run-typescript")]
    RunTypescript(Step<RunCodeParams>),
    #[serde(rename = "filter.only-continue-if")]
    OnlyContinueIf(Step<FilterParams>),
}

impl AutomationAction {
    pub fn name(&self) -> &str {
        match self {
            AutomationAction::HttpPost(s) | AutomationAction::HttpGet(s) => &s.name,
            AutomationAction::CreateRecord(s) | AutomationAction::UpdateRecord(s) => &s.name,
            AutomationAction::SendEmail(s) => &s.name,
            AutomationAction::RunTypescript(s) => &s.name,
            AutomationAction::OnlyContinueIf(s) => &s.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger: AutomationTrigger,
    pub actions: Vec<AutomationAction>,
}

fn automation_schema(trigger: SchemaNode, action: SchemaNode) -> SchemaNode {
    SchemaNode::structure([
        ("id", common::id().optional()),
        ("name", common::name()),
        ("description", common::description().optional()),
        ("trigger", trigger),
        (
            "actions",
            SchemaNode::array(action)
                .min_items(1)
                .unique_by("name")
                .description("Steps run in order after the trigger fires"),
        ),
    ])
    .title("Automation")
    .description("A workflow started by a trigger")
    .define("Automation")
}

pub(crate) fn register(registry: &mut SchemaRegistry) -> Result<(), RegistryError> {
    let mut trigger = FeatureRegistry::new("AutomationTrigger", "event")
        .with_description("What starts the automation, selected by its `event`");
    trigger.register_all(triggers::variants())?;
    let trigger = registry.insert_feature(trigger)?;

    let mut action = FeatureRegistry::new("AutomationAction", "action")
        .with_description("A workflow step, selected by its `action`");
    action.register_all(actions::variants())?;
    let action = registry.insert_feature(action)?;

    registry.insert("Automation", automation_schema(trigger, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::default();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn test_unknown_action() {
        let err = registry()
            .validate(
                "AutomationAction",
                &json!({"action": "unknown-action", "name": "x", "params": {}}),
            )
            .unwrap_err();
        assert_eq!(
            err.validation().unwrap().first().to_string(),
            "action: unknown type: unknown-action"
        );
    }

    #[test]
    fn test_typed_automation() {
        let automation: Automation = registry()
            .validate_as(
                "Automation",
                &json!({
                    "name": "welcome",
                    "trigger": {"event": "database.record-created", "table": "users"},
                    "actions": [{
                        "action": "google-gmail.send-email",
                        "name": "send",
                        "params": {
                            "connection": "gmail",
                            "to": ["new@example.com"],
                            "subject": "Welcome"
                        }
                    }]
                }),
            )
            .unwrap();
        assert!(matches!(automation.trigger, AutomationTrigger::RecordCreated(_)));
        let AutomationAction::SendEmail(step) = &automation.actions[0] else {
            panic!("expected send-email");
        };
        assert_eq!(step.params.to, ["new@example.com"]);
        assert_eq!(automation.actions[0].name(), "send");
    }

    #[test]
    fn test_cron_expression() {
        let trigger = json!({"event": "schedule.cron-time", "cronTime": "0 9 * * 1"});
        assert!(registry().validate("AutomationTrigger", &trigger).is_ok());

        let trigger = json!({"event": "schedule.cron-time", "cronTime": "daily"});
        let err = registry().validate("AutomationTrigger", &trigger).unwrap_err();
        assert!(err.validation().unwrap().has_path("cronTime"));
    }
}
