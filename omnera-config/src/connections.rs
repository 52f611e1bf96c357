//! External service connections, tagged by `type`.

use serde::{Deserialize, Serialize};

use omnera_schema::SchemaNode;

use crate::{
    common,
    error::RegistryError,
    registry::{FeatureRegistry, SchemaRegistry},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConnection {
    pub id: u64,
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConnection {
    pub id: u64,
    pub name: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Connection {
    GoogleGmail(OAuthConnection),
    Calendly(OAuthConnection),
    Notion(TokenConnection),
    Airtable(TokenConnection),
}

impl Connection {
    pub fn name(&self) -> &str {
        match self {
            Connection::GoogleGmail(c) | Connection::Calendly(c) => &c.name,
            Connection::Notion(c) | Connection::Airtable(c) => &c.name,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Connection::GoogleGmail(c) | Connection::Calendly(c) => c.id,
            Connection::Notion(c) | Connection::Airtable(c) => c.id,
        }
    }
}

fn secret(description: &str) -> SchemaNode {
    SchemaNode::string().min_length(1).description(description)
}

fn connection<I>(tag: &str, title: &str, members: I) -> SchemaNode
where
    I: IntoIterator<Item = (&'static str, SchemaNode)>,
{
    let base = SchemaNode::structure([
        ("id", common::id()),
        ("name", common::name()),
        ("type", SchemaNode::literal(tag)),
    ]);
    members
        .into_iter()
        .fold(base, |node, (name, schema)| node.with_field(name, schema))
        .title(title)
        .define(format!("{}Connection", title.replace(' ', "")))
}

fn oauth(tag: &str, title: &str) -> SchemaNode {
    connection(
        tag,
        title,
        [
            ("clientId", secret("OAuth client id")),
            ("clientSecret", secret("OAuth client secret")),
            ("redirectUri", common::url().optional()),
        ],
    )
}

fn variants() -> Vec<SchemaNode> {
    vec![
        oauth("google-gmail", "Google Gmail"),
        oauth("calendly", "Calendly"),
        connection("notion", "Notion", [("token", secret("Integration token"))]),
        connection(
            "airtable",
            "Airtable",
            [
                ("token", secret("Personal access token")),
                ("baseId", SchemaNode::string().optional()),
            ],
        ),
    ]
}

pub(crate) fn register(registry: &mut SchemaRegistry) -> Result<(), RegistryError> {
    let mut feature = FeatureRegistry::new("Connection", "type")
        .with_description("Credentials for an external service, selected by its `type`");
    feature.register_all(variants())?;
    registry.insert_feature(feature).map(drop)
}
