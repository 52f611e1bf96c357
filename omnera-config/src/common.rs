//! Definitions shared by every feature: identifiers, names, versions.
//!
//! Each constructor returns a named node, so exporters emit it once under
//! `$defs` no matter how many features use it.

use omnera_schema::{MAX_SAFE_INTEGER, SchemaNode};

use crate::error::ConfigError;

/// Lowercase snake identifier used for tables, fields and automations.
pub const NAME_PATTERN: &str = "^[a-z][a-z0-9_]*$";

/// Lowercase kebab identifier used for blocks.
pub const BLOCK_NAME_PATTERN: &str = "^[a-z][a-z0-9-]*$";

/// npm package name, optionally scoped.
pub const APP_NAME_PATTERN: &str = r"^(?:@[a-z0-9\-~][a-z0-9\-._~]*/)?[a-z0-9\-~][a-z0-9\-._~]*$";

/// Semantic version 2.0.0.
pub const VERSION_PATTERN: &str = r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][a-zA-Z0-9-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][a-zA-Z0-9-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$";

/// Absolute page path: `/` or slash separated lowercase segments.
pub const PAGE_PATH_PATTERN: &str = r"^/(?:[a-z0-9_-]+(?:/[a-z0-9_-]+)*)?$";

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

pub const URL_PATTERN: &str = r"^https?://[^\s]+$";

pub const MAX_NAME_LENGTH: usize = 63;

pub const MAX_APP_NAME_LENGTH: usize = 214;

pub fn id() -> SchemaNode {
    SchemaNode::integer()
        .minimum(1.0)
        .maximum(MAX_SAFE_INTEGER as f64)
        .title("ID")
        .description("Unique, read-only positive integer identifier")
        .message("ID must be a positive integer no greater than 9007199254740991")
        .example(1)
        .define("Id")
}

pub fn name() -> SchemaNode {
    SchemaNode::string()
        .min_length(1)
        .max_length(MAX_NAME_LENGTH)
        .pattern(NAME_PATTERN)
        .title("Name")
        .description("Lowercase identifier: letters, digits and underscores, starting with a letter")
        .message(
            "Name must start with a lowercase letter and contain only lowercase letters, \
             digits and underscores (max 63 characters)",
        )
        .example("user_email")
        .define("Name")
}

pub fn app_name() -> SchemaNode {
    SchemaNode::string()
        .min_length(1)
        .max_length(MAX_APP_NAME_LENGTH)
        .pattern(APP_NAME_PATTERN)
        .title("Application Name")
        .description("The name of the application, following npm package naming rules")
        .message(
            "App name must be a valid npm package name: lowercase letters, digits, \
             '-', '.', '_' and '~', optionally scoped as '@scope/name'",
        )
        .example("todo-app")
        .example("@acme/crm")
        .define("AppName")
}

pub fn version() -> SchemaNode {
    SchemaNode::string()
        .min_length(1)
        .pattern(VERSION_PATTERN)
        .title("Version")
        .description("Semantic version of the application")
        .message("Version must follow semantic versioning, for example '1.0.0' or '2.1.0-beta.1'")
        .example("1.0.0")
        .define("Version")
}

pub fn description() -> SchemaNode {
    SchemaNode::string()
        .title("Description")
        .description("Free-form description, may span multiple lines")
        .define("Description")
}

pub fn block_name() -> SchemaNode {
    SchemaNode::string()
        .min_length(1)
        .max_length(MAX_NAME_LENGTH)
        .pattern(BLOCK_NAME_PATTERN)
        .title("Block Name")
        .description("Kebab-case block identifier")
        .message(
            "Block name must start with a lowercase letter and contain only lowercase \
             letters, digits and hyphens",
        )
        .example("hero-section")
        .define("BlockName")
}

pub fn page_path() -> SchemaNode {
    SchemaNode::string()
        .min_length(1)
        .pattern(PAGE_PATH_PATTERN)
        .title("Page Path")
        .description("URL path the page is served at")
        .message("Path must start with '/' and contain lowercase slash-separated segments")
        .example("/")
        .example("/about")
        .define("PagePath")
}

pub fn email() -> SchemaNode {
    SchemaNode::string()
        .pattern(EMAIL_PATTERN)
        .message("Must be a valid email address")
        .define("Email")
}

pub fn url() -> SchemaNode {
    SchemaNode::string()
        .pattern(URL_PATTERN)
        .message("Must be an http or https URL")
        .define("Url")
}

/// Next identifier after the largest of `existing`, starting at 1.
pub fn next_id<I>(existing: I) -> Result<u64, ConfigError>
where
    I: IntoIterator<Item = u64>,
{
    let next = existing.into_iter().max().map_or(Some(1), |max| max.checked_add(1));
    match next {
        Some(id) if id <= MAX_SAFE_INTEGER => Ok(id),
        _ => Err(ConfigError::IdExhausted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_bounds() {
        let id = id();
        assert!(id.is_valid(&json!(1)));
        assert!(id.is_valid(&json!(MAX_SAFE_INTEGER)));
        assert!(!id.is_valid(&json!(0)));
        assert!(!id.is_valid(&json!(1.5)));
        assert!(!id.is_valid(&json!(MAX_SAFE_INTEGER + 1)));
    }

    #[test]
    fn test_name_rules() {
        let name = name();
        assert!(name.is_valid(&json!("user_email")));
        assert!(!name.is_valid(&json!("UserEmail")));
        assert!(!name.is_valid(&json!("1st")));
        assert!(!name.is_valid(&json!("a".repeat(64))));

        let err = name.validate(&json!("Bad")).unwrap_err();
        assert!(err.first().to_string().contains("lowercase letter"));
    }

    #[test]
    fn test_app_name_and_version() {
        assert!(app_name().is_valid(&json!("todo-app")));
        assert!(app_name().is_valid(&json!("@acme/crm")));
        assert!(!app_name().is_valid(&json!("Invalid App Name")));

        assert!(version().is_valid(&json!("1.0.0")));
        assert!(version().is_valid(&json!("2.1.0-beta.1+build.5")));
        assert!(!version().is_valid(&json!("1.0")));
        assert!(!version().is_valid(&json!("01.0.0")));
    }

    #[test]
    fn test_page_path() {
        assert!(page_path().is_valid(&json!("/")));
        assert!(page_path().is_valid(&json!("/blog/post-1")));
        assert!(!page_path().is_valid(&json!("about")));
        assert!(!page_path().is_valid(&json!("/About")));
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(std::iter::empty()).unwrap(), 1);
        assert_eq!(next_id([3, 1, 2]).unwrap(), 4);
        assert!(matches!(
            next_id([MAX_SAFE_INTEGER]),
            Err(ConfigError::IdExhausted)
        ));
    }
}
