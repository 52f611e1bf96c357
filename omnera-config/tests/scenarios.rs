use omnera_config::{
    AppConfig, BlockDefinition, SchemaRegistry, VarValue, Vars,
    blocks::{substitute, template::placeholders},
    pages::ResolvedSection,
    resolve_block,
    tables::TableField,
};
use omnera_schema::{Constraint, ErrorCategory, ValidationError, from_json_schema};
use proptest::prelude::*;
use serde_json::json;

fn registry() -> SchemaRegistry {
    let _ = env_logger::builder().is_test(true).try_init();
    SchemaRegistry::standard().unwrap()
}

#[test]
fn minimal_app_keeps_absent_fields_absent() {
    let registry = registry();
    let input = json!({"name": "todo-app", "version": "1.0.0"});

    let tree = registry.validate("App", &input).unwrap();
    assert_eq!(tree, input);

    let app = registry.validate_app(&input).unwrap();
    assert_eq!(app.name, "todo-app");
    assert_eq!(app.version.as_deref(), Some("1.0.0"));
    assert_eq!(app.description, None);
}

#[test]
fn app_name_with_spaces_fails_at_name() {
    let err = registry()
        .validate_app(&json!({"name": "Invalid App Name"}))
        .unwrap_err();
    let errors = err.validation().unwrap();
    assert_eq!(errors.len(), 1);
    let first = errors.first();
    assert_eq!(first.path().to_string(), "name");
    assert_eq!(first.category(), ErrorCategory::Constraint);
    assert!(matches!(
        first,
        ValidationError::Constraint {
            constraint: Constraint::Pattern(_),
            ..
        }
    ));
}

#[test]
fn table_index_needs_at_least_one_field() {
    let registry = registry();
    let tree = registry
        .validate("TableIndex", &json!({"name": "idx_users_email", "fields": ["email"]}))
        .unwrap();
    assert_eq!(tree["unique"], json!(false));

    let err = registry
        .validate("TableIndex", &json!({"name": "idx_users_email", "fields": []}))
        .unwrap_err();
    let first = err.validation().unwrap().first();
    assert_eq!(first.path().to_string(), "fields");
    assert!(matches!(
        first,
        ValidationError::Constraint {
            constraint: Constraint::MinItems(1),
            ..
        }
    ));
}

#[test]
fn block_variables_are_substituted_into_props() {
    let blocks: Vec<BlockDefinition> = serde_json::from_value(json!([
        {"name": "card", "type": "div", "props": {"className": "card-$variant"}}
    ]))
    .unwrap();
    let vars: Vars = [("variant".to_string(), VarValue::from("primary"))].into();

    let component = resolve_block("card", Some(&blocks), Some(&vars)).unwrap();
    assert_eq!(component.kind, "div");
    assert_eq!(json!(component.props), json!({"className": "card-primary"}));
    assert_eq!(blocks[0].template.props["className"], "card-$variant");
}

#[test]
fn unknown_action_names_the_tag() {
    let err = registry()
        .validate(
            "AutomationAction",
            &json!({"action": "unknown-action", "name": "step", "params": {}}),
        )
        .unwrap_err();
    let first = err.validation().unwrap().first();
    assert_eq!(first.category(), ErrorCategory::Discriminator);
    assert_eq!(first.path().to_string(), "action");
    assert!(first.to_string().contains("unknown-action"));
}

fn full_app() -> serde_json::Value {
    json!({
        "name": "@acme/crm",
        "version": "2.1.0-beta.1",
        "description": "Customer tracking",
        "tables": [{
            "id": 1,
            "name": "customers",
            "fields": [
                {"id": 1, "name": "email", "type": "email", "required": true, "unique": true},
                {"id": 2, "name": "balance", "type": "decimal", "precision": 4},
                {"id": 3, "name": "tier", "type": "single-select", "options": ["gold", "silver"]}
            ],
            "indexes": [{"name": "idx_customers_email", "fields": ["email"], "unique": true}]
        }],
        "connections": [{
            "id": 1,
            "name": "gmail",
            "type": "google-gmail",
            "clientId": "id",
            "clientSecret": "secret"
        }],
        "automations": [{
            "name": "notify_signup",
            "trigger": {"event": "http.post", "path": "/signup"},
            "actions": [
                {
                    "action": "database.create-record",
                    "name": "store",
                    "params": {"table": "customers", "fields": {"email": "{{trigger.body.email}}"}}
                },
                {
                    "action": "google-gmail.send-email",
                    "name": "greet",
                    "params": {"connection": "gmail", "to": ["team@acme.io"], "subject": "New signup"}
                }
            ]
        }],
        "blocks": [{
            "name": "hero",
            "type": "section",
            "children": [{"type": "h1", "content": "$title"}]
        }],
        "pages": [{
            "name": "home",
            "path": "/",
            "meta": {"lang": "en", "title": "Home"},
            "sections": [
                {"$ref": "hero", "vars": {"title": "Welcome"}},
                {"$ref": "missing-block"},
                {"type": "form", "table": "customers", "inputs": [{"name": "email", "type": "email"}]}
            ]
        }]
    })
}

#[test]
fn full_app_validates_and_resolves() {
    let app: AppConfig = registry().validate_app(&full_app()).unwrap();
    assert_eq!(app.tables[0].fields.len(), 3);
    assert_eq!(app.table("customers").unwrap().indexes.len(), 1);

    let library = app.block_library();
    let sections = app.page("home").unwrap().resolve_sections(&library);
    assert_eq!(sections.len(), 3);
    let ResolvedSection::Component(hero) = &sections[0] else {
        panic!("expected the hero block");
    };
    assert_eq!(hero.children[0].content.as_deref(), Some("Welcome"));
    assert_eq!(
        sections[1],
        ResolvedSection::Missing {
            name: "missing-block".into()
        }
    );
    assert!(matches!(sections[2], ResolvedSection::Form(_)));
}

#[test]
fn integral_floats_decode_into_integer_fields() {
    let mut doc = full_app();
    doc["tables"][0]["id"] = json!(1.0);
    doc["tables"][0]["fields"][1]["precision"] = json!(4.0);
    doc["connections"][0]["id"] = json!(1.0);

    let app = registry().validate_app(&doc).unwrap();
    assert_eq!(app.tables[0].id, 1);
    let Some(TableField::Decimal(balance)) = app.tables[0].field("balance") else {
        panic!("expected the decimal field");
    };
    assert_eq!(balance.precision, 4);

    doc["tables"][0]["fields"][1]["id"] = json!(1.0);
    let err = registry().validate_app(&doc).unwrap_err();
    let first = err.validation().unwrap().first();
    assert_eq!(first.path().to_string(), "tables[0].fields[1].id");
    assert!(matches!(
        first,
        ValidationError::Constraint {
            constraint: Constraint::UniqueBy(_),
            ..
        }
    ));
}

#[test]
fn errors_follow_schema_field_order() {
    let mut doc = full_app();
    doc["tables"][0]["fields"][1]["precision"] = json!(12);
    doc["automations"][0]["actions"][1]["params"]["to"] = json!(["not-an-email"]);
    doc["pages"][0]["path"] = json!("home");

    let err = registry().validate_app(&doc).unwrap_err();
    let paths: Vec<String> = err
        .validation()
        .unwrap()
        .iter()
        .map(|e| e.path().to_string())
        .collect();
    assert_eq!(
        paths,
        [
            "tables[0].fields[1].precision",
            "pages[0].path",
            "automations[0].actions[1].params.to[0]",
        ]
    );
}

#[test]
fn exported_app_schema_imports_with_the_same_verdicts() {
    let registry = registry();
    let document = registry.json_schema("App").unwrap();
    assert!(document["$defs"]["TableField"]["oneOf"].is_array());

    let imported = from_json_schema(&document).unwrap();
    assert!(imported.is_valid(&full_app()));
    assert!(!imported.is_valid(&json!({"name": "Invalid App Name"})));

    let mut doc = full_app();
    doc["automations"][0]["actions"][0]["action"] = json!("unknown-action");
    assert!(!imported.is_valid(&doc));
}

#[test]
fn typescript_declares_every_feature() {
    let ts = registry().typescript("App").unwrap();
    assert!(ts.contains("export type App = {"));
    assert!(ts.contains("export type TableField = "));
    assert!(ts.contains("export type AutomationAction = "));
    assert!(ts.contains("  $ref: BlockName;\n"));
}

#[test]
fn typescript_declares_recursive_component_once() {
    let ts = registry().typescript("Component").unwrap();
    assert_eq!(ts.matches("export type Component =").count(), 1);
    assert!(ts.contains("  children?: Component[];\n"));
}

proptest! {
    #[test]
    fn unplaceholdered_text_is_unchanged(text in "[^$]{0,40}") {
        let vars: Vars = [("x".to_string(), VarValue::from("y"))].into();
        prop_assert_eq!(substitute(&text, &vars), text);
    }

    #[test]
    fn bound_placeholders_disappear(
        names in prop::collection::btree_set("[a-z][a-z0-9_]{0,6}", 1..4),
        glue in "[ ,.:!-]{1,3}",
    ) {
        let template: String = names
            .iter()
            .map(|n| format!("${n}"))
            .collect::<Vec<_>>()
            .join(&glue);
        let vars: Vars = names
            .iter()
            .map(|n| (n.clone(), VarValue::from(n.to_uppercase())))
            .collect();
        let out = substitute(&template, &vars);
        prop_assert_eq!(placeholders(&out).count(), 0);
        prop_assert!(!out.contains('$'));
    }

    #[test]
    fn absent_block_lists_resolve_to_nothing(
        name in "[a-z][a-z0-9-]{0,10}",
        value in "[a-z]{0,6}",
    ) {
        let vars: Vars = [("x".to_string(), VarValue::from(value))].into();
        prop_assert_eq!(resolve_block(&name, Some(&[]), Some(&vars)), None);
        prop_assert_eq!(resolve_block(&name, None, Some(&vars)), None);
        prop_assert_eq!(resolve_block(&name, None, None), None);
    }

    #[test]
    fn resolving_never_changes_the_definition(value in "[a-z ]{0,12}") {
        let blocks: Vec<BlockDefinition> = serde_json::from_value(json!([
            {"name": "card", "type": "div", "content": "$value", "props": {"title": "$value"}}
        ]))
        .unwrap();
        let before = blocks.clone();
        let vars: Vars = [("value".to_string(), VarValue::from(value.as_str()))].into();
        let component = resolve_block("card", Some(&blocks), Some(&vars)).unwrap();
        prop_assert_eq!(component.content.as_deref(), Some(value.as_str()));
        prop_assert_eq!(blocks, before);
    }
}

#[test]
fn lone_placeholder_content_is_replaced_or_kept() {
    let blocks: Vec<BlockDefinition> =
        serde_json::from_value(json!([{"name": "greeting", "type": "p", "content": "$x"}])).unwrap();

    let vars: Vars = [("x".to_string(), VarValue::from("Hello"))].into();
    let hello = resolve_block("greeting", Some(&blocks), Some(&vars)).unwrap();
    assert_eq!(hello.content.as_deref(), Some("Hello"));

    let untouched = resolve_block("greeting", Some(&blocks), Some(&Vars::new())).unwrap();
    assert_eq!(untouched.content.as_deref(), Some("$x"));
}
