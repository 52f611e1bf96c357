//! Laws every schema node must satisfy.

use omnera_schema::{SchemaNode, ValidationError, Value, from_json_schema, to_json_schema};
use proptest::prelude::*;
use serde_json::{Map, json};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-6i64..12).prop_map(Value::from),
        (-12i32..24).prop_map(|n| Value::from(f64::from(n) / 2.0)),
        "[a-c]{0,4}".prop_map(Value::from),
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn arb_schema() -> impl Strategy<Value = SchemaNode> {
    let leaf = prop_oneof![
        Just(SchemaNode::any()),
        Just(SchemaNode::boolean()),
        (0usize..3, 0usize..4)
            .prop_map(|(min, extra)| SchemaNode::string().min_length(min).max_length(min + extra)),
        Just(SchemaNode::string().pattern("^[a-b]+$")),
        (-5i64..5, 0i64..10, any::<bool>()).prop_map(|(min, span, integer)| {
            let node = if integer {
                SchemaNode::integer()
            } else {
                SchemaNode::number()
            };
            node.minimum(min as f64).maximum((min + span) as f64)
        }),
        prop::collection::vec(arb_scalar(), 1..4).prop_map(SchemaNode::literals),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (inner.clone(), 0usize..2, 0usize..3).prop_map(|(item, min, extra)| {
                SchemaNode::array(item).min_items(min).max_items(min + extra)
            }),
            inner.clone().prop_map(SchemaNode::record),
            prop::collection::vec(inner.clone(), 1..3).prop_map(SchemaNode::union),
            (
                prop::collection::btree_map("[a-c]", (inner, 0u8..3), 0..3),
                any::<bool>()
            )
                .prop_map(|(fields, open)| {
                    SchemaNode::structure(fields.into_iter().map(|(name, (node, mode))| {
                        let node = match mode {
                            0 => node,
                            1 => node.optional(),
                            _ => node.default_value(Value::Null),
                        };
                        (name, node)
                    }))
                    .additional_properties(open)
                }),
        ]
    })
}

proptest! {
    #[test]
    fn validation_is_deterministic(schema in arb_schema(), value in arb_json()) {
        prop_assert_eq!(schema.validate(&value), schema.validate(&value));
    }

    #[test]
    fn export_import_accepts_the_same_values(
        schema in arb_schema(),
        values in prop::collection::vec(arb_json(), 1..16),
    ) {
        let imported = from_json_schema(&to_json_schema(&schema)).unwrap();
        for value in &values {
            prop_assert_eq!(
                schema.is_valid(value),
                imported.is_valid(value),
                "value {} disagrees", value
            );
        }
    }

    #[test]
    fn arrays_keep_element_order(items in prop::collection::vec("[a-z]{1,6}", 2..10)) {
        let schema = SchemaNode::array(SchemaNode::string().min_length(1));
        let input = json!(items);
        prop_assert_eq!(schema.validate(&input).unwrap(), input);
    }

    #[test]
    fn removing_a_required_field_is_reported_at_its_path(
        name in "[a-z]{1,8}",
        count in 0i64..100,
        enabled in any::<bool>(),
        drop in 0usize..3,
    ) {
        let schema = SchemaNode::structure([
            ("name", SchemaNode::string()),
            ("count", SchemaNode::integer()),
            ("enabled", SchemaNode::boolean()),
            ("note", SchemaNode::string().optional()),
        ]);
        let mut value = json!({"name": name, "count": count, "enabled": enabled});
        prop_assert!(schema.is_valid(&value));

        let key = ["name", "count", "enabled"][drop];
        value.as_object_mut().unwrap().remove(key);
        let err = schema.validate(&value).unwrap_err();
        let reported = err
            .iter()
            .any(|e| matches!(e, ValidationError::Missing { path } if path == key));
        prop_assert!(reported, "no missing-field error at {}", key);
    }
}

#[test]
fn round_trip_keeps_custom_messages_and_uniqueness() {
    let schema = SchemaNode::array(SchemaNode::structure([(
        "name",
        SchemaNode::string()
            .pattern("^idx_[a-z][a-z0-9_]*$")
            .message("Name of the index. Use descriptive names like 'idx_tablename_fieldname'"),
    )]))
    .unique_by("name");

    let imported = from_json_schema(&to_json_schema(&schema)).unwrap();

    let err = imported.validate(&json!([{"name": "bad"}])).unwrap_err();
    assert!(err.first().to_string().contains("idx_tablename_fieldname"));

    let err = imported
        .validate(&json!([{"name": "idx_a"}, {"name": "idx_a"}]))
        .unwrap_err();
    assert_eq!(err.first().path().to_string(), "[1].name");
}
