//! Property-based tests for the prop normalizer.
//!
//! - Totality: any JSON value normalizes without panicking
//! - Idempotence: normalizing the persisted form of a normalized map is a no-op
//! - Projection: component code never sees styling keys

use pagecraft_engine::props::{is_styling_key, normalize, props_to_json, render_props, PropKind};
use proptest::prelude::*;
use serde_json::{Map, Value};

// =============================================================================
// STRATEGIES
// =============================================================================

fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-z][a-zA-Z0-9]{0,8}").unwrap(),
        Just("text".to_string()),
        Just("href".to_string()),
        Just("kind".to_string()),
        Just("value".to_string()),
        Just("tailwindClasses".to_string()),
        Just("customCssOverrides".to_string()),
    ]
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_000i64..1_000_000).prop_map(Value::from),
        prop::string::string_regex("[a-zA-Z0-9 #/.:-]{0,20}")
            .unwrap()
            .prop_map(Value::String),
        prop_oneof![Just("text"), Just("object"), Just("array")].prop_map(Value::from),
    ]
}

/// Arbitrary JSON, biased towards the shapes stored props actually take.
fn json_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn props_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), json_strategy(), 0..6)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn normalize_is_total(raw in json_strategy()) {
        let props = normalize(&raw);
        for prop in props.values() {
            match prop.kind {
                PropKind::Text => prop_assert!(prop.value.is_string()),
                PropKind::Object => prop_assert!(prop.value.is_object()),
                PropKind::Array => prop_assert!(prop.value.is_array()),
            }
        }
    }

    #[test]
    fn normalize_is_idempotent(raw in props_strategy()) {
        let once = normalize(&raw);
        let twice = normalize(&props_to_json(&once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn array_elements_are_records(raw in props_strategy()) {
        for prop in normalize(&raw).values() {
            for element in prop.elements() {
                prop_assert!(element.is_object());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rendered_props_carry_no_styling_at_the_top(raw in props_strategy()) {
        let rendered = render_props(&normalize(&raw));
        let object = rendered.as_object().unwrap();
        for (key, value) in object {
            if let Value::Object(record) = value {
                prop_assert!(!record.keys().any(|k| is_styling_key(k)), "{key}: {value}");
            }
            if let Value::Array(items) = value {
                for item in items {
                    if let Value::Object(record) = item {
                        prop_assert!(!record.keys().any(|k| is_styling_key(k)), "{key}: {item}");
                    }
                }
            }
        }
    }
}
