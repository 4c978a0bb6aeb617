//! Canonical prop shape shared by the compiler, the inspector and every editor.
//!
//! Stored props arrive in several historical shapes (flat strings, nested
//! content objects, bare arrays). [`normalize`] is the only place those are
//! accepted; everything downstream works on [`PropValue`].

mod normalize;
mod path;

pub use normalize::{normalize, normalize_value, wrap_element};
pub use path::{PathSegment, PropPath, ResolvedProp};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key carrying utility classes on a prop, array element, or content object.
pub const TAILWIND_KEY: &str = "tailwindClasses";
/// Key carrying custom CSS property overrides.
pub const CUSTOM_CSS_KEY: &str = "customCssOverrides";
/// Key a scalar array element is wrapped under.
pub const WRAPPED_VALUE_KEY: &str = "value";

/// Props of one component, keyed by prop name.
pub type PropMap = BTreeMap<String, PropValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    Text,
    Object,
    Array,
}

impl PropKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(PropKind::Text),
            "object" => Some(PropKind::Object),
            "array" => Some(PropKind::Array),
            _ => None,
        }
    }

    /// Kind a raw JSON payload would be edited as.
    pub fn of_json(value: &Value) -> Self {
        match value {
            Value::Array(_) => PropKind::Array,
            Value::Object(_) => PropKind::Object,
            _ => PropKind::Text,
        }
    }
}

/// The canonical tagged prop value.
///
/// * `Text` carries a JSON string
/// * `Object` carries a JSON object with styling keys lifted out
/// * `Array` carries a JSON array of records, each with its own styling keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropValue {
    #[serde(alias = "type")]
    pub kind: PropKind,
    pub value: Value,
    #[serde(default)]
    pub tailwind_classes: String,
    #[serde(default)]
    pub custom_css_overrides: BTreeMap<String, String>,
}

impl PropValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: PropKind::Text,
            value: Value::String(value.into()),
            tailwind_classes: String::new(),
            custom_css_overrides: BTreeMap::new(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match (&self.kind, &self.value) {
            (PropKind::Text, Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn elements(&self) -> &[Value] {
        match (&self.kind, &self.value) {
            (PropKind::Array, Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Plain value handed to component code: styling keys are stripped and
    /// wrapped scalar elements are unwrapped back to the scalar.
    pub fn render_value(&self) -> Value {
        match self.kind {
            PropKind::Text => self.value.clone(),
            PropKind::Object => strip_styling(&self.value),
            PropKind::Array => Value::Array(self.elements().iter().map(unwrap_element).collect()),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Projects a normalized prop map into the plain object component code sees.
pub fn render_props(props: &PropMap) -> Value {
    let map: Map<String, Value> = props
        .iter()
        .map(|(k, v)| (k.clone(), v.render_value()))
        .collect();
    Value::Object(map)
}

/// Serializes a prop map back to JSON (the persisted form).
pub fn props_to_json(props: &PropMap) -> Value {
    Value::Object(props.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

/// Styling fields attached to a record (array element or content object).
pub fn record_styling(record: &Value) -> (String, BTreeMap<String, String>) {
    let classes = record
        .get(TAILWIND_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let css = record
        .get(CUSTOM_CSS_KEY)
        .map(css_map_from_json)
        .unwrap_or_default();
    (classes, css)
}

pub fn is_styling_key(key: &str) -> bool {
    key == TAILWIND_KEY || key == CUSTOM_CSS_KEY
}

pub(crate) fn css_map_from_json(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k.clone(), s.clone())),
                Value::Number(n) => Some((k.clone(), n.to_string())),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn strip_styling(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !is_styling_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn unwrap_element(element: &Value) -> Value {
    if let Value::Object(map) = element {
        let only_wrapper_keys = map.contains_key(WRAPPED_VALUE_KEY)
            && map
                .keys()
                .all(|k| k == WRAPPED_VALUE_KEY || is_styling_key(k));
        if only_wrapper_keys {
            return map.get(WRAPPED_VALUE_KEY).map(strip_styling).unwrap_or(Value::Null);
        }
    }
    strip_styling(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_value_unwraps_scalar_elements() {
        let prop = normalize_value(&json!(["/a", "/b"]));
        assert_eq!(prop.render_value(), json!(["/a", "/b"]));
    }

    #[test]
    fn render_value_strips_styling_from_records() {
        let prop = normalize_value(&json!([{ "title": "One", "tailwindClasses": "p-2" }]));
        assert_eq!(prop.render_value(), json!([{ "title": "One" }]));
    }

    #[test]
    fn deserializes_legacy_type_alias() {
        let prop: PropValue =
            serde_json::from_value(json!({ "type": "text", "value": "Hi" })).unwrap();
        assert_eq!(prop.kind, PropKind::Text);
        assert_eq!(prop.as_text(), Some("Hi"));
    }
}
