use pagecraft_engine::props::is_styling_key;
use pagecraft_engine::PropKind;
use serde_json::{Map, Value};

use crate::error::{EditorError, EditorResult};

/// Generic field editor for `object` props and array records.
///
/// Styling fields ride along untouched; they belong to the style editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEditor {
    original: Map<String, Value>,
    fields: Map<String, Value>,
}

impl ObjectEditor {
    /// Non-object values are edited as a record with a single `value` field.
    pub fn new(value: &Value) -> Self {
        let fields = match value {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
        };
        Self {
            original: fields.clone(),
            fields,
        }
    }

    /// Editable fields, styling excluded, in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter(|(k, _)| !is_styling_key(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn field_kind(&self, key: &str) -> Option<PropKind> {
        self.fields.get(key).map(PropKind::of_json)
    }

    pub fn set_field(&mut self, key: &str, value: Value) -> EditorResult<()> {
        if is_styling_key(key) {
            return Err(EditorError::ReservedField {
                field: key.to_string(),
            });
        }
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    /// Sets a field from form text, keeping the field's current JSON type
    /// when the text parses as that type.
    pub fn set_text(&mut self, key: &str, text: &str) -> EditorResult<()> {
        let value = match self.fields.get(key) {
            Some(Value::Number(_)) => text
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| text.trim().parse::<f64>().map(Value::from))
                .unwrap_or_else(|_| Value::String(text.to_string())),
            Some(Value::Bool(_)) => match text.trim() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(text.to_string()),
            },
            _ => Value::String(text.to_string()),
        };
        self.set_field(key, value)
    }

    pub fn remove_field(&mut self, key: &str) -> EditorResult<Option<Value>> {
        if is_styling_key(key) {
            return Err(EditorError::ReservedField {
                field: key.to_string(),
            });
        }
        Ok(self.fields.remove(key))
    }

    pub fn is_dirty(&self) -> bool {
        self.fields != self.original
    }

    pub fn value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn styling_fields_are_hidden_and_protected() {
        let mut editor = ObjectEditor::new(&json!({
            "text": "Buy", "href": "/buy", "tailwindClasses": "px-4", "customCssOverrides": {}
        }));
        let keys: Vec<&str> = editor.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["href", "text"]);
        assert!(matches!(
            editor.set_field("tailwindClasses", json!("x")),
            Err(EditorError::ReservedField { .. })
        ));
        assert_eq!(editor.value()["tailwindClasses"], json!("px-4"));
    }

    #[test]
    fn text_input_keeps_field_types() {
        let mut editor = ObjectEditor::new(&json!({ "count": 3, "featured": false, "name": "Pro" }));
        editor.set_text("count", "12").unwrap();
        editor.set_text("featured", "true").unwrap();
        editor.set_text("name", "Team").unwrap();
        assert_eq!(editor.value(), json!({ "count": 12, "featured": true, "name": "Team" }));
        assert!(editor.is_dirty());
    }

    #[test]
    fn scalars_are_edited_as_value_records() {
        let editor = ObjectEditor::new(&json!("/a"));
        assert_eq!(editor.get("value"), Some(&json!("/a")));
        assert_eq!(editor.field_kind("value"), Some(PropKind::Text));
    }
}
