//! CRUD over the records of an `array` prop.
//!
//! Records are the wrapped elements the normalizer produces, so scalar
//! lists and record lists are edited the same way. Nothing is written back
//! until [`ArrayEditor::save`] hands the whole list over in one commit.

use pagecraft_engine::props::{is_styling_key, wrap_element, CUSTOM_CSS_KEY, TAILWIND_KEY};
use serde_json::{Map, Value};
use tracing::debug;

use super::object::ObjectEditor;
use crate::error::{EditorError, EditorResult};

/// Fields tried, in order, for a collapsed record's label.
pub const PREVIEW_FIELDS: &[&str] = &["title", "name", "label", "text", "heading"];

pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayEditor {
    original: Vec<Value>,
    items: Vec<Value>,
    pending_delete: Option<usize>,
    session: Option<RecordSession>,
}

/// One record open for editing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSession {
    pub index: usize,
    pub editor: ObjectEditor,
}

impl ArrayEditor {
    pub fn new(items: Vec<Value>) -> Self {
        let items: Vec<Value> = items.iter().map(wrap_element).collect();
        Self {
            original: items.clone(),
            items,
            pending_delete: None,
            session: None,
        }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.items != self.original
    }

    pub fn session(&self) -> Option<&RecordSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut RecordSession> {
        self.session.as_mut()
    }

    pub fn pending_delete(&self) -> Option<usize> {
        self.pending_delete
    }

    /// Empty record shaped like the first one: same keys, scalars reset.
    pub fn template_record(&self) -> Value {
        match self.items.first() {
            Some(first) => wrap_element(&blank_like(first)),
            None => wrap_element(&Value::String(String::new())),
        }
    }

    /// Appends a templated record and opens it for editing.
    pub fn create(&mut self) -> usize {
        let record = self.template_record();
        self.items.push(record);
        let index = self.items.len() - 1;
        self.open_record(index);
        index
    }

    /// Inserts a copy right after `index`.
    pub fn duplicate(&mut self, index: usize) -> EditorResult<usize> {
        let copy = self.get(index)?.clone();
        self.items.insert(index + 1, copy);
        self.remap_indices(|i| if i > index { i + 1 } else { i });
        Ok(index + 1)
    }

    /// First half of a delete; nothing is removed until confirmed.
    pub fn request_delete(&mut self, index: usize) -> EditorResult<()> {
        self.get(index)?;
        self.pending_delete = Some(index);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Removes the record awaiting confirmation and returns it.
    pub fn confirm_delete(&mut self) -> EditorResult<Value> {
        let index = self.pending_delete.take().ok_or(EditorError::NoPendingDelete)?;
        self.get(index)?;
        let removed = self.items.remove(index);
        if self.session.as_ref().is_some_and(|s| s.index == index) {
            self.session = None;
        } else {
            self.remap_indices(|i| if i > index { i - 1 } else { i });
        }
        debug!(index, remaining = self.items.len(), "array record deleted");
        Ok(removed)
    }

    /// Request and confirm in one step.
    pub fn delete(&mut self, index: usize) -> EditorResult<Value> {
        self.request_delete(index)?;
        self.confirm_delete()
    }

    /// Swaps two records; swapping twice restores the order.
    pub fn swap(&mut self, a: usize, b: usize) -> EditorResult<()> {
        self.get(a)?;
        self.get(b)?;
        self.items.swap(a, b);
        self.remap_indices(|i| match i {
            i if i == a => b,
            i if i == b => a,
            i => i,
        });
        Ok(())
    }

    pub fn move_up(&mut self, index: usize) -> EditorResult<()> {
        match index.checked_sub(1) {
            Some(above) => self.swap(above, index),
            None => Err(EditorError::OutOfBounds {
                index,
                len: self.items.len(),
            }),
        }
    }

    pub fn move_down(&mut self, index: usize) -> EditorResult<()> {
        self.swap(index, index + 1)
    }

    /// Opens one record in an [`ObjectEditor`], replacing any open session.
    pub fn edit(&mut self, index: usize) -> EditorResult<&mut ObjectEditor> {
        self.get(index)?;
        self.open_record(index);
        self.session
            .as_mut()
            .map(|session| &mut session.editor)
            .ok_or(EditorError::NoOpenEditor)
    }

    /// Writes the open record back into the list and closes it.
    pub fn save_record(&mut self) -> EditorResult<()> {
        let session = self.session.take().ok_or(EditorError::NoOpenEditor)?;
        let len = self.items.len();
        let slot = self.items.get_mut(session.index).ok_or(EditorError::OutOfBounds {
            index: session.index,
            len,
        })?;
        *slot = wrap_element(&session.editor.value());
        Ok(())
    }

    pub fn close_record(&mut self) {
        self.session = None;
    }

    /// The whole list, ready to be written back in a single commit. An open
    /// record session is saved first.
    pub fn save(&mut self) -> EditorResult<Value> {
        if self.session.is_some() {
            self.save_record()?;
        }
        Ok(Value::Array(self.items.clone()))
    }

    fn get(&self, index: usize) -> EditorResult<&Value> {
        self.items.get(index).ok_or(EditorError::OutOfBounds {
            index,
            len: self.items.len(),
        })
    }

    fn open_record(&mut self, index: usize) {
        if let Some(record) = self.items.get(index) {
            self.session = Some(RecordSession {
                index,
                editor: ObjectEditor::new(record),
            });
        }
    }

    /// Keeps the open session and a pending delete on the same records
    /// after a structural change.
    fn remap_indices(&mut self, remap: impl Fn(usize) -> usize) {
        if let Some(session) = self.session.as_mut() {
            session.index = remap(session.index);
        }
        self.pending_delete = self.pending_delete.map(&remap);
    }
}

/// Label for a collapsed record.
pub fn preview_text(record: &Value) -> String {
    let Value::Object(map) = record else {
        return scalar_label(record).unwrap_or_else(|| UNTITLED.to_string());
    };
    PREVIEW_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .find_map(scalar_label)
        .or_else(|| {
            map.iter()
                .filter(|(k, _)| !is_styling_key(k))
                .find_map(|(_, v)| v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn scalar_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Same shape, every scalar reset to its type's empty value.
fn blank_like(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let blank: Map<String, Value> = map
                .iter()
                .map(|(k, v)| {
                    let v = match k.as_str() {
                        TAILWIND_KEY => Value::String(String::new()),
                        CUSTOM_CSS_KEY => Value::Object(Map::new()),
                        _ => blank_like(v),
                    };
                    (k.clone(), v)
                })
                .collect();
            Value::Object(blank)
        }
        Value::Array(_) => Value::Array(Vec::new()),
        Value::String(_) => Value::String(String::new()),
        Value::Number(_) => Value::from(0),
        Value::Bool(_) => Value::Bool(false),
        Value::Null => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn features() -> ArrayEditor {
        ArrayEditor::new(vec![
            json!({ "title": "Fast", "rank": 1, "tags": ["a"], "tailwindClasses": "shadow", "customCssOverrides": { "color": "red" } }),
            json!({ "title": "Safe", "rank": 2, "tags": [], "tailwindClasses": "", "customCssOverrides": {} }),
        ])
    }

    fn titles(editor: &ArrayEditor) -> Vec<String> {
        editor.items().iter().map(preview_text).collect()
    }

    #[test]
    fn pending_delete_follows_its_record() {
        let mut editor = ArrayEditor::new(vec![json!("A"), json!("B")]);
        editor.request_delete(0).unwrap();
        editor.move_down(0).unwrap();
        assert_eq!(editor.pending_delete(), Some(1));
        assert_eq!(editor.confirm_delete().unwrap()["value"], json!("A"));
        assert_eq!(editor.items()[0]["value"], json!("B"));

        let mut editor = ArrayEditor::new(vec![json!("A"), json!("B"), json!("C")]);
        editor.request_delete(1).unwrap();
        editor.duplicate(0).unwrap();
        editor.swap(0, 3).unwrap();
        assert_eq!(editor.confirm_delete().unwrap()["value"], json!("B"));
        let left: Vec<&Value> = editor.items().iter().map(|r| &r["value"]).collect();
        assert_eq!(left, vec![&json!("C"), &json!("A"), &json!("A")]);
    }

    #[test]
    fn create_templates_from_the_first_record() {
        let mut editor = features();
        let index = editor.create();
        assert_eq!(index, 2);
        assert_eq!(editor.len(), 3);
        assert_eq!(
            editor.items()[2],
            json!({ "title": "", "rank": 0, "tags": [], "tailwindClasses": "", "customCssOverrides": {} })
        );
        let first_keys: Vec<&String> = editor.items()[0].as_object().unwrap().keys().collect();
        let new_keys: Vec<&String> = editor.items()[2].as_object().unwrap().keys().collect();
        assert_eq!(first_keys, new_keys);
        assert_eq!(editor.session().map(|s| s.index), Some(2));
    }

    #[test]
    fn create_on_empty_list_gives_a_wrapped_value() {
        let mut editor = ArrayEditor::new(Vec::new());
        editor.create();
        assert_eq!(
            editor.items(),
            &[json!({ "value": "", "tailwindClasses": "", "customCssOverrides": {} })]
        );
    }

    #[test]
    fn delete_needs_confirmation_and_keeps_order() {
        let mut editor = features();
        editor.duplicate(1).unwrap();
        editor.request_delete(0).unwrap();
        assert_eq!(editor.len(), 3);
        editor.cancel_delete();
        assert!(matches!(editor.confirm_delete(), Err(EditorError::NoPendingDelete)));

        editor.request_delete(0).unwrap();
        let removed = editor.confirm_delete().unwrap();
        assert_eq!(preview_text(&removed), "Fast");
        assert_eq!(titles(&editor), vec!["Safe", "Safe"]);
    }

    #[test]
    fn swap_is_its_own_inverse() {
        let mut editor = features();
        let before = editor.items().to_vec();
        editor.move_down(0).unwrap();
        assert_eq!(titles(&editor), vec!["Safe", "Fast"]);
        editor.move_up(1).unwrap();
        assert_eq!(editor.items(), before.as_slice());
        assert!(editor.move_up(0).is_err());
        assert!(editor.move_down(1).is_err());
    }

    #[test]
    fn record_sessions_follow_their_record() {
        let mut editor = features();
        editor.edit(1).unwrap().set_text("title", "Secure").unwrap();
        editor.swap(0, 1).unwrap();
        assert_eq!(editor.session().map(|s| s.index), Some(0));
        editor.save_record().unwrap();
        assert_eq!(titles(&editor), vec!["Secure", "Fast"]);
        assert!(editor.is_dirty());
    }

    #[test]
    fn bulk_save_returns_the_whole_list() {
        let mut editor = features();
        editor.create();
        editor
            .session_mut()
            .unwrap()
            .editor
            .set_text("title", "Simple")
            .unwrap();
        let saved = editor.save().unwrap();
        assert_eq!(saved.as_array().map(Vec::len), Some(3));
        assert_eq!(saved[2]["title"], json!("Simple"));
        assert!(editor.session().is_none());
    }

    #[test]
    fn preview_text_priority() {
        assert_eq!(preview_text(&json!({ "label": "L", "name": "N" })), "N");
        assert_eq!(preview_text(&json!({ "title": "", "quote": "Great" })), "Great");
        assert_eq!(preview_text(&json!({ "tailwindClasses": "px-4", "count": 3 })), UNTITLED);
        assert_eq!(preview_text(&json!({ "value": "/a" })), "/a");
    }
}
