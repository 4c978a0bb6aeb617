use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::{
    is_styling_key, normalize_value, record_styling, wrap_element, PropKind, PropMap, PropValue,
    CUSTOM_CSS_KEY, TAILWIND_KEY, WRAPPED_VALUE_KEY,
};
use crate::error::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Dot-path into a component's prop tree, e.g. `features.2.title`.
///
/// The first segment always names a top-level prop; numeric segments index
/// arrays. `features[2].title` is accepted as an alternate spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropPath {
    segments: Vec<PathSegment>,
}

/// What a [`PropPath`] points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedProp<'a> {
    /// A whole top-level prop
    Prop { name: &'a str, prop: &'a PropValue },
    /// One record of an array prop
    Element { name: &'a str, index: usize, record: &'a Value },
    /// A value nested inside an object prop or an array record
    Field { value: &'a Value },
}

impl<'a> ResolvedProp<'a> {
    /// Editable kind used to pick the editor.
    pub fn kind(&self) -> PropKind {
        match self {
            ResolvedProp::Prop { prop, .. } => prop.kind,
            ResolvedProp::Element { record, .. } => {
                if is_wrapped_scalar(record) {
                    PropKind::Text
                } else {
                    PropKind::Object
                }
            }
            ResolvedProp::Field { value } => PropKind::of_json(value),
        }
    }

    /// Plain JSON an editor is seeded with.
    pub fn editor_value(&self) -> Value {
        match self {
            ResolvedProp::Prop { prop, .. } => match prop.kind {
                // array editors work on the wrapped records, not the projection
                PropKind::Array => prop.value.clone(),
                _ => prop.render_value(),
            },
            ResolvedProp::Element { record, .. } => {
                if is_wrapped_scalar(record) {
                    record.get(WRAPPED_VALUE_KEY).cloned().unwrap_or(Value::Null)
                } else {
                    (*record).clone()
                }
            }
            ResolvedProp::Field { value } => (*value).clone(),
        }
    }

    /// Current value as display text, for scalar targets.
    pub fn current_text(&self) -> Option<String> {
        match self.editor_value() {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some(String::new()),
            _ => None,
        }
    }

    /// Styling attached to the target, if the target can carry styling.
    pub fn styling(&self) -> Option<(String, BTreeMap<String, String>)> {
        match self {
            ResolvedProp::Prop { prop, .. } => {
                Some((prop.tailwind_classes.clone(), prop.custom_css_overrides.clone()))
            }
            ResolvedProp::Element { record, .. } => Some(record_styling(record)),
            ResolvedProp::Field { .. } => None,
        }
    }
}

impl PropPath {
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let normalized = input.trim().replace('[', ".").replace(']', "");
        let mut segments = Vec::new();
        for raw in normalized.split('.') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let segment = match raw.parse::<usize>() {
                Ok(index) if !segments.is_empty() => PathSegment::Index(index),
                _ => PathSegment::Key(raw.to_string()),
            };
            segments.push(segment);
        }
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Name of the top-level prop this path starts at.
    pub fn root_key(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Key(k)) => k,
            Some(PathSegment::Index(_)) | None => "",
        }
    }

    pub fn resolve<'a>(&self, props: &'a PropMap) -> Result<ResolvedProp<'a>, PathError> {
        let (name, prop) = props
            .get_key_value(self.root_key())
            .ok_or_else(|| PathError::UnknownProp {
                name: self.root_key().to_string(),
            })?;
        let rest = &self.segments[1..];
        if rest.is_empty() {
            return Ok(ResolvedProp::Prop { name, prop });
        }

        match (prop.kind, &rest[0]) {
            (PropKind::Array, PathSegment::Index(index)) => {
                let items = prop.elements();
                let record = items.get(*index).ok_or_else(|| PathError::OutOfBounds {
                    path: self.to_string(),
                    index: *index,
                    len: items.len(),
                })?;
                if rest.len() == 1 {
                    return Ok(ResolvedProp::Element {
                        name,
                        index: *index,
                        record,
                    });
                }
                let value = descend(record, &rest[1..], self)?;
                Ok(ResolvedProp::Field { value })
            }
            (PropKind::Object, PathSegment::Key(_)) => {
                let value = descend(&prop.value, rest, self)?;
                Ok(ResolvedProp::Field { value })
            }
            _ => Err(PathError::Unresolved {
                path: self.to_string(),
                reason: format!("cannot descend into a {:?} prop", prop.kind),
            }),
        }
    }

    /// Writes `value` at this path, keeping every prop in canonical shape.
    ///
    /// Existing styling on the target survives a content write.
    pub fn write(&self, props: &mut PropMap, value: Value) -> Result<(), PathError> {
        let root = self.root_key().to_string();
        let rest = &self.segments[1..];

        if rest.is_empty() {
            let mut next = normalize_value(&value);
            if let Some(existing) = props.get(&root) {
                if next.tailwind_classes.is_empty() {
                    next.tailwind_classes = existing.tailwind_classes.clone();
                }
                if next.custom_css_overrides.is_empty() {
                    next.custom_css_overrides = existing.custom_css_overrides.clone();
                }
            }
            props.insert(root, next);
            return Ok(());
        }

        let path_str = self.to_string();
        let prop = props
            .get_mut(&root)
            .ok_or_else(|| PathError::UnknownProp { name: root.clone() })?;

        match (prop.kind, &rest[0]) {
            (PropKind::Array, PathSegment::Index(index)) => {
                let items = prop.value.as_array_mut().ok_or_else(|| PathError::Unresolved {
                    path: path_str.clone(),
                    reason: "array prop without list payload".to_string(),
                })?;
                let len = items.len();
                let record = items.get_mut(*index).ok_or(PathError::OutOfBounds {
                    path: path_str.clone(),
                    index: *index,
                    len,
                })?;
                if rest.len() == 1 {
                    *record = replace_element(record, value);
                    Ok(())
                } else {
                    set_json_at(record, &rest[1..], value, &path_str)
                }
            }
            (PropKind::Object, PathSegment::Key(_)) => {
                set_json_at(&mut prop.value, rest, value, &path_str)
            }
            (kind, _) => Err(PathError::Unresolved {
                path: path_str,
                reason: format!("cannot descend into a {:?} prop", kind),
            }),
        }
    }

    /// Replaces the styling of the prop or array record this path points at.
    pub fn write_styling(
        &self,
        props: &mut PropMap,
        classes: &str,
        css: &BTreeMap<String, String>,
    ) -> Result<(), PathError> {
        let root = self.root_key().to_string();
        let path_str = self.to_string();
        let prop = props
            .get_mut(&root)
            .ok_or_else(|| PathError::UnknownProp { name: root.clone() })?;
        match &self.segments[1..] {
            [] => {
                prop.tailwind_classes = classes.to_string();
                prop.custom_css_overrides = css.clone();
                Ok(())
            }
            [PathSegment::Index(index)] if prop.kind == PropKind::Array => {
                let items = prop.value.as_array_mut().ok_or_else(|| PathError::Unresolved {
                    path: path_str.clone(),
                    reason: "array prop without list payload".to_string(),
                })?;
                let len = items.len();
                let record = items
                    .get_mut(*index)
                    .and_then(Value::as_object_mut)
                    .ok_or(PathError::OutOfBounds {
                        path: path_str.clone(),
                        index: *index,
                        len,
                    })?;
                record.insert(TAILWIND_KEY.to_string(), Value::String(classes.to_string()));
                record.insert(
                    CUSTOM_CSS_KEY.to_string(),
                    Value::Object(
                        css.iter()
                            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                            .collect(),
                    ),
                );
                Ok(())
            }
            _ => Err(PathError::Unresolved {
                path: path_str,
                reason: "styling can only be attached to a prop or an array record".to_string(),
            }),
        }
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for PropPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PropPath::parse(&value)
    }
}

impl From<PropPath> for String {
    fn from(path: PropPath) -> Self {
        path.to_string()
    }
}

pub(crate) fn is_wrapped_scalar(record: &Value) -> bool {
    match record {
        Value::Object(map) => {
            map.contains_key(WRAPPED_VALUE_KEY)
                && map.keys().all(|k| k == WRAPPED_VALUE_KEY || is_styling_key(k))
                && !matches!(map.get(WRAPPED_VALUE_KEY), Some(Value::Object(_)))
        }
        _ => false,
    }
}

fn descend<'a>(
    root: &'a Value,
    segments: &[PathSegment],
    path: &PropPath,
) -> Result<&'a Value, PathError> {
    let mut current = root;
    for segment in segments {
        current = match (segment, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k),
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        }
        .ok_or_else(|| PathError::Unresolved {
            path: path.to_string(),
            reason: format!("no value at segment '{}'", segment),
        })?;
    }
    Ok(current)
}

fn set_json_at(
    root: &mut Value,
    segments: &[PathSegment],
    value: Value,
    path: &str,
) -> Result<(), PathError> {
    let Some((first, rest)) = segments.split_first() else {
        *root = value;
        return Ok(());
    };
    match (first, root) {
        (PathSegment::Key(k), Value::Object(map)) => {
            if rest.is_empty() {
                map.insert(k.clone(), value);
                return Ok(());
            }
            let child = map.get_mut(k).ok_or_else(|| PathError::Unresolved {
                path: path.to_string(),
                reason: format!("no value at segment '{}'", k),
            })?;
            set_json_at(child, rest, value, path)
        }
        (PathSegment::Index(i), Value::Array(items)) => {
            let len = items.len();
            let child = items.get_mut(*i).ok_or(PathError::OutOfBounds {
                path: path.to_string(),
                index: *i,
                len,
            })?;
            set_json_at(child, rest, value, path)
        }
        (segment, _) => Err(PathError::Unresolved {
            path: path.to_string(),
            reason: format!("segment '{}' does not match the value shape", segment),
        }),
    }
}

fn replace_element(existing: &Value, value: Value) -> Value {
    if is_wrapped_scalar(existing) && !value.is_object() {
        let mut record = existing.clone();
        if let Value::Object(map) = &mut record {
            map.insert(WRAPPED_VALUE_KEY.to_string(), value);
        }
        return record;
    }

    let mut next = wrap_element(&value);
    let carries_classes = matches!(&value, Value::Object(m) if m.contains_key(TAILWIND_KEY));
    if !carries_classes {
        if let (Value::Object(old), Value::Object(new)) = (existing, &mut next) {
            for key in [TAILWIND_KEY, CUSTOM_CSS_KEY] {
                if let Some(v) = old.get(key) {
                    new.insert(key.to_string(), v.clone());
                }
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::normalize;
    use serde_json::json;

    fn sample() -> PropMap {
        normalize(&json!({
            "title": "Hello",
            "cta": { "text": "Go", "href": "#start" },
            "features": [{ "title": "Fast" }, { "title": "Safe" }],
            "links": ["/a", "/b"]
        }))
    }

    #[test]
    fn parses_dot_and_bracket_forms() {
        let a = PropPath::parse("features.1.title").unwrap();
        let b = PropPath::parse("features[1].title").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "features.1.title");
        assert_eq!(a.root_key(), "features");
        assert!(PropPath::parse("  ").is_err());
    }

    #[test]
    fn resolves_each_target_kind() {
        let props = sample();
        let title = PropPath::parse("title").unwrap();
        assert_eq!(title.resolve(&props).unwrap().kind(), PropKind::Text);

        let features = PropPath::parse("features").unwrap();
        assert_eq!(features.resolve(&props).unwrap().kind(), PropKind::Array);

        let record = PropPath::parse("features.0").unwrap();
        assert_eq!(record.resolve(&props).unwrap().kind(), PropKind::Object);

        let link = PropPath::parse("links.1").unwrap();
        let resolved = link.resolve(&props).unwrap();
        assert_eq!(resolved.kind(), PropKind::Text);
        assert_eq!(resolved.current_text().as_deref(), Some("/b"));

        let field = PropPath::parse("cta.href").unwrap();
        assert_eq!(field.resolve(&props).unwrap().current_text().as_deref(), Some("#start"));
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let props = sample();
        let err = PropPath::parse("features.9").unwrap().resolve(&props).unwrap_err();
        assert!(matches!(err, PathError::OutOfBounds { index: 9, len: 2, .. }));
    }

    #[test]
    fn write_keeps_styling_and_shape() {
        let mut props = sample();
        PropPath::parse("title")
            .unwrap()
            .write_styling(&mut props, "text-4xl", &BTreeMap::new())
            .unwrap();
        PropPath::parse("title").unwrap().write(&mut props, json!("Changed")).unwrap();
        let title = &props["title"];
        assert_eq!(title.as_text(), Some("Changed"));
        assert_eq!(title.tailwind_classes, "text-4xl");

        PropPath::parse("links.0").unwrap().write(&mut props, json!("/z")).unwrap();
        assert_eq!(props["links"].render_value(), json!(["/z", "/b"]));

        PropPath::parse("features.1.title").unwrap().write(&mut props, json!("Secure")).unwrap();
        assert_eq!(props["features"].elements()[1]["title"], json!("Secure"));
        assert_eq!(props["features"].elements()[1][TAILWIND_KEY], json!(""));
    }
}
