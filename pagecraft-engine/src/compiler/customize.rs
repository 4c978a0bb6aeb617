//! Substitutes legacy content overrides into component source.
//!
//! Two key conventions are understood:
//!
//! * `{tag}_content` replaces the literal text of the first `<tag>text</tag>`
//! * any other key replaces a `{key}` / `{props.key}` binding site with the
//!   value as a JS literal (strings quoted, records and lists as JSON)

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::props::normalize_value;

/// Legacy override key → stored value.
pub type Customizations = BTreeMap<String, Value>;

/// Suffix marking a tag-content override key.
pub const CONTENT_KEY_SUFFIX: &str = "_content";

pub fn apply_customizations(source: &str, customizations: &Customizations) -> String {
    let mut out = source.to_string();
    for (key, value) in customizations {
        let literal = js_literal(value);
        let replaced = match key.strip_suffix(CONTENT_KEY_SUFFIX) {
            Some(tag) if is_identifier(tag) => replace_tag_content(&out, tag, &literal),
            _ if is_identifier(key) => replace_bindings(&out, key, &literal),
            _ => None,
        };
        match replaced {
            Some(next) => out = next,
            None => debug!(key = %key, "customization has no binding site in source"),
        }
    }
    out
}

/// Value as a JS expression: scalars become quoted strings, records and
/// lists their plain JSON form.
fn js_literal(value: &Value) -> String {
    let plain = normalize_value(value).render_value();
    match plain {
        Value::String(_) | Value::Array(_) | Value::Object(_) => plain.to_string(),
        other => Value::String(other.to_string()).to_string(),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn replace_tag_content(source: &str, tag: &str, literal: &str) -> Option<String> {
    let tag = regex::escape(tag);
    let re = Regex::new(&format!(r"(<{tag}(?:\s[^<>]*)?>)([^<>{{}}]*\S[^<>{{}}]*)(</{tag}\s*>)")).ok()?;
    let caps = re.captures(source)?;
    let whole = caps.get(0)?;
    let mut out = String::with_capacity(source.len() + literal.len());
    out.push_str(&source[..whole.start()]);
    out.push_str(&caps[1]);
    out.push('{');
    out.push_str(literal);
    out.push('}');
    out.push_str(&caps[3]);
    out.push_str(&source[whole.end()..]);
    Some(out)
}

fn replace_bindings(source: &str, key: &str, literal: &str) -> Option<String> {
    let re = Regex::new(&format!(r"\{{\s*(?:props\.)?{}\s*\}}", regex::escape(key))).ok()?;
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    let mut replaced = false;
    for m in re.find_iter(source) {
        let preceding = source[..m.start()].trim_end().chars().last();
        if !matches!(preceding, Some('=' | '>' | '}')) {
            continue;
        }
        out.push_str(&source[last..m.start()]);
        out.push('{');
        out.push_str(literal);
        out.push('}');
        last = m.end();
        replaced = true;
    }
    if !replaced {
        return None;
    }
    out.push_str(&source[last..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn custom(entries: Vec<(&str, Value)>) -> Customizations {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn tag_content_replaces_first_literal_text() {
        let src = r#"<div><h1 className="x">Old title</h1><h1>Second</h1></div>"#;
        let out = apply_customizations(src, &custom(vec![("h1_content", json!("New \"title\""))]));
        assert_eq!(
            out,
            r#"<div><h1 className="x">{"New \"title\""}</h1><h1>Second</h1></div>"#
        );
    }

    #[test]
    fn bindings_after_equals_or_tag_close_are_replaced() {
        let src = "const t = {title}; return <h1 title={props.title}>{ title }</h1>;";
        let out = apply_customizations(src, &custom(vec![("title", json!("Hi"))]));
        assert_eq!(
            out,
            r#"const t = {"Hi"}; return <h1 title={"Hi"}>{"Hi"}</h1>;"#
        );
    }

    #[test]
    fn object_literal_shorthand_is_left_alone() {
        let src = "const o = ({title}); return <p>{title}</p>;";
        let out = apply_customizations(src, &custom(vec![("title", json!(5))]));
        assert_eq!(out, r#"const o = ({title}); return <p>{"5"}</p>;"#);
    }

    #[test]
    fn lists_are_substituted_as_json() {
        let src = "<ul>{items}</ul>";
        let out = apply_customizations(src, &custom(vec![("items", json!(["a", "b"]))]));
        assert_eq!(out, r#"<ul>{["a","b"]}</ul>"#);
    }

    #[test]
    fn unknown_keys_leave_source_unchanged() {
        let src = "<p>{x}</p>";
        assert_eq!(apply_customizations(src, &custom(vec![("y", json!("1"))])), src);
        assert_eq!(apply_customizations(src, &custom(vec![("not a key", json!("1"))])), src);
    }
}
