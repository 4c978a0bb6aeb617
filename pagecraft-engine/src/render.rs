//! Layers prop-level styling onto rendered output.
//!
//! Any element carrying a `data-prop-path` marker gets the styling of the
//! prop (or array element) that path resolves to: utility classes are
//! appended to its class list, custom CSS is merged into its inline style
//! and wins over whatever the component set.

use std::collections::BTreeMap;

use tracing::debug;

use crate::props::{PropMap, PropPath};
use crate::runtime::css_property_name;
use crate::tailwind::merge_classes;
use crate::vdom::{VNode, PROP_PATH_ATTR};

pub fn apply_styling_overrides(node: &mut VNode, props: &PropMap) {
    node.for_each_element_mut(&mut |element| {
        let Some(raw_path) = element.get_attr(PROP_PATH_ATTR).map(str::to_string) else {
            return;
        };
        let styling = PropPath::parse(&raw_path)
            .and_then(|path| path.resolve(props).map(|resolved| resolved.styling()));
        match styling {
            Ok(Some((classes, css))) => apply_styling(element, &classes, &css),
            Ok(None) => {}
            Err(e) => debug!(path = %raw_path, error = %e, "marked element does not resolve"),
        }
    });
}

fn apply_styling(element: &mut VNode, classes: &str, css: &BTreeMap<String, String>) {
    if !classes.trim().is_empty() {
        let merged = merge_classes([element.get_attr("class").unwrap_or_default(), classes]);
        element.set_attr("class", merged);
    }
    if !css.is_empty() {
        let merged = merge_style(element.get_attr("style").unwrap_or_default(), css);
        if merged.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", merged);
        }
    }
}

/// Merges `overrides` into an inline style string. Existing declarations
/// keep their position; overridden ones take the new value.
pub fn merge_style(existing: &str, overrides: &BTreeMap<String, String>) -> String {
    let mut declarations = parse_style(existing);
    for (property, value) in overrides {
        let property = css_property_name(property.trim());
        let value = sanitize_css_value(value);
        if property.is_empty() || value.is_empty() {
            continue;
        }
        match declarations.iter_mut().find(|(p, _)| *p == property) {
            Some((_, slot)) => *slot = value,
            None => declarations.push((property, value)),
        }
    }
    declarations
        .iter()
        .map(|(p, v)| format!("{p}:{v}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let (property, value) = (property.trim(), value.trim());
            (!property.is_empty() && !value.is_empty())
                .then(|| (property.to_string(), value.to_string()))
        })
        .collect()
}

/// Keeps a user-supplied value from closing the declaration or the rule.
fn sanitize_css_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn merges_overrides_into_existing_style() {
        let mut css = BTreeMap::new();
        css.insert("color".to_string(), "red".to_string());
        css.insert("marginTop".to_string(), "4px".to_string());
        assert_eq!(
            merge_style("color: blue; padding:0", &css),
            "color:red;padding:0;margin-top:4px"
        );
    }

    #[test]
    fn override_values_cannot_break_out() {
        let mut css = BTreeMap::new();
        css.insert("color".to_string(), "red;}body{display:none".to_string());
        assert_eq!(merge_style("", &css), "color:redbodydisplay:none");
    }

    #[test]
    fn marked_elements_receive_prop_styling() {
        let props = normalize(&json!({
            "title": {
                "kind": "text",
                "value": "Hi",
                "tailwindClasses": "font-bold text-xl",
                "customCssOverrides": { "color": "#f00" }
            },
            "items": [{ "label": "a", "tailwindClasses": "italic", "customCssOverrides": {} }]
        }));
        let mut node = VNode::element("section")
            .child(
                VNode::element("h1")
                    .attr("class", "text-xl")
                    .attr("style", "color:blue")
                    .attr(PROP_PATH_ATTR, "title")
                    .with_text("Hi"),
            )
            .child(VNode::element("li").attr(PROP_PATH_ATTR, "items.0").with_text("a"))
            .child(VNode::element("p").attr(PROP_PATH_ATTR, "missing"));
        apply_styling_overrides(&mut node, &props);
        assert_eq!(
            node.to_html(),
            "<section><h1 class=\"text-xl font-bold\" style=\"color:#f00\" data-prop-path=\"title\">Hi</h1>\
             <li data-prop-path=\"items.0\" class=\"italic\">a</li>\
             <p data-prop-path=\"missing\"></p></section>"
        );
    }
}
