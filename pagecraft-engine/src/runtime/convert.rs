//! Interpreter values to [`VNode`] trees.
//!
//! This is the sanitising boundary: event handlers, raw HTML injection,
//! script tags and `javascript:` URLs never make it into a VNode.

use std::rc::Rc;

use super::value::{format_number, Element, ElementKind, Object, Value};
use crate::vdom::{is_void_element, VNode};

/// Props consumed by the element model itself.
const RESERVED_PROPS: &[&str] = &[
    "key",
    "ref",
    "children",
    "dangerouslySetInnerHTML",
    "__self",
    "__source",
];

const DROPPED_TAGS: &[&str] = &["script"];

const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction", "xlink:href", "poster"];

/// React prop name -> HTML attribute name, for names that differ.
const ATTRIBUTE_ALIASES: &[(&str, &str)] = &[
    ("className", "class"),
    ("htmlFor", "for"),
    ("tabIndex", "tabindex"),
    ("readOnly", "readonly"),
    ("maxLength", "maxlength"),
    ("minLength", "minlength"),
    ("autoComplete", "autocomplete"),
    ("autoFocus", "autofocus"),
    ("autoPlay", "autoplay"),
    ("playsInline", "playsinline"),
    ("colSpan", "colspan"),
    ("rowSpan", "rowspan"),
    ("srcSet", "srcset"),
    ("crossOrigin", "crossorigin"),
    ("formAction", "formaction"),
    ("defaultValue", "value"),
    ("defaultChecked", "checked"),
    ("strokeWidth", "stroke-width"),
    ("strokeLinecap", "stroke-linecap"),
    ("strokeLinejoin", "stroke-linejoin"),
    ("strokeDasharray", "stroke-dasharray"),
    ("strokeOpacity", "stroke-opacity"),
    ("fillRule", "fill-rule"),
    ("fillOpacity", "fill-opacity"),
    ("clipRule", "clip-rule"),
    ("clipPath", "clip-path"),
    ("stopColor", "stop-color"),
    ("stopOpacity", "stop-opacity"),
    ("xlinkHref", "xlink:href"),
];

const UNITLESS_PROPERTIES: &[&str] = &[
    "animationIterationCount",
    "aspectRatio",
    "columnCount",
    "columns",
    "flex",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "gridArea",
    "gridColumn",
    "gridColumnEnd",
    "gridColumnStart",
    "gridRow",
    "gridRowEnd",
    "gridRowStart",
    "lineClamp",
    "lineHeight",
    "opacity",
    "order",
    "orphans",
    "scale",
    "tabSize",
    "widows",
    "zIndex",
    "zoom",
    "fillOpacity",
    "floodOpacity",
    "stopOpacity",
    "strokeDasharray",
    "strokeDashoffset",
    "strokeMiterlimit",
    "strokeOpacity",
    "strokeWidth",
];

/// Converts a component's return value. `max_depth` bounds element nesting.
pub fn to_vnode(value: &Value, max_depth: usize) -> Result<VNode, String> {
    match value {
        Value::Undefined => Err(
            "Nothing was returned from render. This usually means a return statement is missing."
                .to_string(),
        ),
        Value::Null | Value::Bool(_) => Ok(VNode::fragment(Vec::new())),
        Value::Function(_) => Err("Functions are not valid as a render result".to_string()),
        Value::Object(object) => Err(object_child_error(&object.borrow())),
        Value::Element(element) if element.kind == ElementKind::Fragment => {
            let mut converter = Converter { max_depth };
            Ok(VNode::fragment(converter.children_of(element, 1)?))
        }
        other => {
            let mut converter = Converter { max_depth };
            let mut nodes = Vec::new();
            converter.push_child(other, 0, &mut nodes)?;
            Ok(match nodes.len() {
                1 if !matches!(other, Value::Array(_)) => nodes.remove(0),
                _ => VNode::fragment(nodes),
            })
        }
    }
}

fn object_child_error(object: &Object) -> String {
    let keys: Vec<&str> = object.keys().map(|k| &**k).collect();
    format!(
        "Objects are not valid as a React child (found: object with keys {{{}}})",
        keys.join(", ")
    )
}

struct Converter {
    max_depth: usize,
}

impl Converter {
    fn push_child(&mut self, value: &Value, depth: usize, out: &mut Vec<VNode>) -> Result<(), String> {
        if depth > self.max_depth {
            return Err(format!(
                "Rendered tree is nested deeper than {} levels",
                self.max_depth
            ));
        }
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Function(_) => {}
            Value::Str(s) => push_text(out, s),
            Value::Number(n) => push_text(out, &format_number(*n)),
            Value::Array(items) => {
                for item in items.borrow().iter() {
                    self.push_child(item, depth + 1, out)?;
                }
            }
            Value::Object(object) => return Err(object_child_error(&object.borrow())),
            Value::Element(element) => match &element.kind {
                ElementKind::Fragment => {
                    for child in self.children_of(element, depth + 1)? {
                        match child {
                            VNode::Text { text } => push_text(out, &text),
                            other => out.push(other),
                        }
                    }
                }
                ElementKind::Tag(tag) => {
                    if let Some(node) = self.element(tag, element, depth)? {
                        out.push(node);
                    }
                }
            },
        }
        Ok(())
    }

    fn children_of(&mut self, element: &Rc<Element>, depth: usize) -> Result<Vec<VNode>, String> {
        let mut out = Vec::new();
        if element.children.is_empty() {
            if let Some(children) = element.props.get("children") {
                self.push_child(children, depth, &mut out)?;
            }
        } else {
            for child in &element.children {
                self.push_child(child, depth, &mut out)?;
            }
        }
        Ok(out)
    }

    fn element(&mut self, tag: &str, element: &Rc<Element>, depth: usize) -> Result<Option<VNode>, String> {
        if !is_valid_tag(tag) {
            return Err(format!("Invalid element tag <{}>", tag));
        }
        let tag = if is_svg_tag(tag) {
            tag.to_string()
        } else {
            tag.to_ascii_lowercase()
        };
        if DROPPED_TAGS.contains(&tag.as_str()) {
            return Ok(None);
        }
        let attributes = attributes(&element.props);
        let children = if is_void_element(&tag) {
            Vec::new()
        } else {
            self.children_of(element, depth + 1)?
        };
        Ok(Some(VNode::Element {
            tag,
            attributes,
            children,
        }))
    }
}

fn push_text(out: &mut Vec<VNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(VNode::Text { text: last }) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(VNode::text(text));
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// SVG elements keep their camel-cased names (`linearGradient`).
fn is_svg_tag(tag: &str) -> bool {
    matches!(
        tag,
        "linearGradient" | "radialGradient" | "clipPath" | "foreignObject" | "textPath"
    )
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name[..2].eq_ignore_ascii_case("on")
}

fn is_unsafe_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:")
}

fn attributes(props: &Object) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for (key, value) in props.iter() {
        let key: &str = key;
        if RESERVED_PROPS.contains(&key) || is_event_handler(key) {
            continue;
        }
        let name = ATTRIBUTE_ALIASES
            .iter()
            .find(|(from, _)| *from == key)
            .map_or(key, |(_, to)| *to);
        if !is_valid_attribute_name(name) {
            continue;
        }
        let is_flag_like = name.starts_with("aria-") || name.starts_with("data-");
        let text = match value {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Element(_) => continue,
            Value::Bool(true) if is_flag_like => "true".to_string(),
            Value::Bool(false) if is_flag_like => "false".to_string(),
            Value::Bool(true) => String::new(),
            Value::Bool(false) => continue,
            Value::Object(style) if name == "style" => {
                let css = style_to_css(&style.borrow());
                if css.is_empty() {
                    continue;
                }
                css
            }
            Value::Object(_) => continue,
            other => other.to_js_string(),
        };
        if URL_ATTRIBUTES.contains(&name) && is_unsafe_url(&text) {
            continue;
        }
        match out.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = text,
            None => out.push((name.to_string(), text)),
        }
    }
    out
}

/// `backgroundColor` -> `background-color`, `WebkitTransform` -> `-webkit-transform`.
pub fn css_property_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    if name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn style_to_css(style: &Object) -> String {
    let mut declarations = Vec::new();
    for (key, value) in style.iter() {
        let text = match value {
            Value::Number(n) if *n != 0.0 && !UNITLESS_PROPERTIES.contains(&&**key) => {
                format!("{}px", format_number(*n))
            }
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            _ => continue,
        };
        let lowered = text.to_ascii_lowercase();
        if lowered.contains("expression(") || lowered.contains("javascript:") {
            continue;
        }
        let text: String = text.chars().filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>')).collect();
        if text.trim().is_empty() {
            continue;
        }
        declarations.push(format!("{}:{}", css_property_name(key), text.trim()));
    }
    declarations.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn el(tag: &str, props: Vec<(&str, Value)>, children: Vec<Value>) -> Value {
        let mut object = Object::new();
        for (k, v) in props {
            object.set(k, v);
        }
        Value::Element(Rc::new(Element {
            kind: ElementKind::Tag(Rc::from(tag)),
            props: object,
            children,
        }))
    }

    fn style(entries: Vec<(&str, Value)>) -> Value {
        let mut object = Object::new();
        for (k, v) in entries {
            object.set(k, v);
        }
        Value::object(object)
    }

    #[test]
    fn maps_react_props_to_attributes() {
        let node = to_vnode(
            &el(
                "label",
                vec![
                    ("className", Value::str("a b")),
                    ("htmlFor", Value::str("email")),
                    ("key", Value::str("k")),
                    ("onClick", Value::native("noop", |_, _, _| Ok(Value::Undefined))),
                    ("aria-hidden", Value::Bool(true)),
                    ("hidden", Value::Bool(false)),
                    ("disabled", Value::Bool(true)),
                ],
                vec![Value::str("Email")],
            ),
            32,
        )
        .unwrap();
        assert_eq!(
            node,
            VNode::Element {
                tag: "label".into(),
                attributes: vec![
                    ("class".into(), "a b".into()),
                    ("for".into(), "email".into()),
                    ("aria-hidden".into(), "true".into()),
                    ("disabled".into(), "".into()),
                ],
                children: vec![VNode::text("Email")],
            }
        );
    }

    #[test]
    fn style_objects_become_css() {
        let node = to_vnode(
            &el(
                "div",
                vec![(
                    "style",
                    style(vec![
                        ("backgroundColor", Value::str("red")),
                        ("marginTop", Value::Number(8.0)),
                        ("opacity", Value::Number(0.5)),
                        ("zIndex", Value::Number(10.0)),
                        ("WebkitTransform", Value::str("none")),
                    ]),
                )],
                vec![],
            ),
            32,
        )
        .unwrap();
        assert_eq!(
            node.get_attr("style"),
            Some("background-color:red;margin-top:8px;opacity:0.5;z-index:10;-webkit-transform:none")
        );
    }

    #[test]
    fn strips_dangerous_urls_and_scripts() {
        let node = to_vnode(
            &el(
                "div",
                vec![],
                vec![
                    el("a", vec![("href", Value::str(" JavaScript:alert(1)"))], vec![Value::str("x")]),
                    el("script", vec![], vec![Value::str("alert(1)")]),
                ],
            ),
            32,
        )
        .unwrap();
        assert_eq!(node.to_html(), "<div><a>x</a></div>");
    }

    #[test]
    fn merges_text_and_flattens_arrays() {
        let list = Value::array(vec![Value::str("a"), Value::Number(1.0), Value::Null, Value::Bool(false)]);
        let node = to_vnode(&el("p", vec![], vec![Value::str("n="), list]), 32).unwrap();
        assert_eq!(node.children(), &[VNode::text("n=a1")]);
    }

    #[test]
    fn rejects_undefined_and_plain_objects() {
        assert!(to_vnode(&Value::Undefined, 32).is_err());
        let err = to_vnode(&style(vec![("a", Value::Null)]), 32).unwrap_err();
        assert!(err.contains("keys {a}"), "{}", err);
        assert_eq!(to_vnode(&Value::Null, 32).unwrap(), VNode::fragment(vec![]));
    }

    #[test]
    fn void_elements_drop_children() {
        let node = to_vnode(&el("img", vec![("src", Value::str("/a.png"))], vec![Value::str("x")]), 32).unwrap();
        assert_eq!(node.to_html(), "<img src=\"/a.png\">");
    }

    #[test]
    fn depth_is_bounded() {
        let mut value = Value::str("leaf");
        for _ in 0..10 {
            value = el("div", vec![], vec![value]);
        }
        assert!(to_vnode(&value, 5).is_err());
        assert!(to_vnode(&value, 40).is_ok());
    }
}
