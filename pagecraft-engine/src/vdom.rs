//! Virtual DOM produced by the compiler and the fallback renderers, plus
//! safe HTML serialisation of it.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Marker attribute carrying the dot-path of the prop an element renders.
pub const PROP_PATH_ATTR: &str = "data-prop-path";
/// Marker attribute carrying the editable kind of an element.
pub const EDITABLE_ATTR: &str = "data-editable";

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<VNode>,
    },
    Text {
        text: String,
    },
    /// Children without a wrapper, flattened into the parent when rendered.
    Fragment {
        children: Vec<VNode>,
    },
    /// Inert card standing in for a component that failed to compile.
    Diagnostic {
        message: String,
        source: String,
    },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        VNode::Text { text: text.into() }
    }

    pub fn fragment(children: Vec<VNode>) -> Self {
        VNode::Fragment { children }
    }

    pub fn diagnostic(message: impl Into<String>, source: impl Into<String>) -> Self {
        VNode::Diagnostic {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Builder: sets (or replaces) an attribute. No-op on non-elements.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: appends a child. No-op on text and diagnostics.
    pub fn child(mut self, child: VNode) -> Self {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.child(VNode::text(text))
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        if let VNode::Element { attributes, .. } = self {
            let value = value.into();
            match attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, slot)) => *slot = value,
                None => attributes.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        if let VNode::Element { attributes, .. } = self {
            let index = attributes.iter().position(|(k, _)| k == name)?;
            return Some(attributes.remove(index).1);
        }
        None
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } | VNode::Fragment { children } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<VNode>> {
        match self {
            VNode::Element { children, .. } | VNode::Fragment { children } => Some(children),
            _ => None,
        }
    }

    /// Concatenated descendant text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            VNode::Text { text } => out.push_str(text),
            VNode::Diagnostic { message, .. } => out.push_str(message),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, VNode::Diagnostic { .. })
    }

    /// Node at `path`, where each index selects a child.
    pub fn node_at(&self, path: &NodePath) -> Option<&VNode> {
        path.0
            .iter()
            .try_fold(self, |node, &index| node.children().get(index))
    }

    /// Pre-order walk over every node, including `self`.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&NodePath, &'a VNode)) {
        fn go<'a>(node: &'a VNode, path: &mut Vec<usize>, visit: &mut impl FnMut(&NodePath, &'a VNode)) {
            visit(&NodePath(path.clone()), node);
            for (i, child) in node.children().iter().enumerate() {
                path.push(i);
                go(child, path, visit);
                path.pop();
            }
        }
        go(self, &mut Vec::new(), visit);
    }

    /// Mutable pre-order walk over every element.
    pub fn for_each_element_mut(&mut self, visit: &mut impl FnMut(&mut VNode)) {
        if matches!(self, VNode::Element { .. }) {
            visit(self);
        }
        if let Some(children) = self.children_mut() {
            for child in children {
                child.for_each_element_mut(visit);
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) -> fmt::Result {
        match self {
            VNode::Text { text } => write!(out, "{}", escape_html(text)),
            VNode::Fragment { children } => {
                for child in children {
                    child.write_html(out)?;
                }
                Ok(())
            }
            VNode::Element {
                tag,
                attributes,
                children,
            } => {
                write!(out, "<{}", tag)?;
                for (name, value) in attributes {
                    write!(out, " {}=\"{}\"", name, escape_html(value))?;
                }
                write!(out, ">")?;
                if is_void_element(tag) {
                    return Ok(());
                }
                for child in children {
                    child.write_html(out)?;
                }
                write!(out, "</{}>", tag)
            }
            VNode::Diagnostic { message, source } => write!(
                out,
                "<div class=\"pc-diagnostic\" role=\"alert\">\
                 <strong>Component failed to render</strong>\
                 <p>{}</p>\
                 <details><summary>Source</summary><pre><code>{}</code></pre></details>\
                 </div>",
                escape_html(message),
                escape_html(source)
            ),
        }
    }
}

/// Child-index path from an instance root to one of its nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        NodePath(path)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(NodePath(rest.to_vec()))
    }

    /// Every prefix from the node itself up to (excluding) the root.
    pub fn ancestors_inclusive(&self) -> impl Iterator<Item = NodePath> + '_ {
        (1..=self.0.len()).rev().map(|n| NodePath(self.0[..n].to_vec()))
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(v: Vec<usize>) -> Self {
        NodePath(v)
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VNode {
        VNode::element("section")
            .attr("class", "hero")
            .child(VNode::element("h1").with_text("Hi <there>"))
            .child(
                VNode::element("p")
                    .child(VNode::text("a"))
                    .child(VNode::element("br"))
                    .child(VNode::text("b")),
            )
    }

    #[test]
    fn renders_escaped_html_with_void_elements() {
        assert_eq!(
            sample().to_html(),
            "<section class=\"hero\"><h1>Hi &lt;there&gt;</h1><p>a<br>b</p></section>"
        );
    }

    #[test]
    fn node_at_follows_child_indices() {
        let root = sample();
        assert_eq!(root.node_at(&NodePath(vec![1, 1])).and_then(VNode::tag), Some("br"));
        assert!(root.node_at(&NodePath(vec![5])).is_none());
        assert_eq!(root.node_at(&NodePath::root()), Some(&root));
    }

    #[test]
    fn fragments_flatten_in_html() {
        let node = VNode::fragment(vec![VNode::text("x"), VNode::element("hr")]);
        assert_eq!(node.to_html(), "x<hr>");
    }

    #[test]
    fn diagnostic_card_keeps_source_collapsible() {
        let html = VNode::diagnostic("boom", "<div>").to_html();
        assert!(html.contains("<details>"));
        assert!(html.contains("&lt;div&gt;"));
    }

    #[test]
    fn ancestors_walk_up_to_first_level() {
        let path = NodePath(vec![0, 2, 1]);
        let all: Vec<_> = path.ancestors_inclusive().collect();
        assert_eq!(all, vec![NodePath(vec![0, 2, 1]), NodePath(vec![0, 2]), NodePath(vec![0])]);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(VNode::text("x")).unwrap();
        assert_eq!(json["type"], "text");
    }
}
