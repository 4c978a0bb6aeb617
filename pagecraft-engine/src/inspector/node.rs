use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vdom::{NodePath, VNode, EDITABLE_ATTR, PROP_PATH_ATTR};

/// Editable classification of a clicked node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditableKind {
    Text,
    Url,
    Image,
    Video,
    Style,
}

/// What a content editor edits. Style is handled by its own editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Url,
    Image,
    Video,
}

impl EditableKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(EditableKind::Text),
            "url" | "link" | "href" => Some(EditableKind::Url),
            "image" | "img" => Some(EditableKind::Image),
            "video" => Some(EditableKind::Video),
            "style" => Some(EditableKind::Style),
            _ => None,
        }
    }

    /// `img` → image, `video` → video, `a` → url, anything else → text.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "img" | "picture" => EditableKind::Image,
            "video" | "source" => EditableKind::Video,
            "a" => EditableKind::Url,
            _ => EditableKind::Text,
        }
    }

    pub fn content_type(self) -> Option<ContentType> {
        match self {
            EditableKind::Text => Some(ContentType::Text),
            EditableKind::Url => Some(ContentType::Url),
            EditableKind::Image => Some(ContentType::Image),
            EditableKind::Video => Some(ContentType::Video),
            EditableKind::Style => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditableKind::Text => "text",
            EditableKind::Url => "url",
            EditableKind::Image => "image",
            EditableKind::Video => "video",
            EditableKind::Style => "style",
        }
    }
}

impl fmt::Display for EditableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ContentType> for EditableKind {
    fn from(content: ContentType) -> Self {
        match content {
            ContentType::Text => EditableKind::Text,
            ContentType::Url => EditableKind::Url,
            ContentType::Image => EditableKind::Image,
            ContentType::Video => EditableKind::Video,
        }
    }
}

/// CSS-selector-like identity: `#id`, else `.first-class`, else the tag.
///
/// Only used to key legacy style overrides.
pub fn node_selector(node: &VNode) -> String {
    if let Some(id) = node.get_attr("id").map(str::trim).filter(|id| !id.is_empty()) {
        return format!("#{id}");
    }
    if let Some(class) = node.get_attr("class").and_then(|c| c.split_whitespace().next()) {
        return format!(".{class}");
    }
    node.tag().unwrap_or("div").to_string()
}

/// The clicked element: a text node stands for its parent element.
pub fn element_at<'a>(root: &'a VNode, path: &NodePath) -> Option<(NodePath, &'a VNode)> {
    let mut current = path.clone();
    loop {
        let node = root.node_at(&current)?;
        if matches!(node, VNode::Element { .. }) {
            return Some((current, node));
        }
        current = current.parent()?;
    }
}

/// Markers found on the clicked element or its nearest marked ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub node: NodePath,
    pub prop_path: String,
    pub editable: Option<EditableKind>,
}

/// Nearest element at or above `path` (never the instance root itself)
/// carrying a prop-path marker.
pub fn nearest_markers(root: &VNode, path: &NodePath) -> Option<Markers> {
    path.ancestors_inclusive().find_map(|candidate| {
        let node = root.node_at(&candidate)?;
        let prop_path = node.get_attr(PROP_PATH_ATTR)?.trim();
        if prop_path.is_empty() {
            return None;
        }
        Some(Markers {
            prop_path: prop_path.to_string(),
            editable: node.get_attr(EDITABLE_ATTR).and_then(EditableKind::parse),
            node: candidate,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_prefers_id_then_class_then_tag() {
        let node = VNode::element("h2").attr("class", "title big").attr("id", "main");
        assert_eq!(node_selector(&node), "#main");
        let node = VNode::element("h2").attr("class", " title big");
        assert_eq!(node_selector(&node), ".title");
        assert_eq!(node_selector(&VNode::element("h2")), "h2");
    }

    #[test]
    fn text_nodes_resolve_to_their_element() {
        let root = VNode::element("div").child(VNode::element("p").with_text("x"));
        let (path, node) = element_at(&root, &NodePath(vec![0, 0])).unwrap();
        assert_eq!(path, NodePath(vec![0]));
        assert_eq!(node.tag(), Some("p"));
    }

    #[test]
    fn markers_come_from_nearest_marked_ancestor() {
        let root = VNode::element("div").attr(PROP_PATH_ATTR, "ignored").child(
            VNode::element("h1")
                .attr(PROP_PATH_ATTR, "title")
                .attr(EDITABLE_ATTR, "text")
                .child(VNode::element("span").with_text("Hi")),
        );
        let markers = nearest_markers(&root, &NodePath(vec![0, 0, 0])).unwrap();
        assert_eq!(markers.prop_path, "title");
        assert_eq!(markers.editable, Some(EditableKind::Text));
        assert_eq!(markers.node, NodePath(vec![0]));
        assert!(nearest_markers(&root, &NodePath::root()).is_none());
    }
}
