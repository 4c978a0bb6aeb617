use serde_json::Value;
use tracing::debug;

use super::node::{element_at, nearest_markers, node_selector, ContentType, EditableKind};
use crate::compiler::CONTENT_KEY_SUFFIX;
use crate::props::{PropKind, PropMap, PropPath};
use crate::vdom::{NodePath, VNode};

/// Result of inspecting one click inside a rendered instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    /// The clicked element (text nodes resolve to their parent)
    pub node: NodePath,
    pub selector: String,
    pub kind: EditableKind,
    pub target: EditTarget,
}

/// Where an edit will be written back.
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    /// Marker-addressed prop, array record, or nested field
    Prop {
        path: PropPath,
        prop_kind: PropKind,
        current: Value,
    },
    /// Legacy override key (`{propName}` or `{tag}_content`)
    Legacy { key: String, current: String },
    /// Nothing resolvable; only style editing by selector is possible
    Unresolved,
}

impl Inspection {
    /// Content type for a content editor, when this inspection opens one.
    pub fn content_type(&self) -> Option<ContentType> {
        self.kind.content_type()
    }
}

/// Inspects a click at `clicked` inside an instance rendered as `root`.
///
/// Returns `None` for clicks on the instance root container itself (those
/// select the instance instead) and for paths that do not exist.
pub fn inspect(root: &VNode, clicked: &NodePath, props: &PropMap) -> Option<Inspection> {
    let (node_path, node) = element_at(root, clicked)?;
    if node_path.is_root() {
        return None;
    }
    let selector = node_selector(node);
    let tag_kind = EditableKind::from_tag(node.tag().unwrap_or_default());

    if let Some(markers) = nearest_markers(root, &node_path) {
        match PropPath::parse(&markers.prop_path).and_then(|path| {
            let resolved = path.resolve(props)?;
            Ok((path, resolved.kind(), resolved.editor_value()))
        }) {
            Ok((path, prop_kind, current)) => {
                let kind = match markers.editable {
                    Some(kind) => kind,
                    None if markers.node == node_path => tag_kind,
                    None => EditableKind::from_tag(
                        root.node_at(&markers.node).and_then(VNode::tag).unwrap_or_default(),
                    ),
                };
                return Some(Inspection {
                    node: node_path,
                    selector,
                    kind,
                    target: EditTarget::Prop {
                        path,
                        prop_kind,
                        current,
                    },
                });
            }
            Err(e) => {
                debug!(path = %markers.prop_path, error = %e, "prop-path marker does not resolve, using legacy lookup");
            }
        }
    }

    let target = legacy_target(node, tag_kind, props).unwrap_or_else(|| {
        debug!(selector = %selector, "element resolution miss, style editing only");
        EditTarget::Unresolved
    });
    let kind = match target {
        EditTarget::Unresolved => EditableKind::Style,
        _ => tag_kind,
    };
    Some(Inspection {
        node: node_path,
        selector,
        kind,
        target,
    })
}

/// Legacy heuristic: the clicked node's content (text, `src`, or `href`)
/// is matched against top-level text props, first match in key order. A
/// node with literal text and no matching prop gets a `{tag}_content` key.
fn legacy_target(node: &VNode, kind: EditableKind, props: &PropMap) -> Option<EditTarget> {
    let content = match kind {
        EditableKind::Image | EditableKind::Video => node.get_attr("src").map(str::to_string),
        EditableKind::Url => node
            .get_attr("href")
            .map(str::to_string)
            .filter(|href| find_text_prop(props, href).is_some())
            .or_else(|| Some(node.text_content())),
        _ => Some(node.text_content()),
    }?;
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    if let Some(key) = find_text_prop(props, content) {
        return Some(EditTarget::Legacy {
            key: key.to_string(),
            current: content.to_string(),
        });
    }
    let tag = node.tag()?;
    has_own_text(node).then(|| EditTarget::Legacy {
        key: format!("{tag}{CONTENT_KEY_SUFFIX}"),
        current: content.to_string(),
    })
}

fn find_text_prop<'a>(props: &'a PropMap, content: &str) -> Option<&'a str> {
    props
        .iter()
        .find(|(_, prop)| prop.as_text().is_some_and(|text| text.trim() == content))
        .map(|(key, _)| key.as_str())
}

fn has_own_text(node: &VNode) -> bool {
    node.children()
        .iter()
        .any(|child| matches!(child, VNode::Text { text } if !text.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::normalize;
    use crate::vdom::{EDITABLE_ATTR, PROP_PATH_ATTR};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree() -> VNode {
        VNode::element("section")
            .child(
                VNode::element("h1")
                    .attr(PROP_PATH_ATTR, "title")
                    .attr(EDITABLE_ATTR, "text")
                    .with_text("Hello"),
            )
            .child(
                VNode::element("ul").attr(PROP_PATH_ATTR, "links").child(
                    VNode::element("li")
                        .attr(PROP_PATH_ATTR, "links.0")
                        .child(VNode::element("a").attr("href", "/a").with_text("A")),
                ),
            )
            .child(VNode::element("p").with_text("Subtitle"))
            .child(VNode::element("span").with_text("Static"))
            .child(VNode::element("img").attr("src", "pic.png"))
            .child(VNode::element("div").attr("class", "box"))
    }

    fn props() -> PropMap {
        normalize(&json!({
            "title": "Hello",
            "links": [{ "text": "A", "href": "/a" }],
            "subtitle": "Subtitle",
            "photo": "pic.png"
        }))
    }

    #[test]
    fn root_clicks_are_ignored() {
        assert!(inspect(&tree(), &NodePath::root(), &props()).is_none());
    }

    #[test]
    fn marked_text_resolves_by_path() {
        let inspection = inspect(&tree(), &NodePath(vec![0, 0]), &props()).unwrap();
        assert_eq!(inspection.node, NodePath(vec![0]));
        assert_eq!(inspection.kind, EditableKind::Text);
        assert_eq!(
            inspection.target,
            EditTarget::Prop {
                path: PropPath::parse("title").unwrap(),
                prop_kind: PropKind::Text,
                current: json!("Hello"),
            }
        );
    }

    #[test]
    fn records_and_lists_resolve_to_their_kinds() {
        let anchor = inspect(&tree(), &NodePath(vec![1, 0, 0]), &props()).unwrap();
        match anchor.target {
            EditTarget::Prop { path, prop_kind, .. } => {
                assert_eq!(path.to_string(), "links.0");
                assert_eq!(prop_kind, PropKind::Object);
            }
            other => panic!("unexpected target {other:?}"),
        }
        let list = inspect(&tree(), &NodePath(vec![1]), &props()).unwrap();
        assert!(matches!(list.target, EditTarget::Prop { prop_kind: PropKind::Array, .. }));
    }

    #[test]
    fn unmarked_text_falls_back_to_first_matching_prop() {
        let inspection = inspect(&tree(), &NodePath(vec![2]), &props()).unwrap();
        assert_eq!(
            inspection.target,
            EditTarget::Legacy {
                key: "subtitle".into(),
                current: "Subtitle".into()
            }
        );
    }

    #[test]
    fn literal_text_gets_tag_content_key() {
        let inspection = inspect(&tree(), &NodePath(vec![3]), &props()).unwrap();
        assert_eq!(
            inspection.target,
            EditTarget::Legacy {
                key: "span_content".into(),
                current: "Static".into()
            }
        );
    }

    #[test]
    fn images_match_by_source() {
        let inspection = inspect(&tree(), &NodePath(vec![4]), &props()).unwrap();
        assert_eq!(inspection.kind, EditableKind::Image);
        assert_eq!(inspection.content_type(), Some(ContentType::Image));
        assert!(matches!(inspection.target, EditTarget::Legacy { ref key, .. } if key == "photo"));
    }

    #[test]
    fn unresolvable_nodes_open_style_editing() {
        let inspection = inspect(&tree(), &NodePath(vec![5]), &props()).unwrap();
        assert_eq!(inspection.target, EditTarget::Unresolved);
        assert_eq!(inspection.kind, EditableKind::Style);
        assert_eq!(inspection.selector, ".box");
        assert_eq!(inspection.content_type(), None);
    }

    #[test]
    fn identical_text_resolves_to_first_prop_in_key_order() {
        let props = normalize(&json!({ "b": "Same", "a": "Same" }));
        let root = VNode::element("div").child(VNode::element("p").with_text("Same"));
        let inspection = inspect(&root, &NodePath(vec![0]), &props).unwrap();
        assert!(matches!(inspection.target, EditTarget::Legacy { ref key, .. } if key == "a"));
    }
}
