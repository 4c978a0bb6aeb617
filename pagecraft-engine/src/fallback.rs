//! Static renderers for definitions that ship without source.
//!
//! One renderer per [`Category`]. Output carries the same prop-path and
//! editable markers as compiled components, so the overlay edits both the
//! same way.

use serde_json::Value;

use crate::component::Category;
use crate::props::{PropMap, PropValue, WRAPPED_VALUE_KEY};
use crate::vdom::{VNode, EDITABLE_ATTR, PROP_PATH_ATTR};

pub fn render_fallback(category: Category, props: &PropMap) -> VNode {
    let section = |class: &str| VNode::element("section").attr("class", class);
    match category {
        Category::Navbar => navbar(props),
        Category::Hero => section("py-20 px-6 text-center bg-theme-background")
            .child_opt(text_prop(props, "h1", &["title", "heading", "headline"], "text-5xl font-bold text-theme-foreground"))
            .child_opt(text_prop(props, "p", &["subtitle", "description", "text"], "mt-4 text-theme-muted-foreground"))
            .child_opt(link_prop(props, &["ctaText", "buttonText"], &["ctaLink", "buttonLink"], "mt-8 inline-block px-6 py-3 rounded bg-theme-primary text-white"))
            .child_opt(image_prop(props, &["image", "heroImage", "imageUrl"], "mt-10 mx-auto")),
        Category::Features => with_heading(section("py-16 px-6"), props).child_opt(record_grid(
            props,
            &["features", "items"],
            &[("h3", &["title", "name"]), ("p", &["description", "text"])],
        )),
        Category::Pricing => with_heading(section("py-16 px-6"), props).child_opt(record_grid(
            props,
            &["plans", "tiers", "pricing"],
            &[("h3", &["name", "title"]), ("p", &["price"]), ("p", &["description", "period"])],
        )),
        Category::Testimonials => with_heading(section("py-16 px-6 bg-theme-muted"), props).child_opt(
            record_grid(
                props,
                &["testimonials", "reviews", "items"],
                &[("blockquote", &["quote", "text", "content"]), ("cite", &["author", "name"]), ("p", &["role", "company"])],
            ),
        ),
        Category::Cta => section("py-16 px-6 text-center bg-theme-primary text-white")
            .child_opt(text_prop(props, "h2", &["title", "heading"], "text-3xl font-bold"))
            .child_opt(text_prop(props, "p", &["subtitle", "description", "text"], "mt-2"))
            .child_opt(link_prop(props, &["buttonText", "ctaText"], &["buttonLink", "ctaLink"], "mt-6 inline-block px-6 py-3 rounded bg-white text-theme-primary")),
        Category::Contact => with_heading(section("py-16 px-6"), props)
            .child_opt(mail_prop(props))
            .child_opt(text_prop(props, "p", &["phone"], "mt-2"))
            .child_opt(text_prop(props, "address", &["address", "location"], "mt-2 not-italic")),
        Category::Footer => VNode::element("footer")
            .attr("class", "py-8 px-6 bg-theme-muted text-theme-muted-foreground")
            .child_opt(link_list(props, &["links", "footerLinks"], "flex gap-4"))
            .child_opt(text_prop(props, "p", &["copyright", "text", "description"], "mt-4 text-sm")),
        Category::Gallery => with_heading(section("py-16 px-6"), props).child_opt(image_grid(props)),
        Category::Team => with_heading(section("py-16 px-6"), props).child_opt(record_grid(
            props,
            &["members", "team", "items"],
            &[("img", &["image", "avatar", "photo"]), ("h3", &["name"]), ("p", &["role", "title"])],
        )),
        Category::Faq => with_heading(section("py-16 px-6"), props).child_opt(record_grid(
            props,
            &["faqs", "questions", "items"],
            &[("h3", &["question", "q"]), ("p", &["answer", "a"])],
        )),
        Category::Stats => section("py-16 px-6 bg-theme-muted").child_opt(record_grid(
            props,
            &["stats", "items"],
            &[("strong", &["value", "number"]), ("span", &["label", "title"])],
        )),
        Category::Blog => with_heading(section("py-16 px-6"), props).child_opt(record_grid(
            props,
            &["posts", "articles", "items"],
            &[("h3", &["title"]), ("p", &["excerpt", "description"]), ("time", &["date"])],
        )),
        Category::Generic => generic(props),
    }
}

trait ChildOpt {
    fn child_opt(self, child: Option<VNode>) -> Self;
}

impl ChildOpt for VNode {
    fn child_opt(self, child: Option<VNode>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }
}

fn with_heading(node: VNode, props: &PropMap) -> VNode {
    node.child_opt(text_prop(
        props,
        "h2",
        &["title", "heading", "sectionTitle"],
        "text-3xl font-bold text-center text-theme-foreground",
    ))
}

fn first_text<'a>(props: &'a PropMap, keys: &[&'a str]) -> Option<(&'a str, &'a str)> {
    keys.iter()
        .find_map(|key| props.get(*key).and_then(PropValue::as_text).map(|text| (*key, text)))
}

fn first_list<'a>(props: &'a PropMap, keys: &[&'a str]) -> Option<(&'a str, &'a [Value])> {
    keys.iter().find_map(|key| {
        let elements = props.get(*key)?.elements();
        (!elements.is_empty()).then_some((*key, elements))
    })
}

/// First present scalar field of a record; a wrapped scalar element counts
/// as every field.
fn record_field<'a>(record: &'a Value, names: &[&'a str]) -> Option<(&'a str, String)> {
    names.iter().find_map(|name| {
        let value = record.get(*name)?;
        scalar_text(value).map(|text| (*name, text))
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn marked(node: VNode, path: &str, kind: &str) -> VNode {
    node.attr(PROP_PATH_ATTR, path).attr(EDITABLE_ATTR, kind)
}

fn text_prop(props: &PropMap, tag: &str, keys: &[&str], class: &str) -> Option<VNode> {
    let (key, text) = first_text(props, keys)?;
    Some(marked(VNode::element(tag).attr("class", class), key, "text").with_text(text))
}

fn link_prop(props: &PropMap, text_keys: &[&str], href_keys: &[&str], class: &str) -> Option<VNode> {
    let (key, text) = first_text(props, text_keys)?;
    let href = first_text(props, href_keys).map_or("#", |(_, href)| href);
    Some(
        marked(VNode::element("a").attr("href", href).attr("class", class), key, "url")
            .with_text(text),
    )
}

fn image_prop(props: &PropMap, keys: &[&str], class: &str) -> Option<VNode> {
    let (key, src) = first_text(props, keys)?;
    Some(marked(
        VNode::element("img").attr("src", src).attr("alt", "").attr("class", class),
        key,
        "image",
    ))
}

fn mail_prop(props: &PropMap) -> Option<VNode> {
    let (key, email) = first_text(props, &["email"])?;
    Some(
        marked(VNode::element("a").attr("href", format!("mailto:{email}")), key, "url")
            .with_text(email),
    )
}

fn navbar(props: &PropMap) -> VNode {
    VNode::element("nav")
        .attr("class", "flex items-center justify-between px-6 py-4 bg-theme-background")
        .child_opt(text_prop(props, "span", &["logo", "brand", "title", "logoText"], "text-xl font-bold text-theme-primary"))
        .child_opt(link_list(props, &["links", "menuItems", "navItems"], "flex gap-6"))
}

/// `<ul>` of links from an array of `{text|label, href|url}` records.
fn link_list(props: &PropMap, keys: &[&str], class: &str) -> Option<VNode> {
    let (key, links) = first_list(props, keys)?;
    let mut list = marked(VNode::element("ul").attr("class", class), key, "style");
    for (i, link) in links.iter().enumerate() {
        let (field, text) = record_field(link, &["text", "label", "title", "name", WRAPPED_VALUE_KEY])
            .unwrap_or(("", String::new()));
        let href = record_field(link, &["href", "url", "link"]).map_or("#".to_string(), |(_, h)| h);
        let anchor = VNode::element("a").attr("href", href).with_text(text);
        let anchor = if field.is_empty() {
            anchor
        } else {
            marked(anchor, &format!("{key}.{i}.{field}"), "url")
        };
        list = list.child(marked(VNode::element("li"), &format!("{key}.{i}"), "style").child(anchor));
    }
    Some(list)
}

fn record_grid(props: &PropMap, keys: &[&str], fields: &[(&str, &[&str])]) -> Option<VNode> {
    let (key, records) = first_list(props, keys)?;
    let mut grid = marked(
        VNode::element("div").attr("class", "mt-10 grid gap-8 md:grid-cols-3"),
        key,
        "style",
    );
    for (i, record) in records.iter().enumerate() {
        let mut card = marked(
            VNode::element("div").attr("class", "p-6 rounded-lg border border-theme-muted"),
            &format!("{key}.{i}"),
            "style",
        );
        for (tag, names) in fields {
            let Some((field, text)) = record_field(record, names) else {
                continue;
            };
            let path = format!("{key}.{i}.{field}");
            card = card.child(if *tag == "img" {
                marked(VNode::element("img").attr("src", text).attr("alt", ""), &path, "image")
            } else {
                marked(VNode::element(*tag), &path, "text").with_text(text)
            });
        }
        grid = grid.child(card);
    }
    Some(grid)
}

fn image_grid(props: &PropMap) -> Option<VNode> {
    let (key, images) = first_list(props, &["images", "gallery", "photos", "items"])?;
    let mut grid = marked(
        VNode::element("div").attr("class", "mt-10 grid gap-4 md:grid-cols-3"),
        key,
        "style",
    );
    for (i, image) in images.iter().enumerate() {
        let Some((field, src)) = record_field(image, &["src", "url", "image", WRAPPED_VALUE_KEY]) else {
            continue;
        };
        let alt = record_field(image, &["alt", "caption", "title"]).map_or(String::new(), |(_, a)| a);
        grid = grid.child(marked(
            VNode::element("img").attr("src", src).attr("alt", alt),
            &format!("{key}.{i}.{field}"),
            "image",
        ));
    }
    Some(grid)
}

/// Every text prop as a paragraph, in key order.
fn generic(props: &PropMap) -> VNode {
    let mut section = VNode::element("section").attr("class", "py-12 px-6");
    for (key, prop) in props {
        if let Some(text) = prop.as_text().filter(|t| !t.is_empty()) {
            section = section.child(marked(VNode::element("p"), key, "text").with_text(text));
        }
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::normalize;
    use serde_json::json;

    #[test]
    fn hero_fallback_is_marked_for_editing() {
        let props = normalize(&json!({
            "title": "Build faster",
            "ctaText": "Start",
            "ctaLink": "/signup",
            "image": "https://example.com/a.png"
        }));
        let html = render_fallback(Category::Hero, &props).to_html();
        assert!(html.contains(r#"data-prop-path="title" data-editable="text">Build faster</h1>"#), "{html}");
        assert!(html.contains(r#"href="/signup""#));
        assert!(html.contains(r#"data-prop-path="image" data-editable="image""#));
    }

    #[test]
    fn array_records_get_element_paths() {
        let props = normalize(&json!({
            "features": [
                { "title": "Fast", "description": "Very" },
                { "title": "Safe" }
            ]
        }));
        let node = render_fallback(Category::Features, &props);
        let html = node.to_html();
        assert!(html.contains(r#"data-prop-path="features.1""#));
        assert!(html.contains(r#"data-prop-path="features.0.description" data-editable="text">Very</p>"#));
        assert!(!html.contains("features.1.description"));
    }

    #[test]
    fn wrapped_scalar_links_resolve_through_value() {
        let props = normalize(&json!({ "links": ["Home", "About"] }));
        let html = render_fallback(Category::Navbar, &props).to_html();
        assert!(html.contains(r#"data-prop-path="links.1.value" data-editable="url">About</a>"#), "{html}");
    }

    #[test]
    fn generic_lists_text_props() {
        let props = normalize(&json!({ "a": "one", "b": "", "c": ["x"] }));
        assert_eq!(
            render_fallback(Category::Generic, &props).to_html(),
            r#"<section class="py-12 px-6"><p data-prop-path="a" data-editable="text">one</p></section>"#
        );
    }
}
