//! Renders a page's instances for the editing canvas.
//! Compiled, fallback and diagnostic output all get the same instance
//! wrapper, and the page gets one `<style>` payload per pass.

use pagecraft_engine::inspector::node_selector;
use pagecraft_engine::render::merge_style;
use pagecraft_engine::tailwind::{extract_classes, merge_classes};
use pagecraft_engine::theme::synthesize_for_classes;
use pagecraft_engine::vdom::{escape_html, VNode};
use pagecraft_engine::{
    apply_styling_overrides, render_fallback, Category, CompileContext, Compiler, EngineError,
};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{debug, warn};

use crate::error::{EditorError, EditorResult};
use crate::page::{ComponentInstance, LegacyStyle};
use crate::store::EditorStore;

/// Canvas chrome the theme stylesheet does not cover.
const CANVAS_BASE_STYLES: &str = "html,body{margin:0;}\
.pc-instance{position:relative;}\
.pc-instance.pc-selected{outline:2px solid #3b82f6;outline-offset:-2px;}\
.pc-diagnostic{margin:1rem;padding:1rem;border:1px solid #ef4444;border-radius:8px;background:#fef2f2;color:#991b1b;font-family:sans-serif;}\
.pc-diagnostic pre{white-space:pre-wrap;font-size:0.8rem;}";

pub const INSTANCE_ID_ATTR: &str = "data-instance-id";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedInstance {
    pub instance_id: String,
    pub definition_id: String,
    pub category: Category,
    /// Rendered component, without the instance wrapper; overlay clicks are
    /// addressed relative to this node
    pub node: VNode,
}

impl RenderedInstance {
    pub fn failed(&self) -> bool {
        self.node.is_diagnostic()
    }

    pub fn wrapped(&self, selected: bool) -> VNode {
        let mut class = format!("pc-instance pc-{}", self.category);
        if selected {
            class.push_str(" pc-selected");
        }
        VNode::element("div")
            .attr("class", class)
            .attr(INSTANCE_ID_ATTR, self.instance_id.as_str())
            .child(self.node.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub page_id: String,
    pub instances: Vec<RenderedInstance>,
    /// Theme stylesheet plus per-instance legacy CSS
    pub style: String,
    scope_class: String,
    selected: Option<String>,
}

impl RenderedPage {
    pub fn instance(&self, instance_id: &str) -> Option<&RenderedInstance> {
        self.instances.iter().find(|i| i.instance_id == instance_id)
    }

    pub fn failures(&self) -> usize {
        self.instances.iter().filter(|i| i.failed()).count()
    }

    /// Every wrapped instance under the theme scope container.
    pub fn root(&self) -> VNode {
        self.instances.iter().fold(
            VNode::element("div").attr("class", self.scope_class.as_str()),
            |root, instance| {
                root.child(instance.wrapped(self.selected.as_deref() == Some(instance.instance_id.as_str())))
            },
        )
    }

    /// Standalone preview document.
    pub fn to_html(&self, title: &str) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n<style>{}\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            escape_html(title),
            CANVAS_BASE_STYLES,
            self.style,
            self.root().to_html()
        );
        html
    }
}

/// Renders every instance of a page.
pub fn render_page(store: &EditorStore, compiler: &Compiler, page_id: &str) -> EditorResult<RenderedPage> {
    let page = store.page(page_id)?;
    let mut instances = Vec::with_capacity(page.instances.len());
    let mut legacy_css = String::new();
    for instance in &page.instances {
        instances.push(render_instance(store, compiler, page_id, instance)?);
        legacy_css.push_str(&legacy_rules(instance));
    }

    let markup: String = instances.iter().map(|i| i.node.to_html()).collect();
    let classes = extract_classes(&markup);
    let mut style = synthesize_for_classes(store.theme(), compiler.config(), &classes);
    style.push_str(&legacy_css);

    let failures = instances.iter().filter(|i| i.failed()).count();
    debug!(page = %page_id, instances = instances.len(), failures, "page rendered");
    Ok(RenderedPage {
        page_id: page_id.to_string(),
        instances,
        style,
        scope_class: compiler.config().theme_scope_class.clone(),
        selected: store.selected().map(str::to_string),
    })
}

/// Renders one instance: compiled when its definition has source, the
/// category fallback otherwise. Compile failures and definitions missing
/// from the library become diagnostic nodes.
pub fn render_instance(
    store: &EditorStore,
    compiler: &Compiler,
    page_id: &str,
    instance: &ComponentInstance,
) -> EditorResult<RenderedInstance> {
    let definition = match store.definition_of(instance) {
        Ok(definition) => definition,
        Err(EditorError::Engine(e @ EngineError::UnknownDefinition { .. })) => {
            warn!(page = %page_id, instance = %instance.id, error = %e, "instance definition missing from library");
            return Ok(RenderedInstance {
                instance_id: instance.id.clone(),
                definition_id: instance.definition_ref.clone(),
                category: Category::Generic,
                node: VNode::diagnostic(e.to_string(), String::new()),
            });
        }
        Err(e) => return Err(e),
    };
    let props = instance.effective_props(definition);
    let category = store
        .library()
        .category_of(&definition.id)
        .unwrap_or_else(|| definition.category());

    let mut node = if definition.has_source() {
        let ctx = CompileContext {
            customizations: Some(&instance.customizations),
            rewrite_theme: true,
        };
        compiler.render_or_diagnostic(&definition.source_text, &props, ctx)
    } else {
        let mut node = render_fallback(category, &props);
        apply_styling_overrides(&mut node, &props);
        node
    };
    apply_legacy_classes(&mut node, &instance.legacy_styles);

    Ok(RenderedInstance {
        instance_id: instance.id.clone(),
        definition_id: definition.id.clone(),
        category,
        node,
    })
}

/// Adds legacy selector classes to the matching elements.
fn apply_legacy_classes(node: &mut VNode, styles: &BTreeMap<String, LegacyStyle>) {
    if styles.values().all(|s| s.tailwind_classes.trim().is_empty()) {
        return;
    }
    node.for_each_element_mut(&mut |element| {
        let Some(style) = styles.get(&node_selector(element)) else {
            return;
        };
        if style.tailwind_classes.trim().is_empty() {
            return;
        }
        let existing = element.get_attr("class").unwrap_or_default().to_string();
        let merged = merge_classes([existing.as_str(), style.tailwind_classes.as_str()]);
        element.set_attr("class", merged);
    });
}

/// Legacy CSS overrides scoped to one instance.
fn legacy_rules(instance: &ComponentInstance) -> String {
    let mut css = String::new();
    for (selector, style) in &instance.legacy_styles {
        if style.custom_css_overrides.is_empty() {
            continue;
        }
        let selector: String = selector
            .chars()
            .filter(|c| !matches!(c, '{' | '}' | '<' | '>' | ';'))
            .collect();
        let _ = write!(
            css,
            "\n[{}=\"{}\"] {} {{ {} }}",
            INSTANCE_ID_ATTR,
            instance.id,
            selector.trim(),
            merge_style("", &style.custom_css_overrides)
        );
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_engine::{ComponentDefinition, ComponentLibrary, Theme};
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> (EditorStore, String) {
        let mut library = ComponentLibrary::new();
        library
            .insert(
                ComponentDefinition::new(
                    "hero_001",
                    r#"function Hero({ title }) { return <section className="card"><h1 className="text-blue-600">{title}</h1><p>Static tagline</p></section>; }"#,
                )
                .with_default_props(json!({ "title": "Hi" })),
            )
            .unwrap();
        library
            .insert(ComponentDefinition::new("cta_001", "function Broken( {"))
            .unwrap();
        library
            .insert(ComponentDefinition::new("footer_001", "").with_default_props(json!({ "copyright": "© 2024" })))
            .unwrap();
        let mut store = EditorStore::new("p1", Arc::new(library));
        let page = store.add_page("Home");
        store.set_theme(Theme {
            primary_color: "#FF0000".into(),
            ..Theme::default()
        });
        (store, page)
    }

    #[test]
    fn instances_are_wrapped_and_themed() {
        let (mut store, page) = store();
        let hero = store.add_instance(&page, "hero_001").unwrap();
        store.add_instance(&page, "footer_001").unwrap();
        store.select_instance(Some(&hero)).unwrap();

        let rendered = render_page(&store, &Compiler::default(), &page).unwrap();
        assert_eq!(rendered.failures(), 0);
        let html = rendered.root().to_html();
        assert!(html.starts_with(r#"<div class="pc-theme"><div class="pc-instance pc-hero pc-selected" data-instance-id=""#), "{html}");
        assert!(html.contains(r#"<h1 class="text-theme-primary">Hi</h1>"#), "{html}");
        assert!(html.contains("pc-instance pc-footer"), "{html}");
        assert!(rendered.style.contains("--pc-primary: #FF0000;"));
        assert!(rendered.style.contains(".text-theme-primary"));
    }

    #[test]
    fn broken_source_renders_a_diagnostic_without_failing_the_page() {
        let (mut store, page) = store();
        store.add_instance(&page, "cta_001").unwrap();
        store.add_instance(&page, "hero_001").unwrap();
        let rendered = render_page(&store, &Compiler::default(), &page).unwrap();
        assert_eq!(rendered.failures(), 1);
        assert!(rendered.instances[0].failed());
        assert!(!rendered.instances[1].failed());
        let doc = rendered.to_html("Home");
        assert!(doc.contains("<title>Home</title>"));
        assert!(doc.contains("pc-diagnostic"));
    }

    #[test]
    fn missing_definitions_do_not_stop_the_page() {
        let (mut store, page) = store();
        store.add_instance(&page, "hero_001").unwrap();
        store.add_instance(&page, "footer_001").unwrap();
        let mut snapshot = store.snapshot();
        snapshot.pages[0].instances[0].definition_ref = "gone_001".to_string();
        let restored = EditorStore::from_snapshot(snapshot, Arc::new(store.library().clone()));

        let rendered = render_page(&restored, &Compiler::default(), &page).unwrap();
        assert_eq!(rendered.instances.len(), 2);
        assert_eq!(rendered.failures(), 1);
        assert_eq!(rendered.instances[0].category, Category::Generic);
        assert!(rendered.instances[0].node.to_html().contains("gone_001"));
        assert!(!rendered.instances[1].failed());
        assert!(rendered.root().to_html().contains("pc-instance pc-footer"));
    }

    #[test]
    fn legacy_styles_reach_markup_and_stylesheet() {
        let (mut store, page) = store();
        let hero = store.add_instance(&page, "hero_001").unwrap();
        let style = LegacyStyle {
            tailwind_classes: "shadow-lg".into(),
            custom_css_overrides: BTreeMap::from([("borderColor".to_string(), "red".to_string())]),
        };
        store.set_legacy_style(&page, &hero, ".card", style).unwrap();
        store
            .set_legacy_override(&page, &hero, "p_content", json!("Custom"))
            .unwrap();

        let rendered = render_page(&store, &Compiler::default(), &page).unwrap();
        let html = rendered.instances[0].node.to_html();
        assert!(html.contains(r#"<section class="card shadow-lg">"#), "{html}");
        assert!(html.contains("<p>Custom</p>"), "{html}");
        assert!(
            rendered
                .style
                .contains(&format!(r#"[data-instance-id="{hero}"] .card {{ border-color:red }}"#)),
            "{}",
            rendered.style
        );
    }
}
