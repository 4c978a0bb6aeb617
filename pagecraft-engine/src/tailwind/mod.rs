//! Utility-class plumbing shared by the theme stylesheet and the editors.
//!
//! Scans rendered HTML for `class="..."` attributes, handles variant
//! prefixes (`hover:`, `md:`, `group-hover:`, ...) and renders [`CssRule`]s
//! into a CSS string ready to inject into a `<style>` tag.

pub mod parser;
pub mod variants;

pub use parser::{extract_classes, merge_classes, split_classes};
pub use variants::{apply_variants, escape_selector, is_known_variant, split_variants, BREAKPOINTS};

/// One CSS rule: selector, ordered declarations and an optional at-rule wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
    pub media_query: Option<String>,
}

impl CssRule {
    pub fn new(selector: impl Into<String>, declarations: Vec<(String, String)>) -> Self {
        Self {
            selector: selector.into(),
            declarations,
            media_query: None,
        }
    }

    /// Nests every comma-separated selector under `.{scope}`.
    pub fn scoped(mut self, scope: &str) -> Self {
        self.selector = self
            .selector
            .split(',')
            .map(|s| format!(".{} {}", scope, s.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        self
    }
}

pub fn render_css(rules: &[CssRule]) -> String {
    let mut css = String::new();
    for rule in rules {
        if rule.declarations.is_empty() {
            continue;
        }
        match &rule.media_query {
            None => {
                push_rule_body(&mut css, rule);
                css.push('\n');
            }
            Some(mq) => {
                css.push_str(mq);
                css.push_str(" {\n  ");
                push_rule_body(&mut css, rule);
                css.push_str("\n}\n");
            }
        }
    }
    css
}

fn push_rule_body(css: &mut String, rule: &CssRule) {
    css.push_str(&rule.selector);
    css.push_str(" {");
    for (prop, val) in &rule.declarations {
        css.push(' ');
        css.push_str(prop);
        css.push_str(": ");
        css.push_str(val);
        css.push(';');
    }
    css.push_str(" }");
}
