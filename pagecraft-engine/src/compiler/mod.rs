//! Dynamic compiler: component source text in, renderable [`VNode`] out.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. theme token rewrite and legacy customization substitution
//! 2. module syntax strip (imports recorded, exports dropped)
//! 3. parse and lower JSX into element construction calls
//! 4. entry point resolution
//! 5. execution in a fresh [`Interpreter`] per render
//! 6. validation of the result into a [`VNode`]
//!
//! Steps 2 to 4 are cached per prepared source text. Every failure along
//! the way ends up as a [`CompileError`]; [`Compiler::render_or_diagnostic`]
//! turns those into an inert diagnostic node.

mod cache;
mod customize;
mod entry;
mod strip;

pub use cache::{source_hash, CacheStats, RenderCache};
pub use customize::{apply_customizations, Customizations, CONTENT_KEY_SUFFIX};
pub use entry::{entry_candidates, is_helper_name, resolve_entry, EntryPoint};
pub use strip::{strip_module_syntax, ImportBinding, StrippedSource};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{CompileError, CompileErrorKind, CompileResult};
use crate::jsx::ast::Program;
use crate::jsx::{lower_program, parse_program, print_program};
use crate::props::{render_props, PropMap};
use crate::render::apply_styling_overrides;
use crate::runtime::{import_binding, to_vnode, Interpreter, Interrupt, Value};
use crate::theme::rewrite_source;
use crate::vdom::VNode;

/// Per-render inputs that change the prepared source text.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    pub customizations: Option<&'a Customizations>,
    pub rewrite_theme: bool,
}

impl Default for CompileContext<'_> {
    fn default() -> Self {
        Self {
            customizations: None,
            rewrite_theme: true,
        }
    }
}

/// A parsed, lowered program with its resolved entry point. Immutable and
/// shareable across threads; every render runs it in a fresh interpreter.
#[derive(Debug)]
pub struct CompiledComponent {
    pub source_text: String,
    pub entry: EntryPoint,
    pub imports: Vec<ImportBinding>,
    program: Program,
    transpiled: String,
}

impl CompiledComponent {
    /// The lowered program printed back as plain JavaScript.
    pub fn transpiled(&self) -> &str {
        &self.transpiled
    }

    /// Runs the component against `props` (the plain projection component
    /// code sees, see [`render_props`]).
    pub fn render(&self, props: &serde_json::Value, config: &EngineConfig) -> CompileResult<VNode> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.execute(props, config))) {
            Ok(result) => result,
            Err(payload) => Err(self.error(
                CompileErrorKind::Execution,
                format!("Internal error while rendering: {}", panic_message(&*payload)),
            )),
        }
    }

    fn execute(&self, props: &serde_json::Value, config: &EngineConfig) -> CompileResult<VNode> {
        let mut interp = Interpreter::new(config);
        for import in &self.imports {
            let value = import_binding(&import.module, import.imported.as_deref(), &import.local);
            interp.define_global(&import.local, value);
        }
        let result = self
            .invoke(&mut interp, Value::from_json(props))
            .map_err(|interrupt| self.interrupt_error(interrupt))?;
        debug!(steps = interp.steps(), "component executed");
        to_vnode(&result, config.max_nesting_depth)
            .map_err(|message| self.error(CompileErrorKind::InvalidOutput, message))
    }

    fn invoke(&self, interp: &mut Interpreter, props: Value) -> Result<Value, Interrupt> {
        interp.run_program(&self.program)?;
        match &self.entry {
            EntryPoint::Named(name) => {
                let function = interp.global().lookup(name).ok_or_else(|| {
                    Interrupt::error("ReferenceError", format!("{name} is not defined"))
                })?;
                interp.call(&function, Value::Undefined, vec![props])
            }
            EntryPoint::Expression(expr) => {
                interp.define_global("props", props.clone());
                let global = interp.global().clone();
                let value = interp.eval(expr, &global)?;
                match value {
                    Value::Function(_) => interp.call(&value, Value::Undefined, vec![props]),
                    other => Ok(other),
                }
            }
        }
    }

    fn interrupt_error(&self, interrupt: Interrupt) -> CompileError {
        let kind = match interrupt {
            Interrupt::Budget(_) => CompileErrorKind::BudgetExceeded,
            Interrupt::Throw(_) => CompileErrorKind::Execution,
        };
        self.error(kind, interrupt.message())
    }

    fn error(&self, kind: CompileErrorKind, message: impl Into<String>) -> CompileError {
        CompileError::new(kind, message, &self.source_text)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Steps 2 to 4 of the pipeline on already prepared source.
pub fn compile_source(source: &str, config: &EngineConfig) -> CompileResult<CompiledComponent> {
    let stripped = strip_module_syntax(source);
    let parsed = parse_program(&stripped.code, config.max_nesting_depth).map_err(|e| CompileError {
        source_text: source.to_string(),
        ..e
    })?;
    let mut program = lower_program(parsed);
    let entry = resolve_entry(&mut program, source)?;
    let transpiled = print_program(&program);
    Ok(CompiledComponent {
        source_text: source.to_string(),
        entry,
        imports: stripped.imports,
        program,
        transpiled,
    })
}

pub struct Compiler {
    config: EngineConfig,
    cache: RenderCache,
}

impl Compiler {
    pub fn new(config: EngineConfig) -> Self {
        let cache = RenderCache::new(config.cache_capacity);
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Step 1: theme token rewrite, then legacy customization substitution.
    pub fn prepare_source(&self, source: &str, ctx: CompileContext<'_>) -> String {
        let rewritten = if self.config.rewrite_theme_tokens && ctx.rewrite_theme {
            rewrite_source(source)
        } else {
            source.to_string()
        };
        match ctx.customizations {
            Some(customizations) if !customizations.is_empty() => {
                apply_customizations(&rewritten, customizations)
            }
            _ => rewritten,
        }
    }

    #[instrument(skip_all, fields(len = source.len()))]
    pub fn compile(
        &self,
        source: &str,
        ctx: CompileContext<'_>,
    ) -> CompileResult<Arc<CompiledComponent>> {
        let prepared = self.prepare_source(source, ctx);
        self.cache.get_or_compile(&prepared, || {
            compile_source(&prepared, &self.config).map(Arc::new)
        })
    }

    /// Compiles and renders with normalized props, then layers each marked
    /// element's styling overrides on top.
    #[instrument(skip_all, fields(len = source.len()))]
    pub fn render(
        &self,
        source: &str,
        props: &PropMap,
        ctx: CompileContext<'_>,
    ) -> CompileResult<VNode> {
        let compiled = self.compile(source, ctx)?;
        let mut node = compiled.render(&render_props(props), &self.config)?;
        apply_styling_overrides(&mut node, props);
        Ok(node)
    }

    /// Like [`Compiler::render`], but a failure becomes a diagnostic node.
    pub fn render_or_diagnostic(
        &self,
        source: &str,
        props: &PropMap,
        ctx: CompileContext<'_>,
    ) -> VNode {
        match self.render(source, props, ctx) {
            Ok(node) => node,
            Err(e) => {
                warn!(kind = ?e.kind, error = %e.describe(), "component failed to render");
                VNode::diagnostic(e.describe(), e.source_text)
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render_html(source: &str, props: serde_json::Value) -> CompileResult<String> {
        let compiler = Compiler::default();
        compiler
            .render(source, &normalize(&props), CompileContext::default())
            .map(|node| node.to_html())
    }

    #[test]
    fn renders_function_declaration() {
        let html = render_html(
            "import React from 'react';\nexport default function Hero(props) { return <h1>{props.title}</h1>; }",
            json!({ "title": "Hi" }),
        )
        .unwrap();
        assert_eq!(html, "<h1>Hi</h1>");
    }

    #[test]
    fn renders_arrow_assigned_to_const() {
        let html = render_html(
            "const Badge = ({ label = 'new' }) => <span className=\"badge\">{label}</span>;\nexport default Badge;",
            json!({}),
        )
        .unwrap();
        assert_eq!(html, r#"<span class="badge">new</span>"#);
    }

    #[test]
    fn renders_bare_jsx_expression() {
        let html = render_html("<p>{props.text}</p>", json!({ "text": "bare" })).unwrap();
        assert_eq!(html, "<p>bare</p>");
    }

    #[test]
    fn uses_hooks_and_maps_lists() {
        let source = r#"
            import { useState } from 'react';
            function List({ items }) {
                const [open] = useState(true);
                return <ul>{open && items.map((item, i) => <li key={i}>{item.label}</li>)}</ul>;
            }
        "#;
        let html = render_html(source, json!({ "items": [{ "label": "a" }, { "label": "b" }] })).unwrap();
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn icon_imports_render_placeholders() {
        let source = "import { Star } from 'lucide-react';\nfunction Rating() { return <div><Star className=\"w-4\" /></div>; }";
        let html = render_html(source, json!({})).unwrap();
        assert!(html.contains(r#"data-icon="Star""#), "{html}");
    }

    #[test]
    fn syntax_errors_carry_original_source() {
        let source = "import React from 'react';\nfunction Broken() { return <div>; }";
        let err = render_html(source, json!({})).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Syntax);
        assert_eq!(err.source_text, source);
        assert_eq!(err.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn thrown_errors_become_execution_errors() {
        let err = render_html("function Boom() { return missing.value; }", json!({})).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Execution);
        assert!(err.message.contains("missing is not defined"), "{}", err.message);
    }

    #[test]
    fn infinite_loops_hit_the_budget() {
        let source = "function Spin() { const f = (n) => f(n + 1); return f(0); }";
        let err = render_html(source, json!({})).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::BudgetExceeded);
    }

    #[test]
    fn object_results_are_invalid_output() {
        let err = render_html("function Obj() { return { a: 1 }; }", json!({})).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::InvalidOutput);
    }

    #[test]
    fn failures_render_as_diagnostics() {
        let compiler = Compiler::default();
        let node = compiler.render_or_diagnostic("function A() {", &PropMap::new(), CompileContext::default());
        assert!(node.is_diagnostic());
        assert!(node.to_html().contains("function A() {"));
    }

    #[test]
    fn identical_source_hits_the_cache() {
        let compiler = Compiler::default();
        let src = "function Card() { return <div />; }";
        let first = compiler.compile(src, CompileContext::default()).unwrap();
        let second = compiler.compile(&src.to_string(), CompileContext::default()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.cache_stats().hits, 1);
    }

    #[test]
    fn customizations_are_substituted_before_compiling() {
        let compiler = Compiler::default();
        let mut custom = Customizations::new();
        custom.insert("h1_content".into(), json!("Custom"));
        let ctx = CompileContext {
            customizations: Some(&custom),
            rewrite_theme: true,
        };
        let node = compiler
            .render("function Hero() { return <h1>Default</h1>; }", &PropMap::new(), ctx)
            .unwrap();
        assert_eq!(node.to_html(), "<h1>Custom</h1>");
    }

    #[test]
    fn transpiled_output_has_no_jsx() {
        let compiler = Compiler::default();
        let compiled = compiler
            .compile("function Hero() { return <h1>x</h1>; }", CompileContext::default())
            .unwrap();
        assert!(compiled.transpiled().contains("React.createElement(\"h1\""));
    }
}
