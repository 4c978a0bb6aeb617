use pagecraft_engine::compiler::{CompileContext, Compiler, EntryPoint};
use pagecraft_engine::tailwind::extract_classes;
use pagecraft_engine::theme::{adjust_brightness, parse_hex, rewrite_source, synthesize_for_classes};
use pagecraft_engine::{
    inspect, normalize, render_fallback, Category, CompileErrorKind, ComponentDefinition,
    EditTarget, EngineConfig, NodePath, PropKind, Theme, VNode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn red_theme() -> Theme {
    Theme {
        primary_color: "#FF0000".to_string(),
        ..Theme::default()
    }
}

// End-to-end scenarios

#[test]
fn test_hero_renders_with_theme_primary() {
    let compiler = Compiler::default();
    let source = r#"function Hero(props){ return <h1 className="text-blue-600">{props.title}</h1>; }"#;
    let props = normalize(&json!({ "title": "Hi" }));

    let node = compiler
        .render(source, &props, CompileContext::default())
        .expect("hero should render");
    let html = node.to_html();
    assert_eq!(html, r#"<h1 class="text-theme-primary">Hi</h1>"#);

    let css = synthesize_for_classes(&red_theme(), compiler.config(), &extract_classes(&html));
    assert!(css.contains("--pc-primary: #FF0000;"));
    assert!(css.contains(".pc-theme .text-theme-primary { color: var(--pc-primary); }"));
}

#[test]
fn test_helper_functions_are_not_entry_points() {
    let compiler = Compiler::default();
    let source = r#"
        function _helper(year) { return "© " + year; }
        function Footer(props) {
            return <footer><p>{_helper(props.year)}</p></footer>;
        }
    "#;
    let compiled = compiler.compile(source, CompileContext::default()).unwrap();
    assert_eq!(compiled.entry, EntryPoint::Named("Footer".to_string()));

    let html = compiler
        .render(source, &normalize(&json!({ "year": "2024" })), CompileContext::default())
        .unwrap()
        .to_html();
    assert_eq!(html, "<footer><p>© 2024</p></footer>");
}

// Containment

#[test]
fn test_malformed_sources_never_escape_the_compiler() {
    let compiler = Compiler::default();
    let cases = [
        ("function Broken( { return <div>; }", CompileErrorKind::Syntax),
        ("function Ghost() { return <div>{notDefined}</div>; }", CompileErrorKind::Execution),
        (
            "function Header() { return <header />; }\nfunction Footer() { return <footer />; }",
            CompileErrorKind::EntryNotFound,
        ),
        ("const x = 1;", CompileErrorKind::EntryNotFound),
        ("function Deep() { return Deep(); }", CompileErrorKind::BudgetExceeded),
        ("function Thrower() { throw new Error('boom'); }", CompileErrorKind::Execution),
    ];
    for (source, expected) in cases {
        let err = compiler
            .render(source, &normalize(&json!({})), CompileContext::default())
            .expect_err(source);
        assert_eq!(err.kind, expected, "{source}: {}", err.message);
        assert!(!err.source_text.is_empty());

        let node = compiler.render_or_diagnostic(source, &normalize(&json!({})), CompileContext::default());
        assert!(node.is_diagnostic());
    }
}

#[test]
fn test_deep_operator_chains_become_diagnostics() {
    let compiler = Compiler::default();
    let sums = vec!["1"; 10_000].join("+");
    let nots = "!".repeat(10_000);
    let sources = [
        format!("function Deep() {{ return <p>{{{sums}}}</p>; }}"),
        format!("function Deep() {{ return <p>{{{nots}true}}</p>; }}"),
        format!("function Deep() {{ return <p>{{a{}}}</p>; }}", ".b".repeat(10_000)),
    ];
    for source in &sources {
        let err = compiler
            .render(source, &normalize(&json!({})), CompileContext::default())
            .expect_err("deep chain must be rejected");
        assert_eq!(err.kind, CompileErrorKind::Syntax);
        assert!(err.message.contains("nesting depth"), "{}", err.message);

        let node = compiler.render_or_diagnostic(source, &normalize(&json!({})), CompileContext::default());
        assert!(node.is_diagnostic());
    }

    let html = compiler
        .render(
            "function Sum() { return <p>{1 + 2 + 3 + 4}{!!true ? 'y' : 'n'}</p>; }",
            &normalize(&json!({})),
            CompileContext::default(),
        )
        .unwrap()
        .to_html();
    assert_eq!(html, "<p>10y</p>");
}

#[test]
fn test_thrown_error_message_reaches_the_diagnostic() {
    let compiler = Compiler::default();
    let node = compiler.render_or_diagnostic(
        "function Thrower() { throw new Error('boom'); }",
        &normalize(&json!({})),
        CompileContext::default(),
    );
    match node {
        VNode::Diagnostic { message, source } => {
            assert_eq!(message, "Error: boom");
            assert!(source.contains("Thrower"));
        }
        other => panic!("expected diagnostic, got {other:?}"),
    }
}

#[test]
fn test_arrow_helpers_do_not_compete_with_the_component() {
    let compiler = Compiler::default();
    let source = r#"
        const formatPrice = (p) => '$' + p;
        function Pricing(props) {
            return <p>{formatPrice(props.price)}</p>;
        }
    "#;
    let compiled = compiler.compile(source, CompileContext::default()).unwrap();
    assert_eq!(compiled.entry, EntryPoint::Named("Pricing".to_string()));
    let html = compiler
        .render(source, &normalize(&json!({ "price": "9" })), CompileContext::default())
        .unwrap()
        .to_html();
    assert_eq!(html, "<p>$9</p>");
}

// Determinism and caching

#[test]
fn test_renders_are_deterministic_across_cache_paths() {
    let source = r#"
        import { useState, useId } from 'react';
        const Stats = ({ items }) => {
            const [count] = useState(items.length);
            const id = useId();
            return (
                <section id={id} data-random={Math.random().toFixed(6)}>
                    <h2>{count} stats</h2>
                    {items.map((s, i) => <div key={i}><strong>{s.value}</strong> {s.label}</div>)}
                </section>
            );
        };
    "#;
    let props = normalize(&json!({ "items": [{ "value": "10k", "label": "users" }, { "value": "99%", "label": "uptime" }] }));

    let compiler = Compiler::default();
    let miss = compiler.render(source, &props, CompileContext::default()).unwrap();
    let hit = compiler.render(source, &props, CompileContext::default()).unwrap();
    let fresh = Compiler::default()
        .render(source, &props, CompileContext::default())
        .unwrap();

    assert_eq!(miss, hit);
    assert_eq!(miss, fresh);
    assert_eq!(compiler.cache_stats().hits, 1);
    assert!(miss.to_html().contains("<strong>99%</strong> uptime"));
}

#[test]
fn test_source_change_invalidates_cache_entry() {
    let compiler = Compiler::default();
    let props = normalize(&json!({}));
    let a = compiler
        .render("function Card() { return <p>a</p>; }", &props, CompileContext::default())
        .unwrap();
    let b = compiler
        .render("function Card() { return <p>b</p>; }", &props, CompileContext::default())
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(compiler.cache_len(), 2);
}

// Theme targeting

#[test]
fn test_rewrite_targets_only_color_classes() {
    let src = r#"<button className="bg-blue-500 text-gray-900 hover:bg-blue-600 px-4 rounded-lg">Go</button>"#;
    assert_eq!(
        rewrite_source(src),
        r#"<button className="bg-theme-primary text-theme-foreground hover:bg-theme-primary-hover px-4 rounded-lg">Go</button>"#
    );

    let classes = ["bg-theme-primary", "text-theme-foreground", "hover:bg-theme-primary-hover"];
    let css = synthesize_for_classes(&red_theme(), &EngineConfig::default(), &classes);
    assert!(css.contains("background-color: var(--pc-primary);"));
    assert!(css.contains("color: var(--pc-foreground);"));
    assert!(css.contains(":hover { background-color: var(--pc-primary-hover); }"));
    assert!(css.contains("--pc-primary-hover: #e60000;"));
}

#[test]
fn test_rewrite_leaves_text_content_alone() {
    let compiler = Compiler::default();
    let html = compiler
        .render(
            r#"function Hint() { return <p className="p-4 text-red-500">Use text-red-500 for errors</p>; }"#,
            &normalize(&json!({})),
            CompileContext::default(),
        )
        .unwrap()
        .to_html();
    assert_eq!(html, r#"<p class="p-4 text-theme-secondary">Use text-red-500 for errors</p>"#);
}

#[test]
fn test_rewrite_can_be_disabled_per_render() {
    let compiler = Compiler::default();
    let ctx = CompileContext {
        customizations: None,
        rewrite_theme: false,
    };
    let html = compiler
        .render(r#"function A() { return <p className="text-blue-600">x</p>; }"#, &normalize(&json!({})), ctx)
        .unwrap()
        .to_html();
    assert_eq!(html, r#"<p class="text-blue-600">x</p>"#);
}

#[test]
fn test_color_math() {
    assert_eq!(adjust_brightness("#10B981", 0.0), "#10B981");
    let darker = parse_hex(&adjust_brightness("#10B981", -0.1)).unwrap();
    let base = parse_hex("#10B981").unwrap();
    assert!(darker.r <= base.r && darker.g < base.g && darker.b < base.b);
    assert_eq!(adjust_brightness("not-a-color", 0.2), "not-a-color");
}

// Styling overrides, inspection and fallbacks

#[test]
fn test_marked_output_is_styled_and_inspectable() {
    let compiler = Compiler::default();
    let source = r#"
        export default function Features({ title, features }) {
            return (
                <section>
                    <h2 data-prop-path="title" data-editable="text">{title}</h2>
                    {features.map((f, i) => (
                        <article key={i} data-prop-path={`features.${i}`}>
                            <h3 data-prop-path={`features.${i}.title`} data-editable="text">{f.title}</h3>
                        </article>
                    ))}
                </section>
            );
        }
    "#;
    let props = normalize(&json!({
        "title": { "kind": "text", "value": "Why us", "tailwindClasses": "uppercase", "customCssOverrides": {} },
        "features": [
            { "title": "Fast", "tailwindClasses": "shadow", "customCssOverrides": { "borderColor": "red" } },
            { "title": "Safe" }
        ]
    }));
    let node = compiler.render(source, &props, CompileContext::default()).unwrap();
    let html = node.to_html();
    assert!(html.contains(r#"<h2 data-prop-path="title" data-editable="text" class="uppercase">Why us</h2>"#), "{html}");
    assert!(html.contains(r#"<article data-prop-path="features.0" class="shadow" style="border-color:red">"#), "{html}");

    let title = inspect(&node, &NodePath(vec![1, 0, 0]), &props).unwrap();
    match title.target {
        EditTarget::Prop { path, prop_kind, current } => {
            assert_eq!(path.to_string(), "features.0.title");
            assert_eq!(prop_kind, PropKind::Text);
            assert_eq!(current, json!("Fast"));
        }
        other => panic!("unexpected target {other:?}"),
    }
    let card = inspect(&node, &NodePath(vec![2]), &props).unwrap();
    assert!(matches!(card.target, EditTarget::Prop { prop_kind: PropKind::Object, .. }));
}

#[test]
fn test_definitions_without_source_use_category_fallbacks() {
    let definition = ComponentDefinition::new("pricing_002", "").with_default_props(json!({
        "title": "Plans",
        "plans": [{ "name": "Pro", "price": "$9" }]
    }));
    assert!(!definition.has_source());
    assert_eq!(definition.category(), Category::Pricing);
    let node = render_fallback(definition.category(), &definition.normalized_defaults());
    let html = node.to_html();
    assert!(html.contains(r#"data-prop-path="plans.0.price" data-editable="text">$9</p>"#), "{html}");
}
