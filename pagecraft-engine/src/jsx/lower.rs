//! Lowers JSX nodes into `React.createElement(type, props, ...children)` calls.
//!
//! After [`lower_program`] no [`Expr::Jsx`] remains anywhere in the tree.

use std::sync::Arc;

use super::ast::*;
use super::parser::decode_entities;

pub fn lower_program(program: Program) -> Program {
    Program {
        body: program.body.into_iter().map(lower_stmt).collect(),
    }
}

fn lower_stmt(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(e) => Stmt::Expr(lower_expr(e)),
        Stmt::VarDecl { kind, declarations } => Stmt::VarDecl {
            kind,
            declarations: declarations
                .into_iter()
                .map(|d| VarDeclarator {
                    pattern: lower_pattern(d.pattern),
                    init: d.init.map(lower_expr),
                })
                .collect(),
        },
        Stmt::Function(f) => Stmt::Function(lower_function(&f)),
        Stmt::Return(e) => Stmt::Return(e.map(lower_expr)),
        Stmt::If {
            test,
            consequent,
            alternate,
        } => Stmt::If {
            test: lower_expr(test),
            consequent: Box::new(lower_stmt(*consequent)),
            alternate: alternate.map(|s| Box::new(lower_stmt(*s))),
        },
        Stmt::ForOf {
            kind,
            pattern,
            iterable,
            body,
        } => Stmt::ForOf {
            kind,
            pattern: lower_pattern(pattern),
            iterable: lower_expr(iterable),
            body: Box::new(lower_stmt(*body)),
        },
        Stmt::Block(body) => Stmt::Block(body.into_iter().map(lower_stmt).collect()),
        Stmt::Throw(e) => Stmt::Throw(lower_expr(e)),
        Stmt::Empty => Stmt::Empty,
    }
}

fn lower_function(f: &Function) -> Arc<Function> {
    Arc::new(Function {
        name: f.name.clone(),
        params: f
            .params
            .iter()
            .cloned()
            .map(|p| Param {
                pattern: lower_pattern(p.pattern),
                default: p.default.map(lower_expr),
                rest: p.rest,
            })
            .collect(),
        body: match &f.body {
            FunctionBody::Block(stmts) => {
                FunctionBody::Block(stmts.iter().cloned().map(lower_stmt).collect())
            }
            FunctionBody::Expr(e) => FunctionBody::Expr(Box::new(lower_expr((**e).clone()))),
        },
        is_arrow: f.is_arrow,
        location: f.location,
    })
}

/// Defaults inside destructuring patterns may hold JSX too.
fn lower_pattern(pattern: Pattern) -> Pattern {
    match pattern {
        Pattern::Ident(_) => pattern,
        Pattern::Object { properties, rest } => Pattern::Object {
            properties: properties
                .into_iter()
                .map(|p| ObjectPatternProp {
                    key: p.key,
                    value: lower_pattern(p.value),
                    default: p.default.map(lower_expr),
                })
                .collect(),
            rest,
        },
        Pattern::Array { elements, rest } => Pattern::Array {
            elements: elements
                .into_iter()
                .map(|e| {
                    e.map(|e| PatternElement {
                        pattern: lower_pattern(e.pattern),
                        default: e.default.map(lower_expr),
                    })
                })
                .collect(),
            rest,
        },
    }
}

fn lower_boxed(e: Box<Expr>) -> Box<Expr> {
    Box::new(lower_expr(*e))
}

fn lower_elements(elements: Vec<ArrayElement>) -> Vec<ArrayElement> {
    elements
        .into_iter()
        .map(|e| match e {
            ArrayElement::Expr(e) => ArrayElement::Expr(lower_expr(e)),
            ArrayElement::Spread(e) => ArrayElement::Spread(lower_expr(e)),
            ArrayElement::Hole => ArrayElement::Hole,
        })
        .collect()
}

pub fn lower_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Jsx(element) => lower_element(*element),
        Expr::Template { quasis, exprs } => Expr::Template {
            quasis,
            exprs: exprs.into_iter().map(lower_expr).collect(),
        },
        Expr::Array(elements) => Expr::Array(lower_elements(elements)),
        Expr::Object(props) => Expr::Object(
            props
                .into_iter()
                .map(|p| match p {
                    ObjectProp::KeyValue(PropKey::Computed(k), v) => {
                        ObjectProp::KeyValue(PropKey::Computed(lower_expr(k)), lower_expr(v))
                    }
                    ObjectProp::KeyValue(k, v) => ObjectProp::KeyValue(k, lower_expr(v)),
                    ObjectProp::Spread(e) => ObjectProp::Spread(lower_expr(e)),
                    shorthand @ ObjectProp::Shorthand(_) => shorthand,
                })
                .collect(),
        ),
        Expr::Function(f) => Expr::Function(lower_function(&f)),
        Expr::Member {
            object,
            property,
            optional,
        } => Expr::Member {
            object: lower_boxed(object),
            property,
            optional,
        },
        Expr::Index {
            object,
            index,
            optional,
        } => Expr::Index {
            object: lower_boxed(object),
            index: lower_boxed(index),
            optional,
        },
        Expr::Call {
            callee,
            args,
            optional,
        } => Expr::Call {
            callee: lower_boxed(callee),
            args: lower_elements(args),
            optional,
        },
        Expr::New { callee, args } => Expr::New {
            callee: lower_boxed(callee),
            args: lower_elements(args),
        },
        Expr::Unary { op, expr } => Expr::Unary {
            op,
            expr: lower_boxed(expr),
        },
        Expr::Update { op, prefix, target } => Expr::Update {
            op,
            prefix,
            target: lower_boxed(target),
        },
        Expr::Binary { op, left, right } => Expr::Binary {
            op,
            left: lower_boxed(left),
            right: lower_boxed(right),
        },
        Expr::Logical { op, left, right } => Expr::Logical {
            op,
            left: lower_boxed(left),
            right: lower_boxed(right),
        },
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => Expr::Conditional {
            test: lower_boxed(test),
            consequent: lower_boxed(consequent),
            alternate: lower_boxed(alternate),
        },
        Expr::Assign { op, target, value } => Expr::Assign {
            op,
            target: lower_boxed(target),
            value: lower_boxed(value),
        },
        Expr::Sequence(exprs) => Expr::Sequence(exprs.into_iter().map(lower_expr).collect()),
        leaf => leaf,
    }
}

fn react_member(name: &str) -> Expr {
    Expr::Member {
        object: Box::new(Expr::Ident("React".to_string())),
        property: name.to_string(),
        optional: false,
    }
}

fn lower_element(element: JsxElement) -> Expr {
    let element_type = match element.name {
        JsxName::Tag(tag) => Expr::Str(tag),
        JsxName::Fragment => react_member("Fragment"),
        JsxName::Component(path) => {
            let mut segments = path.into_iter();
            let first = segments.next().unwrap_or_default();
            segments.fold(Expr::Ident(first), |object, property| Expr::Member {
                object: Box::new(object),
                property,
                optional: false,
            })
        }
    };

    let props = if element.attributes.is_empty() {
        Expr::Null
    } else {
        Expr::Object(
            element
                .attributes
                .into_iter()
                .map(|attr| match attr {
                    JsxAttribute::Spread(e) => ObjectProp::Spread(lower_expr(e)),
                    JsxAttribute::Named { name, value } => {
                        let value = match value {
                            None => Expr::Bool(true),
                            Some(JsxAttrValue::Str(s)) => Expr::Str(s),
                            Some(JsxAttrValue::Expr(e)) => lower_expr(e),
                            Some(JsxAttrValue::Element(el)) => lower_element(el),
                        };
                        ObjectProp::KeyValue(PropKey::Named(name), value)
                    }
                })
                .collect(),
        )
    };

    let mut args = vec![ArrayElement::Expr(element_type), ArrayElement::Expr(props)];
    for child in element.children {
        match child {
            JsxChild::Text(raw) => {
                if let Some(text) = clean_jsx_text(&raw) {
                    args.push(ArrayElement::Expr(Expr::Str(text)));
                }
            }
            JsxChild::Expr(e) => args.push(ArrayElement::Expr(lower_expr(e))),
            JsxChild::Element(el) => args.push(ArrayElement::Expr(lower_element(el))),
        }
    }

    Expr::Call {
        callee: Box::new(react_member("createElement")),
        args,
        optional: false,
    }
}

/// JSX whitespace rules: lines are trimmed where they touch a line break,
/// blank lines vanish, and the remaining lines are joined with one space.
fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let last_non_empty = lines.iter().rposition(|l| !l.trim().is_empty())?;
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed: &str = line;
        if i != 0 {
            trimmed = trimmed.trim_start_matches([' ', '\t']);
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches([' ', '\t']);
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(&trimmed.replace('\t', " "));
        if i != last_non_empty {
            out.push(' ');
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(decode_entities(&out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsx::parser::parse_expression;

    fn lowered(src: &str) -> Expr {
        lower_expr(parse_expression(src, 64).unwrap())
    }

    #[test]
    fn element_becomes_create_element_call() {
        let Expr::Call { callee, args, .. } = lowered(r#"<a href="/x" disabled>Go</a>"#) else {
            panic!("expected call");
        };
        assert_eq!(*callee, react_member("createElement"));
        assert_eq!(args[0], ArrayElement::Expr(Expr::Str("a".to_string())));
        let ArrayElement::Expr(Expr::Object(props)) = &args[1] else {
            panic!("expected props object");
        };
        assert_eq!(
            props[1],
            ObjectProp::KeyValue(PropKey::Named("disabled".to_string()), Expr::Bool(true))
        );
        assert_eq!(args[2], ArrayElement::Expr(Expr::Str("Go".to_string())));
    }

    #[test]
    fn whitespace_only_text_is_dropped() {
        let Expr::Call { args, .. } = lowered("<div>\n    <span/>\n  </div>") else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 3);
        assert_eq!(args[1], ArrayElement::Expr(Expr::Null));
    }

    #[test]
    fn multiline_text_is_joined() {
        assert_eq!(
            clean_jsx_text("\n   Build   faster\n   with us  \n").as_deref(),
            Some("Build   faster with us")
        );
        assert_eq!(clean_jsx_text(" a ").as_deref(), Some(" a "));
    }

    #[test]
    fn nested_jsx_inside_expressions_is_lowered() {
        let expr = lowered("items.map(i => <li key={i}>{i}</li>)");
        let printed = format!("{:?}", expr);
        assert!(!printed.contains("Jsx("));
    }
}
