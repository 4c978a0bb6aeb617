//! Prints a lowered [`Program`] back to plain JavaScript.
//!
//! The output is what the render cache stores as the transpiled form of a
//! component and what `pagecraft-check --emit` shows.

use std::fmt::Write;

use super::ast::*;

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    for stmt in &program.body {
        printer.stmt(stmt);
    }
    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, 0);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

/// Binding strength used to decide where parentheses are needed.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Sequence(_) => 0,
        Expr::Assign { .. } | Expr::Function(_) => 1,
        Expr::Conditional { .. } => 2,
        Expr::Logical { op, .. } => match op {
            LogicalOp::Nullish => 3,
            LogicalOp::Or => 4,
            LogicalOp::And => 5,
        },
        Expr::Binary { op, .. } => match op {
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 9,
            BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::InstanceOf => 10,
            BinaryOp::Add | BinaryOp::Sub => 12,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 13,
            BinaryOp::Exp => 14,
        },
        Expr::Unary { .. } | Expr::Update { prefix: true, .. } => 15,
        Expr::Update { .. } => 16,
        Expr::New { .. } | Expr::Call { .. } | Expr::Member { .. } | Expr::Index { .. } => 18,
        _ => 20,
    }
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => {
                let text = format!("{};", print_expr_at(e, 1));
                self.line(&text);
            }
            Stmt::VarDecl { kind, declarations } => {
                let decls: Vec<String> = declarations
                    .iter()
                    .map(|d| match &d.init {
                        Some(init) => format!("{} = {}", pattern(&d.pattern), print_expr_at(init, 1)),
                        None => pattern(&d.pattern),
                    })
                    .collect();
                let text = format!("{} {};", kind.as_str(), decls.join(", "));
                self.line(&text);
            }
            Stmt::Function(f) => {
                let text = function_text(f, self.indent);
                self.line(&text);
            }
            Stmt::Return(None) => self.line("return;"),
            Stmt::Return(Some(e)) => {
                let text = format!("return {};", print_expr_at(e, 0));
                self.line(&text);
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                let text = format!("if ({})", print_expr_at(test, 0));
                self.line(&text);
                self.nested(consequent);
                if let Some(alt) = alternate {
                    self.line("else");
                    self.nested(alt);
                }
            }
            Stmt::ForOf {
                kind,
                pattern: pat,
                iterable,
                body,
            } => {
                let text = format!(
                    "for ({} {} of {})",
                    kind.as_str(),
                    pattern(pat),
                    print_expr_at(iterable, 1)
                );
                self.line(&text);
                self.nested(body);
            }
            Stmt::Block(body) => {
                self.line("{");
                self.indent += 1;
                for s in body {
                    self.stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Throw(e) => {
                let text = format!("throw {};", print_expr_at(e, 0));
                self.line(&text);
            }
            Stmt::Empty => {}
        }
    }

    fn nested(&mut self, stmt: &Stmt) {
        if matches!(stmt, Stmt::Block(_)) {
            self.stmt(stmt);
        } else {
            self.indent += 1;
            self.stmt(stmt);
            self.indent -= 1;
        }
    }

    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let needs_parens = precedence(expr) < min_prec;
        if needs_parens {
            self.out.push('(');
        }
        self.expr_inner(expr);
        if needs_parens {
            self.out.push(')');
        }
    }

    fn elements(&mut self, elements: &[ArrayElement]) {
        for (i, el) in elements.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match el {
                ArrayElement::Expr(e) => self.expr(e, 1),
                ArrayElement::Spread(e) => {
                    self.out.push_str("...");
                    self.expr(e, 1);
                }
                ArrayElement::Hole => {}
            }
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n) => self.out.push_str(&number_literal(*n)),
            Expr::Str(s) => self.out.push_str(&string_literal(s)),
            Expr::Template { quasis, exprs } => {
                self.out.push('`');
                for (i, quasi) in quasis.iter().enumerate() {
                    self.out.push_str(&quasi.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${"));
                    if let Some(e) = exprs.get(i) {
                        self.out.push_str("${");
                        self.expr(e, 0);
                        self.out.push('}');
                    }
                }
                self.out.push('`');
            }
            Expr::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Expr::Null => self.out.push_str("null"),
            Expr::Undefined => self.out.push_str("undefined"),
            Expr::Ident(name) => self.out.push_str(name),
            Expr::This => self.out.push_str("this"),
            Expr::Array(elements) => {
                self.out.push('[');
                self.elements(elements);
                self.out.push(']');
            }
            Expr::Object(props) => {
                if props.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push_str("{ ");
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match prop {
                        ObjectProp::KeyValue(PropKey::Named(k), v) => {
                            self.out.push_str(&property_key(k));
                            self.out.push_str(": ");
                            self.expr(v, 1);
                        }
                        ObjectProp::KeyValue(PropKey::Computed(k), v) => {
                            self.out.push('[');
                            self.expr(k, 1);
                            self.out.push_str("]: ");
                            self.expr(v, 1);
                        }
                        ObjectProp::Shorthand(k) => self.out.push_str(k),
                        ObjectProp::Spread(e) => {
                            self.out.push_str("...");
                            self.expr(e, 1);
                        }
                    }
                }
                self.out.push_str(" }");
            }
            Expr::Function(f) => {
                let text = function_text(f, self.indent);
                self.out.push_str(&text);
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                self.expr(object, 18);
                self.out.push_str(if *optional { "?." } else { "." });
                self.out.push_str(property);
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                self.expr(object, 18);
                self.out.push_str(if *optional { "?.[" } else { "[" });
                self.expr(index, 0);
                self.out.push(']');
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => {
                self.expr(callee, 18);
                self.out.push_str(if *optional { "?.(" } else { "(" });
                self.elements(args);
                self.out.push(')');
            }
            Expr::New { callee, args } => {
                self.out.push_str("new ");
                self.expr(callee, 19);
                self.out.push('(');
                self.elements(args);
                self.out.push(')');
            }
            Expr::Unary { op, expr } => {
                self.out.push_str(match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::TypeOf => "typeof ",
                    UnaryOp::Void => "void ",
                });
                // `- -x` must not print as a decrement
                let signed_operand = matches!(
                    **expr,
                    Expr::Unary { op: UnaryOp::Neg | UnaryOp::Plus, .. }
                        | Expr::Update { prefix: true, .. }
                ) || matches!(**expr, Expr::Number(n) if n < 0.0);
                if matches!(op, UnaryOp::Neg | UnaryOp::Plus) && signed_operand {
                    self.out.push(' ');
                }
                self.expr(expr, 15);
            }
            Expr::Update { op, prefix, target } => {
                let symbol = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    self.out.push_str(symbol);
                    self.expr(target, 16);
                } else {
                    self.expr(target, 16);
                    self.out.push_str(symbol);
                }
            }
            Expr::Binary { op, left, right } => {
                let prec = precedence(expr);
                let (lp, rp) = if *op == BinaryOp::Exp {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.expr(left, lp);
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(right, rp);
            }
            Expr::Logical { op, left, right } => {
                let prec = precedence(expr);
                self.expr(left, prec);
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(right, prec + 1);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, 3);
                self.out.push_str(" ? ");
                self.expr(consequent, 1);
                self.out.push_str(" : ");
                self.expr(alternate, 1);
            }
            Expr::Assign { op, target, value } => {
                self.expr(target, 18);
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(value, 1);
            }
            Expr::Sequence(exprs) => {
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(e, 1);
                }
            }
            Expr::Jsx(_) => self.out.push_str("/* jsx */ null"),
        }
    }
}

fn print_expr_at(expr: &Expr, min_prec: u8) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, min_prec);
    printer.out
}

fn function_text(f: &Function, indent: usize) -> String {
    let params: Vec<String> = f
        .params
        .iter()
        .map(|p| {
            let mut text = String::new();
            if p.rest {
                text.push_str("...");
            }
            text.push_str(&pattern(&p.pattern));
            if let Some(default) = &p.default {
                text.push_str(" = ");
                text.push_str(&print_expr_at(default, 1));
            }
            text
        })
        .collect();
    let params = params.join(", ");

    let body = match &f.body {
        FunctionBody::Expr(e) => {
            // an object literal body must be wrapped to not read as a block
            let text = print_expr_at(e, 1);
            return if matches!(**e, Expr::Object(_)) {
                format!("({}) => ({})", params, text)
            } else {
                format!("({}) => {}", params, text)
            };
        }
        FunctionBody::Block(stmts) => {
            let mut printer = Printer {
                out: String::new(),
                indent: indent + 1,
            };
            for s in stmts {
                printer.stmt(s);
            }
            let closing_indent = "  ".repeat(indent);
            format!("{{\n{}{}}}", printer.out, closing_indent)
        }
    };

    if f.is_arrow {
        format!("({}) => {}", params, body)
    } else {
        format!(
            "function{}({}) {}",
            f.name.as_deref().map(|n| format!(" {}", n)).unwrap_or_default(),
            params,
            body
        )
    }
}

fn pattern(p: &Pattern) -> String {
    match p {
        Pattern::Ident(name) => name.clone(),
        Pattern::Object { properties, rest } => {
            let mut parts: Vec<String> = properties
                .iter()
                .map(|prop| {
                    let mut text = match &prop.value {
                        Pattern::Ident(local) if *local == prop.key => prop.key.clone(),
                        value => format!("{}: {}", property_key(&prop.key), pattern(value)),
                    };
                    if let Some(default) = &prop.default {
                        text.push_str(" = ");
                        text.push_str(&print_expr_at(default, 1));
                    }
                    text
                })
                .collect();
            if let Some(rest) = rest {
                parts.push(format!("...{}", rest));
            }
            format!("{{ {} }}", parts.join(", "))
        }
        Pattern::Array { elements, rest } => {
            let mut parts: Vec<String> = elements
                .iter()
                .map(|el| match el {
                    None => String::new(),
                    Some(el) => {
                        let mut text = pattern(&el.pattern);
                        if let Some(default) = &el.default {
                            text.push_str(" = ");
                            text.push_str(&print_expr_at(default, 1));
                        }
                        text
                    }
                })
                .collect();
            if let Some(rest) = rest {
                parts.push(format!("...{}", rest));
            }
            format!("[{}]", parts.join(", "))
        }
    }
}

fn property_key(key: &str) -> String {
    let plain = key.chars().next().is_some_and(super::parser::is_ident_start)
        && key.chars().all(super::parser::is_ident_continue);
    if plain {
        key.to_string()
    } else {
        string_literal(key)
    }
}

fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub(crate) fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsx::{lower_program, parse_program};

    fn transpile(src: &str) -> String {
        print_program(&lower_program(parse_program(src, 64).unwrap()))
    }

    #[test]
    fn prints_create_element_calls() {
        let out = transpile(r#"function Hero(props) { return <h1 className="title">{props.title}</h1>; }"#);
        assert_eq!(
            out,
            "function Hero(props) {\n  return React.createElement(\"h1\", { className: \"title\" }, props.title);\n}\n"
        );
    }

    #[test]
    fn keeps_needed_parentheses() {
        let expr = crate::jsx::parser::parse_expression("(a + b) * c - -d", 32).unwrap();
        assert_eq!(print_expr(&expr), "(a + b) * c - -d");
    }

    #[test]
    fn arrow_with_object_body_is_wrapped() {
        let out = transpile("const f = () => ({ a: 1 });");
        assert_eq!(out, "const f = () => ({ a: 1 });\n");
    }

    #[test]
    fn printed_output_parses_again() {
        let once = transpile(
            "const List = ({ items = [] }) => <ul>{items.map((it, i) => <li key={i}>{it.label ?? 'x'}</li>)}</ul>;",
        );
        let twice = print_program(&parse_program(&once, 64).unwrap());
        assert_eq!(once, twice);
    }
}
