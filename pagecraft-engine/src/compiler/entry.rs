//! Picks the component entry point out of a lowered program.

use std::collections::HashSet;

use crate::error::{CompileError, CompileErrorKind, CompileResult};
use crate::jsx::ast::{Expr, Pattern, Program, Stmt};

/// Names emitted by common JSX/TS transpilers for their runtime helpers.
const TRANSPILER_HELPERS: &[&str] = &[
    "_extends",
    "_objectSpread",
    "_objectSpread2",
    "_defineProperty",
    "_jsx",
    "_jsxs",
    "jsx",
    "jsxs",
    "_interopRequireDefault",
    "__assign",
    "__rest",
    "createElement",
];

/// Shortest name still considered a component.
const MIN_ENTRY_NAME_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryPoint {
    /// A top-level function or a function-valued binding
    Named(String),
    /// A bare top-level expression: either a function expression (called
    /// with props) or an element expression (evaluated with `props` bound)
    Expression(Expr),
}

pub fn is_helper_name(name: &str) -> bool {
    name.starts_with('_')
        || TRANSPILER_HELPERS.contains(&name)
        || name.chars().count() < MIN_ENTRY_NAME_LEN
}

/// Top-level function names that survive helper filtering, in source order.
/// Function declarations take precedence; function-valued bindings are only
/// considered when no declaration survives.
pub fn entry_candidates(program: &Program) -> Vec<String> {
    let mut declared = Vec::new();
    let mut bound = Vec::new();
    for stmt in &program.body {
        match stmt {
            Stmt::Function(function) => {
                if let Some(name) = &function.name {
                    declared.push(name.clone());
                }
            }
            Stmt::VarDecl { declarations, .. } => {
                for declarator in declarations {
                    if let (Pattern::Ident(name), Some(Expr::Function(_))) =
                        (&declarator.pattern, &declarator.init)
                    {
                        bound.push(name.clone());
                    }
                }
            }
            _ => {}
        }
    }
    let declared = unique_entries(declared);
    if declared.is_empty() {
        unique_entries(bound)
    } else {
        declared
    }
}

fn unique_entries(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| !is_helper_name(name) && seen.insert(name.clone()))
        .collect()
}

/// Resolves the entry point. A bare expression entry is removed from the
/// program so running the program does not evaluate it twice.
pub fn resolve_entry(program: &mut Program, source: &str) -> CompileResult<EntryPoint> {
    let mut candidates = entry_candidates(program);
    match candidates.len() {
        1 => Ok(EntryPoint::Named(candidates.remove(0))),
        0 => take_expression_entry(program).ok_or_else(|| {
            CompileError::new(
                CompileErrorKind::EntryNotFound,
                "No component function found in source",
                source,
            )
        }),
        _ => Err(CompileError::new(
            CompileErrorKind::EntryNotFound,
            format!(
                "Ambiguous entry point: found {} candidate functions ({})",
                candidates.len(),
                candidates.join(", ")
            ),
            source,
        )),
    }
}

fn take_expression_entry(program: &mut Program) -> Option<EntryPoint> {
    let positions: Vec<usize> = program
        .body
        .iter()
        .enumerate()
        .filter(|(_, stmt)| matches!(stmt, Stmt::Expr(Expr::Function(_) | Expr::Call { .. })))
        .map(|(i, _)| i)
        .collect();
    let [index] = positions.as_slice() else {
        return None;
    };
    match program.body.remove(*index) {
        Stmt::Expr(expr) => Some(EntryPoint::Expression(expr)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsx::{lower_program, parse_program};

    fn program(src: &str) -> Program {
        lower_program(parse_program(src, 64).unwrap())
    }

    #[test]
    fn helpers_and_short_names_are_ignored() {
        let mut p = program(
            "function _helper() { return 1; }\n\
             function Footer(props) { return <footer />; }\n\
             const cx = () => '';\n\
             function jsx() {}",
        );
        assert_eq!(resolve_entry(&mut p, "").unwrap(), EntryPoint::Named("Footer".into()));
    }

    #[test]
    fn arrow_bound_to_const_is_a_candidate() {
        let mut p = program("const Hero = ({ title }) => <h1>{title}</h1>;");
        assert_eq!(resolve_entry(&mut p, "").unwrap(), EntryPoint::Named("Hero".into()));
    }

    #[test]
    fn declarations_win_over_arrow_helpers() {
        let mut p = program(
            "const formatPrice = (p) => '$' + p;\n\
             function Pricing(props) { return <p>{formatPrice(props.price)}</p>; }",
        );
        assert_eq!(resolve_entry(&mut p, "").unwrap(), EntryPoint::Named("Pricing".into()));
    }

    #[test]
    fn redeclared_names_count_once() {
        let mut p = program(
            "function Card() { return <div />; }\n\
             function _pad() { return 1; }\n\
             function Card() { return <section />; }",
        );
        assert_eq!(entry_candidates(&p), vec!["Card".to_string()]);
        assert_eq!(resolve_entry(&mut p, "").unwrap(), EntryPoint::Named("Card".into()));
    }

    #[test]
    fn several_candidates_are_rejected() {
        let mut p = program("function Header() {}\nfunction Footer() {}");
        let err = resolve_entry(&mut p, "src").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::EntryNotFound);
        assert!(err.message.contains("Header, Footer"));
        assert_eq!(err.source_text, "src");
    }

    #[test]
    fn bare_jsx_expression_becomes_the_entry() {
        let mut p = program("const label = 'x';\n<div>{label}</div>");
        let entry = resolve_entry(&mut p, "").unwrap();
        assert!(matches!(entry, EntryPoint::Expression(Expr::Call { .. })));
        assert_eq!(p.body.len(), 1);
    }

    #[test]
    fn anonymous_function_becomes_the_entry() {
        let mut p = program("(props) => <p>{props.text}</p>");
        let entry = resolve_entry(&mut p, "").unwrap();
        assert!(matches!(entry, EntryPoint::Expression(Expr::Function(_))));
        assert!(p.body.is_empty());
    }

    #[test]
    fn nothing_renderable_is_entry_not_found() {
        let mut p = program("const a = 1;");
        let err = resolve_entry(&mut p, "").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::EntryNotFound);
    }
}
