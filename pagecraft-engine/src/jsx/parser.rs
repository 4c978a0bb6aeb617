use std::sync::Arc;

use super::ast::*;
use crate::error::{CompileError, CompileErrorKind, CompileResult, SourceLocation};

/// Binary operators by precedence (higher binds tighter).
const BINARY_OPERATORS: &[(&str, u8)] = &[
    ("===", 7),
    ("!==", 7),
    ("**", 12),
    ("==", 7),
    ("!=", 7),
    ("<=", 8),
    (">=", 8),
    ("&&", 3),
    ("||", 2),
    ("??", 1),
    ("<", 8),
    (">", 8),
    ("+", 10),
    ("-", 10),
    ("*", 11),
    ("/", 11),
    ("%", 11),
];

const ASSIGN_OPERATORS: &[(&str, AssignOp)] = &[
    ("||=", AssignOp::Or),
    ("&&=", AssignOp::And),
    ("??=", AssignOp::Nullish),
    ("+=", AssignOp::Add),
    ("-=", AssignOp::Sub),
    ("*=", AssignOp::Mul),
    ("/=", AssignOp::Div),
];

/// Words that can never start an identifier expression.
const RESERVED: &[&str] = &[
    "const", "let", "var", "return", "if", "else", "for", "while", "do", "switch", "case",
    "break", "continue", "function", "class", "import", "export", "throw", "try", "catch",
    "finally", "delete", "in", "of", "instanceof", "yield",
];

/// Parses a component module body (imports already stripped) into a [`Program`].
pub fn parse_program(source: &str, max_depth: usize) -> CompileResult<Program> {
    let mut parser = Parser::new(source, max_depth);
    let mut body = Vec::new();
    loop {
        parser.skip_trivia();
        if parser.at_end() {
            break;
        }
        body.push(parser.parse_statement()?);
    }
    Ok(Program { body })
}

/// Parses a single expression, e.g. a customization value or a test fixture.
pub fn parse_expression(source: &str, max_depth: usize) -> CompileResult<Expr> {
    let mut parser = Parser::new(source, max_depth);
    let expr = parser.parse_expression()?;
    parser.skip_trivia();
    if !parser.at_end() {
        return Err(parser.error("Unexpected trailing input after expression"));
    }
    Ok(expr)
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, max_depth: usize) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    // ─── Cursor ──────────────────────────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn location(&self) -> SourceLocation {
        let mut line = 1;
        let mut column = 1;
        for c in self.chars.iter().take(self.pos) {
            if *c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        SourceLocation { line, column }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(CompileErrorKind::Syntax, message, self.source).at(self.location())
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        }
    }

    /// Skips whitespace and comments. Returns true when a newline was crossed.
    fn skip_trivia(&mut self) -> bool {
        let mut newline = false;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    newline |= c == '\n';
                    self.pos += 1;
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while !self.at_end() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        newline |= self.peek() == Some('\n');
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.chars.len());
                }
                _ => return newline,
            }
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// Skips trivia, then consumes `s` if it comes next.
    fn eat(&mut self, s: &str) -> bool {
        self.skip_trivia();
        if self.starts_with(s) {
            self.pos += s.chars().count();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> CompileResult<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}' but found {}", s, self.describe_next())))
        }
    }

    fn peek_keyword(&mut self, keyword: &str) -> bool {
        self.skip_trivia();
        self.starts_with(keyword)
            && !self
                .peek_at(keyword.chars().count())
                .is_some_and(is_ident_continue)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.chars().count();
            true
        } else {
            false
        }
    }

    fn parse_ident(&mut self) -> CompileResult<String> {
        self.skip_trivia();
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_ident_continue) {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            _ => Err(self.error(format!("Expected identifier but found {}", self.describe_next()))),
        }
    }

    fn enter(&mut self) -> CompileResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error(format!(
                "Maximum nesting depth ({}) exceeded",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn eat_semicolon(&mut self) {
        self.eat(";");
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        self.skip_trivia();
        if self.eat(";") {
            return Ok(Stmt::Empty);
        }
        if self.starts_with("{") {
            return Ok(Stmt::Block(self.parse_block()?));
        }
        if self.peek_keyword("function") {
            let location = self.location();
            self.eat_keyword("function");
            let function = self.parse_function_rest(location)?;
            return Ok(if function.name.is_some() {
                Stmt::Function(Arc::new(function))
            } else {
                let stmt = Stmt::Expr(Expr::Function(Arc::new(function)));
                self.eat_semicolon();
                stmt
            });
        }
        for kind in [VarKind::Const, VarKind::Let, VarKind::Var] {
            if self.eat_keyword(kind.as_str()) {
                let stmt = self.parse_var_declaration(kind)?;
                self.eat_semicolon();
                return Ok(stmt);
            }
        }
        if self.eat_keyword("return") {
            self.skip_trivia();
            let value = if self.starts_with(";") || self.starts_with("}") || self.at_end() {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.eat_semicolon();
            return Ok(Stmt::Return(value));
        }
        if self.eat_keyword("if") {
            self.expect("(")?;
            let test = self.parse_expression()?;
            self.expect(")")?;
            let consequent = Box::new(self.parse_statement()?);
            let alternate = if self.eat_keyword("else") {
                Some(Box::new(self.parse_statement()?))
            } else {
                None
            };
            return Ok(Stmt::If {
                test,
                consequent,
                alternate,
            });
        }
        if self.eat_keyword("for") {
            return self.parse_for_of();
        }
        if self.eat_keyword("throw") {
            let value = self.parse_expression()?;
            self.eat_semicolon();
            return Ok(Stmt::Throw(value));
        }
        for unsupported in ["while", "do", "switch", "class", "try", "import", "export"] {
            if self.peek_keyword(unsupported) {
                return Err(self.error(format!("'{}' is not supported in component source", unsupported)));
            }
        }

        let expr = self.parse_expression()?;
        self.eat_semicolon();
        Ok(Stmt::Expr(expr))
    }

    fn parse_block(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect("{")?;
        self.enter()?;
        let mut body = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat("}") {
                break;
            }
            if self.at_end() {
                return Err(self.error("Unterminated block: missing '}'"));
            }
            body.push(self.parse_statement()?);
        }
        self.leave();
        Ok(body)
    }

    fn parse_var_declaration(&mut self, kind: VarKind) -> CompileResult<Stmt> {
        let mut declarations = Vec::new();
        loop {
            let pattern = self.parse_pattern()?;
            let init = if self.eat_assign_sign() {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if init.is_none() && kind == VarKind::Const {
                return Err(self.error("Missing initializer in const declaration"));
            }
            declarations.push(VarDeclarator { pattern, init });
            if !self.eat(",") {
                break;
            }
        }
        Ok(Stmt::VarDecl { kind, declarations })
    }

    fn parse_for_of(&mut self) -> CompileResult<Stmt> {
        self.expect("(")?;
        let kind = [VarKind::Const, VarKind::Let, VarKind::Var]
            .into_iter()
            .find(|k| self.eat_keyword(k.as_str()))
            .ok_or_else(|| self.error("Only 'for (const x of items)' loops are supported"))?;
        let pattern = self.parse_pattern()?;
        if !self.eat_keyword("of") {
            return Err(self.error("Only 'for (const x of items)' loops are supported"));
        }
        let iterable = self.parse_expression()?;
        self.expect(")")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::ForOf {
            kind,
            pattern,
            iterable,
            body,
        })
    }

    /// `=` that is not part of `==`, `===` or `=>`.
    fn eat_assign_sign(&mut self) -> bool {
        self.skip_trivia();
        if self.peek() == Some('=') && !matches!(self.peek_at(1), Some('=') | Some('>')) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ─── Patterns & functions ────────────────────────────────────────────────

    fn parse_pattern(&mut self) -> CompileResult<Pattern> {
        self.skip_trivia();
        if self.eat("{") {
            let mut properties = Vec::new();
            let mut rest = None;
            loop {
                if self.eat("}") {
                    break;
                }
                if self.eat("...") {
                    rest = Some(self.parse_ident()?);
                    self.eat(",");
                    self.expect("}")?;
                    break;
                }
                let key = self.parse_property_name()?;
                let value = if self.eat(":") {
                    self.parse_pattern()?
                } else {
                    Pattern::Ident(key.clone())
                };
                let default = if self.eat_assign_sign() {
                    Some(self.parse_assignment()?)
                } else {
                    None
                };
                properties.push(ObjectPatternProp {
                    key,
                    value,
                    default,
                });
                if !self.eat(",") {
                    self.expect("}")?;
                    break;
                }
            }
            return Ok(Pattern::Object { properties, rest });
        }
        if self.eat("[") {
            let mut elements = Vec::new();
            let mut rest = None;
            loop {
                if self.eat("]") {
                    break;
                }
                if self.eat(",") {
                    elements.push(None);
                    continue;
                }
                if self.eat("...") {
                    rest = Some(self.parse_ident()?);
                    self.expect("]")?;
                    break;
                }
                let pattern = self.parse_pattern()?;
                let default = if self.eat_assign_sign() {
                    Some(self.parse_assignment()?)
                } else {
                    None
                };
                elements.push(Some(PatternElement { pattern, default }));
                if !self.eat(",") {
                    self.expect("]")?;
                    break;
                }
            }
            return Ok(Pattern::Array { elements, rest });
        }
        Ok(Pattern::Ident(self.parse_ident()?))
    }

    fn parse_params(&mut self) -> CompileResult<Vec<Param>> {
        self.expect("(")?;
        let mut params = Vec::new();
        loop {
            if self.eat(")") {
                break;
            }
            let rest = self.eat("...");
            let pattern = self.parse_pattern()?;
            let default = if self.eat_assign_sign() {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param {
                pattern,
                default,
                rest,
            });
            if !self.eat(",") {
                self.expect(")")?;
                break;
            }
        }
        Ok(params)
    }

    /// After the `function` keyword: optional name, params, block body.
    fn parse_function_rest(&mut self, location: SourceLocation) -> CompileResult<Function> {
        self.skip_trivia();
        let name = if self.peek().is_some_and(is_ident_start) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = FunctionBody::Block(self.parse_block()?);
        Ok(Function {
            name,
            params,
            body,
            is_arrow: false,
            location,
        })
    }

    /// Attempts an arrow function at the cursor, restoring it when there is none.
    fn try_parse_arrow(&mut self) -> CompileResult<Option<Expr>> {
        self.skip_trivia();
        let start = self.pos;
        let start_depth = self.depth;
        let location = self.location();
        let params = match self.peek() {
            Some('(') => match self.parse_params() {
                Ok(params) => params,
                Err(_) => {
                    self.pos = start;
                    self.depth = start_depth;
                    return Ok(None);
                }
            },
            Some(c) if is_ident_start(c) => match self.parse_ident() {
                Ok(name) if !RESERVED.contains(&name.as_str()) => vec![Param {
                    pattern: Pattern::Ident(name),
                    default: None,
                    rest: false,
                }],
                _ => {
                    self.pos = start;
                    return Ok(None);
                }
            },
            _ => return Ok(None),
        };
        if !self.eat("=>") {
            self.pos = start;
            return Ok(None);
        }
        self.skip_trivia();
        let body = if self.starts_with("{") {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        Ok(Some(Expr::Function(Arc::new(Function {
            name: None,
            params,
            body,
            is_arrow: true,
            location,
        }))))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        let first = self.parse_assignment()?;
        if !self.peek_comma() {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(",") {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(exprs))
    }

    fn peek_comma(&mut self) -> bool {
        self.skip_trivia();
        self.peek() == Some(',')
    }

    fn parse_assignment(&mut self) -> CompileResult<Expr> {
        self.enter()?;
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> CompileResult<Expr> {
        // async arrows render like plain ones; awaiting is not supported
        self.eat_keyword("async");
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }
        let target = self.parse_conditional()?;

        let op = if self.eat_assign_sign() {
            Some(AssignOp::Assign)
        } else {
            self.skip_trivia();
            ASSIGN_OPERATORS
                .iter()
                .find(|(text, _)| self.starts_with(text))
                .map(|(text, op)| {
                    self.pos += text.chars().count();
                    *op
                })
        };
        let Some(op) = op else {
            return Ok(target);
        };
        if !matches!(target, Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. }) {
            return Err(self.error("Invalid assignment target"));
        }
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> CompileResult<Expr> {
        let test = self.parse_binary(0)?;
        self.skip_trivia();
        if self.peek() == Some('?') && !matches!(self.peek_at(1), Some('?') | Some('.')) {
            self.pos += 1;
            let consequent = self.parse_assignment()?;
            self.expect(":")?;
            let alternate = self.parse_assignment()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        Ok(test)
    }

    fn peek_binary_operator(&mut self) -> Option<(&'static str, u8)> {
        self.skip_trivia();
        if self.peek_keyword("instanceof") {
            return Some(("instanceof", 8));
        }
        if self.peek_keyword("in") {
            return Some(("in", 8));
        }
        let (text, prec) = BINARY_OPERATORS
            .iter()
            .find(|(text, _)| self.starts_with(text))
            .copied()?;
        let next = self.peek_at(text.chars().count());
        // compound assignment, arrows and update operators are not binary
        let clashes = match text {
            "+" => matches!(next, Some('=') | Some('+')),
            "-" => matches!(next, Some('=') | Some('-')),
            "*" | "/" | "%" | "**" => next == Some('='),
            "&&" | "||" | "??" => next == Some('='),
            _ => false,
        };
        if clashes {
            None
        } else {
            Some((text, prec))
        }
    }

    fn parse_binary(&mut self, min_prec: u8) -> CompileResult<Expr> {
        let mut left = self.parse_unary()?;
        // every operator adds one level to the left-leaning tree
        let mut levels = 0;
        while let Some((text, prec)) = self.peek_binary_operator() {
            if prec < min_prec {
                break;
            }
            self.enter()?;
            levels += 1;
            self.pos += text.chars().count();
            let next_min = if text == "**" { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            left = match text {
                "&&" => logical(LogicalOp::And, left, right),
                "||" => logical(LogicalOp::Or, left, right),
                "??" => logical(LogicalOp::Nullish, left, right),
                _ => Expr::Binary {
                    op: binary_op(text),
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }
        for _ in 0..levels {
            self.leave();
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> CompileResult<Expr> {
        self.skip_trivia();
        for (text, op) in [("++", UpdateOp::Increment), ("--", UpdateOp::Decrement)] {
            if self.starts_with(text) {
                self.pos += 2;
                let target = self.parse_nested_unary()?;
                return Ok(Expr::Update {
                    op,
                    prefix: true,
                    target: Box::new(target),
                });
            }
        }
        let op = match self.peek() {
            Some('!') if self.peek_at(1) != Some('=') => Some(UnaryOp::Not),
            Some('-') => Some(UnaryOp::Neg),
            Some('+') => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let expr = self.parse_nested_unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }
        if self.eat_keyword("typeof") {
            let expr = self.parse_nested_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::TypeOf,
                expr: Box::new(expr),
            });
        }
        if self.eat_keyword("void") {
            let expr = self.parse_nested_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Void,
                expr: Box::new(expr),
            });
        }
        if self.eat_keyword("await") {
            return Err(self.error("'await' is not supported in component source"));
        }
        self.parse_postfix()
    }

    fn parse_nested_unary(&mut self) -> CompileResult<Expr> {
        self.enter()?;
        let expr = self.parse_unary()?;
        self.leave();
        Ok(expr)
    }

    fn parse_postfix(&mut self) -> CompileResult<Expr> {
        let expr = self.parse_call_member()?;
        let save = self.pos;
        let newline = self.skip_trivia();
        if !newline {
            for (text, op) in [("++", UpdateOp::Increment), ("--", UpdateOp::Decrement)] {
                if self.starts_with(text) {
                    self.pos += 2;
                    return Ok(Expr::Update {
                        op,
                        prefix: false,
                        target: Box::new(expr),
                    });
                }
            }
        }
        self.pos = save;
        Ok(expr)
    }

    fn parse_call_member(&mut self) -> CompileResult<Expr> {
        let mut expr = if self.eat_keyword("new") {
            let callee = self.parse_primary()?;
            let callee = self.parse_member_chain(callee, false)?;
            let args = if self.peek_char('(') {
                self.parse_arguments()?
            } else {
                Vec::new()
            };
            Expr::New {
                callee: Box::new(callee),
                args,
            }
        } else {
            self.parse_primary()?
        };
        expr = self.parse_member_chain(expr, true)?;
        Ok(expr)
    }

    fn peek_char(&mut self, c: char) -> bool {
        self.skip_trivia();
        self.peek() == Some(c)
    }

    fn parse_member_chain(&mut self, mut expr: Expr, allow_calls: bool) -> CompileResult<Expr> {
        let mut levels = 0;
        loop {
            self.skip_trivia();
            let link = self.starts_with("?.")
                || match self.peek() {
                    Some('.') => self.peek_at(1) != Some('.'),
                    Some('[') => true,
                    Some('(') => allow_calls,
                    _ => false,
                };
            if !link {
                break;
            }
            self.enter()?;
            levels += 1;
            if self.starts_with("?.") {
                self.pos += 2;
                self.skip_trivia();
                expr = match self.peek() {
                    Some('(') if allow_calls => Expr::Call {
                        callee: Box::new(expr),
                        args: self.parse_arguments()?,
                        optional: true,
                    },
                    Some('[') => {
                        self.pos += 1;
                        let index = self.parse_expression()?;
                        self.expect("]")?;
                        Expr::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                            optional: true,
                        }
                    }
                    _ => Expr::Member {
                        object: Box::new(expr),
                        property: self.parse_ident()?,
                        optional: true,
                    },
                };
                continue;
            }
            match self.peek() {
                Some('.') if self.peek_at(1) != Some('.') => {
                    self.pos += 1;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: self.parse_ident()?,
                        optional: false,
                    };
                }
                Some('[') => {
                    self.pos += 1;
                    let index = self.parse_expression()?;
                    self.expect("]")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: false,
                    };
                }
                Some('(') if allow_calls => {
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args: self.parse_arguments()?,
                        optional: false,
                    };
                }
                _ => break,
            }
        }
        for _ in 0..levels {
            self.leave();
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> CompileResult<Vec<ArrayElement>> {
        self.expect("(")?;
        let mut args = Vec::new();
        loop {
            if self.eat(")") {
                break;
            }
            if self.eat("...") {
                args.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                args.push(ArrayElement::Expr(self.parse_assignment()?));
            }
            if !self.eat(",") {
                self.expect(")")?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        self.skip_trivia();
        let Some(c) = self.peek() else {
            return Err(self.error("Unexpected end of input"));
        };
        match c {
            '0'..='9' => self.parse_number(),
            '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.parse_number(),
            '"' | '\'' => Ok(Expr::Str(self.parse_string_literal()?)),
            '`' => self.parse_template(),
            '(' => {
                self.pos += 1;
                let expr = self.parse_expression()?;
                self.expect(")")?;
                Ok(expr)
            }
            '[' => self.parse_array_literal(),
            '{' => self.parse_object_literal(),
            '<' => {
                self.enter()?;
                let element = self.parse_jsx_element()?;
                self.leave();
                Ok(Expr::Jsx(Box::new(element)))
            }
            c if is_ident_start(c) => {
                if self.peek_keyword("function") {
                    let location = self.location();
                    self.eat_keyword("function");
                    return Ok(Expr::Function(Arc::new(self.parse_function_rest(location)?)));
                }
                let ident = self.parse_ident()?;
                match ident.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" => Ok(Expr::Null),
                    "undefined" => Ok(Expr::Undefined),
                    "this" => Ok(Expr::This),
                    word if RESERVED.contains(&word) => {
                        Err(self.error(format!("Unexpected keyword '{}'", word)))
                    }
                    _ => Ok(Expr::Ident(ident)),
                }
            }
            other => Err(self.error(format!("Unexpected character '{}'", other))),
        }
    }

    fn parse_number(&mut self) -> CompileResult<Expr> {
        let start = self.pos;
        if self.starts_with("0x") || self.starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.pos += 1;
            }
            let digits: String = self.chars[digits_start..self.pos]
                .iter()
                .filter(|c| **c != '_')
                .collect();
            return u64::from_str_radix(&digits, 16)
                .map(|n| Expr::Number(n as f64))
                .map_err(|_| self.error("Invalid hexadecimal literal"));
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.pos += 1;
        }
        if self.peek() == Some('.') && self.peek_at(1) != Some('.') {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = save;
            }
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        text.parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| self.error(format!("Invalid number literal '{}'", text)))
    }

    fn parse_string_literal(&mut self) -> CompileResult<String> {
        let Some(quote) = self.bump() else {
            return Err(self.error("Expected string literal"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("Unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.parse_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> CompileResult<()> {
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('\n') => {}
            Some('u') => {
                let code = if self.peek() == Some('{') {
                    self.pos += 1;
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != '}') {
                        self.pos += 1;
                    }
                    let hex: String = self.chars[start..self.pos].iter().collect();
                    self.pos += 1;
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = self.chars.iter().skip(self.pos).take(4).collect();
                    self.pos += 4;
                    u32::from_str_radix(&hex, 16).ok()
                };
                let c = code
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("Invalid unicode escape"))?;
                out.push(c);
            }
            Some('x') => {
                let hex: String = self.chars.iter().skip(self.pos).take(2).collect();
                self.pos += 2;
                let c = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("Invalid hex escape"))?;
                out.push(c);
            }
            Some(c) => out.push(c),
            None => return Err(self.error("Unterminated escape sequence")),
        }
        Ok(())
    }

    fn parse_template(&mut self) -> CompileResult<Expr> {
        self.pos += 1;
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut current = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("Unterminated template literal")),
                Some('`') => break,
                Some('\\') => self.parse_escape(&mut current)?,
                Some('$') if self.peek() == Some('{') => {
                    self.pos += 1;
                    quasis.push(std::mem::take(&mut current));
                    exprs.push(self.parse_expression()?);
                    self.expect("}")?;
                }
                Some(c) => current.push(c),
            }
        }
        quasis.push(current);
        Ok(Expr::Template { quasis, exprs })
    }

    fn parse_array_literal(&mut self) -> CompileResult<Expr> {
        self.expect("[")?;
        let mut elements = Vec::new();
        loop {
            if self.eat("]") {
                break;
            }
            if self.eat(",") {
                elements.push(ArrayElement::Hole);
                continue;
            }
            if self.eat("...") {
                elements.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                elements.push(ArrayElement::Expr(self.parse_assignment()?));
            }
            if !self.eat(",") {
                self.expect("]")?;
                break;
            }
        }
        Ok(Expr::Array(elements))
    }

    /// Identifier, keyword, string or number usable as an object key.
    fn parse_property_name(&mut self) -> CompileResult<String> {
        self.skip_trivia();
        match self.peek() {
            Some('"') | Some('\'') => self.parse_string_literal(),
            Some(c) if c.is_ascii_digit() => match self.parse_number()? {
                Expr::Number(n) => Ok(format_number_key(n)),
                _ => Err(self.error("Invalid numeric key")),
            },
            _ => self.parse_ident(),
        }
    }

    fn parse_object_literal(&mut self) -> CompileResult<Expr> {
        self.expect("{")?;
        let mut props = Vec::new();
        loop {
            if self.eat("}") {
                break;
            }
            if self.eat("...") {
                props.push(ObjectProp::Spread(self.parse_assignment()?));
            } else if self.eat("[") {
                let key = self.parse_assignment()?;
                self.expect("]")?;
                self.expect(":")?;
                let value = self.parse_assignment()?;
                props.push(ObjectProp::KeyValue(PropKey::Computed(key), value));
            } else {
                let location = self.location();
                let key = self.parse_property_name()?;
                self.skip_trivia();
                if self.eat(":") {
                    let value = self.parse_assignment()?;
                    props.push(ObjectProp::KeyValue(PropKey::Named(key), value));
                } else if self.peek() == Some('(') {
                    let params = self.parse_params()?;
                    let body = FunctionBody::Block(self.parse_block()?);
                    let method = Function {
                        name: Some(key.clone()),
                        params,
                        body,
                        is_arrow: false,
                        location,
                    };
                    props.push(ObjectProp::KeyValue(
                        PropKey::Named(key),
                        Expr::Function(Arc::new(method)),
                    ));
                } else {
                    props.push(ObjectProp::Shorthand(key));
                }
            }
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(Expr::Object(props))
    }

    // ─── JSX ─────────────────────────────────────────────────────────────────

    fn parse_jsx_name(&mut self) -> CompileResult<String> {
        self.skip_trivia();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| is_ident_continue(c) || c == '-' || c == '.' || c == ':')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("Expected JSX name but found {}", self.describe_next())));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_jsx_element(&mut self) -> CompileResult<JsxElement> {
        self.expect("<")?;
        self.skip_trivia();
        if self.eat(">") {
            let children = self.parse_jsx_children()?;
            self.expect("/")?;
            self.expect(">")?;
            return Ok(JsxElement {
                name: JsxName::Fragment,
                attributes: Vec::new(),
                children,
            });
        }

        let raw_name = self.parse_jsx_name()?;
        let name = classify_jsx_name(&raw_name);
        let mut attributes = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat("/>") {
                return Ok(JsxElement {
                    name,
                    attributes,
                    children: Vec::new(),
                });
            }
            if self.eat(">") {
                break;
            }
            if self.at_end() {
                return Err(self.error(format!("Unterminated JSX tag <{}>", raw_name)));
            }
            if self.eat("{") {
                self.expect("...")?;
                let expr = self.parse_assignment()?;
                self.expect("}")?;
                attributes.push(JsxAttribute::Spread(expr));
                continue;
            }
            let attr_name = self.parse_jsx_name()?;
            let value = if self.eat_assign_sign() {
                self.skip_trivia();
                Some(match self.peek() {
                    Some('"') | Some('\'') => JsxAttrValue::Str(decode_entities(&self.parse_jsx_string()?)),
                    Some('{') => {
                        self.pos += 1;
                        let expr = self.parse_assignment()?;
                        self.expect("}")?;
                        JsxAttrValue::Expr(expr)
                    }
                    Some('<') => JsxAttrValue::Element(self.parse_jsx_element()?),
                    _ => {
                        return Err(self.error(format!(
                            "Invalid value for JSX attribute '{}'",
                            attr_name
                        )))
                    }
                })
            } else {
                None
            };
            attributes.push(JsxAttribute::Named {
                name: attr_name,
                value,
            });
        }

        let children = self.parse_jsx_children()?;
        self.expect("/")?;
        let closing = self.parse_jsx_name()?;
        if closing != raw_name {
            return Err(self.error(format!(
                "Expected closing tag </{}> but found </{}>",
                raw_name, closing
            )));
        }
        self.expect(">")?;
        Ok(JsxElement {
            name,
            attributes,
            children,
        })
    }

    /// JSX attribute strings have no escapes.
    fn parse_jsx_string(&mut self) -> CompileResult<String> {
        let Some(quote) = self.bump() else {
            return Err(self.error("Expected attribute string"));
        };
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        if self.at_end() {
            return Err(self.error("Unterminated JSX attribute string"));
        }
        let value = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(value)
    }

    /// Children up to (and including) the `<` of the closing tag.
    fn parse_jsx_children(&mut self) -> CompileResult<Vec<JsxChild>> {
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated JSX element: missing closing tag")),
                Some('<') => {
                    let mut look = self.pos + 1;
                    while self.chars.get(look).is_some_and(|c| c.is_whitespace()) {
                        look += 1;
                    }
                    if self.chars.get(look) == Some(&'/') {
                        self.pos += 1;
                        return Ok(children);
                    }
                    self.enter()?;
                    let element = self.parse_jsx_element()?;
                    self.leave();
                    children.push(JsxChild::Element(element));
                }
                Some('{') => {
                    self.pos += 1;
                    self.skip_trivia();
                    if self.eat("}") {
                        continue;
                    }
                    let expr = self.parse_expression()?;
                    self.expect("}")?;
                    children.push(JsxChild::Expr(expr));
                }
                Some(_) => {
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != '<' && c != '{') {
                        self.pos += 1;
                    }
                    let raw: String = self.chars[start..self.pos].iter().collect();
                    children.push(JsxChild::Text(raw));
                }
            }
        }
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn binary_op(text: &str) -> BinaryOp {
    match text {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        "**" => BinaryOp::Exp,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::NotEq,
        "===" => BinaryOp::StrictEq,
        "!==" => BinaryOp::StrictNotEq,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::LtEq,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::GtEq,
        "in" => BinaryOp::In,
        _ => BinaryOp::InstanceOf,
    }
}

fn classify_jsx_name(raw: &str) -> JsxName {
    if raw.contains('.') {
        return JsxName::Component(raw.split('.').map(str::to_string).collect());
    }
    match raw.chars().next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' || c == '$' => {
            JsxName::Component(vec![raw.to_string()])
        }
        _ => JsxName::Tag(raw.to_string()),
    }
}

fn format_number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Decodes the HTML entities JSX text and attribute strings may carry.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "copy" => Some('©'),
                "reg" => Some('®'),
                "trade" => Some('™'),
                "hellip" => Some('…'),
                "mdash" => Some('—'),
                "ndash" => Some('–'),
                "rarr" => Some('→'),
                "larr" => Some('←'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
