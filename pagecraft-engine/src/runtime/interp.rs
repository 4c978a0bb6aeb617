//! Tree-walking evaluator for lowered component programs.
//!
//! Every evaluation step is metered against the configured budget and every
//! call against the configured depth, so hostile or broken source ends in an
//! [`Interrupt`] instead of hanging or overflowing the host stack.

use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use super::builtins;
use super::value::{Callable, ElementKind, Object, Scope, Value};
use crate::config::EngineConfig;
use crate::jsx::ast::*;
use crate::jsx::print_expr;

/// Non-local exit out of evaluation.
#[derive(Debug, Clone)]
pub enum Interrupt {
    /// A JS exception (explicit `throw` or a runtime error)
    Throw(Value),
    /// Step budget or call depth exhausted
    Budget(String),
}

impl Interrupt {
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        Interrupt::Throw(error_value(name, &message.into()))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::error("TypeError", message)
    }

    pub fn message(&self) -> String {
        match self {
            Interrupt::Budget(m) => m.clone(),
            Interrupt::Throw(Value::Object(object)) => {
                let object = object.borrow();
                let message = object.get("message").map(Value::to_js_string);
                match (object.get("name"), message) {
                    (Some(name), Some(message)) => format!("{}: {}", name.to_js_string(), message),
                    (None, Some(message)) => message,
                    _ => "Uncaught [object Object]".to_string(),
                }
            }
            Interrupt::Throw(other) => format!("Uncaught {}", other.to_js_string()),
        }
    }
}

/// An `Error`-shaped record.
pub fn error_value(name: &str, message: &str) -> Value {
    let mut object = Object::new();
    object.set("name", Value::str(name));
    object.set("message", Value::str(message));
    Value::object(object)
}

enum Flow {
    Normal,
    Return(Value),
}

type Eval<T = Value> = Result<T, Interrupt>;

pub struct Interpreter {
    global: Scope,
    /// Every scope created during the run; cleared on drop to break the
    /// closure <-> scope reference cycles.
    scopes: Vec<Scope>,
    steps: u64,
    max_steps: u64,
    depth: usize,
    max_depth: usize,
    id_counter: u64,
    rng_state: u64,
}

impl Interpreter {
    pub fn new(config: &EngineConfig) -> Self {
        let global = Scope::default();
        builtins::install_globals(&global);
        Self {
            global,
            scopes: Vec::new(),
            steps: 0,
            max_steps: config.max_steps,
            depth: 0,
            max_depth: config.max_call_depth,
            id_counter: 0,
            rng_state: 0x2545_f491_4f6c_dd1d,
        }
    }

    pub fn global(&self) -> &Scope {
        &self.global
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Binds `local` in the global scope.
    pub fn define_global(&mut self, local: &str, value: Value) {
        self.global.declare(local, value, true);
    }

    /// Runs top-level statements. A top-level `return` is ignored.
    pub fn run_program(&mut self, program: &Program) -> Eval<()> {
        let global = self.global.clone();
        self.exec_block(&program.body, &global)?;
        Ok(())
    }

    pub(crate) fn tick(&mut self) -> Eval<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(Interrupt::Budget(format!(
                "execution exceeded the budget of {} steps",
                self.max_steps
            )));
        }
        Ok(())
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        self.id_counter += 1;
        self.id_counter
    }

    /// xorshift64*: deterministic so identical renders stay identical.
    pub(crate) fn next_random(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        (x.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 11) as f64 / (1u64 << 53) as f64
    }

    fn new_scope(&mut self, parent: &Scope) -> Scope {
        let scope = parent.child();
        self.scopes.push(scope.clone());
        scope
    }

    fn closure(&self, function: &Arc<Function>, scope: &Scope) -> Value {
        Value::Function(Rc::new(Callable::Closure {
            function: function.clone(),
            scope: scope.clone(),
        }))
    }

    // ─── Calls ───────────────────────────────────────────────────────────────

    pub fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Eval {
        let Value::Function(callable) = callee else {
            return Err(Interrupt::type_error(format!(
                "{} is not a function",
                callee.to_js_string()
            )));
        };
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            Err(Interrupt::Budget(format!(
                "maximum call depth of {} exceeded",
                self.max_depth
            )))
        } else {
            self.invoke(callable.clone(), this, args)
        };
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, callable: Rc<Callable>, this: Value, args: Vec<Value>) -> Eval {
        match &*callable {
            Callable::Native { func, .. } => func(self, &this, args),
            Callable::Method { name, receiver } => {
                builtins::call_method(self, receiver, name, args)
            }
            Callable::Placeholder { name } => Ok(builtins::placeholder_element(name, &args)),
            Callable::Closure { function, scope } => {
                let scope = self.new_scope(scope);
                if !function.is_arrow {
                    scope.declare("this", this, false);
                }
                self.bind_params(&function.params, args, &scope)?;
                match &function.body {
                    FunctionBody::Expr(expr) => self.eval(expr, &scope),
                    FunctionBody::Block(body) => match self.exec_block(body, &scope)? {
                        Flow::Return(value) => Ok(value),
                        Flow::Normal => Ok(Value::Undefined),
                    },
                }
            }
        }
    }

    fn bind_params(&mut self, params: &[Param], args: Vec<Value>, scope: &Scope) -> Eval<()> {
        let mut args = args.into_iter();
        for param in params {
            if param.rest {
                let rest = Value::array(args.by_ref().collect());
                self.bind_pattern(&param.pattern, rest, scope, true)?;
                break;
            }
            let mut value = args.next().unwrap_or(Value::Undefined);
            if let (Value::Undefined, Some(default)) = (&value, &param.default) {
                value = self.eval(default, scope)?;
            }
            self.bind_pattern(&param.pattern, value, scope, true)?;
        }
        Ok(())
    }

    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        scope: &Scope,
        mutable: bool,
    ) -> Eval<()> {
        match pattern {
            Pattern::Ident(name) => {
                scope.declare(name, value, mutable);
                Ok(())
            }
            Pattern::Object { properties, rest } => {
                if value.is_nullish() {
                    return Err(Interrupt::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                for prop in properties {
                    let mut field = self.get_property(&value, &prop.key)?;
                    if let (Value::Undefined, Some(default)) = (&field, &prop.default) {
                        field = self.eval(default, scope)?;
                    }
                    self.bind_pattern(&prop.value, field, scope, mutable)?;
                }
                if let Some(rest) = rest {
                    let mut remaining = Object::new();
                    if let Value::Object(object) = &value {
                        for (k, v) in object.borrow().iter() {
                            if !properties.iter().any(|p| p.key == **k) {
                                remaining.set(k.clone(), v.clone());
                            }
                        }
                    }
                    scope.declare(rest, Value::object(remaining), mutable);
                }
                Ok(())
            }
            Pattern::Array { elements, rest } => {
                let items = self.iterate(&value)?;
                for (i, element) in elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    let mut item = items.get(i).cloned().unwrap_or(Value::Undefined);
                    if let (Value::Undefined, Some(default)) = (&item, &element.default) {
                        item = self.eval(default, scope)?;
                    }
                    self.bind_pattern(&element.pattern, item, scope, mutable)?;
                }
                if let Some(rest) = rest {
                    let tail = items.iter().skip(elements.len()).cloned().collect();
                    scope.declare(rest, Value::array(tail), mutable);
                }
                Ok(())
            }
        }
    }

    /// Items of an iterable value (arrays and strings).
    pub(crate) fn iterate(&self, value: &Value) -> Eval<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            other => Err(Interrupt::type_error(format!(
                "{} is not iterable",
                other.to_js_string()
            ))),
        }
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn exec_block(&mut self, body: &[Stmt], scope: &Scope) -> Eval<Flow> {
        for stmt in body {
            if let Stmt::Function(function) = stmt {
                if let Some(name) = &function.name {
                    let closure = self.closure(function, scope);
                    scope.declare(name, closure, true);
                }
            }
        }
        for stmt in body {
            if let Flow::Return(value) = self.exec(stmt, scope)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, scope: &Scope) -> Eval<Flow> {
        self.tick()?;
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
            }
            Stmt::VarDecl { kind, declarations } => {
                for declaration in declarations {
                    let value = match &declaration.init {
                        Some(init) => self.eval(init, scope)?,
                        None => Value::Undefined,
                    };
                    self.bind_pattern(&declaration.pattern, value, scope, *kind != VarKind::Const)?;
                }
            }
            Stmt::Function(function) => {
                // Hoisted by the enclosing block unless it stands alone.
                if let Some(name) = &function.name {
                    if !scope.has_own(name) {
                        let closure = self.closure(function, scope);
                        scope.declare(name, closure, true);
                    }
                }
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.truthy() {
                    return self.exec(consequent, scope);
                } else if let Some(alternate) = alternate {
                    return self.exec(alternate, scope);
                }
            }
            Stmt::ForOf {
                kind,
                pattern,
                iterable,
                body,
            } => {
                let iterable = self.eval(iterable, scope)?;
                for item in self.iterate(&iterable)? {
                    self.tick()?;
                    let iteration = self.new_scope(scope);
                    self.bind_pattern(pattern, item, &iteration, *kind != VarKind::Const)?;
                    if let Flow::Return(value) = self.exec(body, &iteration)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Block(body) => {
                let inner = self.new_scope(scope);
                return self.exec_block(body, &inner);
            }
            Stmt::Throw(expr) => {
                let value = self.eval(expr, scope)?;
                return Err(Interrupt::Throw(value));
            }
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn eval(&mut self, expr: &Expr, scope: &Scope) -> Eval {
        Ok(self.eval_chain(expr, scope)?.unwrap_or(Value::Undefined))
    }

    /// `None` means an optional chain short-circuited somewhere below.
    fn eval_chain(&mut self, expr: &Expr, scope: &Scope) -> Eval<Option<Value>> {
        self.tick()?;
        let value = match expr {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(object) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *optional && object.is_nullish() {
                    return Ok(None);
                }
                self.get_property(&object, property)?
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let Some(object) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval(index, scope)?;
                self.get_index(&object, &key)?
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => return self.eval_call(callee, args, *optional, scope),
            other => self.eval_plain(other, scope)?,
        };
        Ok(Some(value))
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[ArrayElement],
        optional: bool,
        scope: &Scope,
    ) -> Eval<Option<Value>> {
        let (function, this) = match callee {
            Expr::Member {
                object,
                property,
                optional: member_optional,
            } => {
                let Some(object) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *member_optional && object.is_nullish() {
                    return Ok(None);
                }
                (self.get_property(&object, property)?, object)
            }
            Expr::Index {
                object,
                index,
                optional: member_optional,
            } => {
                let Some(object) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *member_optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval(index, scope)?;
                (self.get_index(&object, &key)?, object)
            }
            other => match self.eval_chain(other, scope)? {
                Some(function) => (function, Value::Undefined),
                None => return Ok(None),
            },
        };
        if optional && function.is_nullish() {
            return Ok(None);
        }
        if !matches!(function, Value::Function(_)) {
            return Err(Interrupt::type_error(format!(
                "{} is not a function",
                print_expr(callee)
            )));
        }
        let args = self.eval_args(args, scope)?;
        self.call(&function, this, args).map(Some)
    }

    fn eval_args(&mut self, args: &[ArrayElement], scope: &Scope) -> Eval<Vec<Value>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                ArrayElement::Expr(e) => out.push(self.eval(e, scope)?),
                ArrayElement::Spread(e) => {
                    let value = self.eval(e, scope)?;
                    out.extend(self.iterate(&value)?);
                }
                ArrayElement::Hole => out.push(Value::Undefined),
            }
        }
        Ok(out)
    }

    fn eval_plain(&mut self, expr: &Expr, scope: &Scope) -> Eval {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::str(s)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template { quasis, exprs } => {
                let mut out = String::new();
                for (i, quasi) in quasis.iter().enumerate() {
                    out.push_str(quasi);
                    if let Some(expr) = exprs.get(i) {
                        out.push_str(&self.eval(expr, scope)?.to_js_string());
                    }
                }
                Ok(Value::str(out))
            }
            Expr::Ident(name) => scope.lookup(name).ok_or_else(|| {
                Interrupt::error("ReferenceError", format!("{} is not defined", name))
            }),
            Expr::This => Ok(scope.lookup("this").unwrap_or(Value::Undefined)),
            Expr::Array(elements) => Ok(Value::array(self.eval_args(elements, scope)?)),
            Expr::Object(props) => self.eval_object(props, scope),
            Expr::Function(function) => Ok(self.closure(function, scope)),
            Expr::New { callee, args } => {
                let constructor = self.eval(callee, scope)?;
                let args = self.eval_args(args, scope)?;
                self.construct(&constructor, callee, args)
            }
            Expr::Unary { op, expr } => {
                if let (UnaryOp::TypeOf, Expr::Ident(name)) = (op, &**expr) {
                    let kind = scope.lookup(name).map_or("undefined", |v| v.type_of());
                    return Ok(Value::str(kind));
                }
                let value = self.eval(expr, scope)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::TypeOf => Value::str(value.type_of()),
                    UnaryOp::Void => Value::Undefined,
                })
            }
            Expr::Update { op, prefix, target } => {
                let old = self.eval(target, scope)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.assign_to(target, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                self.binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, scope)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, scope)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.truthy() {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, scope),
            Expr::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval(expr, scope)?;
                }
                Ok(last)
            }
            Expr::Jsx(_) => Err(Interrupt::error(
                "SyntaxError",
                "JSX must be lowered before execution",
            )),
            Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => self.eval(expr, scope),
        }
    }

    fn eval_object(&mut self, props: &[ObjectProp], scope: &Scope) -> Eval {
        let mut object = Object::new();
        for prop in props {
            match prop {
                ObjectProp::KeyValue(PropKey::Named(key), value) => {
                    let value = self.eval(value, scope)?;
                    object.set(key.as_str(), value);
                }
                ObjectProp::KeyValue(PropKey::Computed(key), value) => {
                    let key = self.eval(key, scope)?.to_js_string();
                    let value = self.eval(value, scope)?;
                    object.set(key, value);
                }
                ObjectProp::Shorthand(name) => {
                    let value = scope.lookup(name).ok_or_else(|| {
                        Interrupt::error("ReferenceError", format!("{} is not defined", name))
                    })?;
                    object.set(name.as_str(), value);
                }
                ObjectProp::Spread(expr) => match self.eval(expr, scope)? {
                    Value::Object(source) => {
                        for (k, v) in source.borrow().iter() {
                            object.set(k.clone(), v.clone());
                        }
                    }
                    Value::Array(items) => {
                        for (i, v) in items.borrow().iter().enumerate() {
                            object.set(i.to_string(), v.clone());
                        }
                    }
                    Value::Str(s) => {
                        for (i, c) in s.chars().enumerate() {
                            object.set(i.to_string(), Value::str(c.to_string()));
                        }
                    }
                    _ => {}
                },
            }
        }
        Ok(Value::object(object))
    }

    fn construct(&mut self, constructor: &Value, callee: &Expr, args: Vec<Value>) -> Eval {
        match constructor {
            Value::Function(callable) => match &**callable {
                Callable::Closure { .. } => {
                    let instance = Value::object(Object::new());
                    let result = self.call(constructor, instance.clone(), args)?;
                    Ok(match result {
                        Value::Object(_) | Value::Array(_) => result,
                        _ => instance,
                    })
                }
                _ => self.call(constructor, Value::Undefined, args),
            },
            _ => Err(Interrupt::type_error(format!(
                "{} is not a constructor",
                print_expr(callee)
            ))),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Eval {
        let num = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
        Ok(match op {
            BinaryOp::Add => {
                let is_text = |v: &Value| {
                    matches!(
                        v,
                        Value::Str(_) | Value::Array(_) | Value::Object(_) | Value::Element(_)
                    )
                };
                if is_text(left) || is_text(right) {
                    let mut out = left.to_js_string();
                    out.push_str(&right.to_js_string());
                    Value::str(out)
                } else {
                    num(|a, b| a + b)
                }
            }
            BinaryOp::Sub => num(|a, b| a - b),
            BinaryOp::Mul => num(|a, b| a * b),
            BinaryOp::Div => num(|a, b| a / b),
            BinaryOp::Rem => num(|a, b| a % b),
            BinaryOp::Exp => num(f64::powf),
            BinaryOp::Eq => Value::Bool(left.loose_eq(right)),
            BinaryOp::NotEq => Value::Bool(!left.loose_eq(right)),
            BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
            BinaryOp::StrictNotEq => Value::Bool(!left.strict_eq(right)),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let ordering = match (left, right) {
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ => left.to_number().partial_cmp(&right.to_number()),
                };
                Value::Bool(match ordering {
                    None => false,
                    Some(ordering) => match op {
                        BinaryOp::Lt => ordering.is_lt(),
                        BinaryOp::LtEq => ordering.is_le(),
                        BinaryOp::Gt => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    },
                })
            }
            BinaryOp::In => {
                let key = left.to_js_string();
                Value::Bool(match right {
                    Value::Object(object) => object.borrow().contains(&key),
                    Value::Array(items) => {
                        key == "length"
                            || key.parse::<usize>().is_ok_and(|i| i < items.borrow().len())
                    }
                    other => {
                        return Err(Interrupt::type_error(format!(
                            "Cannot use 'in' operator to search for '{}' in {}",
                            key,
                            other.to_js_string()
                        )))
                    }
                })
            }
            BinaryOp::InstanceOf => Value::Bool(builtins::instance_of(left, right)),
        })
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, scope: &Scope) -> Eval {
        let result = match op {
            AssignOp::Assign => self.eval(value, scope)?,
            AssignOp::Or | AssignOp::And | AssignOp::Nullish => {
                let current = self.eval(target, scope)?;
                let keep = match op {
                    AssignOp::Or => current.truthy(),
                    AssignOp::And => !current.truthy(),
                    _ => !current.is_nullish(),
                };
                if keep {
                    return Ok(current);
                }
                self.eval(value, scope)?
            }
            AssignOp::Add | AssignOp::Sub | AssignOp::Mul | AssignOp::Div => {
                let current = self.eval(target, scope)?;
                let rhs = self.eval(value, scope)?;
                let op = match op {
                    AssignOp::Add => BinaryOp::Add,
                    AssignOp::Sub => BinaryOp::Sub,
                    AssignOp::Mul => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                };
                self.binary(op, &current, &rhs)?
            }
        };
        self.assign_to(target, result.clone(), scope)?;
        Ok(result)
    }

    fn assign_to(&mut self, target: &Expr, value: Value, scope: &Scope) -> Eval<()> {
        match target {
            Expr::Ident(name) => scope
                .assign(name, value)
                .map_err(|message| match message.split_once(": ") {
                    Some((kind, rest)) => Interrupt::error(kind, rest),
                    None => Interrupt::type_error(message),
                }),
            Expr::Member { object, property, .. } => {
                let object = self.eval(object, scope)?;
                self.set_property(&object, property, value)
            }
            Expr::Index { object, index, .. } => {
                let object = self.eval(object, scope)?;
                let key = self.eval(index, scope)?;
                self.set_property(&object, &key.to_js_string(), value)
            }
            other => Err(Interrupt::error(
                "SyntaxError",
                format!("Invalid assignment target: {}", print_expr(other)),
            )),
        }
    }

    // ─── Properties ──────────────────────────────────────────────────────────

    fn get_index(&mut self, object: &Value, key: &Value) -> Eval {
        if let (Value::Array(items), Value::Number(n)) = (object, key) {
            if n.fract() == 0.0 && *n >= 0.0 {
                return Ok(items
                    .borrow()
                    .get(*n as usize)
                    .cloned()
                    .unwrap_or(Value::Undefined));
            }
        }
        self.get_property(object, &key.to_js_string())
    }

    pub fn get_property(&mut self, object: &Value, key: &str) -> Eval {
        Ok(match object {
            Value::Undefined | Value::Null => {
                return Err(Interrupt::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    object.to_js_string(),
                    key
                )))
            }
            Value::Object(record) => record.borrow().get(key).cloned().unwrap_or_else(|| {
                if builtins::has_method(object, key) {
                    bound_method(object, key)
                } else {
                    Value::Undefined
                }
            }),
            Value::Array(items) => {
                if key == "length" {
                    Value::Number(items.borrow().len() as f64)
                } else if let Ok(index) = key.parse::<usize>() {
                    items.borrow().get(index).cloned().unwrap_or(Value::Undefined)
                } else if builtins::has_method(object, key) {
                    bound_method(object, key)
                } else {
                    Value::Undefined
                }
            }
            Value::Str(s) => {
                if key == "length" {
                    Value::Number(s.encode_utf16().count() as f64)
                } else if let Ok(index) = key.parse::<usize>() {
                    s.chars()
                        .nth(index)
                        .map(|c| Value::str(c.to_string()))
                        .unwrap_or(Value::Undefined)
                } else if builtins::has_method(object, key) {
                    bound_method(object, key)
                } else {
                    Value::Undefined
                }
            }
            Value::Number(_) if builtins::has_method(object, key) => bound_method(object, key),
            Value::Function(callable) => match &**callable {
                Callable::Placeholder { name } => Value::Function(Rc::new(Callable::Placeholder {
                    name: Rc::from(format!("{}.{}", name, key)),
                })),
                Callable::Native { name, .. } => builtins::static_member(name, key),
                Callable::Closure { function, .. } if key == "name" => {
                    Value::str(function.name.as_deref().unwrap_or(""))
                }
                _ => Value::Undefined,
            },
            Value::Element(element) => match key {
                "props" => {
                    let mut props = element.props.clone();
                    if !element.children.is_empty() {
                        props.set("children", Value::array(element.children.clone()));
                    }
                    Value::object(props)
                }
                "type" => match &element.kind {
                    ElementKind::Tag(tag) => Value::Str(tag.clone()),
                    ElementKind::Fragment => Value::str("Fragment"),
                },
                _ => Value::Undefined,
            },
            _ => Value::Undefined,
        })
    }

    pub fn set_property(&mut self, object: &Value, key: &str, value: Value) -> Eval<()> {
        match object {
            Value::Undefined | Value::Null => Err(Interrupt::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                object.to_js_string(),
                key
            ))),
            Value::Object(record) => {
                record.borrow_mut().set(key, value);
                Ok(())
            }
            Value::Array(items) => {
                if key == "length" {
                    let len = value.to_number();
                    if len.fract() != 0.0 || len < 0.0 {
                        return Err(Interrupt::error("RangeError", "Invalid array length"));
                    }
                    items
                        .borrow_mut()
                        .resize(builtins::capped_len(len as usize)?, Value::Undefined);
                } else if let Ok(index) = key.parse::<usize>() {
                    let mut items = items.borrow_mut();
                    if index >= items.len() {
                        items.resize(builtins::capped_len(index + 1)?, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn bound_method(receiver: &Value, name: &str) -> Value {
    Value::Function(Rc::new(Callable::Method {
        name: Rc::from(name),
        receiver: receiver.clone(),
    }))
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        debug!(
            steps = self.steps,
            scopes = self.scopes.len(),
            "interpreter released"
        );
        for scope in self.scopes.drain(..) {
            scope.clear();
        }
        self.global.clear();
    }
}
