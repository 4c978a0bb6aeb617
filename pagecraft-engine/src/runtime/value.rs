use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use super::interp::{Interpreter, Interrupt};
use crate::jsx::ast::Function;

/// Native function: interpreter, `this`, arguments.
pub type NativeFn = fn(&mut Interpreter, &Value, Vec<Value>) -> Result<Value, Interrupt>;

/// A runtime value of the component interpreter.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Callable>),
    Element(Rc<Element>),
}

pub enum Callable {
    Closure {
        function: Arc<Function>,
        scope: Scope,
    },
    Native {
        name: &'static str,
        func: NativeFn,
    },
    /// Array, string or number method bound to its receiver
    Method { name: Rc<str>, receiver: Value },
    /// Stand-in for a component imported from a package we do not have
    Placeholder { name: Rc<str> },
}

impl Callable {
    pub fn name(&self) -> String {
        match self {
            Callable::Closure { function, .. } => {
                function.name.clone().unwrap_or_else(|| "anonymous".to_string())
            }
            Callable::Native { name, .. } => name.to_string(),
            Callable::Method { name, .. } | Callable::Placeholder { name } => name.to_string(),
        }
    }
}

/// Insertion-ordered string-keyed record.
#[derive(Clone, Default)]
pub struct Object {
    entries: Vec<(Rc<str>, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    pub fn set(&mut self, key: impl Into<Rc<str>>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Rc<str>> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ElementKind {
    Tag(Rc<str>),
    Fragment,
}

/// Output of `createElement` for a host tag or a fragment.
///
/// Component types never appear here: they are invoked as soon as the
/// element is created.
pub struct Element {
    pub kind: ElementKind,
    pub props: Object,
    pub children: Vec<Value>,
}

// ─── Scopes ──────────────────────────────────────────────────────────────────

struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
struct Frame {
    vars: HashMap<String, Binding>,
    parent: Option<Scope>,
}

/// Lexical scope chain.
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    pub fn child(&self) -> Scope {
        Scope(Rc::new(RefCell::new(Frame {
            vars: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .vars
            .insert(name.to_string(), Binding { value, mutable });
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let frame = scope.0.borrow();
            if let Some(binding) = frame.vars.get(name) {
                return Some(binding.value.clone());
            }
            current = frame.parent.clone();
        }
        None
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().vars.contains_key(name)
    }

    /// Reassigns an existing binding. Errors name the JS exception.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), String> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let mut frame = scope.0.borrow_mut();
            if let Some(binding) = frame.vars.get_mut(name) {
                if !binding.mutable {
                    return Err("TypeError: Assignment to constant variable.".to_string());
                }
                binding.value = value;
                return Ok(());
            }
            current = frame.parent.clone();
        }
        Err(format!("ReferenceError: {} is not defined", name))
    }

    /// Drops every binding, breaking closure reference cycles.
    pub fn clear(&self) {
        let mut frame = self.0.borrow_mut();
        frame.vars.clear();
        frame.parent = None;
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl Value {
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: Object) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn native(name: &'static str, func: NativeFn) -> Value {
        Value::Function(Rc::new(Callable::Native { name, func }))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Element(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Str(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                    i64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN)
                } else {
                    t.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(items) => {
                let items = items.borrow();
                match items.len() {
                    0 => 0.0,
                    1 => items[0].to_number(),
                    _ => f64::NAN,
                }
            }
            _ => f64::NAN,
        }
    }

    /// JS `String(value)`.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_js_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) | Value::Element(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("function {}() {{ [code] }}", f.name()),
        }
    }

    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::Str(_))
            | (Value::Str(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_eq(other),
        }
    }

    /// Same-value-zero, as used by `includes`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_eq(other),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::str(s),
            serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                let mut object = Object::new();
                for (k, v) in map {
                    object.set(k.as_str(), Value::from_json(v));
                }
                Value::object(object)
            }
        }
    }

    /// JSON projection; functions and undefined become `None` (skipped).
    pub fn to_json(&self, depth: usize) -> Option<serde_json::Value> {
        if depth > 64 {
            return Some(serde_json::Value::Null);
        }
        Some(match self {
            Value::Undefined | Value::Function(_) => return None,
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::Number((*n as i64).into())
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .borrow()
                    .iter()
                    .map(|v| v.to_json(depth + 1).unwrap_or(serde_json::Value::Null))
                    .collect(),
            ),
            Value::Object(object) => serde_json::Value::Object(
                object
                    .borrow()
                    .iter()
                    .filter_map(|(k, v)| v.to_json(depth + 1).map(|j| (k.to_string(), j)))
                    .collect(),
            ),
            Value::Element(_) => serde_json::Value::Object(serde_json::Map::new()),
        })
    }
}

/// JS number formatting for the ranges components realistically produce.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(object) => f
                .debug_map()
                .entries(object.borrow().iter().map(|(k, v)| (k.to_string(), v.clone())))
                .finish(),
            Value::Function(c) => write!(f, "[Function {}]", c.name()),
            Value::Element(el) => match &el.kind {
                ElementKind::Tag(tag) => write!(f, "<{}>", tag),
                ElementKind::Fragment => write!(f, "<>"),
            },
            other => f.write_str(&other.to_js_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_like_js() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(1e6), "1000000");
    }

    #[test]
    fn equality_rules() {
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.strict_eq(&Value::Undefined));
        assert!(Value::Number(1.0).loose_eq(&Value::str("1")));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
        assert!(Value::Number(f64::NAN).same_value_zero(&Value::Number(f64::NAN)));
    }

    #[test]
    fn array_to_string_joins_with_commas() {
        let v = Value::array(vec![Value::Number(1.0), Value::Null, Value::str("x")]);
        assert_eq!(v.to_js_string(), "1,,x");
    }

    #[test]
    fn scope_assignment_respects_const() {
        let global = Scope::default();
        global.declare("a", Value::Number(1.0), false);
        global.declare("b", Value::Number(1.0), true);
        let inner = global.child();
        assert!(inner.assign("a", Value::Null).is_err());
        assert!(inner.assign("b", Value::Null).is_ok());
        assert!(inner.assign("c", Value::Null).is_err());
        assert!(matches!(global.lookup("b"), Some(Value::Null)));
    }
}
