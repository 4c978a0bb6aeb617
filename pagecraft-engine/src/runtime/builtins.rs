//! Globals and primitive methods visible to component code.
//!
//! Hooks are render-once stand-ins: state never changes after the first
//! render, effects never run, memo callbacks run eagerly.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use super::interp::{error_value, Interpreter, Interrupt};
use super::value::{format_number, Callable, Element, ElementKind, Object, Scope, Value};

type Eval<T = Value> = Result<T, Interrupt>;

/// Upper bound on array lengths component code may create.
pub const MAX_ARRAY_LEN: usize = 100_000;

/// Hidden field holding a date's epoch milliseconds.
const DATE_TIME_KEY: &str = "__time";

const ARRAY_METHODS: &[&str] = &[
    "map", "filter", "forEach", "find", "findIndex", "some", "every", "reduce", "flatMap", "join",
    "includes", "indexOf", "lastIndexOf", "slice", "concat", "push", "pop", "shift", "unshift",
    "reverse", "flat", "at", "sort", "toString",
];

const STRING_METHODS: &[&str] = &[
    "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd", "split", "includes",
    "startsWith", "endsWith", "indexOf", "slice", "substring", "replace", "replaceAll", "charAt",
    "padStart", "padEnd", "repeat", "toString", "concat", "at", "localeCompare",
];

const NUMBER_METHODS: &[&str] = &["toFixed", "toString", "toLocaleString"];

const DATE_METHODS: &[&str] = &[
    "getFullYear", "getMonth", "getDate", "getDay", "getHours", "getMinutes", "getSeconds",
    "getTime", "valueOf", "toISOString", "toLocaleDateString", "toDateString",
];

pub fn install_globals(global: &Scope) {
    let react = react_namespace();
    if let Value::Object(object) = &react {
        for (name, value) in object.borrow().iter() {
            global.declare(name, value.clone(), true);
        }
    }
    global.declare("React", react, true);

    let bindings: Vec<(&str, Value)> = vec![
        ("Math", math_namespace()),
        ("Object", object_namespace()),
        ("Array", array_namespace()),
        ("JSON", json_namespace()),
        ("console", console_namespace()),
        ("String", Value::native("String", string_ctor)),
        ("Number", Value::native("Number", number_ctor)),
        ("Boolean", Value::native("Boolean", boolean_ctor)),
        ("Error", Value::native("Error", error_ctor)),
        ("Date", Value::native("Date", date_ctor)),
        ("parseInt", Value::native("parseInt", parse_int)),
        ("parseFloat", Value::native("parseFloat", parse_float)),
        ("isNaN", Value::native("isNaN", is_nan)),
        ("isFinite", Value::native("isFinite", is_finite)),
        ("encodeURIComponent", Value::native("encodeURIComponent", encode_uri_component)),
        ("NaN", Value::Number(f64::NAN)),
        ("Infinity", Value::Number(f64::INFINITY)),
    ];
    for (name, value) in bindings {
        global.declare(name, value, true);
    }
}

/// Value bound to an import specifier. `imported` is `None` for default
/// and namespace imports.
pub fn import_binding(module: &str, imported: Option<&str>, local: &str) -> Value {
    match module {
        "react" | "react-dom" => {
            let react = react_namespace();
            match imported {
                None => react,
                Some(name) => match &react {
                    Value::Object(object) => object
                        .borrow()
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| Value::native("Fragment", fragment)),
                    _ => react.clone(),
                },
            }
        }
        "clsx" | "classnames" => Value::native("clsx", class_names),
        _ => Value::Function(Rc::new(Callable::Placeholder {
            name: Rc::from(imported.unwrap_or(local)),
        })),
    }
}

fn namespace(entries: Vec<(&'static str, Value)>) -> Value {
    let mut object = Object::new();
    for (name, value) in entries {
        object.set(name, value);
    }
    Value::object(object)
}

fn react_namespace() -> Value {
    namespace(vec![
        ("createElement", Value::native("createElement", create_element)),
        ("Fragment", Value::native("Fragment", fragment)),
        ("StrictMode", Value::native("StrictMode", fragment)),
        ("useState", Value::native("useState", use_state)),
        ("useReducer", Value::native("useReducer", use_reducer)),
        ("useEffect", Value::native("useEffect", use_effect)),
        ("useLayoutEffect", Value::native("useLayoutEffect", use_effect)),
        ("useMemo", Value::native("useMemo", use_memo)),
        ("useCallback", Value::native("useCallback", identity)),
        ("useRef", Value::native("useRef", use_ref)),
        ("useContext", Value::native("useContext", use_context)),
        ("useId", Value::native("useId", use_id)),
        ("createContext", Value::native("createContext", create_context)),
        ("forwardRef", Value::native("forwardRef", identity)),
        ("memo", Value::native("memo", identity)),
    ])
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn num_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, Value::to_number)
}

fn require_function(value: &Value) -> Eval<()> {
    match value {
        Value::Function(_) => Ok(()),
        other => Err(Interrupt::type_error(format!(
            "{} is not a function",
            other.to_js_string()
        ))),
    }
}

pub(crate) fn capped_len(len: usize) -> Eval<usize> {
    if len > MAX_ARRAY_LEN {
        return Err(Interrupt::error("RangeError", "Invalid array length"));
    }
    Ok(len)
}

fn element(kind: ElementKind, props: Object, children: Vec<Value>) -> Value {
    Value::Element(Rc::new(Element {
        kind,
        props,
        children,
    }))
}

// ─── React primitives ────────────────────────────────────────────────────────

fn create_element(interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    let mut args = args.into_iter();
    let kind = args.next().unwrap_or(Value::Undefined);
    let mut props = match args.next() {
        Some(Value::Object(object)) => object.borrow().clone(),
        _ => Object::new(),
    };
    let mut children: Vec<Value> = args.collect();
    match &kind {
        Value::Str(tag) => Ok(element(ElementKind::Tag(tag.clone()), props, children)),
        Value::Function(_) => {
            if children.len() == 1 {
                props.set("children", children.remove(0));
            } else if !children.is_empty() {
                props.set("children", Value::array(children));
            }
            interp.call(&kind, Value::Undefined, vec![Value::object(props)])
        }
        other => Err(Interrupt::type_error(format!(
            "Element type is invalid: expected a string or a function but got: {}",
            other.type_of()
        ))),
    }
}

fn fragment(_interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    let children = match args.first() {
        Some(Value::Object(props)) => match props.borrow().get("children") {
            Some(Value::Array(items)) => items.borrow().clone(),
            Some(Value::Undefined) | None => Vec::new(),
            Some(single) => vec![single.clone()],
        },
        _ => Vec::new(),
    };
    Ok(element(ElementKind::Fragment, Object::new(), children))
}

fn noop(_interp: &mut Interpreter, _this: &Value, _args: Vec<Value>) -> Eval {
    Ok(Value::Undefined)
}

fn identity(_interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    Ok(arg(&args, 0))
}

fn use_state(interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    let initial = arg(&args, 0);
    let state = if matches!(initial, Value::Function(_)) {
        interp.call(&initial, Value::Undefined, Vec::new())?
    } else {
        initial
    };
    Ok(Value::array(vec![state, Value::native("setState", noop)]))
}

fn use_reducer(interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    let initial = arg(&args, 1);
    let state = match args.get(2) {
        Some(init @ Value::Function(_)) => interp.call(init, Value::Undefined, vec![initial])?,
        _ => initial,
    };
    Ok(Value::array(vec![state, Value::native("dispatch", noop)]))
}

fn use_effect(_interp: &mut Interpreter, _this: &Value, _args: Vec<Value>) -> Eval {
    Ok(Value::Undefined)
}

fn use_memo(interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    let factory = arg(&args, 0);
    require_function(&factory)?;
    interp.call(&factory, Value::Undefined, Vec::new())
}

fn use_ref(_interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    let mut object = Object::new();
    object.set("current", arg(&args, 0));
    Ok(Value::object(object))
}

fn create_context(_interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    Ok(namespace(vec![
        ("Provider", Value::native("Provider", fragment)),
        ("Consumer", Value::native("Consumer", fragment)),
        ("_currentValue", arg(&args, 0)),
    ]))
}

fn use_context(_interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    Ok(match args.first() {
        Some(Value::Object(context)) => context
            .borrow()
            .get("_currentValue")
            .cloned()
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    })
}

fn use_id(interp: &mut Interpreter, _this: &Value, _args: Vec<Value>) -> Eval {
    Ok(Value::str(format!(":r{}:", interp.next_id())))
}

/// Inert stand-in for a component from a package that is not available,
/// typically an icon.
///
/// Called with a string first argument it behaves like a class-name joiner,
/// which is what unresolved `cn(...)` style helpers are.
pub fn placeholder_element(name: &str, args: &[Value]) -> Value {
    if matches!(args.first(), Some(Value::Str(_))) {
        return Value::str(join_classes(args));
    }
    let mut props = Object::new();
    props.set("data-icon", Value::str(name));
    props.set("aria-hidden", Value::str("true"));
    if let Some(Value::Object(given)) = args.first() {
        let given = given.borrow();
        for key in ["className", "style", "width", "height"] {
            if let Some(value) = given.get(key) {
                props.set(key, value.clone());
            }
        }
        if let Some(size) = given.get("size") {
            props.set("width", size.clone());
            props.set("height", size.clone());
        }
    }
    element(ElementKind::Tag(Rc::from("svg")), props, Vec::new())
}

fn join_classes(args: &[Value]) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Str(s) if !s.is_empty() => out.push(s.to_string()),
            Value::Number(n) if *n != 0.0 => out.push(format_number(*n)),
            Value::Array(items) => items.borrow().iter().for_each(|v| collect(v, out)),
            Value::Object(object) => {
                for (k, v) in object.borrow().iter() {
                    if v.truthy() {
                        out.push(k.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    args.iter().for_each(|v| collect(v, &mut out));
    out.join(" ")
}

fn class_names(_interp: &mut Interpreter, _this: &Value, args: Vec<Value>) -> Eval {
    Ok(Value::str(join_classes(&args)))
}

// ─── Namespaces ──────────────────────────────────────────────────────────────

fn math_namespace() -> Value {
    fn unary(args: &[Value], f: fn(f64) -> f64) -> Eval {
        Ok(Value::Number(f(num_arg(args, 0))))
    }
    fn floor(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, f64::floor)
    }
    fn ceil(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, f64::ceil)
    }
    fn round(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, |n| (n + 0.5).floor())
    }
    fn abs(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, f64::abs)
    }
    fn sqrt(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, f64::sqrt)
    }
    fn trunc(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, f64::trunc)
    }
    fn sign(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        unary(&a, |n| if n == 0.0 || n.is_nan() { n } else { n.signum() })
    }
    fn pow(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::Number(num_arg(&a, 0).powf(num_arg(&a, 1))))
    }
    fn min(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::Number(a.iter().map(Value::to_number).fold(f64::INFINITY, |acc, n| {
            if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }
        })))
    }
    fn max(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::Number(a.iter().map(Value::to_number).fold(f64::NEG_INFINITY, |acc, n| {
            if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }
        })))
    }
    fn random(interp: &mut Interpreter, _: &Value, _: Vec<Value>) -> Eval {
        Ok(Value::Number(interp.next_random()))
    }
    namespace(vec![
        ("PI", Value::Number(std::f64::consts::PI)),
        ("E", Value::Number(std::f64::consts::E)),
        ("floor", Value::native("floor", floor)),
        ("ceil", Value::native("ceil", ceil)),
        ("round", Value::native("round", round)),
        ("abs", Value::native("abs", abs)),
        ("sqrt", Value::native("sqrt", sqrt)),
        ("trunc", Value::native("trunc", trunc)),
        ("sign", Value::native("sign", sign)),
        ("pow", Value::native("pow", pow)),
        ("min", Value::native("min", min)),
        ("max", Value::native("max", max)),
        ("random", Value::native("random", random)),
    ])
}

fn own_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(object) => object
            .borrow()
            .iter()
            .filter(|(k, _)| &***k != DATE_TIME_KEY)
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::Str(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::str(c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

fn object_namespace() -> Value {
    fn keys(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::array(
            own_entries(&arg(&a, 0)).into_iter().map(|(k, _)| Value::str(k)).collect(),
        ))
    }
    fn values(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::array(
            own_entries(&arg(&a, 0)).into_iter().map(|(_, v)| v).collect(),
        ))
    }
    fn entries(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::array(
            own_entries(&arg(&a, 0))
                .into_iter()
                .map(|(k, v)| Value::array(vec![Value::str(k), v]))
                .collect(),
        ))
    }
    fn assign(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        let target = arg(&a, 0);
        let Value::Object(object) = &target else {
            return Err(Interrupt::type_error("Cannot convert undefined or null to object"));
        };
        for source in a.iter().skip(1) {
            for (k, v) in own_entries(source) {
                object.borrow_mut().set(k, v);
            }
        }
        Ok(target)
    }
    fn from_entries(interp: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        let mut object = Object::new();
        for entry in interp.iterate(&arg(&a, 0))? {
            if let Value::Array(pair) = entry {
                let pair = pair.borrow();
                let key = pair.first().map(Value::to_js_string).unwrap_or_default();
                object.set(key, pair.get(1).cloned().unwrap_or(Value::Undefined));
            }
        }
        Ok(Value::object(object))
    }
    namespace(vec![
        ("keys", Value::native("keys", keys)),
        ("values", Value::native("values", values)),
        ("entries", Value::native("entries", entries)),
        ("assign", Value::native("assign", assign)),
        ("fromEntries", Value::native("fromEntries", from_entries)),
        ("freeze", Value::native("freeze", identity)),
    ])
}

fn array_namespace() -> Value {
    fn is_array(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::Bool(matches!(a.first(), Some(Value::Array(_)))))
    }
    fn from(interp: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        let source = arg(&a, 0);
        let items = match &source {
            Value::Array(_) | Value::Str(_) => interp.iterate(&source)?,
            Value::Object(object) => {
                let len = object.borrow().get("length").map_or(0.0, Value::to_number);
                let len = if len.is_finite() && len > 0.0 { len as usize } else { 0 };
                vec![Value::Undefined; capped_len(len)?]
            }
            _ => Vec::new(),
        };
        let map = arg(&a, 1);
        if !matches!(map, Value::Function(_)) {
            return Ok(Value::array(items));
        }
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            interp.tick()?;
            out.push(interp.call(&map, Value::Undefined, vec![item, Value::Number(i as f64)])?);
        }
        Ok(Value::array(out))
    }
    fn of(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::array(a))
    }
    namespace(vec![
        ("isArray", Value::native("isArray", is_array)),
        ("from", Value::native("from", from)),
        ("of", Value::native("of", of)),
    ])
}

fn json_namespace() -> Value {
    fn stringify(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        let Some(json) = arg(&a, 0).to_json(0) else {
            return Ok(Value::Undefined);
        };
        let pretty = arg(&a, 2).truthy();
        let text = if pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        };
        text.map(Value::str)
            .map_err(|e| Interrupt::type_error(e.to_string()))
    }
    fn parse(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        let text = arg(&a, 0).to_js_string();
        serde_json::from_str::<serde_json::Value>(&text)
            .map(|json| Value::from_json(&json))
            .map_err(|e| Interrupt::error("SyntaxError", e.to_string()))
    }
    namespace(vec![
        ("stringify", Value::native("stringify", stringify)),
        ("parse", Value::native("parse", parse)),
    ])
}

fn console_namespace() -> Value {
    fn log(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        let line = a.iter().map(Value::to_js_string).collect::<Vec<_>>().join(" ");
        debug!(target: "pagecraft::console", "{}", line);
        Ok(Value::Undefined)
    }
    namespace(vec![
        ("log", Value::native("log", log)),
        ("info", Value::native("info", log)),
        ("warn", Value::native("warn", log)),
        ("error", Value::native("error", log)),
        ("debug", Value::native("debug", log)),
    ])
}

// ─── Global functions ────────────────────────────────────────────────────────

fn string_ctor(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    Ok(Value::str(a.first().map(Value::to_js_string).unwrap_or_default()))
}

fn number_ctor(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    Ok(Value::Number(a.first().map_or(0.0, Value::to_number)))
}

fn boolean_ctor(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    Ok(Value::Bool(a.first().is_some_and(Value::truthy)))
}

fn error_ctor(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    let message = match a.first() {
        None | Some(Value::Undefined) => String::new(),
        Some(v) => v.to_js_string(),
    };
    Ok(error_value("Error", &message))
}

fn parse_int(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    let text = arg(&a, 0).to_js_string();
    let mut s = text.trim();
    let negative = s.starts_with('-');
    if negative || s.starts_with('+') {
        s = &s[1..];
    }
    let mut radix = match arg(&a, 1) {
        Value::Undefined => 10,
        r => r.to_number() as u32,
    };
    if radix == 0 {
        radix = 10;
    }
    if (radix == 16 || radix == 10) && (s.starts_with("0x") || s.starts_with("0X")) {
        radix = 16;
        s = &s[2..];
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    Ok(Value::Number(if negative { -value } else { value }))
}

/// Longest numeric prefix of `text`, as `parseFloat` reads it.
fn float_prefix(text: &str) -> f64 {
    let s = text.trim_start();
    if s.starts_with("Infinity") || s.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if s.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }
    let mut best = f64::NAN;
    for (i, c) in s.char_indices() {
        if !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')) {
            break;
        }
        if let Ok(n) = s[..i + c.len_utf8()].parse::<f64>() {
            best = n;
        }
    }
    best
}

fn parse_float(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    Ok(Value::Number(float_prefix(&arg(&a, 0).to_js_string())))
}

fn is_nan(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    Ok(Value::Bool(num_arg(&a, 0).is_nan()))
}

fn is_finite(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    Ok(Value::Bool(num_arg(&a, 0).is_finite()))
}

fn encode_uri_component(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    let text = arg(&a, 0).to_js_string();
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    Ok(Value::str(out))
}

// ─── Dates ───────────────────────────────────────────────────────────────────

fn date_value(millis: f64) -> Value {
    let mut object = Object::new();
    object.set(DATE_TIME_KEY, Value::Number(millis));
    Value::object(object)
}

fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}

fn parse_date(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.timestamp_millis() as f64;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(f64::NAN, |dt| dt.and_utc().timestamp_millis() as f64)
}

fn date_ctor(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
    let millis = match a.first() {
        None | Some(Value::Undefined) => now_millis(),
        Some(Value::Number(n)) => *n,
        Some(Value::Str(s)) => parse_date(s),
        Some(Value::Object(object)) => object
            .borrow()
            .get(DATE_TIME_KEY)
            .map_or(f64::NAN, Value::to_number),
        Some(other) => other.to_number(),
    };
    Ok(date_value(millis))
}

fn date_now(_: &mut Interpreter, _: &Value, _: Vec<Value>) -> Eval {
    Ok(Value::Number(now_millis()))
}

fn date_method(millis: f64, name: &str, args: &[Value]) -> Eval {
    use chrono::{Datelike, Timelike};

    let Some(dt) = (millis.is_finite())
        .then(|| DateTime::<Utc>::from_timestamp_millis(millis as i64))
        .flatten()
    else {
        return match name {
            "toISOString" => Err(Interrupt::error("RangeError", "Invalid time value")),
            "toLocaleDateString" | "toDateString" => Ok(Value::str("Invalid Date")),
            _ => Ok(Value::Number(f64::NAN)),
        };
    };
    Ok(match name {
        "getFullYear" => Value::Number(dt.year() as f64),
        "getMonth" => Value::Number(dt.month0() as f64),
        "getDate" => Value::Number(dt.day() as f64),
        "getDay" => Value::Number(dt.weekday().num_days_from_sunday() as f64),
        "getHours" => Value::Number(dt.hour() as f64),
        "getMinutes" => Value::Number(dt.minute() as f64),
        "getSeconds" => Value::Number(dt.second() as f64),
        "getTime" | "valueOf" => Value::Number(millis),
        "toISOString" => Value::str(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        "toDateString" => Value::str(dt.format("%a %b %d %Y").to_string()),
        _ => {
            let month = match args.get(1) {
                Some(Value::Object(options)) => options
                    .borrow()
                    .get("month")
                    .map(Value::to_js_string)
                    .unwrap_or_default(),
                _ => String::new(),
            };
            let pattern = match month.as_str() {
                "long" => "%B %-d, %Y",
                "short" => "%b %-d, %Y",
                _ => "%-m/%-d/%Y",
            };
            Value::str(dt.format(pattern).to_string())
        }
    })
}

/// Static members of native constructors (`Date.now`, `Number.isInteger`).
pub fn static_member(constructor: &str, key: &str) -> Value {
    fn is_integer(_: &mut Interpreter, _: &Value, a: Vec<Value>) -> Eval {
        Ok(Value::Bool(
            matches!(a.first(), Some(Value::Number(n)) if n.is_finite() && n.fract() == 0.0),
        ))
    }
    match (constructor, key) {
        ("Date", "now") => Value::native("now", date_now),
        ("Number", "isInteger") => Value::native("isInteger", is_integer),
        ("Number", "isNaN") => Value::native("isNaN", is_nan),
        ("Number", "isFinite") => Value::native("isFinite", is_finite),
        ("Number", "parseFloat") => Value::native("parseFloat", parse_float),
        ("Number", "parseInt") => Value::native("parseInt", parse_int),
        ("Number", "MAX_SAFE_INTEGER") => Value::Number(9_007_199_254_740_991.0),
        _ => Value::Undefined,
    }
}

pub fn instance_of(value: &Value, constructor: &Value) -> bool {
    match constructor {
        Value::Object(object) if object.borrow().contains("isArray") => {
            matches!(value, Value::Array(_))
        }
        Value::Function(callable) => match (&**callable, value) {
            (Callable::Native { name: "Date", .. }, Value::Object(o)) => {
                o.borrow().contains(DATE_TIME_KEY)
            }
            (Callable::Native { name: "Error", .. }, Value::Object(o)) => {
                let o = o.borrow();
                o.contains("name") && o.contains("message")
            }
            _ => false,
        },
        _ => false,
    }
}

// ─── Methods ─────────────────────────────────────────────────────────────────

pub fn has_method(receiver: &Value, name: &str) -> bool {
    match receiver {
        Value::Array(_) => ARRAY_METHODS.contains(&name),
        Value::Str(_) => STRING_METHODS.contains(&name),
        Value::Number(_) => NUMBER_METHODS.contains(&name),
        Value::Object(object) => {
            name == "hasOwnProperty"
                || (DATE_METHODS.contains(&name) && object.borrow().contains(DATE_TIME_KEY))
        }
        _ => false,
    }
}

pub fn call_method(interp: &mut Interpreter, receiver: &Value, name: &str, args: Vec<Value>) -> Eval {
    match receiver {
        Value::Array(items) => array_method(interp, receiver, items, name, args),
        Value::Str(s) => string_method(interp, s, name, args),
        Value::Number(n) => number_method(*n, name, &args),
        Value::Object(object) => {
            let time = object.borrow().get(DATE_TIME_KEY).map(Value::to_number);
            match (name, time) {
                ("hasOwnProperty", _) => {
                    let key = arg(&args, 0).to_js_string();
                    Ok(Value::Bool(object.borrow().contains(&key)))
                }
                (_, Some(millis)) => date_method(millis, name, &args),
                _ => Ok(Value::Undefined),
            }
        }
        _ => Ok(Value::Undefined),
    }
}

/// Resolves a relative index (`slice`, `at`) against `len`.
fn relative(index: &Value, len: usize, default: usize) -> usize {
    match index {
        Value::Undefined => default,
        other => {
            let n = other.to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                (n as usize).min(len)
            }
        }
    }
}

fn array_method(
    interp: &mut Interpreter,
    receiver: &Value,
    items: &Rc<RefCell<Vec<Value>>>,
    name: &str,
    args: Vec<Value>,
) -> Eval {
    let snapshot = items.borrow().clone();
    let len = snapshot.len();
    let callback = arg(&args, 0);
    let each = |interp: &mut Interpreter, i: usize, item: &Value| -> Eval {
        interp.tick()?;
        interp.call(
            &callback,
            Value::Undefined,
            vec![item.clone(), Value::Number(i as f64), receiver.clone()],
        )
    };

    match name {
        "map" => {
            require_function(&arg(&args, 0))?;
            let mut out = Vec::with_capacity(len);
            for (i, item) in snapshot.iter().enumerate() {
                out.push(each(interp, i, item)?);
            }
            Ok(Value::array(out))
        }
        "flatMap" => {
            require_function(&arg(&args, 0))?;
            let mut out = Vec::new();
            for (i, item) in snapshot.iter().enumerate() {
                match each(interp, i, item)? {
                    Value::Array(inner) => out.extend(inner.borrow().iter().cloned()),
                    other => out.push(other),
                }
            }
            Ok(Value::array(out))
        }
        "filter" => {
            require_function(&arg(&args, 0))?;
            let mut out = Vec::new();
            for (i, item) in snapshot.iter().enumerate() {
                if each(interp, i, item)?.truthy() {
                    out.push(item.clone());
                }
            }
            Ok(Value::array(out))
        }
        "forEach" => {
            require_function(&arg(&args, 0))?;
            for (i, item) in snapshot.iter().enumerate() {
                each(interp, i, item)?;
            }
            Ok(Value::Undefined)
        }
        "find" | "findIndex" => {
            require_function(&arg(&args, 0))?;
            for (i, item) in snapshot.iter().enumerate() {
                if each(interp, i, item)?.truthy() {
                    return Ok(if name == "find" {
                        item.clone()
                    } else {
                        Value::Number(i as f64)
                    });
                }
            }
            Ok(if name == "find" {
                Value::Undefined
            } else {
                Value::Number(-1.0)
            })
        }
        "some" => {
            require_function(&arg(&args, 0))?;
            for (i, item) in snapshot.iter().enumerate() {
                if each(interp, i, item)?.truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "every" => {
            require_function(&arg(&args, 0))?;
            for (i, item) in snapshot.iter().enumerate() {
                if !each(interp, i, item)?.truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        "reduce" => {
            let reducer = arg(&args, 0);
            require_function(&reducer)?;
            let mut iter = snapshot.iter().enumerate();
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match iter.next() {
                    Some((_, first)) => first.clone(),
                    None => {
                        return Err(Interrupt::type_error(
                            "Reduce of empty array with no initial value",
                        ))
                    }
                },
            };
            for (i, item) in iter {
                interp.tick()?;
                acc = interp.call(
                    &reducer,
                    Value::Undefined,
                    vec![acc, item.clone(), Value::Number(i as f64), receiver.clone()],
                )?;
            }
            Ok(acc)
        }
        "join" | "toString" => {
            let separator = match args.first() {
                Some(Value::Undefined) | None => ",".to_string(),
                Some(sep) if name == "join" => sep.to_js_string(),
                Some(_) => ",".to_string(),
            };
            Ok(Value::str(
                snapshot
                    .iter()
                    .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
                    .collect::<Vec<_>>()
                    .join(&separator),
            ))
        }
        "includes" => {
            let needle = arg(&args, 0);
            Ok(Value::Bool(snapshot.iter().any(|v| v.same_value_zero(&needle))))
        }
        "indexOf" | "lastIndexOf" => {
            let needle = arg(&args, 0);
            let position = if name == "indexOf" {
                snapshot.iter().position(|v| v.strict_eq(&needle))
            } else {
                snapshot.iter().rposition(|v| v.strict_eq(&needle))
            };
            Ok(Value::Number(position.map_or(-1.0, |p| p as f64)))
        }
        "slice" => {
            let start = relative(&arg(&args, 0), len, 0);
            let end = relative(&arg(&args, 1), len, len);
            Ok(Value::array(
                snapshot.get(start..end.max(start)).unwrap_or(&[]).to_vec(),
            ))
        }
        "at" => {
            let n = num_arg(&args, 0);
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { len as f64 + n } else { n };
            Ok(if index < 0.0 {
                Value::Undefined
            } else {
                snapshot.get(index as usize).cloned().unwrap_or(Value::Undefined)
            })
        }
        "concat" => {
            let mut out = snapshot;
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    other => out.push(other),
                }
            }
            capped_len(out.len())?;
            Ok(Value::array(out))
        }
        "flat" => {
            fn flatten(items: &[Value], depth: f64, out: &mut Vec<Value>) {
                for item in items {
                    match item {
                        Value::Array(inner) if depth >= 1.0 => {
                            flatten(&inner.borrow(), depth - 1.0, out)
                        }
                        other => out.push(other.clone()),
                    }
                }
            }
            let depth = match arg(&args, 0) {
                Value::Undefined => 1.0,
                d => d.to_number().min(16.0),
            };
            let mut out = Vec::new();
            flatten(&snapshot, depth, &mut out);
            Ok(Value::array(out))
        }
        "push" | "unshift" => {
            capped_len(len + args.len())?;
            let mut items = items.borrow_mut();
            if name == "push" {
                items.extend(args);
            } else {
                items.splice(0..0, args);
            }
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined)),
        "shift" => {
            let mut items = items.borrow_mut();
            Ok(if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            })
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Ok(receiver.clone())
        }
        "sort" => {
            let comparator = arg(&args, 0);
            let mut sorted: Vec<Value> = Vec::with_capacity(len);
            // Insertion sort: the comparator may fail, so no std sort.
            for item in snapshot {
                let mut index = sorted.len();
                while index > 0 {
                    interp.tick()?;
                    let ordering = compare_for_sort(interp, &comparator, &sorted[index - 1], &item)?;
                    if ordering != Ordering::Greater {
                        break;
                    }
                    index -= 1;
                }
                sorted.insert(index, item);
            }
            *items.borrow_mut() = sorted;
            Ok(receiver.clone())
        }
        _ => Ok(Value::Undefined),
    }
}

fn compare_for_sort(interp: &mut Interpreter, comparator: &Value, a: &Value, b: &Value) -> Eval<Ordering> {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ok(Ordering::Equal),
        (Value::Undefined, _) => return Ok(Ordering::Greater),
        (_, Value::Undefined) => return Ok(Ordering::Less),
        _ => {}
    }
    if matches!(comparator, Value::Function(_)) {
        let n = interp
            .call(comparator, Value::Undefined, vec![a.clone(), b.clone()])?
            .to_number();
        return Ok(if n > 0.0 {
            Ordering::Greater
        } else if n < 0.0 {
            Ordering::Less
        } else {
            Ordering::Equal
        });
    }
    Ok(a.to_js_string().cmp(&b.to_js_string()))
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn pad(s: &str, args: &[Value], at_start: bool) -> Value {
    let target = num_arg(args, 0);
    let fill = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        f => f.to_js_string(),
    };
    let current = s.chars().count();
    if !target.is_finite() || target as usize <= current || fill.is_empty() {
        return Value::str(s);
    }
    let padding: String = fill
        .chars()
        .cycle()
        .take((target as usize).min(MAX_ARRAY_LEN).saturating_sub(current))
        .collect();
    if at_start {
        Value::str(padding + s)
    } else {
        Value::str(s.to_string() + &padding)
    }
}

fn string_method(interp: &mut Interpreter, s: &Rc<str>, name: &str, args: Vec<Value>) -> Eval {
    let len = s.chars().count();
    let text_arg = |i: usize| arg(&args, i).to_js_string();
    Ok(match name {
        "toUpperCase" => Value::str(s.to_uppercase()),
        "toLowerCase" => Value::str(s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "trimStart" => Value::str(s.trim_start()),
        "trimEnd" => Value::str(s.trim_end()),
        "toString" => Value::Str(s.clone()),
        "split" => {
            let limit = match arg(&args, 1) {
                Value::Undefined => usize::MAX,
                l => l.to_number().max(0.0) as usize,
            };
            let parts: Vec<Value> = match arg(&args, 0) {
                Value::Undefined => vec![Value::Str(s.clone())],
                sep => {
                    let sep = sep.to_js_string();
                    if sep.is_empty() {
                        s.chars().map(|c| Value::str(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::str).collect()
                    }
                }
            };
            Value::array(parts.into_iter().take(limit).collect())
        }
        "includes" => Value::Bool(s.contains(text_arg(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text_arg(0).as_str())),
        "indexOf" => Value::Number(
            s.find(text_arg(0).as_str())
                .map_or(-1.0, |byte| s[..byte].chars().count() as f64),
        ),
        "slice" => {
            let start = relative(&arg(&args, 0), len, 0);
            let end = relative(&arg(&args, 1), len, len);
            Value::str(char_slice(s, start, end))
        }
        "substring" => {
            let clamp = |v: Value, default: usize| match v {
                Value::Undefined => default,
                v => {
                    let n = v.to_number();
                    if n.is_nan() || n < 0.0 { 0 } else { (n as usize).min(len) }
                }
            };
            let a = clamp(arg(&args, 0), 0);
            let b = clamp(arg(&args, 1), len);
            Value::str(char_slice(s, a.min(b), a.max(b)))
        }
        "replace" | "replaceAll" => {
            let pattern = text_arg(0);
            let replacement = arg(&args, 1);
            let count = if name == "replace" { 1 } else { usize::MAX };
            let mut out = String::with_capacity(s.len());
            let mut rest: &str = s;
            let mut done = 0;
            while done < count {
                let Some(at) = rest.find(pattern.as_str()) else { break };
                out.push_str(&rest[..at]);
                let with = if matches!(replacement, Value::Function(_)) {
                    interp
                        .call(&replacement, Value::Undefined, vec![Value::str(&pattern)])?
                        .to_js_string()
                } else {
                    replacement.to_js_string()
                };
                out.push_str(&with);
                rest = &rest[at + pattern.len()..];
                done += 1;
                if pattern.is_empty() {
                    match rest.chars().next() {
                        Some(c) => {
                            out.push(c);
                            rest = &rest[c.len_utf8()..];
                        }
                        None => break,
                    }
                }
            }
            out.push_str(rest);
            Value::str(out)
        }
        "charAt" => {
            let index = num_arg(&args, 0);
            let index = if index.is_nan() { 0 } else { index as usize };
            Value::str(s.chars().nth(index).map(String::from).unwrap_or_default())
        }
        "at" => {
            let n = num_arg(&args, 0);
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { len as f64 + n } else { n };
            if index < 0.0 {
                Value::Undefined
            } else {
                s.chars()
                    .nth(index as usize)
                    .map_or(Value::Undefined, |c| Value::str(c.to_string()))
            }
        }
        "padStart" => pad(s, &args, true),
        "padEnd" => pad(s, &args, false),
        "repeat" => {
            let times = num_arg(&args, 0);
            if !(times >= 0.0) || !times.is_finite() {
                return Err(Interrupt::error("RangeError", "Invalid count value"));
            }
            capped_len(s.len().saturating_mul(times as usize))?;
            Value::str(s.repeat(times as usize))
        }
        "concat" => {
            let mut out = s.to_string();
            for a in &args {
                out.push_str(&a.to_js_string());
            }
            Value::str(out)
        }
        "localeCompare" => Value::Number(match (**s).cmp(text_arg(0).as_str()) {
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
            Ordering::Greater => 1.0,
        }),
        _ => Value::Undefined,
    })
}

/// `toLocaleString` for the `en-US` locale.
fn group_thousands(n: f64) -> String {
    let rounded = (n * 1000.0).round() / 1000.0;
    let text = format_number(rounded.abs());
    let (int, frac) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Eval {
    Ok(match name {
        "toFixed" => {
            let digits = match arg(args, 0) {
                Value::Undefined => 0,
                d => d.to_number() as usize,
            };
            if digits > 100 {
                return Err(Interrupt::error(
                    "RangeError",
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            if n.is_finite() {
                Value::str(format!("{:.*}", digits, n))
            } else {
                Value::str(format_number(n))
            }
        }
        "toLocaleString" => {
            if n.is_finite() {
                Value::str(group_thousands(n))
            } else {
                Value::str(format_number(n))
            }
        }
        _ => {
            let radix = match arg(args, 0) {
                Value::Undefined => 10,
                r => r.to_number() as u32,
            };
            if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
                Value::str(format_number(n))
            } else if (2..=36).contains(&radix) {
                let mut value = n.abs() as u64;
                let mut digits = Vec::new();
                loop {
                    let digit = (value % radix as u64) as u32;
                    digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
                    value /= radix as u64;
                    if value == 0 {
                        break;
                    }
                }
                let text: String = digits.into_iter().rev().collect();
                Value::str(if n < 0.0 { format!("-{}", text) } else { text })
            } else {
                return Err(Interrupt::error(
                    "RangeError",
                    "toString() radix must be between 2 and 36",
                ));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::jsx::{lower_program, parse_program};

    fn eval(source: &str) -> String {
        let program = lower_program(parse_program(&format!("const result = {};", source), 64).unwrap());
        let mut interp = Interpreter::new(&EngineConfig::default());
        interp.run_program(&program).unwrap();
        interp.global().lookup("result").unwrap().to_js_string()
    }

    #[test]
    fn array_methods() {
        assert_eq!(eval("[1, 2, 3].map(n => n * 2).join('-')"), "2-4-6");
        assert_eq!(eval("[1, 2, 3, 4].filter(n => n % 2).length"), "2");
        assert_eq!(eval("[1, 2, 3].reduce((a, b) => a + b, 10)"), "16");
        assert_eq!(eval("[3, 1, 2].sort().join('')"), "123");
        assert_eq!(eval("[3, 1, 2].sort((a, b) => b - a).join('')"), "321");
        assert_eq!(eval("[1, [2, [3]]].flat().length"), "3");
        assert_eq!(eval("['a', 'b', 'c'].slice(-2).join('')"), "bc");
        assert_eq!(eval("[1, 2].concat([3], 4).includes(4)"), "true");
        assert_eq!(eval("[{ id: 1 }, { id: 2 }].find(x => x.id === 2).id"), "2");
        assert_eq!(eval("[1, 2, 3].findIndex(x => x > 5)"), "-1");
    }

    #[test]
    fn string_methods() {
        assert_eq!(eval("'Hello World'.split(' ')[1].toUpperCase()"), "WORLD");
        assert_eq!(eval("'  x '.trim().padStart(3, '0')"), "00x");
        assert_eq!(eval("'a-b-c'.replace('-', '+')"), "a+b-c");
        assert_eq!(eval("'a-b-c'.replaceAll('-', '')"), "abc");
        assert_eq!(eval("'pricing'.charAt(0).toUpperCase() + 'pricing'.slice(1)"), "Pricing");
        assert_eq!(eval("'abc'.includes('bc') && 'abc'.startsWith('a')"), "true");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(eval("(1234567.891).toLocaleString()"), "1,234,567.891");
        assert_eq!(eval("(19.5).toFixed(2)"), "19.50");
        assert_eq!(eval("(255).toString(16)"), "ff");
        assert_eq!(eval("parseInt('42px')"), "42");
        assert_eq!(eval("parseFloat('3.5rem')"), "3.5");
        assert_eq!(eval("Math.max(1, 5, 3) + Math.round(2.5)"), "8");
    }

    #[test]
    fn object_and_json_helpers() {
        assert_eq!(eval("Object.keys({ a: 1, b: 2 }).join()"), "a,b");
        assert_eq!(eval("JSON.stringify({ a: [1, 'x'], f: () => 1 })"), r#"{"a":[1,"x"]}"#);
        assert_eq!(eval("JSON.parse('{\"n\": 3}').n"), "3");
        assert_eq!(eval("Object.fromEntries([['k', 'v']]).k"), "v");
    }

    #[test]
    fn dates_format_through_chrono() {
        assert_eq!(eval("new Date('2024-03-05').getFullYear()"), "2024");
        assert_eq!(
            eval("new Date('2024-03-05').toLocaleDateString('en-US', { month: 'long' })"),
            "March 5, 2024"
        );
        assert_eq!(eval("new Date('nope').toLocaleDateString()"), "Invalid Date");
    }

    #[test]
    fn hooks_render_once() {
        assert_eq!(eval("useState(() => 3)[0]"), "3");
        assert_eq!(eval("useMemo(() => 'm', [])"), "m");
        assert_eq!(eval("useRef(7).current"), "7");
        assert_eq!(eval("useContext(React.createContext('light'))"), "light");
    }

    #[test]
    fn random_is_deterministic_per_interpreter() {
        assert_eq!(eval("Math.random()"), eval("Math.random()"));
    }

    #[test]
    fn clsx_joins_truthy_classes() {
        let value = import_binding("clsx", None, "clsx");
        let mut interp = Interpreter::new(&EngineConfig::default());
        let mut flags = Object::new();
        flags.set("on", Value::Bool(true));
        flags.set("off", Value::Bool(false));
        let out = interp
            .call(&value, Value::Undefined, vec![Value::str("a"), Value::Null, Value::object(flags)])
            .unwrap();
        assert_eq!(out.to_js_string(), "a on");
    }
}
