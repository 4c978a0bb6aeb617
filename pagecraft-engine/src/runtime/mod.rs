//! Sandboxed evaluation of lowered component programs.
//!
//! Nothing here touches the host: no I/O, no clock beyond `Date`, no
//! threads. Values are `Rc`-based and never leave the render call that
//! created them; only [`VNode`](crate::vdom::VNode)s do.

mod builtins;
mod convert;
mod interp;
mod value;

pub use builtins::{import_binding, MAX_ARRAY_LEN};
pub use convert::{css_property_name, to_vnode};
pub use interp::{error_value, Interpreter, Interrupt};
pub use value::{format_number, Callable, Element, ElementKind, NativeFn, Object, Scope, Value};
