//! # Pagecraft engine
//!
//! Turns stored, parameterized JSX component source into themed, editable
//! virtual DOM.
//!
//! ## Pipeline
//! - [`props`]: every stored prop shape normalized into [`PropValue`]
//! - [`theme`]: fixed color utilities rewritten into theme tokens, plus the
//!   scoped stylesheet those tokens resolve against
//! - [`compiler`]: module strip, JSX parse and lowering, entry resolution,
//!   sandboxed execution in [`runtime`], cached per source text
//! - [`render`]: prop-level styling layered onto the rendered tree
//! - [`inspector`]: clicked nodes mapped back to prop paths
//!
//! ## Example
//! ```ignore
//! use pagecraft_engine::{normalize, CompileContext, Compiler};
//!
//! let compiler = Compiler::default();
//! let props = normalize(&serde_json::json!({ "title": "Hi" }));
//! let node = compiler.render_or_diagnostic(
//!     "function Hero(props) { return <h1 className=\"text-blue-600\">{props.title}</h1>; }",
//!     &props,
//!     CompileContext::default(),
//! );
//! assert_eq!(node.to_html(), "<h1 class=\"text-theme-primary\">Hi</h1>");
//! ```

pub mod compiler;
pub mod component;
pub mod config;
pub mod error;
pub mod fallback;
pub mod inspector;
pub mod jsx;
pub mod props;
pub mod render;
pub mod runtime;
pub mod tailwind;
pub mod theme;
pub mod vdom;

// --- Core types ---
pub use compiler::{CompileContext, CompiledComponent, Compiler, Customizations};
pub use component::{Category, ComponentDefinition, ComponentLibrary};
pub use config::EngineConfig;
pub use error::{
    CompileError, CompileErrorKind, CompileResult, EngineError, EngineResult, PathError,
    SourceLocation,
};
pub use inspector::{inspect, ContentType, EditTarget, EditableKind, Inspection};
pub use props::{normalize, render_props, PropKind, PropMap, PropPath, PropValue};
pub use theme::{Theme, ThemeRole};
pub use vdom::{NodePath, VNode};

// --- Entry points ---
pub use fallback::render_fallback;
pub use render::apply_styling_overrides;
