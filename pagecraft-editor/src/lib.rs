//! # Pagecraft editor
//!
//! Editing state on top of [`pagecraft_engine`]: pages of component
//! instances, the click-to-edit overlay, the visual editors it opens, the
//! canvas renderer and project persistence.
//!
//! ## Flow
//! 1. [`EditorStore::add_instance`] places a definition with normalized defaults
//! 2. [`canvas::render_page`] renders every instance plus the `<style>` payload
//! 3. [`EditorStore::click`] selects an instance, then drives its [`Overlay`]
//! 4. [`EditorStore::commit_editor`] writes the open editor's result back
//! 5. The configured [`PersistSink`] receives a snapshot after every mutation

pub mod canvas;
pub mod editors;
pub mod error;
pub mod overlay;
pub mod page;
pub mod persist;
pub mod store;
pub mod template;

pub use canvas::{render_page, RenderedInstance, RenderedPage};
pub use editors::{ArrayEditor, ContentEditor, ObjectEditor, StyleEditor};
pub use error::{EditorError, EditorResult, PersistError, PersistResult};
pub use overlay::{Edit, Overlay, OverlayState, StyleTarget};
pub use page::{ComponentInstance, LegacyStyle, Page};
pub use persist::{
    BackgroundPersist, DirectPersist, FileProjectStore, MemoryProjectStore, PersistSink,
    ProjectSnapshot, ProjectStore,
};
pub use store::EditorStore;
pub use template::{Template, TemplateComponent, TemplatePage};
