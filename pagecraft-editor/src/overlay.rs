//! Per-instance click-to-edit state machine.
//!
//! ```text
//! Idle ──click──▶ Inspecting ──▶ ContentEditing | StyleEditing | ArrayEditing | ObjectEditing
//!   ▲                 ▲                              │
//!   │                 └──────── commit / cancel ─────┘
//!   └──────────── click outside / teardown
//! ```
//!
//! The overlay never writes to the store itself: [`Overlay::commit`]
//! returns an [`Edit`] the store applies.

use pagecraft_engine::vdom::{NodePath, VNode};
use pagecraft_engine::{inspect, EditTarget, Inspection, PropKind, PropMap, PropPath};
use serde_json::Value;
use std::collections::BTreeMap;
use std::mem;
use tracing::debug;

use crate::editors::{ArrayEditor, ContentEditor, ObjectEditor, StyleEditor};
use crate::error::{EditorError, EditorResult};
use crate::page::LegacyStyle;

/// A committed change, ready to be applied to one instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Content written through a prop path
    Prop { path: PropPath, value: Value },
    /// Styling of a prop or array record
    Styling {
        path: PropPath,
        classes: String,
        css: BTreeMap<String, String>,
    },
    /// Legacy content override key
    Legacy { key: String, value: String },
    /// Legacy selector-keyed style
    LegacyStyle { selector: String, style: LegacyStyle },
}

/// Where a style editor's result goes.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleTarget {
    Prop(PropPath),
    Selector(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayState {
    #[default]
    Idle,
    Inspecting(Inspection),
    ContentEditing {
        inspection: Inspection,
        editor: ContentEditor,
    },
    StyleEditing {
        inspection: Inspection,
        target: StyleTarget,
        editor: StyleEditor,
    },
    ArrayEditing {
        inspection: Inspection,
        editor: ArrayEditor,
    },
    ObjectEditing {
        inspection: Inspection,
        editor: ObjectEditor,
    },
}

impl OverlayState {
    pub fn inspection(&self) -> Option<&Inspection> {
        match self {
            OverlayState::Idle => None,
            OverlayState::Inspecting(inspection)
            | OverlayState::ContentEditing { inspection, .. }
            | OverlayState::StyleEditing { inspection, .. }
            | OverlayState::ArrayEditing { inspection, .. }
            | OverlayState::ObjectEditing { inspection, .. } => Some(inspection),
        }
    }

    pub fn is_editing(&self) -> bool {
        !matches!(self, OverlayState::Idle | OverlayState::Inspecting(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            OverlayState::Idle => "idle",
            OverlayState::Inspecting(_) => "inspecting",
            OverlayState::ContentEditing { .. } => "content",
            OverlayState::StyleEditing { .. } => "style",
            OverlayState::ArrayEditing { .. } => "array",
            OverlayState::ObjectEditing { .. } => "object",
        }
    }
}

/// Overlay of one component instance. At most one editor is open at a time;
/// opening another replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    instance_id: String,
    state: OverlayState,
}

impl Overlay {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            state: OverlayState::Idle,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// Handles a click at `clicked`, relative to the instance's rendered
    /// root. A click on the root itself only leaves selection in place.
    pub fn click(
        &mut self,
        root: &VNode,
        clicked: &NodePath,
        props: &PropMap,
        legacy_styles: &BTreeMap<String, LegacyStyle>,
    ) -> &OverlayState {
        self.state = match inspect(root, clicked, props) {
            Some(inspection) => open_for(inspection, props, legacy_styles),
            None => OverlayState::Idle,
        };
        debug!(instance = %self.instance_id, state = self.state.name(), "overlay click");
        &self.state
    }

    /// Switches the inspected node to style editing.
    pub fn open_style_editor(
        &mut self,
        props: &PropMap,
        legacy_styles: &BTreeMap<String, LegacyStyle>,
    ) -> EditorResult<&mut StyleEditor> {
        let inspection = self
            .state
            .inspection()
            .cloned()
            .ok_or(EditorError::NoOpenEditor)?;
        self.state = style_editing(inspection, props, legacy_styles);
        match &mut self.state {
            OverlayState::StyleEditing { editor, .. } => Ok(editor),
            _ => Err(EditorError::NoOpenEditor),
        }
    }

    /// Produces the open editor's edit and returns to `Inspecting`.
    pub fn commit(&mut self) -> EditorResult<Edit> {
        let edit = match &mut self.state {
            OverlayState::ContentEditing { inspection, editor } => match &inspection.target {
                EditTarget::Prop { path, .. } => Edit::Prop {
                    path: path.clone(),
                    value: Value::String(editor.value().to_string()),
                },
                EditTarget::Legacy { key, .. } => Edit::Legacy {
                    key: key.clone(),
                    value: editor.value().to_string(),
                },
                EditTarget::Unresolved => return Err(EditorError::NoOpenEditor),
            },
            OverlayState::StyleEditing { target, editor, .. } => {
                let (classes, css) = editor.result();
                match target {
                    StyleTarget::Prop(path) => Edit::Styling {
                        path: path.clone(),
                        classes,
                        css,
                    },
                    StyleTarget::Selector(selector) => Edit::LegacyStyle {
                        selector: selector.clone(),
                        style: LegacyStyle {
                            tailwind_classes: classes,
                            custom_css_overrides: css,
                        },
                    },
                }
            }
            OverlayState::ArrayEditing { inspection, editor } => Edit::Prop {
                path: prop_path(inspection)?,
                value: editor.save()?,
            },
            OverlayState::ObjectEditing { inspection, editor } => Edit::Prop {
                path: prop_path(inspection)?,
                value: editor.value(),
            },
            OverlayState::Idle | OverlayState::Inspecting(_) => {
                return Err(EditorError::NoOpenEditor)
            }
        };
        self.back_to_inspecting();
        Ok(edit)
    }

    /// Discards the open editor. Cancelling while only inspecting goes idle.
    pub fn cancel(&mut self) {
        if self.state.is_editing() {
            self.back_to_inspecting();
        } else {
            self.state = OverlayState::Idle;
        }
    }

    pub fn click_outside(&mut self) {
        self.state = OverlayState::Idle;
    }

    pub fn content_editor_mut(&mut self) -> Option<&mut ContentEditor> {
        match &mut self.state {
            OverlayState::ContentEditing { editor, .. } => Some(editor),
            _ => None,
        }
    }

    pub fn style_editor_mut(&mut self) -> Option<&mut StyleEditor> {
        match &mut self.state {
            OverlayState::StyleEditing { editor, .. } => Some(editor),
            _ => None,
        }
    }

    pub fn array_editor_mut(&mut self) -> Option<&mut ArrayEditor> {
        match &mut self.state {
            OverlayState::ArrayEditing { editor, .. } => Some(editor),
            _ => None,
        }
    }

    pub fn object_editor_mut(&mut self) -> Option<&mut ObjectEditor> {
        match &mut self.state {
            OverlayState::ObjectEditing { editor, .. } => Some(editor),
            _ => None,
        }
    }

    fn back_to_inspecting(&mut self) {
        self.state = match mem::take(&mut self.state) {
            OverlayState::Idle => OverlayState::Idle,
            other => match other.inspection() {
                Some(inspection) => OverlayState::Inspecting(inspection.clone()),
                None => OverlayState::Idle,
            },
        };
    }
}

fn open_for(
    inspection: Inspection,
    props: &PropMap,
    legacy_styles: &BTreeMap<String, LegacyStyle>,
) -> OverlayState {
    let content_type = inspection.content_type().unwrap_or_default();
    match &inspection.target {
        EditTarget::Prop {
            prop_kind: PropKind::Array,
            current,
            ..
        } => {
            let editor = ArrayEditor::new(current.as_array().cloned().unwrap_or_default());
            OverlayState::ArrayEditing { inspection, editor }
        }
        EditTarget::Prop {
            prop_kind: PropKind::Object,
            current,
            ..
        } => {
            let editor = ObjectEditor::new(current);
            OverlayState::ObjectEditing { inspection, editor }
        }
        EditTarget::Prop {
            prop_kind: PropKind::Text,
            current,
            ..
        } => {
            let editor = ContentEditor::new(content_type, value_text(current));
            OverlayState::ContentEditing { inspection, editor }
        }
        EditTarget::Legacy { current, .. } => {
            let editor = ContentEditor::new(content_type, current.clone());
            OverlayState::ContentEditing { inspection, editor }
        }
        EditTarget::Unresolved => style_editing(inspection, props, legacy_styles),
    }
}

/// Style editing against the prop's own styling when the target can carry
/// it, otherwise against the legacy style stored for the node's selector.
fn style_editing(
    inspection: Inspection,
    props: &PropMap,
    legacy_styles: &BTreeMap<String, LegacyStyle>,
) -> OverlayState {
    let prop_styling = match &inspection.target {
        EditTarget::Prop { path, .. } => path
            .resolve(props)
            .ok()
            .and_then(|resolved| resolved.styling())
            .map(|styling| (path.clone(), styling)),
        _ => None,
    };
    let (target, editor) = match prop_styling {
        Some((path, (classes, css))) => (StyleTarget::Prop(path), StyleEditor::new(&classes, &css)),
        None => {
            let existing = legacy_styles.get(&inspection.selector).cloned().unwrap_or_default();
            (
                StyleTarget::Selector(inspection.selector.clone()),
                StyleEditor::new(&existing.tailwind_classes, &existing.custom_css_overrides),
            )
        }
    };
    OverlayState::StyleEditing {
        inspection,
        target,
        editor,
    }
}

fn prop_path(inspection: &Inspection) -> EditorResult<PropPath> {
    match &inspection.target {
        EditTarget::Prop { path, .. } => Ok(path.clone()),
        _ => Err(EditorError::NoOpenEditor),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
