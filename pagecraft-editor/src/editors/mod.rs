//! Visual editors opened by the overlay.
//!
//! Each editor works on a private copy of the value it was seeded with and
//! only hands the result back on commit, so cancelling never touches the
//! store.

pub mod array;
pub mod content;
pub mod object;
pub mod style;

pub use array::{preview_text, ArrayEditor, RecordSession};
pub use content::ContentEditor;
pub use object::ObjectEditor;
pub use style::{PresetGroup, StyleEditor, PRESET_GROUPS};
