//! Maps a clicked node of a rendered instance back to something editable.
//!
//! Prop-path markers on the rendered markup are authoritative. Without
//! them a legacy text-match heuristic is tried, and when that misses too the
//! click degrades to style-only editing of the node's selector.

mod node;
mod resolve;

pub use node::{element_at, nearest_markers, node_selector, ContentType, EditableKind, Markers};
pub use resolve::{inspect, EditTarget, Inspection};
