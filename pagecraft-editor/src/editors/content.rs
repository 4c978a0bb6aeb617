use pagecraft_engine::vdom::VNode;
use pagecraft_engine::ContentType;
use std::path::Path;

/// Inline handler that hides media whose URL fails to load.
pub const HIDE_ON_ERROR: &str = "this.style.display='none'";

/// Single-value editor for text, links, images and videos.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEditor {
    content_type: ContentType,
    original: String,
    value: String,
}

impl ContentEditor {
    pub fn new(content_type: ContentType, current: impl Into<String>) -> Self {
        let current = current.into();
        Self {
            content_type,
            original: current.clone(),
            value: current,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Uses a locally selected file as the media source.
    pub fn select_local_file(&mut self, path: &Path) {
        self.value = format!("file://{}", path.display());
    }

    pub fn is_dirty(&self) -> bool {
        self.value != self.original
    }

    pub fn reset(&mut self) {
        self.value = self.original.clone();
    }

    /// Live preview of the value being edited.
    pub fn preview(&self) -> VNode {
        let value = self.value.trim();
        match self.content_type {
            ContentType::Image | ContentType::Video if value.is_empty() => {
                VNode::element("div")
                    .attr("class", "pc-media-empty")
                    .with_text("No media selected")
            }
            ContentType::Image => VNode::element("img")
                .attr("src", value)
                .attr("alt", "")
                .attr("class", "pc-preview-media")
                .attr("onerror", HIDE_ON_ERROR),
            ContentType::Video => VNode::element("video")
                .attr("src", value)
                .attr("controls", "")
                .attr("class", "pc-preview-media")
                .attr("onerror", HIDE_ON_ERROR),
            ContentType::Url => VNode::element("a")
                .attr("href", value)
                .attr("target", "_blank")
                .attr("rel", "noopener noreferrer")
                .with_text(value),
            ContentType::Text => VNode::element("p")
                .attr("class", "pc-preview-text")
                .with_text(self.value.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_media_hides_itself() {
        let editor = ContentEditor::new(ContentType::Image, "https://cdn.example/missing.png");
        let preview = editor.preview();
        assert_eq!(preview.tag(), Some("img"));
        assert_eq!(preview.get_attr("onerror"), Some(HIDE_ON_ERROR));
    }

    #[test]
    fn empty_media_shows_placeholder() {
        let editor = ContentEditor::new(ContentType::Video, "  ");
        assert_eq!(editor.preview().text_content(), "No media selected");
    }

    #[test]
    fn dirty_tracking() {
        let mut editor = ContentEditor::new(ContentType::Text, "Hello");
        assert!(!editor.is_dirty());
        editor.set_value("Hi");
        assert!(editor.is_dirty());
        editor.reset();
        assert_eq!(editor.value(), "Hello");
    }

    #[test]
    fn local_files_become_file_urls() {
        let mut editor = ContentEditor::new(ContentType::Image, "");
        editor.select_local_file(Path::new("/tmp/photo.png"));
        assert_eq!(editor.value(), "file:///tmp/photo.png");
    }
}
