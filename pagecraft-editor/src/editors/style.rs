use pagecraft_engine::tailwind::{merge_classes, split_classes};
use std::collections::BTreeMap;

/// A named group of preset classes offered as a clickable palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetGroup {
    pub name: &'static str,
    pub classes: &'static [&'static str],
}

pub const PRESET_GROUPS: &[PresetGroup] = &[
    PresetGroup {
        name: "Text size",
        classes: &["text-sm", "text-base", "text-lg", "text-xl", "text-2xl", "text-4xl"],
    },
    PresetGroup {
        name: "Font weight",
        classes: &["font-normal", "font-medium", "font-semibold", "font-bold"],
    },
    PresetGroup {
        name: "Text color",
        classes: &[
            "text-theme-primary",
            "text-theme-secondary",
            "text-theme-foreground",
            "text-theme-muted-foreground",
            "text-white",
        ],
    },
    PresetGroup {
        name: "Background",
        classes: &[
            "bg-theme-primary",
            "bg-theme-secondary",
            "bg-theme-background",
            "bg-theme-muted",
            "bg-transparent",
        ],
    },
    PresetGroup {
        name: "Alignment",
        classes: &["text-left", "text-center", "text-right"],
    },
    PresetGroup {
        name: "Spacing",
        classes: &["p-2", "p-4", "p-8", "px-4", "py-2", "m-4", "mt-4", "mb-4"],
    },
    PresetGroup {
        name: "Corners",
        classes: &["rounded", "rounded-lg", "rounded-xl", "rounded-full"],
    },
    PresetGroup {
        name: "Effects",
        classes: &["shadow", "shadow-lg", "opacity-75", "uppercase", "italic", "underline"],
    },
];

/// Edits a utility-class string and a custom CSS property map.
///
/// The palette and raw text entry both operate on the same class list, so
/// [`StyleEditor::raw_text`] always reflects the toggled presets and vice
/// versa.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleEditor {
    classes: Vec<String>,
    custom_css: BTreeMap<String, String>,
    original: (String, BTreeMap<String, String>),
}

impl StyleEditor {
    pub fn new(classes: &str, custom_css: &BTreeMap<String, String>) -> Self {
        let classes = split_classes(classes);
        let original = (classes.join(" "), custom_css.clone());
        Self {
            classes,
            custom_css: custom_css.clone(),
            original,
        }
    }

    /// Merged, de-duplicated, order-stable class string.
    pub fn class_string(&self) -> String {
        merge_classes(self.classes.iter().map(String::as_str))
    }

    pub fn raw_text(&self) -> String {
        self.class_string()
    }

    /// Replaces the class list from free text.
    pub fn set_raw_text(&mut self, text: &str) {
        self.classes = split_classes(text);
    }

    pub fn is_active(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Adds the class at the end, or removes it if already present.
    /// Returns whether the class is active afterwards.
    pub fn toggle(&mut self, class: &str) -> bool {
        let class = class.trim();
        if class.is_empty() {
            return false;
        }
        if let Some(index) = self.classes.iter().position(|c| c == class) {
            self.classes.remove(index);
            false
        } else {
            self.classes.push(class.to_string());
            true
        }
    }

    /// Active classes from one preset group.
    pub fn active_in<'g>(&self, group: &'g PresetGroup) -> Vec<&'g str> {
        group
            .classes
            .iter()
            .copied()
            .filter(|class| self.is_active(class))
            .collect()
    }

    pub fn custom_css(&self) -> &BTreeMap<String, String> {
        &self.custom_css
    }

    /// Sets one CSS property; an empty value removes it.
    pub fn set_css(&mut self, property: &str, value: &str) {
        let property = property.trim();
        if property.is_empty() {
            return;
        }
        let value = value.trim();
        if value.is_empty() {
            self.custom_css.remove(property);
        } else {
            self.custom_css.insert(property.to_string(), value.to_string());
        }
    }

    pub fn remove_css(&mut self, property: &str) -> Option<String> {
        self.custom_css.remove(property)
    }

    pub fn is_dirty(&self) -> bool {
        self.class_string() != self.original.0 || self.custom_css != self.original.1
    }

    /// The edited class string and CSS map.
    pub fn result(&self) -> (String, BTreeMap<String, String>) {
        (self.class_string(), self.custom_css.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn palette_and_raw_text_stay_in_sync() {
        let mut editor = StyleEditor::new("px-4 font-bold px-4", &BTreeMap::new());
        assert_eq!(editor.raw_text(), "px-4 font-bold");

        assert!(editor.toggle("shadow"));
        assert_eq!(editor.raw_text(), "px-4 font-bold shadow");

        editor.set_raw_text("font-bold  rounded shadow");
        assert!(!editor.is_active("px-4"));
        assert!(!editor.toggle("shadow"));
        assert_eq!(editor.class_string(), "font-bold rounded");
        assert_eq!(editor.active_in(&PRESET_GROUPS[1]), vec!["font-bold"]);
    }

    #[test]
    fn empty_css_value_removes_property() {
        let mut editor = StyleEditor::new("", &BTreeMap::new());
        editor.set_css("color", "red");
        editor.set_css("margin-top", " 4px ");
        editor.set_css("color", "");
        assert_eq!(editor.custom_css().len(), 1);
        assert_eq!(editor.custom_css().get("margin-top").map(String::as_str), Some("4px"));
        assert!(editor.is_dirty());
    }

    #[test]
    fn untouched_editor_is_clean() {
        let css = BTreeMap::from([("color".to_string(), "red".to_string())]);
        let mut editor = StyleEditor::new("a b", &css);
        editor.toggle("c");
        editor.toggle("c");
        assert!(!editor.is_dirty());
    }
}
