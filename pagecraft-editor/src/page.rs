//! Pages and the component instances placed on them.

use pagecraft_engine::{normalize, ComponentDefinition, Customizations, PropMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Slug used when a page name has no usable characters.
const FALLBACK_SLUG: &str = "page";

/// Class and CSS overrides stored against a legacy node selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStyle {
    #[serde(default)]
    pub tailwind_classes: String,
    #[serde(default)]
    pub custom_css_overrides: BTreeMap<String, String>,
}

impl LegacyStyle {
    pub fn is_empty(&self) -> bool {
        self.tailwind_classes.trim().is_empty() && self.custom_css_overrides.is_empty()
    }
}

/// One placement of a definition on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    pub id: String,
    pub definition_ref: String,
    /// Instance-level overrides, merged over the definition's defaults
    #[serde(default)]
    pub props: PropMap,
    /// Legacy overrides (`{tag}_content` / `{propName}` keys)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub customizations: Customizations,
    /// Legacy selector-keyed style overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub legacy_styles: BTreeMap<String, LegacyStyle>,
}

impl ComponentInstance {
    /// Fresh instance carrying a normalized copy of the definition's defaults.
    pub fn from_definition(definition: &ComponentDefinition) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            definition_ref: definition.id.clone(),
            props: definition.normalized_defaults(),
            customizations: Customizations::new(),
            legacy_styles: BTreeMap::new(),
        }
    }

    /// Like [`ComponentInstance::from_definition`], with raw overrides in
    /// any stored prop shape layered on top.
    pub fn with_overrides(definition: &ComponentDefinition, overrides: &serde_json::Value) -> Self {
        let mut instance = Self::from_definition(definition);
        instance.props.extend(normalize(overrides));
        instance
    }

    /// Normalized defaults merged with this instance's overrides.
    pub fn effective_props(&self, definition: &ComponentDefinition) -> PropMap {
        let mut props = definition.normalized_defaults();
        props.extend(self.props.iter().map(|(k, v)| (k.clone(), v.clone())));
        props
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub instances: Vec<ComponentInstance>,
}

impl Page {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            slug: slug.into(),
            instances: Vec::new(),
        }
    }

    pub fn position(&self, instance_id: &str) -> Option<usize> {
        self.instances.iter().position(|i| i.id == instance_id)
    }

    pub fn instance(&self, instance_id: &str) -> Option<&ComponentInstance> {
        self.instances.iter().find(|i| i.id == instance_id)
    }

    pub fn instance_mut(&mut self, instance_id: &str) -> Option<&mut ComponentInstance> {
        self.instances.iter_mut().find(|i| i.id == instance_id)
    }
}

/// Lowercase, ASCII alphanumerics separated by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// `base`, or `base-2`, `base-3`, ... whichever is not taken yet.
pub fn unique_slug<'a>(base: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    let is_taken = |candidate: &str| taken.clone().any(|slug| slug == candidate);
    if !is_taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn slugs_collapse_punctuation() {
        assert_eq!(slugify("About Us!"), "about-us");
        assert_eq!(slugify("  Pricing -- 2024 "), "pricing-2024");
        assert_eq!(slugify("???"), "page");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let taken = ["home", "home-2"];
        assert_eq!(unique_slug("home", taken.iter().copied()), "home-3");
        assert_eq!(unique_slug("about", taken.iter().copied()), "about");
    }

    #[test]
    fn overrides_win_over_defaults() {
        let definition = ComponentDefinition::new("hero_001", "")
            .with_default_props(json!({ "title": "Default", "subtitle": "Sub" }));
        let mut instance = ComponentInstance::with_overrides(&definition, &json!({ "title": "Mine" }));
        instance.props.remove("subtitle");

        let props = instance.effective_props(&definition);
        assert_eq!(props["title"].as_text(), Some("Mine"));
        assert_eq!(props["subtitle"].as_text(), Some("Sub"));
    }
}
