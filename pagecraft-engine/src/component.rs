//! Component library feed: the definitions users pick from.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::props::{normalize, PropMap};

/// Semantic component family. Drives fallback rendering and the CSS class
/// instances are scoped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Navbar,
    Hero,
    Features,
    Pricing,
    Testimonials,
    Cta,
    Contact,
    Footer,
    Gallery,
    Team,
    Faq,
    Stats,
    Blog,
    #[serde(other)]
    Generic,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Navbar,
        Category::Hero,
        Category::Features,
        Category::Pricing,
        Category::Testimonials,
        Category::Cta,
        Category::Contact,
        Category::Footer,
        Category::Gallery,
        Category::Team,
        Category::Faq,
        Category::Stats,
        Category::Blog,
        Category::Generic,
    ];

    /// Unknown names map to [`Category::Generic`].
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .unwrap_or(Category::Generic)
    }

    /// Category encoded in an id prefix: `navbar_001` is a navbar.
    pub fn from_id(id: &str) -> Self {
        let prefix = id.split(['_', '-']).next().unwrap_or_default();
        Self::parse(prefix)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Navbar => "navbar",
            Category::Hero => "hero",
            Category::Features => "features",
            Category::Pricing => "pricing",
            Category::Testimonials => "testimonials",
            Category::Cta => "cta",
            Category::Contact => "contact",
            Category::Footer => "footer",
            Category::Gallery => "gallery",
            Category::Team => "team",
            Category::Faq => "faq",
            Category::Stats => "stats",
            Category::Blog => "blog",
            Category::Generic => "generic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, alias = "code", alias = "source")]
    pub source_text: String,
    /// Raw default props, any historical shape
    #[serde(default)]
    pub default_props: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ComponentDefinition {
    pub fn new(id: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: None,
            source_text: source_text.into(),
            default_props: serde_json::Value::Object(Default::default()),
            dependencies: Vec::new(),
            name: None,
        }
    }

    pub fn with_default_props(mut self, props: serde_json::Value) -> Self {
        self.default_props = props;
        self
    }

    /// Explicit category, else the one encoded in the id.
    pub fn category(&self) -> Category {
        self.category.unwrap_or_else(|| Category::from_id(&self.id))
    }

    pub fn normalized_defaults(&self) -> PropMap {
        normalize(&self.default_props)
    }

    /// Definitions without source render through the static fallbacks.
    pub fn has_source(&self) -> bool {
        !self.source_text.trim().is_empty()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Category name → definitions, as supplied by the library feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentLibrary {
    groups: BTreeMap<String, Vec<ComponentDefinition>>,
}

impl ComponentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let library: Self = serde_json::from_str(json)?;
        library.validate()?;
        Ok(library)
    }

    pub fn from_yaml(yaml: &str) -> EngineResult<Self> {
        let library: Self = serde_yaml::from_str(yaml)?;
        library.validate()?;
        Ok(library)
    }

    /// Loads a feed file, picking the format from the extension.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let library = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text)?,
            _ => Self::from_json(&text)?,
        };
        debug!(path = %path.display(), definitions = library.len(), "component library loaded");
        Ok(library)
    }

    /// Adds a definition under the group named after its category.
    pub fn insert(&mut self, definition: ComponentDefinition) -> EngineResult<()> {
        if self.get(&definition.id).is_some() {
            return Err(EngineError::DuplicateDefinition { id: definition.id });
        }
        let group = definition.category().as_str().to_string();
        self.groups.entry(group).or_default().push(definition);
        Ok(())
    }

    fn validate(&self) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for definition in self.definitions() {
            if !seen.insert(definition.id.as_str()) {
                return Err(EngineError::DuplicateDefinition {
                    id: definition.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ComponentDefinition> {
        self.definitions().find(|d| d.id == id)
    }

    pub fn require(&self, id: &str) -> EngineResult<&ComponentDefinition> {
        self.get(id)
            .ok_or_else(|| EngineError::UnknownDefinition { id: id.to_string() })
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.groups.values().flatten()
    }

    pub fn group(&self, name: &str) -> &[ComponentDefinition] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Category of a definition, taking the group it was listed under into
    /// account when neither the definition nor its id names one.
    pub fn category_of(&self, id: &str) -> Option<Category> {
        self.groups.iter().find_map(|(group, defs)| {
            let definition = defs.iter().find(|d| d.id == id)?;
            Some(match (definition.category, Category::from_id(id)) {
                (Some(category), _) => category,
                (None, Category::Generic) => Category::parse(group),
                (None, from_id) => from_id,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_from_id_prefix() {
        assert_eq!(Category::from_id("navbar_001"), Category::Navbar);
        assert_eq!(Category::from_id("CTA-2"), Category::Cta);
        assert_eq!(Category::from_id("widget_9"), Category::Generic);
        assert_eq!(Category::from_id(""), Category::Generic);
    }

    #[test]
    fn unknown_category_names_deserialize_as_generic() {
        let c: Category = serde_json::from_str("\"carousel\"").unwrap();
        assert_eq!(c, Category::Generic);
    }

    #[test]
    fn loads_yaml_feed() {
        let yaml = r#"
hero:
  - id: hero_001
    sourceText: "function Hero(props) { return <h1>{props.title}</h1>; }"
    defaultProps:
      title: Welcome
    dependencies: [lucide-react]
widgets:
  - id: clock
    code: ""
"#;
        let library = ComponentLibrary::from_yaml(yaml).unwrap();
        assert_eq!(library.len(), 2);
        let hero = library.require("hero_001").unwrap();
        assert_eq!(hero.category(), Category::Hero);
        assert_eq!(hero.normalized_defaults()["title"].as_text(), Some("Welcome"));
        assert!(!library.require("clock").unwrap().has_source());
        assert_eq!(library.category_of("clock"), Some(Category::Generic));
        assert!(library.require("nope").is_err());
    }

    #[test]
    fn group_name_fills_in_missing_category() {
        let json = r#"{ "pricing": [{ "id": "basic", "sourceText": "" }] }"#;
        let library = ComponentLibrary::from_json(json).unwrap();
        assert_eq!(library.category_of("basic"), Some(Category::Pricing));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "a": [{ "id": "x" }], "b": [{ "id": "x" }] }"#;
        assert!(matches!(
            ComponentLibrary::from_json(json),
            Err(EngineError::DuplicateDefinition { .. })
        ));
        let mut library = ComponentLibrary::new();
        library.insert(ComponentDefinition::new("hero_1", "")).unwrap();
        assert!(library.insert(ComponentDefinition::new("hero_1", "")).is_err());
        assert_eq!(library.group("hero").len(), 1);
    }
}
