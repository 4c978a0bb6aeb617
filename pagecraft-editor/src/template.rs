//! Named bundles of pages referencing library components by id.

use pagecraft_engine::{ComponentLibrary, EngineError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::EditorResult;
use crate::page::{slugify, unique_slug, ComponentInstance, Page};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pages: Vec<TemplatePage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub components: Vec<TemplateComponent>,
}

/// A bare definition id, or an id with prop overrides in any stored shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateComponent {
    Id(String),
    WithProps {
        id: String,
        #[serde(default)]
        props: Value,
    },
}

impl TemplateComponent {
    pub fn id(&self) -> &str {
        match self {
            TemplateComponent::Id(id) | TemplateComponent::WithProps { id, .. } => id,
        }
    }
}

impl Template {
    pub fn from_json(json: &str) -> EditorResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::from(e).into())
    }

    pub fn from_yaml(yaml: &str) -> EditorResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| EngineError::from(e).into())
    }

    /// Loads a `.yaml`/`.yml` or JSON template file.
    pub fn load(path: &Path) -> EditorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(EngineError::from)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Builds live pages. Each component becomes a fresh instance: the
    /// definition's normalized defaults with the template's overrides on top.
    pub fn resolve(&self, library: &ComponentLibrary) -> EditorResult<Vec<Page>> {
        let mut pages: Vec<Page> = Vec::with_capacity(self.pages.len());
        for template_page in &self.pages {
            let base = template_page
                .slug
                .as_deref()
                .map(slugify)
                .unwrap_or_else(|| slugify(&template_page.name));
            let slug = unique_slug(&base, pages.iter().map(|p| p.slug.as_str()));
            let mut page = Page::new(template_page.name.clone(), slug);
            for component in &template_page.components {
                let definition = library.require(component.id())?;
                let instance = match component {
                    TemplateComponent::Id(_) => ComponentInstance::from_definition(definition),
                    TemplateComponent::WithProps { props, .. } => {
                        ComponentInstance::with_overrides(definition, props)
                    }
                };
                page.instances.push(instance);
            }
            pages.push(page);
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use pagecraft_engine::ComponentDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn library() -> ComponentLibrary {
        let mut library = ComponentLibrary::new();
        library
            .insert(ComponentDefinition::new("hero_001", "").with_default_props(json!({ "title": "Default" })))
            .unwrap();
        library
            .insert(ComponentDefinition::new("footer_001", "").with_default_props(json!({ "year": "2024" })))
            .unwrap();
        library
    }

    #[test]
    fn resolves_ids_and_overrides() {
        let template = Template::from_yaml(
            r#"
id: landing
name: Landing
pages:
  - name: Home
    components:
      - hero_001
      - id: footer_001
        props:
          year: "2025"
  - name: Home
"#,
        )
        .unwrap();
        let pages = template.resolve(&library()).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].slug, "home");
        assert_eq!(pages[1].slug, "home-2");

        let instances = &pages[0].instances;
        assert_eq!(instances[0].props["title"].as_text(), Some("Default"));
        assert_eq!(instances[1].props["year"].as_text(), Some("2025"));
        assert_ne!(instances[0].id, instances[1].id);
    }

    #[test]
    fn unknown_component_ids_fail() {
        let template = Template::from_json(
            r#"{ "id": "t", "name": "T", "pages": [{ "name": "Home", "components": ["missing_001"] }] }"#,
        )
        .unwrap();
        assert!(matches!(
            template.resolve(&library()),
            Err(EditorError::Engine(EngineError::UnknownDefinition { .. }))
        ));
    }
}
