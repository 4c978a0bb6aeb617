//! The page/instance/theme graph every editor reads and writes.
//!
//! An [`EditorStore`] is an explicit value owned by one editing session;
//! several can coexist (one per open project). Every mutation bumps
//! `updated_at` and hands a snapshot to the configured [`PersistSink`].

use chrono::{DateTime, Utc};
use pagecraft_engine::vdom::{NodePath, VNode};
use pagecraft_engine::{normalize, ComponentDefinition, ComponentLibrary, PropMap, PropPath, Theme};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{EditorError, EditorResult};
use crate::overlay::{Edit, Overlay, OverlayState};
use crate::page::{slugify, unique_slug, ComponentInstance, LegacyStyle, Page};
use crate::persist::{PersistSink, ProjectSnapshot, ProjectStore};
use crate::template::Template;

pub struct EditorStore {
    project_id: String,
    library: Arc<ComponentLibrary>,
    pages: Vec<Page>,
    theme: Theme,
    template_ref: Option<String>,
    selected: Option<String>,
    overlays: HashMap<String, Overlay>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sink: Option<Arc<dyn PersistSink>>,
}

impl EditorStore {
    pub fn new(project_id: impl Into<String>, library: Arc<ComponentLibrary>) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            library,
            pages: Vec::new(),
            theme: Theme::default(),
            template_ref: None,
            selected: None,
            overlays: HashMap::new(),
            created_at: now,
            updated_at: now,
            sink: None,
        }
    }

    pub fn from_snapshot(snapshot: ProjectSnapshot, library: Arc<ComponentLibrary>) -> Self {
        Self {
            project_id: snapshot.project_id,
            library,
            pages: snapshot.pages,
            theme: snapshot.theme,
            template_ref: snapshot.template_ref,
            selected: None,
            overlays: HashMap::new(),
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            sink: None,
        }
    }

    /// Restores a saved project.
    pub fn load(
        project_id: &str,
        library: Arc<ComponentLibrary>,
        store: &dyn ProjectStore,
    ) -> EditorResult<Self> {
        let snapshot = store.load(project_id)?;
        info!(project = %project_id, pages = snapshot.pages.len(), "project loaded");
        Ok(Self::from_snapshot(snapshot, library))
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            project_id: self.project_id.clone(),
            pages: self.pages.clone(),
            theme: self.theme.clone(),
            template_ref: self.template_ref.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // --- Accessors ---

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn library(&self) -> &ComponentLibrary {
        &self.library
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, page_id: &str) -> EditorResult<&Page> {
        self.pages
            .iter()
            .find(|p| p.id == page_id)
            .ok_or_else(|| unknown_page(page_id))
    }

    pub fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn template_ref(&self) -> Option<&str> {
        self.template_ref.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn instance(&self, page_id: &str, instance_id: &str) -> EditorResult<&ComponentInstance> {
        self.page(page_id)?
            .instance(instance_id)
            .ok_or_else(|| unknown_instance(instance_id))
    }

    pub fn definition_of(&self, instance: &ComponentInstance) -> EditorResult<&ComponentDefinition> {
        Ok(self.library.require(&instance.definition_ref)?)
    }

    /// Normalized defaults merged with the instance's overrides.
    pub fn effective_props(&self, page_id: &str, instance_id: &str) -> EditorResult<PropMap> {
        let instance = self.instance(page_id, instance_id)?;
        Ok(instance.effective_props(self.definition_of(instance)?))
    }

    // --- Pages ---

    /// Adds an empty page with a slug derived from its name.
    pub fn add_page(&mut self, name: &str) -> String {
        let slug = unique_slug(&slugify(name), self.pages.iter().map(|p| p.slug.as_str()));
        let page = Page::new(name.trim(), slug);
        let id = page.id.clone();
        debug!(page = %id, slug = %page.slug, "page added");
        self.pages.push(page);
        self.touch();
        id
    }

    pub fn rename_page(&mut self, page_id: &str, name: &str) -> EditorResult<()> {
        let base = slugify(name);
        let slug = unique_slug(
            &base,
            self.pages
                .iter()
                .filter(|p| p.id != page_id)
                .map(|p| p.slug.as_str()),
        );
        let page = self.page_mut(page_id)?;
        page.name = name.trim().to_string();
        page.slug = slug;
        self.touch();
        Ok(())
    }

    /// Removes a page together with its instances and their overlays.
    pub fn delete_page(&mut self, page_id: &str) -> EditorResult<Page> {
        let index = self
            .pages
            .iter()
            .position(|p| p.id == page_id)
            .ok_or_else(|| unknown_page(page_id))?;
        let page = self.pages.remove(index);
        for instance in &page.instances {
            self.teardown(&instance.id);
        }
        debug!(page = %page_id, instances = page.instances.len(), "page deleted");
        self.touch();
        Ok(page)
    }

    // --- Instances ---

    /// Appends a fresh instance of `definition_id` to the page.
    pub fn add_instance(&mut self, page_id: &str, definition_id: &str) -> EditorResult<String> {
        let len = self.page(page_id)?.instances.len();
        self.insert_instance_at(page_id, len, definition_id)
    }

    pub fn insert_instance_at(
        &mut self,
        page_id: &str,
        index: usize,
        definition_id: &str,
    ) -> EditorResult<String> {
        let instance = ComponentInstance::from_definition(self.library.require(definition_id)?);
        let id = instance.id.clone();
        let page = self.page_mut(page_id)?;
        let len = page.instances.len();
        if index > len {
            return Err(EditorError::OutOfBounds { index, len });
        }
        page.instances.insert(index, instance);
        debug!(page = %page_id, instance = %id, definition = %definition_id, "instance added");
        self.touch();
        Ok(id)
    }

    /// Drag-and-drop move within a page.
    pub fn move_instance(&mut self, page_id: &str, from: usize, to: usize) -> EditorResult<()> {
        let page = self.page_mut(page_id)?;
        let len = page.instances.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditorError::OutOfBounds { index, len });
            }
        }
        let instance = page.instances.remove(from);
        page.instances.insert(to, instance);
        self.touch();
        Ok(())
    }

    /// Merges `partial` (any stored prop shape) over the instance's props.
    /// Styling already attached to a replaced prop is kept.
    pub fn update_instance_props(
        &mut self,
        page_id: &str,
        instance_id: &str,
        partial: &Value,
    ) -> EditorResult<()> {
        let instance = self.instance_mut(page_id, instance_id)?;
        for (key, prop) in normalize(partial) {
            PropPath::key(key).write(&mut instance.props, prop.to_json())?;
        }
        self.touch();
        Ok(())
    }

    /// Permutes a page's instances into `ordered_ids`, which must name every
    /// instance exactly once.
    pub fn reorder_instances(&mut self, page_id: &str, ordered_ids: &[String]) -> EditorResult<()> {
        let page = self.page_mut(page_id)?;
        if ordered_ids.len() != page.instances.len() {
            return Err(EditorError::InvalidReorder {
                reason: format!(
                    "expected {} ids, got {}",
                    page.instances.len(),
                    ordered_ids.len()
                ),
            });
        }
        let unique: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        if unique.len() != ordered_ids.len() {
            return Err(EditorError::InvalidReorder {
                reason: "duplicate instance id".to_string(),
            });
        }
        if let Some(missing) = ordered_ids.iter().find(|id| page.position(id).is_none()) {
            return Err(EditorError::InvalidReorder {
                reason: format!("unknown instance id '{missing}'"),
            });
        }
        let mut by_id: HashMap<String, ComponentInstance> = page
            .instances
            .drain(..)
            .map(|instance| (instance.id.clone(), instance))
            .collect();
        let reordered: Vec<ComponentInstance> = ordered_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        page.instances = reordered;
        self.touch();
        Ok(())
    }

    /// Removes one instance and tears down its overlay.
    pub fn remove_instance(&mut self, page_id: &str, instance_id: &str) -> EditorResult<ComponentInstance> {
        let page = self.page_mut(page_id)?;
        let index = page
            .position(instance_id)
            .ok_or_else(|| unknown_instance(instance_id))?;
        let removed = page.instances.remove(index);
        self.teardown(instance_id);
        self.touch();
        Ok(removed)
    }

    /// Selects one instance (or none). Overlays of every other instance go idle.
    pub fn select_instance(&mut self, instance_id: Option<&str>) -> EditorResult<()> {
        if let Some(id) = instance_id {
            if !self.pages.iter().any(|p| p.instance(id).is_some()) {
                return Err(unknown_instance(id));
            }
        }
        for (id, overlay) in self.overlays.iter_mut() {
            if Some(id.as_str()) != instance_id {
                overlay.click_outside();
            }
        }
        self.selected = instance_id.map(str::to_string);
        Ok(())
    }

    // --- Path and legacy writes ---

    pub fn set_prop_at_path(
        &mut self,
        page_id: &str,
        instance_id: &str,
        path: &PropPath,
        value: Value,
    ) -> EditorResult<()> {
        let props = self.materialized_props(page_id, instance_id, path)?;
        path.write(props, value)?;
        self.touch();
        Ok(())
    }

    pub fn set_prop_styling(
        &mut self,
        page_id: &str,
        instance_id: &str,
        path: &PropPath,
        classes: &str,
        css: &BTreeMap<String, String>,
    ) -> EditorResult<()> {
        let props = self.materialized_props(page_id, instance_id, path)?;
        path.write_styling(props, classes, css)?;
        self.touch();
        Ok(())
    }

    /// Stores a legacy content override (`{tag}_content` or `{propName}`).
    pub fn set_legacy_override(
        &mut self,
        page_id: &str,
        instance_id: &str,
        key: &str,
        value: Value,
    ) -> EditorResult<()> {
        let instance = self.instance_mut(page_id, instance_id)?;
        instance.customizations.insert(key.to_string(), value);
        self.touch();
        Ok(())
    }

    /// Stores selector-keyed style overrides; an empty style removes the entry.
    pub fn set_legacy_style(
        &mut self,
        page_id: &str,
        instance_id: &str,
        selector: &str,
        style: LegacyStyle,
    ) -> EditorResult<()> {
        let instance = self.instance_mut(page_id, instance_id)?;
        if style.is_empty() {
            instance.legacy_styles.remove(selector);
        } else {
            instance.legacy_styles.insert(selector.to_string(), style);
        }
        self.touch();
        Ok(())
    }

    // --- Theme and templates ---

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.touch();
    }

    /// Replaces every page with the template's and records the template.
    pub fn apply_template(&mut self, template: &Template) -> EditorResult<()> {
        let pages = template.resolve(&self.library)?;
        let old: Vec<String> = self
            .pages
            .iter()
            .flat_map(|p| p.instances.iter().map(|i| i.id.clone()))
            .collect();
        for id in old {
            self.teardown(&id);
        }
        info!(template = %template.id, pages = pages.len(), "template applied");
        self.pages = pages;
        self.template_ref = Some(template.id.clone());
        self.touch();
        Ok(())
    }

    // --- Overlay ---

    pub fn overlay(&self, instance_id: &str) -> Option<&Overlay> {
        self.overlays.get(instance_id)
    }

    /// The instance's overlay, created on first use.
    pub fn overlay_mut(&mut self, instance_id: &str) -> EditorResult<&mut Overlay> {
        if !self.pages.iter().any(|p| p.instance(instance_id).is_some()) {
            return Err(unknown_instance(instance_id));
        }
        Ok(self
            .overlays
            .entry(instance_id.to_string())
            .or_insert_with(|| Overlay::new(instance_id)))
    }

    /// A click inside a rendered instance. The first click selects the
    /// instance; clicks inside the selected instance drive its overlay.
    pub fn click(
        &mut self,
        page_id: &str,
        instance_id: &str,
        root: &VNode,
        clicked: &NodePath,
    ) -> EditorResult<&OverlayState> {
        if self.selected.as_deref() != Some(instance_id) {
            self.instance(page_id, instance_id)?;
            self.select_instance(Some(instance_id))?;
            return Ok(self.overlay_mut(instance_id)?.state());
        }
        let props = self.effective_props(page_id, instance_id)?;
        let legacy_styles = self.instance(page_id, instance_id)?.legacy_styles.clone();
        let overlay = self.overlay_mut(instance_id)?;
        Ok(overlay.click(root, clicked, &props, &legacy_styles))
    }

    /// Opens the style editor for whatever the instance's overlay inspects.
    pub fn open_style_editor(&mut self, page_id: &str, instance_id: &str) -> EditorResult<()> {
        let props = self.effective_props(page_id, instance_id)?;
        let legacy_styles = self.instance(page_id, instance_id)?.legacy_styles.clone();
        self.overlay_mut(instance_id)?
            .open_style_editor(&props, &legacy_styles)?;
        Ok(())
    }

    /// Commits the instance's open editor and applies the resulting edit.
    pub fn commit_editor(&mut self, page_id: &str, instance_id: &str) -> EditorResult<Edit> {
        self.instance(page_id, instance_id)?;
        let edit = self.overlay_mut(instance_id)?.commit()?;
        self.apply_edit(page_id, instance_id, edit.clone())?;
        Ok(edit)
    }

    pub fn apply_edit(&mut self, page_id: &str, instance_id: &str, edit: Edit) -> EditorResult<()> {
        match edit {
            Edit::Prop { path, value } => self.set_prop_at_path(page_id, instance_id, &path, value),
            Edit::Styling { path, classes, css } => {
                self.set_prop_styling(page_id, instance_id, &path, &classes, &css)
            }
            Edit::Legacy { key, value } => {
                self.set_legacy_override(page_id, instance_id, &key, Value::String(value))
            }
            Edit::LegacyStyle { selector, style } => {
                self.set_legacy_style(page_id, instance_id, &selector, style)
            }
        }
    }

    // --- Internals ---

    fn page_mut(&mut self, page_id: &str) -> EditorResult<&mut Page> {
        self.pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| unknown_page(page_id))
    }

    fn instance_mut(&mut self, page_id: &str, instance_id: &str) -> EditorResult<&mut ComponentInstance> {
        self.page_mut(page_id)?
            .instance_mut(instance_id)
            .ok_or_else(|| unknown_instance(instance_id))
    }

    /// The instance's own props, with the path's top-level prop copied in
    /// from the defaults if the instance does not override it yet.
    fn materialized_props(
        &mut self,
        page_id: &str,
        instance_id: &str,
        path: &PropPath,
    ) -> EditorResult<&mut PropMap> {
        let root = path.root_key().to_string();
        let default = {
            let instance = self.instance(page_id, instance_id)?;
            if instance.props.contains_key(&root) {
                None
            } else {
                self.definition_of(instance)?.normalized_defaults().remove(&root)
            }
        };
        let instance = self.instance_mut(page_id, instance_id)?;
        if let Some(prop) = default {
            instance.props.insert(root, prop);
        }
        Ok(&mut instance.props)
    }

    fn teardown(&mut self, instance_id: &str) {
        if self.overlays.remove(instance_id).is_some() {
            debug!(instance = %instance_id, "overlay torn down");
        }
        if self.selected.as_deref() == Some(instance_id) {
            self.selected = None;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        if let Some(sink) = &self.sink {
            sink.schedule(self.snapshot());
        }
    }
}

impl std::fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("project_id", &self.project_id)
            .field("pages", &self.pages.len())
            .field("selected", &self.selected)
            .field("overlays", &self.overlays.len())
            .finish()
    }
}

fn unknown_page(id: &str) -> EditorError {
    EditorError::UnknownPage { id: id.to_string() }
}

fn unknown_instance(id: &str) -> EditorError {
    EditorError::UnknownInstance { id: id.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{DirectPersist, MemoryProjectStore};
    use pagecraft_engine::props::PropKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn library() -> Arc<ComponentLibrary> {
        let mut library = ComponentLibrary::new();
        library
            .insert(ComponentDefinition::new("hero_001", "").with_default_props(json!({
                "title": "Welcome",
                "subtitle": "Build fast"
            })))
            .unwrap();
        library
            .insert(ComponentDefinition::new("features_001", "").with_default_props(json!({
                "features": [{ "title": "Fast" }, { "title": "Safe" }]
            })))
            .unwrap();
        Arc::new(library)
    }

    fn store_with_page() -> (EditorStore, String) {
        let mut store = EditorStore::new("p1", library());
        let page = store.add_page("Home");
        (store, page)
    }

    #[test]
    fn pages_get_unique_slugs() {
        let (mut store, home) = store_with_page();
        let other = store.add_page("Home");
        assert_eq!(store.page(&other).unwrap().slug, "home-2");
        store.rename_page(&other, "About Us").unwrap();
        assert_eq!(store.page(&other).unwrap().slug, "about-us");
        store.rename_page(&home, "Home").unwrap();
        assert_eq!(store.page(&home).unwrap().slug, "home");
    }

    #[test]
    fn instances_start_from_normalized_defaults() {
        let (mut store, page) = store_with_page();
        let id = store.add_instance(&page, "hero_001").unwrap();
        let instance = store.instance(&page, &id).unwrap();
        assert_eq!(instance.props["title"].as_text(), Some("Welcome"));
        assert!(matches!(
            store.add_instance(&page, "nope_001"),
            Err(EditorError::Engine(_))
        ));
    }

    #[test]
    fn partial_updates_keep_styling() {
        let (mut store, page) = store_with_page();
        let id = store.add_instance(&page, "hero_001").unwrap();
        let title = PropPath::key("title");
        store
            .set_prop_styling(&page, &id, &title, "uppercase", &BTreeMap::new())
            .unwrap();
        store
            .update_instance_props(&page, &id, &json!({ "title": "Hello" }))
            .unwrap();
        let props = store.effective_props(&page, &id).unwrap();
        assert_eq!(props["title"].as_text(), Some("Hello"));
        assert_eq!(props["title"].tailwind_classes, "uppercase");
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let (mut store, page) = store_with_page();
        let a = store.add_instance(&page, "hero_001").unwrap();
        let b = store.add_instance(&page, "features_001").unwrap();
        let c = store.insert_instance_at(&page, 0, "hero_001").unwrap();
        let order = |store: &EditorStore| -> Vec<String> {
            store.page(&page).unwrap().instances.iter().map(|i| i.id.clone()).collect()
        };
        assert_eq!(order(&store), vec![c.clone(), a.clone(), b.clone()]);

        store.reorder_instances(&page, &[b.clone(), a.clone(), c.clone()]).unwrap();
        assert_eq!(order(&store), vec![b.clone(), a.clone(), c.clone()]);

        assert!(store.reorder_instances(&page, &[a.clone(), a.clone(), c.clone()]).is_err());
        assert!(store.reorder_instances(&page, &[a.clone(), b.clone(), "x".into()]).is_err());
        assert_eq!(order(&store).len(), 3);

        store.move_instance(&page, 0, 2).unwrap();
        assert_eq!(order(&store), vec![a, c, b]);
    }

    #[test]
    fn path_writes_reach_array_records() {
        let (mut store, page) = store_with_page();
        let id = store.add_instance(&page, "features_001").unwrap();
        let path = PropPath::parse("features.1.title").unwrap();
        store.set_prop_at_path(&page, &id, &path, json!("Secure")).unwrap();
        let props = store.effective_props(&page, &id).unwrap();
        assert_eq!(props["features"].kind, PropKind::Array);
        assert_eq!(props["features"].elements()[1]["title"], json!("Secure"));
    }

    #[test]
    fn removal_tears_down_overlay_and_selection() {
        let (mut store, page) = store_with_page();
        let id = store.add_instance(&page, "hero_001").unwrap();
        store.select_instance(Some(&id)).unwrap();
        store.overlay_mut(&id).unwrap();
        store.remove_instance(&page, &id).unwrap();
        assert!(store.overlay(&id).is_none());
        assert_eq!(store.selected(), None);
        assert!(store.select_instance(Some(&id)).is_err());
    }

    #[test]
    fn legacy_writes_are_stored_per_instance() {
        let (mut store, page) = store_with_page();
        let id = store.add_instance(&page, "hero_001").unwrap();
        store
            .set_legacy_override(&page, &id, "h1_content", json!("Hi"))
            .unwrap();
        let style = LegacyStyle {
            tailwind_classes: "shadow".into(),
            custom_css_overrides: BTreeMap::new(),
        };
        store.set_legacy_style(&page, &id, ".card", style).unwrap();
        let instance = store.instance(&page, &id).unwrap();
        assert_eq!(instance.customizations["h1_content"], json!("Hi"));
        assert!(instance.legacy_styles.contains_key(".card"));

        store
            .set_legacy_style(&page, &id, ".card", LegacyStyle::default())
            .unwrap();
        assert!(store.instance(&page, &id).unwrap().legacy_styles.is_empty());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let backing = Arc::new(MemoryProjectStore::new());
        let mut store = EditorStore::new("p1", library())
            .with_sink(Arc::new(DirectPersist::new(backing.clone())));
        let page = store.add_page("Home");
        store.add_instance(&page, "hero_001").unwrap();
        store.set_theme(Theme {
            primary_color: "#FF0000".into(),
            ..Theme::default()
        });

        let restored = EditorStore::load("p1", library(), backing.as_ref()).unwrap();
        assert_eq!(restored.pages().len(), 1);
        assert_eq!(restored.pages()[0].instances.len(), 1);
        assert_eq!(restored.theme().primary_color, "#FF0000");
    }
}
