//! # Live Project
//!
//! The single owner of every page and element in an open document.
//!
//! Elements are stored in an id-indexed arena rather than as nested trees so
//! that lookups by id, re-parenting and "imported but not yet placed"
//! elements are all first-class:
//!
//! ```text
//! pages:    [ PageRecord{root: r1}, PageRecord{root: r2} ]
//! elements: { r1 → {children: [e1, e2]}, e1 → {parent: r1}, ..., e9 → {parent: None} }
//!                                                                  ↑ imported, unplaced
//! ```
//!
//! The structural primitives here check every precondition before touching
//! state, so a failed call never leaves the project half-modified. Undo
//! tracking lives one layer up, in the editor's mutations.

use crate::context::ProjectContext;
use crate::element::Element;
use crate::error::ModelError;
use crate::ids::{ElementId, IdGenerator, PageId, PatternId, ProjectId};
use crate::page::Page;
use crate::pattern::Pattern;
use crate::snapshot::ProjectSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Kind of item that currently holds logical focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemType {
    #[default]
    Element,
    Page,
}

/// Transient focus and selection pointers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    pub focused_item_type: ItemType,
    pub selected_element: Option<ElementId>,
    pub active_page: Option<PageId>,
}

/// Element as stored in the project arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub id: ElementId,
    pub name: String,
    pub pattern_id: Option<PatternId>,
    pub accepts_children: bool,
    pub properties: BTreeMap<String, String>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

/// Entry in the project's ordered page sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub name: String,
    pub root: ElementId,
}

/// Root document: ordered pages, element index, pattern library and focus
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    id: ProjectId,
    name: String,
    pages: Vec<PageRecord>,
    elements: HashMap<ElementId, ElementNode>,
    patterns: Vec<Pattern>,
    focus: FocusState,
    ids: IdGenerator,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let ids = IdGenerator::new(&name);

        Self {
            id: ProjectId::new(ids.seed()),
            name,
            pages: Vec::new(),
            elements: HashMap::new(),
            patterns: Vec::new(),
            focus: FocusState::default(),
            ids,
        }
    }

    pub fn from_snapshot(snapshot: &ProjectSnapshot) -> Result<Self, ModelError> {
        let mut ids = match &snapshot.id_seed {
            Some(seed) => IdGenerator::from_parts(seed.clone(), snapshot.id_count),
            None => IdGenerator::new(&snapshot.name),
        };

        let mut project = Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            pages: Vec::new(),
            elements: HashMap::new(),
            patterns: Vec::new(),
            focus: FocusState::default(),
            ids: ids.clone(),
        };

        for pattern in &snapshot.patterns {
            project.import_pattern(pattern.clone())?;
        }

        for page_snapshot in &snapshot.pages {
            let page = Page::from_snapshot(page_snapshot, snapshot);
            let index = project.pages.len();
            project.insert_page(&page, index)?;
        }

        for page in &project.pages {
            ids.observe(page.id.as_str());
        }
        for id in project.elements.keys() {
            ids.observe(id.as_str());
        }
        project.ids = ids;

        let active = snapshot
            .active_page
            .clone()
            .or_else(|| project.pages.first().map(|p| p.id.clone()));
        project.set_active_page(active);

        Ok(project)
    }

    pub fn to_snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            pages: self
                .pages
                .iter()
                .filter_map(|record| self.page_tree(&record.id))
                .map(|page| page.to_snapshot())
                .collect(),
            patterns: self.patterns.clone(),
            active_page: self.focus.active_page.clone(),
            id_seed: Some(self.ids.seed().to_string()),
            id_count: self.ids.count(),
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------
    // Builders (not tracked by undo history)
    // ------------------------------------------------------------------

    /// Append a new page with an empty root; becomes active if none is
    pub fn create_page(&mut self, name: impl Into<String>) -> PageId {
        let page_id = self.ids.next_page_id();
        let root_id = self.ids.next_element_id();

        self.elements.insert(
            root_id.clone(),
            ElementNode {
                id: root_id.clone(),
                name: "Page".to_string(),
                pattern_id: None,
                accepts_children: true,
                properties: BTreeMap::new(),
                parent: None,
                children: Vec::new(),
            },
        );
        self.pages.push(PageRecord {
            id: page_id.clone(),
            name: name.into(),
            root: root_id,
        });

        if self.focus.active_page.is_none() {
            self.focus.active_page = Some(page_id.clone());
        }

        page_id
    }

    /// Create a childless element as the last child of `parent`
    pub fn create_element(
        &mut self,
        parent: &ElementId,
        name: impl Into<String>,
        accepts_children: bool,
    ) -> Result<ElementId, ModelError> {
        self.check_accepts_children(parent)?;

        let id = self.ids.next_element_id();
        let element = Element::new(id.clone(), name).with_accepts_children(accepts_children);
        self.append_tree(parent, &element)?;
        Ok(id)
    }

    /// Register a detached tree and place it as the last child of `parent`
    pub fn append_tree(&mut self, parent: &ElementId, element: &Element) -> Result<(), ModelError> {
        self.check_accepts_children(parent)?;
        self.register_element(element)?;

        let index = self.children_of(parent).len();
        self.attach_element(&element.id, parent, index)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn focused_item_type(&self) -> ItemType {
        self.focus.focused_item_type
    }

    pub fn focus_state(&self) -> FocusState {
        self.focus.clone()
    }

    pub fn element_by_id(&self, id: &ElementId) -> Option<&ElementNode> {
        self.elements.get(id)
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn selected_element(&self) -> Option<&ElementNode> {
        self.focus
            .selected_element
            .as_ref()
            .and_then(|id| self.elements.get(id))
    }

    pub fn active_page(&self) -> Option<&PageRecord> {
        self.focus
            .active_page
            .as_ref()
            .and_then(|id| self.page_by_id(id))
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn page_by_id(&self, id: &PageId) -> Option<&PageRecord> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn page_index(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|p| &p.id == id)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn has_pattern(&self, id: &PatternId) -> bool {
        self.patterns.iter().any(|p| &p.id == id)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn accepts_children(&self, id: &ElementId) -> bool {
        self.elements.get(id).is_some_and(|node| node.accepts_children)
    }

    pub fn children_of(&self, id: &ElementId) -> &[ElementId] {
        self.elements
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Parent and index within the parent's children
    pub fn position_of(&self, id: &ElementId) -> Option<(ElementId, usize)> {
        let parent_id = self.elements.get(id)?.parent.clone()?;
        let index = self
            .children_of(&parent_id)
            .iter()
            .position(|child| child == id)?;
        Some((parent_id, index))
    }

    pub fn is_page_root(&self, id: &ElementId) -> bool {
        self.pages.iter().any(|p| &p.root == id)
    }

    /// Placed elements are reachable from a page root
    pub fn is_placed(&self, id: &ElementId) -> bool {
        match self.elements.get(id) {
            Some(node) => node.parent.is_some() || self.is_page_root(id),
            None => false,
        }
    }

    /// True if `id` is `ancestor` or lies inside its subtree
    pub fn is_within(&self, id: &ElementId, ancestor: &ElementId) -> bool {
        let mut current = Some(id.clone());
        while let Some(node_id) = current {
            if &node_id == ancestor {
                return true;
            }
            current = self.elements.get(&node_id).and_then(|n| n.parent.clone());
        }
        false
    }

    /// Page whose tree contains `id`
    pub fn page_of(&self, id: &ElementId) -> Option<&PageRecord> {
        let mut current = id.clone();
        while let Some(parent) = self.elements.get(&current)?.parent.clone() {
            current = parent;
        }
        self.pages.iter().find(|p| p.root == current)
    }

    /// Rebuild the detached tree rooted at `id`
    pub fn element_tree(&self, id: &ElementId) -> Option<Element> {
        let node = self.elements.get(id)?;
        let children = node
            .children
            .iter()
            .map(|child| self.element_tree(child))
            .collect::<Option<Vec<_>>>()?;

        Some(Element {
            id: node.id.clone(),
            name: node.name.clone(),
            pattern: node
                .pattern_id
                .as_ref()
                .and_then(|pattern_id| self.pattern(pattern_id))
                .cloned(),
            accepts_children: node.accepts_children,
            properties: node.properties.clone(),
            children,
        })
    }

    pub fn page_tree(&self, id: &PageId) -> Option<Page> {
        let record = self.page_by_id(id)?;
        Some(Page {
            id: record.id.clone(),
            name: record.name.clone(),
            root: self.element_tree(&record.root)?,
        })
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn id_generator_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    // ------------------------------------------------------------------
    // Structural primitives
    // ------------------------------------------------------------------

    /// Add a detached subtree to the element index without placing it
    pub fn register_element(&mut self, element: &Element) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for id in element.ids() {
            if self.elements.contains_key(&id) || !seen.insert(id.clone()) {
                return Err(ModelError::DuplicateId(id.to_string()));
            }
        }

        self.insert_nodes(element, None);
        Ok(())
    }

    /// Remove an unplaced subtree from the element index
    pub fn unregister_element(&mut self, id: &ElementId) -> Result<Element, ModelError> {
        let node = self
            .elements
            .get(id)
            .ok_or_else(|| ModelError::ElementNotFound(id.clone()))?;

        if self.is_page_root(id) {
            return Err(ModelError::PageRoot(id.clone()));
        }
        if node.parent.is_some() {
            return Err(ModelError::AlreadyPlaced(id.clone()));
        }

        let tree = self
            .element_tree(id)
            .ok_or_else(|| ModelError::ElementNotFound(id.clone()))?;
        self.remove_nodes(id);
        self.drop_dangling_focus();
        Ok(tree)
    }

    /// Place an unplaced element into `parent` at `index` (clamped)
    pub fn attach_element(
        &mut self,
        id: &ElementId,
        parent_id: &ElementId,
        index: usize,
    ) -> Result<usize, ModelError> {
        if !self.elements.contains_key(id) {
            return Err(ModelError::ElementNotFound(id.clone()));
        }
        if self.is_placed(id) {
            return Err(ModelError::AlreadyPlaced(id.clone()));
        }
        self.check_accepts_children(parent_id)?;
        if self.is_within(parent_id, id) {
            return Err(ModelError::CycleDetected);
        }

        let parent = self
            .elements
            .get_mut(parent_id)
            .ok_or_else(|| ModelError::ElementNotFound(parent_id.clone()))?;
        let index = index.min(parent.children.len());
        parent.children.insert(index, id.clone());

        if let Some(node) = self.elements.get_mut(id) {
            node.parent = Some(parent_id.clone());
        }
        Ok(index)
    }

    /// Take a placed element out of its parent; it stays in the index
    pub fn detach_element(&mut self, id: &ElementId) -> Result<(ElementId, usize), ModelError> {
        let (parent_id, index) = self.position_of(id).ok_or_else(|| {
            if self.elements.contains_key(id) {
                ModelError::NotPlaced(id.clone())
            } else {
                ModelError::ElementNotFound(id.clone())
            }
        })?;

        if let Some(parent) = self.elements.get_mut(&parent_id) {
            parent.children.remove(index);
        }
        if let Some(node) = self.elements.get_mut(id) {
            node.parent = None;
        }
        Ok((parent_id, index))
    }

    /// Register a page's tree and insert it into the page sequence
    pub fn insert_page(&mut self, page: &Page, index: usize) -> Result<usize, ModelError> {
        if self.page_by_id(&page.id).is_some() {
            return Err(ModelError::DuplicateId(page.id.to_string()));
        }
        self.register_element(&page.root)?;

        let index = index.min(self.pages.len());
        self.pages.insert(
            index,
            PageRecord {
                id: page.id.clone(),
                name: page.name.clone(),
                root: page.root.id.clone(),
            },
        );
        Ok(index)
    }

    /// Remove a page and its whole element tree
    pub fn take_page(&mut self, id: &PageId) -> Result<(Page, usize), ModelError> {
        let index = self
            .page_index(id)
            .ok_or_else(|| ModelError::PageNotFound(id.clone()))?;
        let page = self
            .page_tree(id)
            .ok_or_else(|| ModelError::PageNotFound(id.clone()))?;

        let record = self.pages.remove(index);
        self.remove_nodes(&record.root);
        self.drop_dangling_focus();
        Ok((page, index))
    }

    /// Relocate a page to `index` (clamped); returns its previous index
    pub fn move_page(&mut self, id: &PageId, index: usize) -> Result<usize, ModelError> {
        let from = self
            .page_index(id)
            .ok_or_else(|| ModelError::PageNotFound(id.clone()))?;

        let record = self.pages.remove(from);
        let to = index.min(self.pages.len());
        self.pages.insert(to, record);
        Ok(from)
    }

    pub fn import_pattern(&mut self, pattern: Pattern) -> Result<(), ModelError> {
        if self.has_pattern(&pattern.id) {
            return Err(ModelError::DuplicateId(pattern.id.to_string()));
        }
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn forget_pattern(&mut self, id: &PatternId) -> Result<Pattern, ModelError> {
        let index = self
            .patterns
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ModelError::PatternNotFound(id.clone()))?;
        Ok(self.patterns.remove(index))
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn set_focused_item_type(&mut self, item_type: ItemType) {
        self.focus.focused_item_type = item_type;
    }

    /// Select an element; an unknown id clears the selection
    pub fn set_selected_element(&mut self, id: Option<ElementId>) {
        let selected = id.filter(|id| self.elements.contains_key(id));
        self.focus.selected_element = selected;
    }

    /// Activate a page; an unknown id clears the active page
    pub fn set_active_page(&mut self, id: Option<PageId>) {
        let active = id.filter(|id| self.page_by_id(id).is_some());
        self.focus.active_page = active;
    }

    pub fn restore_focus(&mut self, focus: FocusState) {
        self.set_focused_item_type(focus.focused_item_type);
        self.set_selected_element(focus.selected_element);
        self.set_active_page(focus.active_page);
    }

    fn drop_dangling_focus(&mut self) {
        let focus = self.focus.clone();
        self.restore_focus(focus);
    }

    fn check_accepts_children(&self, id: &ElementId) -> Result<(), ModelError> {
        match self.elements.get(id) {
            None => Err(ModelError::ElementNotFound(id.clone())),
            Some(node) if !node.accepts_children => Err(ModelError::RejectsChildren(id.clone())),
            Some(_) => Ok(()),
        }
    }

    fn insert_nodes(&mut self, element: &Element, parent: Option<ElementId>) {
        self.elements.insert(
            element.id.clone(),
            ElementNode {
                id: element.id.clone(),
                name: element.name.clone(),
                pattern_id: element.pattern.as_ref().map(|p| p.id.clone()),
                accepts_children: element.accepts_children,
                properties: element.properties.clone(),
                parent,
                children: element.children.iter().map(|c| c.id.clone()).collect(),
            },
        );

        for child in &element.children {
            self.insert_nodes(child, Some(element.id.clone()));
        }
    }

    fn remove_nodes(&mut self, id: &ElementId) {
        if let Some(node) = self.elements.remove(id) {
            for child in &node.children {
                self.remove_nodes(child);
            }
        }
    }
}

impl ProjectContext for Project {
    fn pattern(&self, id: &PatternId) -> Option<&Pattern> {
        self.patterns.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_children() -> (Project, ElementId, ElementId, ElementId) {
        let mut project = Project::new("Test");
        let page = project.create_page("Home");
        let root = project.page_by_id(&page).unwrap().root.clone();
        let first = project.create_element(&root, "First", true).unwrap();
        let second = project.create_element(&root, "Second", false).unwrap();
        (project, root, first, second)
    }

    #[test]
    fn test_create_page_becomes_active() {
        let mut project = Project::new("Test");
        let home = project.create_page("Home");
        project.create_page("About");

        assert_eq!(project.pages().len(), 2);
        assert_eq!(project.active_page().map(|p| &p.id), Some(&home));
        assert!(project.is_page_root(&project.pages()[0].root.clone()));
    }

    #[test]
    fn test_register_leaves_element_unplaced() {
        let (mut project, _, _, _) = project_with_children();
        let element = Element::new("loose", "Loose");

        project.register_element(&element).unwrap();

        assert!(project.contains_element(&ElementId::new("loose")));
        assert!(!project.is_placed(&ElementId::new("loose")));
    }

    #[test]
    fn test_register_rejects_duplicate_ids() {
        let (mut project, root, _, _) = project_with_children();
        let before = project.clone();

        let element =
            Element::new("fresh", "Fresh").with_child(Element::new(root.clone(), "Clash"));

        assert_eq!(
            project.register_element(&element),
            Err(ModelError::DuplicateId(root.to_string()))
        );
        assert_eq!(project, before);
    }

    #[test]
    fn test_attach_into_childless_parent_is_rejected() {
        let (mut project, _, _, second) = project_with_children();
        project.register_element(&Element::new("loose", "Loose")).unwrap();

        let result = project.attach_element(&ElementId::new("loose"), &second, 0);

        assert_eq!(result, Err(ModelError::RejectsChildren(second.clone())));
        assert!(project.children_of(&second).is_empty());
    }

    #[test]
    fn test_attach_detects_cycles() {
        let (mut project, _, first, _) = project_with_children();
        let nested = project.create_element(&first, "Nested", true).unwrap();
        project.detach_element(&first).unwrap();

        assert_eq!(
            project.attach_element(&first, &nested, 0),
            Err(ModelError::CycleDetected)
        );
    }

    #[test]
    fn test_detach_and_reattach_restores_order() {
        let (mut project, root, first, second) = project_with_children();

        let (parent, index) = project.detach_element(&first).unwrap();
        assert_eq!(parent, root);
        assert_eq!(index, 0);
        assert_eq!(project.children_of(&root), &[second.clone()]);

        project.attach_element(&first, &parent, index).unwrap();
        assert_eq!(project.children_of(&root), &[first, second]);
    }

    #[test]
    fn test_unregister_requires_unplaced() {
        let (mut project, root, first, _) = project_with_children();

        assert_eq!(
            project.unregister_element(&first),
            Err(ModelError::AlreadyPlaced(first.clone()))
        );
        assert_eq!(
            project.unregister_element(&root),
            Err(ModelError::PageRoot(root.clone()))
        );

        project.detach_element(&first).unwrap();
        let tree = project.unregister_element(&first).unwrap();
        assert_eq!(tree.name, "First");
        assert!(!project.contains_element(&first));
    }

    #[test]
    fn test_unregister_clears_selection() {
        let (mut project, _, first, _) = project_with_children();
        project.set_selected_element(Some(first.clone()));

        project.detach_element(&first).unwrap();
        project.unregister_element(&first).unwrap();

        assert!(project.selected_element().is_none());
    }

    #[test]
    fn test_take_page_removes_tree() {
        let (mut project, root, first, _) = project_with_children();
        let page_id = project.pages()[0].id.clone();

        let (page, index) = project.take_page(&page_id).unwrap();

        assert_eq!(index, 0);
        assert_eq!(page.root.id, root);
        assert!(!project.contains_element(&first));
        assert!(project.active_page().is_none());
        assert_eq!(project.element_count(), 0);
    }

    #[test]
    fn test_move_page_returns_previous_index() {
        let mut project = Project::new("Test");
        let a = project.create_page("A");
        let b = project.create_page("B");
        let c = project.create_page("C");

        assert_eq!(project.move_page(&a, 2).unwrap(), 0);
        let order: Vec<_> = project.pages().iter().map(|p| p.id.clone()).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn test_select_unknown_element_clears_selection() {
        let (mut project, _, first, _) = project_with_children();
        project.set_selected_element(Some(first));
        project.set_selected_element(Some(ElementId::new("missing")));

        assert!(project.selected_element().is_none());
    }

    #[test]
    fn test_page_of_walks_to_root() {
        let (mut project, _, first, _) = project_with_children();
        let nested = project.create_element(&first, "Nested", false).unwrap();

        assert_eq!(project.page_of(&nested).map(|p| p.name.as_str()), Some("Home"));
    }

    #[test]
    fn test_element_tree_resolves_pattern() {
        let (mut project, root, _, _) = project_with_children();
        let pattern = Pattern::new("box", "Box", true);
        project.import_pattern(pattern.clone()).unwrap();

        let element = Element::new("boxed", "Boxed").with_pattern(pattern.clone());
        project.append_tree(&root, &element).unwrap();

        let tree = project.element_tree(&ElementId::new("boxed")).unwrap();
        assert_eq!(tree.pattern, Some(pattern));
    }
}
