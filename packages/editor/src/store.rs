//! # Store
//!
//! The live project together with its undo history.
//!
//! Every structural edit goes through a [`Mutation`] recorded on the
//! [`UndoStack`]. Single-call operations (remove, duplicate, import outside
//! a batch) open their own transaction and commit it, so each is one undo
//! step. Inside a batch they join the pending transaction instead.
//!
//! Operations report success as a `bool`. A `false` means nothing changed:
//! every guard is checked before the first mutation, and a mutation that
//! still fails rolls the operation back.

use crate::config::EditorConfig;
use crate::focus::FocusSnapshot;
use crate::{Mutation, MutationError, UndoStack};
use pagecraft_model::{
    Element, ElementId, ElementNode, IdGenerator, ItemType, ModelError, Page, PageId,
    PageRecord, Project,
};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Store {
    project: Project,
    history: UndoStack,
}

impl Store {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            history: UndoStack::new(),
        }
    }

    pub fn with_config(project: Project, config: &EditorConfig) -> Self {
        Self {
            project,
            history: UndoStack::with_max_levels(config.max_undo_levels),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    /// Capture the focus state for one dispatch
    pub fn focus_snapshot(&self, has_focused_input: bool) -> FocusSnapshot {
        FocusSnapshot::capture(&self.project, has_focused_input)
    }

    /// Generator for fresh identities in the live project
    pub fn id_generator(&mut self) -> &mut IdGenerator {
        self.project.id_generator_mut()
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn focused_item_type(&self) -> ItemType {
        self.project.focused_item_type()
    }

    pub fn element_by_id(&self, id: &ElementId) -> Option<&ElementNode> {
        self.project.element_by_id(id)
    }

    pub fn selected_element(&self) -> Option<&ElementNode> {
        self.project.selected_element()
    }

    pub fn active_page(&self) -> Option<&PageRecord> {
        self.project.active_page()
    }

    pub fn page_by_id(&self, id: &PageId) -> Option<&PageRecord> {
        self.project.page_by_id(id)
    }

    pub fn pages(&self) -> &[PageRecord] {
        self.project.pages()
    }

    // ------------------------------------------------------------------
    // Batches and history
    // ------------------------------------------------------------------

    pub fn start_batch(&mut self) {
        self.history.start_batch(self.project.focus_state());
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Close any open batch and revert whatever it left pending
    pub fn abort_batch(&mut self) {
        if let Err(error) = self.history.discard(&mut self.project) {
            warn!(%error, "Failed to revert pending edits");
        }
    }

    pub fn commit(&mut self) -> bool {
        self.history.commit(self.project.focus_state())
    }

    pub fn undo(&mut self) -> bool {
        self.flush_pending();
        match self.history.undo(&mut self.project) {
            Ok(undone) => undone,
            Err(error) => {
                warn!(%error, "Undo failed");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending();
        match self.history.redo(&mut self.project) {
            Ok(redone) => redone,
            Err(error) => {
                warn!(%error, "Redo failed");
                false
            }
        }
    }

    /// Close the latest entry to later focus changes
    ///
    /// Focus set right after a commit (selecting a pasted clone) belongs to
    /// that entry until the edit that made it is over.
    pub fn seal_history(&mut self) {
        self.history.seal_focus();
    }

    fn flush_pending(&mut self) {
        if self.history.has_pending() && !self.history.is_batch_open() {
            self.commit();
        }
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn set_selected_element(&mut self, id: Option<ElementId>) {
        self.project.set_selected_element(id);
        self.history.note_focus(self.project.focus_state());
    }

    pub fn set_active_page(&mut self, id: Option<PageId>) {
        self.project.set_active_page(id);
        self.history.note_focus(self.project.focus_state());
    }

    pub fn set_focused_item_type(&mut self, item_type: ItemType) {
        self.project.set_focused_item_type(item_type);
        self.history.note_focus(self.project.focus_state());
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    pub fn remove_selected_element(&mut self) -> bool {
        match self.project.selected_element().map(|node| node.id.clone()) {
            Some(id) => self.remove_element_by_id(&id),
            None => false,
        }
    }

    /// Remove an element and its subtree; unknown ids and page roots are ignored
    pub fn remove_element_by_id(&mut self, id: &ElementId) -> bool {
        let Some(node) = self.project.element_by_id(id) else {
            debug!(element_id = %id, "Nothing to remove");
            return false;
        };
        if self.project.is_page_root(id) {
            debug!(element_id = %id, "Page roots cannot be removed");
            return false;
        }

        let placed = node.parent.is_some();
        let element_id = id.clone();
        self.transact("Remove element", move |project, history| {
            if placed {
                history.apply(
                    &Mutation::DetachElement {
                        element_id: element_id.clone(),
                    },
                    project,
                )?;
            }
            history.apply(&Mutation::ForgetElement { element_id }, project)
        })
    }

    pub fn remove_selected_page(&mut self) -> bool {
        match self.project.active_page().map(|page| page.id.clone()) {
            Some(id) => self.remove_page(&id),
            None => false,
        }
    }

    /// Remove a page; if it was active, the previous page becomes active
    pub fn remove_page(&mut self, id: &PageId) -> bool {
        let Some(index) = self.project.page_index(id) else {
            return false;
        };
        let was_active = self.project.focus_state().active_page.as_ref() == Some(id);

        let page_id = id.clone();
        let removed = self.transact("Remove page", move |project, history| {
            history.apply(&Mutation::RemovePage { page_id }, project)
        });

        if removed && was_active {
            let pages = self.project.pages();
            let next = if index > 0 {
                pages.get(index - 1)
            } else {
                pages.first()
            }
            .map(|page| page.id.clone());
            self.set_active_page(next);
        }

        removed
    }

    // ------------------------------------------------------------------
    // Duplication
    // ------------------------------------------------------------------

    pub fn duplicate_selected_element(&mut self) -> bool {
        match self.project.selected_element().map(|node| node.id.clone()) {
            Some(id) => self.duplicate_element_by_id(&id),
            None => false,
        }
    }

    /// Copy an element next to itself and select the copy
    pub fn duplicate_element_by_id(&mut self, id: &ElementId) -> bool {
        let Some((parent_id, index)) = self.project.position_of(id) else {
            debug!(element_id = %id, "Only placed elements can be duplicated");
            return false;
        };
        let Some(source) = self.project.element_tree(id) else {
            return false;
        };

        let copy = source.clone_fresh(self.project.id_generator_mut());
        let copy_id = copy.id.clone();
        let element_id = copy_id.clone();

        let duplicated = self.transact("Duplicate element", move |project, history| {
            history.apply(&Mutation::ImportElement { element: copy }, project)?;
            history.apply(
                &Mutation::PlaceElement {
                    element_id,
                    parent_id,
                    index: index + 1,
                },
                project,
            )
        });

        if duplicated {
            self.set_selected_element(Some(copy_id));
        }
        duplicated
    }

    pub fn duplicate_active_page(&mut self) -> bool {
        match self.project.active_page().map(|page| page.id.clone()) {
            Some(id) => self.duplicate_page(&id),
            None => false,
        }
    }

    /// Copy a page right after itself and activate the copy
    pub fn duplicate_page(&mut self, page_id: &PageId) -> bool {
        let (Some(index), Some(source)) = (
            self.project.page_index(page_id),
            self.project.page_tree(page_id),
        ) else {
            return false;
        };

        let copy = source.clone_fresh(self.project.id_generator_mut());
        let copy_id = copy.id.clone();

        let duplicated = self.transact("Duplicate page", move |project, history| {
            history.apply(
                &Mutation::AddPage {
                    page: copy,
                    index: index + 1,
                },
                project,
            )
        });

        if duplicated {
            self.set_active_page(Some(copy_id));
        }
        duplicated
    }

    // ------------------------------------------------------------------
    // Import and placement
    // ------------------------------------------------------------------

    /// Register a cloned subtree (and any patterns it brings) without placing it
    pub fn import_element(&mut self, element: &Element) -> bool {
        self.transact("Import element", |project, history| {
            for pattern in element.patterns() {
                if !project.has_pattern(&pattern.id) {
                    history.apply(
                        &Mutation::ImportPattern {
                            pattern: pattern.clone(),
                        },
                        project,
                    )?;
                }
            }
            history.apply(
                &Mutation::ImportElement {
                    element: element.clone(),
                },
                project,
            )
        })
    }

    /// Register a cloned page and append it to the page sequence
    pub fn import_page(&mut self, page: &Page) -> bool {
        self.transact("Import page", |project, history| {
            for pattern in page.root.patterns() {
                if !project.has_pattern(&pattern.id) {
                    history.apply(
                        &Mutation::ImportPattern {
                            pattern: pattern.clone(),
                        },
                        project,
                    )?;
                }
            }
            let index = project.pages().len();
            history.apply(
                &Mutation::AddPage {
                    page: page.clone(),
                    index,
                },
                project,
            )
        })
    }

    /// Append `element_id` as the last child of `target_id`
    ///
    /// No-op if the target does not accept children.
    pub fn insert_element_inside(&mut self, element_id: &ElementId, target_id: &ElementId) -> bool {
        if !self.project.accepts_children(target_id) {
            debug!(target_id = %target_id, "Target does not accept children");
            return false;
        }
        if !self.project.contains_element(element_id) || self.project.is_page_root(element_id) {
            return false;
        }

        let placed = self.project.position_of(element_id).is_some();
        let (element_id, target_id) = (element_id.clone(), target_id.clone());
        self.transact("Insert element", move |project, history| {
            if placed {
                history.apply(
                    &Mutation::DetachElement {
                        element_id: element_id.clone(),
                    },
                    project,
                )?;
            }
            let index = project.children_of(&target_id).len();
            history.apply(
                &Mutation::PlaceElement {
                    element_id,
                    parent_id: target_id,
                    index,
                },
                project,
            )
        })
    }

    /// Insert `element_id` as the next sibling of `target_id`
    pub fn insert_element_after(&mut self, element_id: &ElementId, target_id: &ElementId) -> bool {
        if element_id == target_id || self.project.position_of(target_id).is_none() {
            debug!(target_id = %target_id, "Target has no parent to insert into");
            return false;
        }
        if !self.project.contains_element(element_id) || self.project.is_page_root(element_id) {
            return false;
        }

        let placed = self.project.position_of(element_id).is_some();
        let (element_id, target_id) = (element_id.clone(), target_id.clone());
        self.transact("Insert element", move |project, history| {
            if placed {
                history.apply(
                    &Mutation::DetachElement {
                        element_id: element_id.clone(),
                    },
                    project,
                )?;
            }
            let (parent_id, index) = project
                .position_of(&target_id)
                .ok_or_else(|| ModelError::NotPlaced(target_id.clone()))?;
            history.apply(
                &Mutation::PlaceElement {
                    element_id,
                    parent_id,
                    index: index + 1,
                },
                project,
            )
        })
    }

    /// Move `page_id` so it immediately follows `target_page_id`
    pub fn move_page_after(&mut self, page_id: &PageId, target_page_id: &PageId) -> bool {
        if page_id == target_page_id {
            return false;
        }
        let (Some(from), Some(target)) = (
            self.project.page_index(page_id),
            self.project.page_index(target_page_id),
        ) else {
            return false;
        };

        let to = if target < from { target + 1 } else { target };
        if to == from {
            return false;
        }

        let page_id = page_id.clone();
        self.transact("Move page", move |project, history| {
            history.apply(&Mutation::MovePage { page_id, index: to }, project)
        })
    }

    /// Run an edit as one step, joining a pending transaction if there is one
    fn transact<F>(&mut self, description: &'static str, edit: F) -> bool
    where
        F: FnOnce(&mut Project, &mut UndoStack) -> Result<(), MutationError>,
    {
        let opened = self.history.begin(self.project.focus_state());
        let mark = self.history.pending_len();
        if opened {
            self.history.set_batch_description(description);
        }

        match edit(&mut self.project, &mut self.history) {
            Ok(()) => {
                if opened {
                    self.history.commit(self.project.focus_state());
                }
                debug!(operation = description, "Edit applied");
                true
            }
            Err(error) => {
                debug!(%error, operation = description, "Edit rejected");
                let rollback = if opened {
                    self.history.discard(&mut self.project)
                } else {
                    self.history.rollback_to(mark, &mut self.project)
                };
                if let Err(error) = rollback {
                    warn!(%error, operation = description, "Rollback failed");
                }
                false
            }
        }
    }

    #[cfg(test)]
    fn focus(&self) -> pagecraft_model::FocusState {
        self.project.focus_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        store: Store,
        root: ElementId,
        first: ElementId,
        second: ElementId,
    }

    fn fixture() -> Fixture {
        let mut project = Project::new("Test");
        let page = project.create_page("Home");
        let root = project.page_by_id(&page).unwrap().root.clone();
        let first = project.create_element(&root, "First", true).unwrap();
        let second = project.create_element(&root, "Second", false).unwrap();

        Fixture {
            store: Store::new(project),
            root,
            first,
            second,
        }
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let Fixture { mut store, .. } = fixture();
        let before = store.project().clone();

        assert!(!store.remove_element_by_id(&ElementId::new("missing")));
        assert_eq!(store.project(), &before);
        assert!(!store.history().can_undo());
    }

    #[test]
    fn test_remove_page_root_is_noop() {
        let Fixture { mut store, root, .. } = fixture();

        assert!(!store.remove_element_by_id(&root));
        assert!(store.project().contains_element(&root));
    }

    #[test]
    fn test_remove_selected_element_clears_selection() {
        let Fixture { mut store, first, .. } = fixture();
        store.set_selected_element(Some(first.clone()));

        assert!(store.remove_selected_element());
        assert!(store.selected_element().is_none());
        assert!(!store.project().contains_element(&first));
        assert_eq!(store.history().undo_levels(), 1);
    }

    #[test]
    fn test_undo_remove_restores_selection() {
        let Fixture { mut store, first, .. } = fixture();
        store.set_selected_element(Some(first.clone()));
        let focus = store.focus();

        store.remove_selected_element();
        assert!(store.undo());

        assert_eq!(store.focus(), focus);
        assert!(store.project().contains_element(&first));
    }

    #[test]
    fn test_duplicate_inserts_next_sibling_and_selects() {
        let Fixture {
            mut store,
            root,
            first,
            second,
        } = fixture();
        store.set_selected_element(Some(first.clone()));

        assert!(store.duplicate_selected_element());

        let children = store.project().children_of(&root).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], first);
        assert_eq!(children[2], second);
        assert_ne!(children[1], first);
        assert_eq!(store.selected_element().map(|e| e.id.clone()), Some(children[1].clone()));
    }

    #[test]
    fn test_duplicate_active_page() {
        let Fixture { mut store, .. } = fixture();
        let original = store.active_page().unwrap().id.clone();

        assert!(store.duplicate_active_page());

        assert_eq!(store.pages().len(), 2);
        assert_eq!(store.pages()[0].id, original);
        assert_eq!(store.active_page().map(|p| p.id.clone()), Some(store.pages()[1].id.clone()));
        assert_eq!(store.pages()[1].name, "Home");
    }

    #[test]
    fn test_remove_active_page_activates_previous() {
        let mut project = Project::new("Test");
        let a = project.create_page("A");
        let b = project.create_page("B");
        let c = project.create_page("C");
        project.set_active_page(Some(b.clone()));
        let mut store = Store::new(project);

        assert!(store.remove_selected_page());
        assert_eq!(store.active_page().map(|p| p.id.clone()), Some(a.clone()));

        store.set_active_page(Some(a));
        assert!(store.remove_selected_page());
        assert_eq!(store.active_page().map(|p| p.id.clone()), Some(c.clone()));

        assert!(store.remove_selected_page());
        assert!(store.active_page().is_none());
        assert!(store.pages().is_empty());
    }

    #[test]
    fn test_insert_inside_rejecting_target_is_noop() {
        let Fixture {
            mut store, second, ..
        } = fixture();
        store.import_element(&Element::new("loose", "Loose"));
        let before = store.project().clone();

        assert!(!store.insert_element_inside(&ElementId::new("loose"), &second));
        assert_eq!(store.project(), &before);
    }

    #[test]
    fn test_insert_after_moves_placed_element() {
        let Fixture {
            mut store,
            root,
            first,
            second,
        } = fixture();

        assert!(store.insert_element_after(&first, &second));
        assert_eq!(store.project().children_of(&root), &[second, first]);
    }

    #[test]
    fn test_move_page_after() {
        let mut project = Project::new("Test");
        let a = project.create_page("A");
        let b = project.create_page("B");
        let c = project.create_page("C");
        let mut store = Store::new(project);

        assert!(store.move_page_after(&a, &c));
        let order: Vec<_> = store.pages().iter().map(|p| p.id.clone()).collect();
        assert_eq!(order, vec![b.clone(), c.clone(), a.clone()]);

        assert!(!store.move_page_after(&a, &c));
        assert!(store.move_page_after(&a, &b));
        let order: Vec<_> = store.pages().iter().map(|p| p.id.clone()).collect();
        assert_eq!(order, vec![b, a, c]);
    }

    #[test]
    fn test_batched_import_and_insert_is_one_step() {
        let Fixture {
            mut store, first, ..
        } = fixture();

        store.start_batch();
        store.end_batch();
        store.import_element(&Element::new("pasted", "Pasted"));
        store.insert_element_inside(&ElementId::new("pasted"), &first);
        assert!(store.commit());

        assert_eq!(store.history().undo_levels(), 1);
        store.undo();
        assert!(!store.project().contains_element(&ElementId::new("pasted")));
    }
}
