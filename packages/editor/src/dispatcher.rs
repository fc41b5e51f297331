//! # Command Dispatcher
//!
//! Routes a [`Command`] to store operations.
//!
//! Routing reads only the [`FocusSnapshot`] taken before the command is
//! handled. Every failure is a silent no-op; [`DispatchOutcome`] reports
//! what happened for logging and tests but is never shown to the user.

use crate::command::{Command, ElementTargetType, PasteElementPayload, PastePagePayload};
use crate::config::EditorConfig;
use crate::focus::{FocusSnapshot, ItemType};
use crate::store::Store;
use crate::EditorError;
use pagecraft_model::{Element, ElementId, Page, Project, ProjectContext, ProjectSnapshot};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Noop(NoopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    /// A text input owns the keyboard
    FocusedInput,
    NothingToUndo,
    NothingToRedo,
    /// Paste needs an active page
    NoActivePage,
    /// Paste could not resolve a target element
    NoTarget,
    NothingSelected,
    /// The command does not apply to the focused item type
    FocusMismatch,
    /// The store refused the edit (unknown id, page root, invalid placement)
    Rejected,
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied)
    }

    fn from_edit(applied: bool) -> Self {
        if applied {
            DispatchOutcome::Applied
        } else {
            DispatchOutcome::Noop(NoopReason::Rejected)
        }
    }
}

/// Handle one command against the store
#[instrument(skip_all, fields(command = command.kind(), item_type = ?focus.focused_item_type))]
pub fn dispatch(store: &mut Store, focus: &FocusSnapshot, command: Command) -> DispatchOutcome {
    if focus.has_focused_input {
        return DispatchOutcome::Noop(NoopReason::FocusedInput);
    }

    debug!("Dispatching command");

    let outcome = route(store, focus, command);
    store.seal_history();
    outcome
}

fn route(store: &mut Store, focus: &FocusSnapshot, command: Command) -> DispatchOutcome {
    match command {
        Command::Undo => {
            if store.undo() {
                DispatchOutcome::Applied
            } else {
                DispatchOutcome::Noop(NoopReason::NothingToUndo)
            }
        }

        Command::Redo => {
            if store.redo() {
                DispatchOutcome::Applied
            } else {
                DispatchOutcome::Noop(NoopReason::NothingToRedo)
            }
        }

        Command::Cut | Command::Delete => remove_focused(store, focus),

        Command::CutElement(id) | Command::DeleteElement(id) => {
            DispatchOutcome::from_edit(store.remove_element_by_id(&id))
        }

        Command::Duplicate => match focus.focused_item_type {
            ItemType::Element => match &focus.selected_element {
                Some(id) => DispatchOutcome::from_edit(store.duplicate_element_by_id(id)),
                None => DispatchOutcome::Noop(NoopReason::NothingSelected),
            },
            ItemType::Page => match &focus.active_page {
                Some(id) => DispatchOutcome::from_edit(store.duplicate_page(id)),
                None => DispatchOutcome::Noop(NoopReason::NoActivePage),
            },
        },

        // Page focus has no duplicate-by-id branch.
        Command::DuplicateElement(id) => match focus.focused_item_type {
            ItemType::Element => DispatchOutcome::from_edit(store.duplicate_element_by_id(&id)),
            ItemType::Page => DispatchOutcome::Noop(NoopReason::FocusMismatch),
        },

        Command::PasteElement(payload) => paste_element(store, focus, &payload),

        Command::PastePage(payload) => paste_page(store, focus, &payload),
    }
}

fn remove_focused(store: &mut Store, focus: &FocusSnapshot) -> DispatchOutcome {
    match focus.focused_item_type {
        ItemType::Element => match &focus.selected_element {
            Some(id) => DispatchOutcome::from_edit(store.remove_element_by_id(id)),
            None => DispatchOutcome::Noop(NoopReason::NothingSelected),
        },
        ItemType::Page => match &focus.active_page {
            Some(id) => DispatchOutcome::from_edit(store.remove_page(id)),
            None => DispatchOutcome::Noop(NoopReason::NoActivePage),
        },
    }
}

/// Materialize, clone and place a pasted element as one undo step
fn paste_element(
    store: &mut Store,
    focus: &FocusSnapshot,
    payload: &PasteElementPayload,
) -> DispatchOutcome {
    store.start_batch();

    let Some(page_root) = focus
        .active_page
        .as_ref()
        .and_then(|id| store.page_by_id(id))
        .map(|page| page.root.clone())
    else {
        store.abort_batch();
        return DispatchOutcome::Noop(NoopReason::NoActivePage);
    };

    let Some(target_id) = resolve_target(store, focus, payload, page_root) else {
        store.abort_batch();
        return DispatchOutcome::Noop(NoopReason::NoTarget);
    };

    // References resolve against the source project before new ids are assigned.
    let materialized = Element::from_snapshot(
        &payload.element,
        context_project(payload.project.as_ref(), store.project()),
    );
    store.end_batch();

    let clone = materialized.clone_fresh(store.id_generator());
    let clone_id = clone.id.clone();

    if !store.import_element(&clone) {
        store.abort_batch();
        return DispatchOutcome::Noop(NoopReason::Rejected);
    }

    match payload.target_type {
        Some(ElementTargetType::Inside) => {
            // A rejecting target leaves the clone imported but unplaced.
            store.insert_element_inside(&clone_id, &target_id);
        }
        Some(ElementTargetType::Auto) | Some(ElementTargetType::Below) => {
            store.insert_element_after(&clone_id, &target_id);
        }
        None => {}
    }

    store.commit();
    store.set_selected_element(Some(clone_id));

    DispatchOutcome::Applied
}

fn resolve_target(
    store: &Store,
    focus: &FocusSnapshot,
    payload: &PasteElementPayload,
    page_root: ElementId,
) -> Option<ElementId> {
    match &payload.target_id {
        Some(id) => store.element_by_id(id).map(|node| node.id.clone()),
        None => focus
            .selected_element
            .as_ref()
            .and_then(|id| store.element_by_id(id))
            .map(|node| node.id.clone())
            .or(Some(page_root)),
    }
}

/// Import a pasted page, then move it after the anchor page as a separate step
fn paste_page(
    store: &mut Store,
    focus: &FocusSnapshot,
    payload: &PastePagePayload,
) -> DispatchOutcome {
    store.start_batch();

    let anchor = focus
        .active_page
        .as_ref()
        .and_then(|id| store.page_by_id(id))
        .or_else(|| store.pages().last())
        .map(|page| page.id.clone());

    let materialized = Page::from_snapshot(
        &payload.page,
        context_project(payload.project.as_ref(), store.project()),
    );
    store.end_batch();

    let clone = materialized.clone_fresh(store.id_generator());
    let clone_id = clone.id.clone();

    if !store.import_page(&clone) {
        store.abort_batch();
        return DispatchOutcome::Noop(NoopReason::Rejected);
    }
    store.commit();

    if let Some(anchor) = anchor {
        store.move_page_after(&clone_id, &anchor);
    }
    store.set_active_page(Some(clone_id));

    DispatchOutcome::Applied
}

fn context_project<'a>(
    snapshot: Option<&'a ProjectSnapshot>,
    live: &'a Project,
) -> &'a dyn ProjectContext {
    match snapshot {
        Some(snapshot) => snapshot,
        None => live,
    }
}

/// Owns the live store and feeds it commands
///
/// The host tells the handler whether a text input has focus; everything
/// else is read from the project when a command arrives.
#[derive(Debug)]
pub struct EditMessageHandler {
    store: Store,
    has_focused_input: bool,
    config: EditorConfig,
}

impl EditMessageHandler {
    pub fn new(project: Project, config: EditorConfig) -> Self {
        Self {
            store: Store::with_config(project, &config),
            has_focused_input: false,
            config,
        }
    }

    /// Open a project from its snapshot
    pub fn open(snapshot: &ProjectSnapshot, config: EditorConfig) -> Result<Self, EditorError> {
        let project = Project::from_snapshot(snapshot)?;
        Ok(Self::new(project, config))
    }

    pub fn handle(&mut self, command: Command) -> DispatchOutcome {
        let focus = self.store.focus_snapshot(self.has_focused_input);
        let kind = command.kind();
        let outcome = dispatch(&mut self.store, &focus, command);

        if let DispatchOutcome::Noop(reason) = outcome {
            if self.config.log_noops {
                info!(command = kind, ?reason, "Command had no effect");
            } else {
                debug!(command = kind, ?reason, "Command had no effect");
            }
        }

        outcome
    }

    /// Parse a wire message and handle it
    pub fn handle_json(&mut self, json: &str) -> Result<DispatchOutcome, EditorError> {
        let command = Command::from_json(json)?;
        Ok(self.handle(command))
    }

    pub fn set_has_focused_input(&mut self, has_focused_input: bool) {
        self.has_focused_input = has_focused_input;
    }

    pub fn has_focused_input(&self) -> bool {
        self.has_focused_input
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn project(&self) -> &Project {
        self.store.project()
    }
}
