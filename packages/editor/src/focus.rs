//! Focus state captured once per dispatch.

use pagecraft_model::{ElementId, FocusState, PageId, Project};
use serde::{Deserialize, Serialize};

pub use pagecraft_model::ItemType;

/// Everything a command handler may read about focus and selection
///
/// Taken at the start of a dispatch and not re-read mid-handling, so a
/// handler's routing depends only on its inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSnapshot {
    /// A text input owns the keyboard; structural commands are suppressed
    pub has_focused_input: bool,
    pub focused_item_type: ItemType,
    pub selected_element: Option<ElementId>,
    pub active_page: Option<PageId>,
}

impl FocusSnapshot {
    pub fn capture(project: &Project, has_focused_input: bool) -> Self {
        let FocusState {
            focused_item_type,
            selected_element,
            active_page,
        } = project.focus_state();

        Self {
            has_focused_input,
            focused_item_type,
            selected_element,
            active_page,
        }
    }
}
