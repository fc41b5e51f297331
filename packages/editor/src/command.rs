//! # Edit Commands
//!
//! Discrete user-intent messages handled by the dispatcher.
//!
//! On the wire a command is a tagged object:
//!
//! ```json
//! { "type": "DeleteElement", "payload": "a1b2c3-4" }
//! { "type": "PasteElement", "payload": { "targetId": "a1b2c3-1", "targetType": "Inside", "element": { ... } } }
//! { "type": "Undo" }
//! ```

use pagecraft_model::{ElementId, ElementSnapshot, PageSnapshot, ProjectSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    Undo,
    Redo,
    /// Remove whatever holds focus
    Cut,
    CutElement(ElementId),
    DeleteElement(ElementId),
    /// Remove whatever holds focus
    Delete,
    PasteElement(PasteElementPayload),
    PastePage(PastePagePayload),
    /// Duplicate whatever holds focus
    Duplicate,
    DuplicateElement(ElementId),
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Name of the command variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::Cut => "Cut",
            Command::CutElement(_) => "CutElement",
            Command::DeleteElement(_) => "DeleteElement",
            Command::Delete => "Delete",
            Command::PasteElement(_) => "PasteElement",
            Command::PastePage(_) => "PastePage",
            Command::Duplicate => "Duplicate",
            Command::DuplicateElement(_) => "DuplicateElement",
        }
    }
}

/// Where a pasted element goes relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementTargetType {
    /// Last child of the target
    Inside,
    /// Next sibling of the target
    Auto,
    /// Next sibling of the target
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteElementPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<ElementTargetType>,
    pub element: ElementSnapshot,
    /// Project the element was copied from, for reference resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastePagePayload {
    pub page: PageSnapshot,
    /// Project the page was copied from, for reference resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSnapshot>,
}
