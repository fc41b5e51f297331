use crate::context::ProjectContext;
use crate::element::{Element, ElementSnapshot};
use crate::ids::{IdGenerator, PageId};
use serde::{Deserialize, Serialize};

/// Inert, serialized representation of a page and its element tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub id: PageId,
    pub name: String,
    pub root: ElementSnapshot,
}

/// Page that is not part of any project's page sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub root: Element,
}

impl Page {
    pub fn new(id: impl Into<PageId>, name: impl Into<String>, root: Element) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            root,
        }
    }

    /// Materialize a snapshot, resolving references against `context`
    pub fn from_snapshot(snapshot: &PageSnapshot, context: &dyn ProjectContext) -> Self {
        Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            root: Element::from_snapshot(&snapshot.root, context),
        }
    }

    /// Deep copy with a fresh page id and fresh ids throughout the tree
    pub fn clone_fresh(&self, ids: &mut IdGenerator) -> Self {
        Self {
            id: ids.next_page_id(),
            name: self.name.clone(),
            root: self.root.clone_fresh(ids),
        }
    }

    pub fn to_snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            root: self.root.to_snapshot(),
        }
    }
}
