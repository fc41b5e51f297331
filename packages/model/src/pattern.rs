use crate::ids::PatternId;
use serde::{Deserialize, Serialize};

/// Library entry that elements are instantiated from
///
/// An element referencing a pattern takes its parent capability from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    pub accepts_children: bool,
}

impl Pattern {
    pub fn new(id: impl Into<PatternId>, name: impl Into<String>, accepts_children: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            accepts_children,
        }
    }
}
