//! # Elements
//!
//! Detached element trees and their serialized snapshots.
//!
//! A detached [`Element`] is what the clipboard subsystem works with: it is
//! materialized from an [`ElementSnapshot`] against a [`ProjectContext`],
//! then cloned with fresh identities before being imported into the live
//! project. Neither step touches a live project tree.
//!
//! ```text
//! ElementSnapshot ──from_snapshot(ctx)──▶ Element ──clone_fresh(ids)──▶ Element'
//!   (inert)                          (references resolved)     (new identities)
//! ```
//!
//! Resolution has to happen before cloning: the snapshot's pattern
//! references belong to the source project, not the one being pasted into.

use crate::context::ProjectContext;
use crate::ids::{ElementId, IdGenerator, PatternId};
use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inert, serialized representation of an element subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub id: ElementId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<PatternId>,
    #[serde(default)]
    pub accepts_children: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

/// Element subtree that is not attached to any project tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub pattern: Option<Pattern>,
    pub accepts_children: bool,
    pub properties: BTreeMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pattern: None,
            accepts_children: false,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_accepts_children(mut self, accepts_children: bool) -> Self {
        self.accepts_children = accepts_children;
        self
    }

    /// Bind to a pattern; the pattern decides whether children are accepted
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.accepts_children = pattern.accepts_children;
        self.pattern = Some(pattern);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Materialize a snapshot, resolving pattern references against `context`
    ///
    /// A pattern id the context does not know is dropped and the snapshot's
    /// own capability flag is kept.
    pub fn from_snapshot(snapshot: &ElementSnapshot, context: &dyn ProjectContext) -> Self {
        let pattern = snapshot
            .pattern_id
            .as_ref()
            .and_then(|id| context.pattern(id))
            .cloned();

        let accepts_children = pattern
            .as_ref()
            .map_or(snapshot.accepts_children, |p| p.accepts_children);

        Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            pattern,
            accepts_children,
            properties: snapshot.properties.clone(),
            children: snapshot
                .children
                .iter()
                .map(|child| Self::from_snapshot(child, context))
                .collect(),
        }
    }

    /// Deep copy in which every node of the subtree gets a fresh identity
    pub fn clone_fresh(&self, ids: &mut IdGenerator) -> Self {
        Self {
            id: ids.next_element_id(),
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            accepts_children: self.accepts_children,
            properties: self.properties.clone(),
            children: self
                .children
                .iter()
                .map(|child| child.clone_fresh(ids))
                .collect(),
        }
    }

    pub fn to_snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            pattern_id: self.pattern.as_ref().map(|p| p.id.clone()),
            accepts_children: self.accepts_children,
            properties: self.properties.clone(),
            children: self.children.iter().map(Self::to_snapshot).collect(),
        }
    }

    /// All ids in the subtree, pre-order
    pub fn ids(&self) -> Vec<ElementId> {
        let mut ids = Vec::new();
        self.walk(&mut |element| ids.push(element.id.clone()));
        ids
    }

    /// Distinct patterns referenced anywhere in the subtree
    pub fn patterns(&self) -> Vec<&Pattern> {
        let mut patterns: Vec<&Pattern> = Vec::new();
        self.walk(&mut |element| {
            if let Some(pattern) = &element.pattern {
                if !patterns.iter().any(|p| p.id == pattern.id) {
                    patterns.push(pattern);
                }
            }
        });
        patterns
    }

    /// Structural and content equality, ignoring identities
    pub fn content_eq(&self, other: &Element) -> bool {
        self.name == other.name
            && self.pattern == other.pattern
            && self.accepts_children == other.accepts_children
            && self.properties == other.properties
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.content_eq(b))
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Library {
        patterns: Vec<Pattern>,
    }

    impl ProjectContext for Library {
        fn pattern(&self, id: &PatternId) -> Option<&Pattern> {
            self.patterns.iter().find(|p| &p.id == id)
        }
    }

    fn card_snapshot() -> ElementSnapshot {
        serde_json::from_str(
            r#"{
                "id": "src-1",
                "name": "Card",
                "patternId": "box",
                "properties": { "padding": "8px" },
                "children": [
                    { "id": "src-2", "name": "Title", "properties": { "text": "Hello" } }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_snapshot_resolves_pattern_in_context() {
        let library = Library {
            patterns: vec![Pattern::new("box", "Box", true)],
        };

        let element = Element::from_snapshot(&card_snapshot(), &library);

        assert_eq!(element.pattern.as_ref().map(|p| p.name.as_str()), Some("Box"));
        assert!(element.accepts_children);
        assert_eq!(element.children.len(), 1);
        assert!(!element.children[0].accepts_children);
    }

    #[test]
    fn test_from_snapshot_drops_unknown_pattern() {
        let library = Library { patterns: vec![] };

        let element = Element::from_snapshot(&card_snapshot(), &library);

        assert!(element.pattern.is_none());
        assert!(!element.accepts_children);
    }

    #[test]
    fn test_clone_fresh_assigns_new_ids() {
        let source = Element::new("a", "Root")
            .with_accepts_children(true)
            .with_child(Element::new("b", "Child").with_property("color", "red"));
        let mut ids = IdGenerator::new("target");

        let copy = source.clone_fresh(&mut ids);

        assert!(copy.content_eq(&source));
        for id in copy.ids() {
            assert!(!source.ids().contains(&id));
        }
    }

    #[test]
    fn test_mutating_clone_leaves_source_untouched() {
        let source = Element::new("a", "Root").with_property("color", "red");
        let mut ids = IdGenerator::new("target");

        let mut copy = source.clone_fresh(&mut ids);
        copy.properties.insert("color".to_string(), "blue".to_string());
        copy.name = "Renamed".to_string();

        assert_eq!(source.properties["color"], "red");
        assert_eq!(source.name, "Root");
    }

    #[test]
    fn test_snapshot_keeps_pattern_reference() {
        let element = Element::new("a", "Root").with_pattern(Pattern::new("box", "Box", true));
        let snapshot = element.to_snapshot();

        assert_eq!(snapshot.pattern_id, Some(PatternId::new("box")));
        assert!(snapshot.accepts_children);
    }

    #[test]
    fn test_patterns_are_deduplicated() {
        let pattern = Pattern::new("box", "Box", true);
        let element = Element::new("a", "Outer")
            .with_pattern(pattern.clone())
            .with_child(Element::new("b", "Inner").with_pattern(pattern));

        assert_eq!(element.patterns().len(), 1);
    }
}
