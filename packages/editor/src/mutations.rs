//! # Structural Mutations
//!
//! Reversible operations on a live [`Project`].
//!
//! ## Design Principles
//!
//! 1. **Validated**: every mutation checks its preconditions before touching state
//! 2. **Invertible**: the inverse is computed from the project before applying
//! 3. **Minimal**: higher-level edits (remove, duplicate, paste) compose these
//!
//! ## Mutation Semantics
//!
//! ### ImportElement / ForgetElement
//! - Register or unregister a detached subtree in the element index
//! - Importing does not place; the subtree is reachable by id only
//!
//! ### PlaceElement / DetachElement
//! - Attach an unplaced element under a parent, or take a placed one out
//! - Placing into an element that rejects children fails without change
//!
//! ### AddPage / RemovePage / MovePage
//! - Page sequence edits; removing a page removes its whole tree

use pagecraft_model::{
    Element, ElementId, ModelError, Page, PageId, Pattern, PatternId, Project, ProjectContext,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Mutation {
    /// Register a detached subtree without placing it
    ImportElement { element: Element },

    /// Unregister an unplaced subtree
    ForgetElement { element_id: ElementId },

    /// Attach an unplaced element under `parent_id` at `index`
    PlaceElement {
        element_id: ElementId,
        parent_id: ElementId,
        index: usize,
    },

    /// Take a placed element out of its parent
    DetachElement { element_id: ElementId },

    /// Insert a page (and register its tree) at `index`
    AddPage { page: Page, index: usize },

    /// Remove a page and its tree
    RemovePage { page_id: PageId },

    /// Relocate a page within the page sequence
    MovePage { page_id: PageId, index: usize },

    /// Add a pattern to the project library
    ImportPattern { pattern: Pattern },

    /// Remove a pattern from the project library
    ForgetPattern { pattern_id: PatternId },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl Mutation {
    /// Apply mutation to the project with validation
    pub fn apply(&self, project: &mut Project) -> Result<(), MutationError> {
        self.validate(project)?;

        match self {
            Mutation::ImportElement { element } => project.register_element(element)?,

            Mutation::ForgetElement { element_id } => {
                project.unregister_element(element_id)?;
            }

            Mutation::PlaceElement { element_id, parent_id, index } => {
                project.attach_element(element_id, parent_id, *index)?;
            }

            Mutation::DetachElement { element_id } => {
                project.detach_element(element_id)?;
            }

            Mutation::AddPage { page, index } => {
                project.insert_page(page, *index)?;
            }

            Mutation::RemovePage { page_id } => {
                project.take_page(page_id)?;
            }

            Mutation::MovePage { page_id, index } => {
                project.move_page(page_id, *index)?;
            }

            Mutation::ImportPattern { pattern } => project.import_pattern(pattern.clone())?,

            Mutation::ForgetPattern { pattern_id } => {
                project.forget_pattern(pattern_id)?;
            }
        }

        Ok(())
    }

    /// Validate without applying
    pub fn validate(&self, project: &Project) -> Result<(), MutationError> {
        match self {
            Mutation::ImportElement { element } => {
                let mut ids = element.ids().into_iter();
                if let Some(existing) = ids.find(|id| project.contains_element(id)) {
                    return Err(ModelError::DuplicateId(existing.to_string()).into());
                }
                Ok(())
            }

            Mutation::ForgetElement { element_id } => {
                Self::require_element(project, element_id)?;
                if project.is_placed(element_id) {
                    return Err(ModelError::AlreadyPlaced(element_id.clone()).into());
                }
                Ok(())
            }

            Mutation::PlaceElement { element_id, parent_id, .. } => {
                Self::require_element(project, element_id)?;
                Self::require_element(project, parent_id)?;

                if project.is_placed(element_id) {
                    return Err(ModelError::AlreadyPlaced(element_id.clone()).into());
                }
                if !project.accepts_children(parent_id) {
                    return Err(ModelError::RejectsChildren(parent_id.clone()).into());
                }
                if project.is_within(parent_id, element_id) {
                    return Err(ModelError::CycleDetected.into());
                }
                Ok(())
            }

            Mutation::DetachElement { element_id } => {
                Self::require_element(project, element_id)?;
                if project.position_of(element_id).is_none() {
                    return Err(ModelError::NotPlaced(element_id.clone()).into());
                }
                Ok(())
            }

            Mutation::AddPage { page, .. } => {
                if project.page_by_id(&page.id).is_some() {
                    return Err(ModelError::DuplicateId(page.id.to_string()).into());
                }
                Self::validate(&Mutation::ImportElement { element: page.root.clone() }, project)
            }

            Mutation::RemovePage { page_id } | Mutation::MovePage { page_id, .. } => {
                Self::require_page(project, page_id)
            }

            Mutation::ImportPattern { pattern } => {
                if project.has_pattern(&pattern.id) {
                    return Err(ModelError::DuplicateId(pattern.id.to_string()).into());
                }
                Ok(())
            }

            Mutation::ForgetPattern { pattern_id } => {
                if !project.has_pattern(pattern_id) {
                    return Err(ModelError::PatternNotFound(pattern_id.clone()).into());
                }
                Ok(())
            }
        }
    }

    /// Create the inverse mutation for undo (call before applying)
    pub fn to_inverse(&self, project: &Project) -> Result<Mutation, MutationError> {
        match self {
            Mutation::ImportElement { element } => Ok(Mutation::ForgetElement {
                element_id: element.id.clone(),
            }),

            Mutation::ForgetElement { element_id } => {
                let element = project
                    .element_tree(element_id)
                    .ok_or_else(|| ModelError::ElementNotFound(element_id.clone()))?;
                Ok(Mutation::ImportElement { element })
            }

            Mutation::PlaceElement { element_id, .. } => Ok(Mutation::DetachElement {
                element_id: element_id.clone(),
            }),

            Mutation::DetachElement { element_id } => {
                let (parent_id, index) = project
                    .position_of(element_id)
                    .ok_or_else(|| ModelError::NotPlaced(element_id.clone()))?;
                Ok(Mutation::PlaceElement {
                    element_id: element_id.clone(),
                    parent_id,
                    index,
                })
            }

            Mutation::AddPage { page, .. } => Ok(Mutation::RemovePage {
                page_id: page.id.clone(),
            }),

            Mutation::RemovePage { page_id } => {
                let index = project
                    .page_index(page_id)
                    .ok_or_else(|| ModelError::PageNotFound(page_id.clone()))?;
                let page = project
                    .page_tree(page_id)
                    .ok_or_else(|| ModelError::PageNotFound(page_id.clone()))?;
                Ok(Mutation::AddPage { page, index })
            }

            Mutation::MovePage { page_id, .. } => {
                let index = project
                    .page_index(page_id)
                    .ok_or_else(|| ModelError::PageNotFound(page_id.clone()))?;
                Ok(Mutation::MovePage {
                    page_id: page_id.clone(),
                    index,
                })
            }

            Mutation::ImportPattern { pattern } => Ok(Mutation::ForgetPattern {
                pattern_id: pattern.id.clone(),
            }),

            Mutation::ForgetPattern { pattern_id } => {
                let pattern = project
                    .pattern(pattern_id)
                    .cloned()
                    .ok_or_else(|| ModelError::PatternNotFound(pattern_id.clone()))?;
                Ok(Mutation::ImportPattern { pattern })
            }
        }
    }

    /// Get a debug name for this mutation
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::ImportElement { .. } => "import_element",
            Mutation::ForgetElement { .. } => "forget_element",
            Mutation::PlaceElement { .. } => "place_element",
            Mutation::DetachElement { .. } => "detach_element",
            Mutation::AddPage { .. } => "add_page",
            Mutation::RemovePage { .. } => "remove_page",
            Mutation::MovePage { .. } => "move_page",
            Mutation::ImportPattern { .. } => "import_pattern",
            Mutation::ForgetPattern { .. } => "forget_pattern",
        }
    }

    fn require_element(project: &Project, id: &ElementId) -> Result<(), MutationError> {
        if project.contains_element(id) {
            Ok(())
        } else {
            Err(ModelError::ElementNotFound(id.clone()).into())
        }
    }

    fn require_page(project: &Project, id: &PageId) -> Result<(), MutationError> {
        if project.page_by_id(id).is_some() {
            Ok(())
        } else {
            Err(ModelError::PageNotFound(id.clone()).into())
        }
    }
}
