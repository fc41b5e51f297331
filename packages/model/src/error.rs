//! Error types for the document model

use crate::ids::{ElementId, PageId, PatternId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Pattern not found: {0}")]
    PatternNotFound(PatternId),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Element is already placed: {0}")]
    AlreadyPlaced(ElementId),

    #[error("Element is not placed: {0}")]
    NotPlaced(ElementId),

    #[error("Element is the root of a page: {0}")]
    PageRoot(ElementId),

    #[error("Element does not accept children: {0}")]
    RejectsChildren(ElementId),

    #[error("Would create cycle")]
    CycleDetected,
}
