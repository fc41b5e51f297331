//! # Pagecraft Model
//!
//! In-memory document model for the Pagecraft design tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ snapshots: inert serialized pages/elements  │
//! └─────────────────────────────────────────────┘
//!                     ↓ from_snapshot(context)
//! ┌─────────────────────────────────────────────┐
//! │ detached Element / Page trees               │
//! │  - references resolved against a context    │
//! │  - clone_fresh() assigns new identities     │
//! └─────────────────────────────────────────────┘
//!                     ↓ register / attach
//! ┌─────────────────────────────────────────────┐
//! │ Project: pages, element index, focus        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Undo history and command handling live in `pagecraft-editor`.

mod context;
mod element;
mod error;
mod ids;
mod page;
mod pattern;
mod project;
mod snapshot;

pub use context::ProjectContext;
pub use element::{Element, ElementSnapshot};
pub use error::ModelError;
pub use ids::{seed_for, ElementId, IdGenerator, PageId, PatternId, ProjectId};
pub use page::{Page, PageSnapshot};
pub use pattern::Pattern;
pub use project::{ElementNode, FocusState, ItemType, PageRecord, Project};
pub use snapshot::ProjectSnapshot;
