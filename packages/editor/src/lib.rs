//! # Pagecraft Editor
//!
//! Edit-command handling for Pagecraft projects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: keystrokes, menus, clipboard → JSON   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ dispatcher: Command + FocusSnapshot         │
//! │  - Focused-input guard                      │
//! │  - Route by focused item type               │
//! │  - Paste: materialize → clone → import      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: Project + UndoStack                  │
//! │  - Structural edits as Mutations            │
//! │  - Batches commit as one undo entry         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Silent no-ops**: unresolved targets and rejected edits change nothing
//! 2. **Guards first**: every check runs before the first mutation
//! 3. **One commit, one undo step**: history moves a whole batch at a time
//! 4. **Explicit context**: focus and source projects are passed in, never polled
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{EditMessageHandler, EditorConfig};
//! use pagecraft_model::ProjectSnapshot;
//!
//! let snapshot = ProjectSnapshot::from_json(&json)?;
//! let mut handler = EditMessageHandler::open(&snapshot, EditorConfig::load(".")?)?;
//!
//! handler.handle_json(r#"{ "type": "DeleteElement", "payload": "a1b2c3-4" }"#)?;
//! handler.handle_json(r#"{ "type": "Undo" }"#)?;
//! ```

mod command;
mod config;
mod dispatcher;
mod errors;
mod focus;
mod mutations;
mod store;
mod undo_stack;

pub use command::{Command, ElementTargetType, PasteElementPayload, PastePagePayload};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use dispatcher::{dispatch, DispatchOutcome, EditMessageHandler, NoopReason};
pub use errors::EditorError;
pub use focus::{FocusSnapshot, ItemType};
pub use mutations::{Mutation, MutationError};
pub use store::Store;
pub use undo_stack::{MutationBatch, UndoStack};
