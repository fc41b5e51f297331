//! # Undo/Redo Stack
//!
//! Tracks mutation history and groups structural edits into undo steps.
//!
//! ## Design
//!
//! - Each mutation records its inverse before being applied
//! - Mutations applied while a transaction is pending join it; otherwise
//!   each one becomes its own immediately-committed step
//! - `commit` flushes the pending transaction into exactly one undo entry
//! - Undo applies the inverses and restores the focus captured before the entry
//! - Redo reapplies the mutations and restores the focus captured after it
//! - New entries clear the redo stack
//!
//! ## Batches
//!
//! `start_batch` opens a pending transaction and a buffering scope.
//! `end_batch` closes the scope but leaves the transaction pending, so the
//! edits that follow up to the next `commit` still land in the same entry:
//!
//! ```text
//! start_batch ─ (construction) ─ end_batch ─ import ─ insert ─ commit
//! └───────────────────────── one undo entry ─────────────────────┘
//! ```
//!
//! Opening a batch while one is open is a caller bug and panics.

use crate::{Mutation, MutationError};
use pagecraft_model::{FocusState, Project};
use tracing::debug;

/// A group of mutations that should be undone/redone together
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// The mutations in this batch (in application order)
    pub mutations: Vec<Mutation>,

    /// The inverse mutations (in reverse order for undo)
    pub inverses: Vec<Mutation>,

    /// Focus to restore when this batch is undone
    pub focus_before: FocusState,

    /// Focus to restore when this batch is redone
    pub focus_after: FocusState,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl MutationBatch {
    /// Create an empty batch opened with the given focus
    pub fn empty(focus: FocusState) -> Self {
        Self {
            mutations: Vec::new(),
            inverses: Vec::new(),
            focus_after: focus.clone(),
            focus_before: focus,
            description: None,
        }
    }

    /// Create a single-mutation batch
    pub fn single(
        mutation: Mutation,
        inverse: Mutation,
        focus_before: FocusState,
        focus_after: FocusState,
    ) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            focus_before,
            focus_after,
            description: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Undo/redo stack for project editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stack of applied batches (most recent last)
    undo_stack: Vec<MutationBatch>,

    /// Stack of undone batches (most recent last)
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Transaction collecting mutations until the next commit
    pending: Option<MutationBatch>,

    /// Between start_batch and end_batch
    batch_open: bool,

    /// Focus changes still belong to the latest entry
    focus_open: bool,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            pending: None,
            batch_open: false,
            focus_open: false,
        }
    }

    /// Apply a mutation and record it for undo
    pub fn apply(
        &mut self,
        mutation: &Mutation,
        project: &mut Project,
    ) -> Result<(), MutationError> {
        // Generate inverse before applying
        let inverse = mutation.to_inverse(project)?;
        let focus_before = project.focus_state();

        mutation.apply(project)?;
        debug!(mutation = mutation.name(), "Applied mutation");

        if let Some(batch) = &mut self.pending {
            batch.mutations.push(mutation.clone());
            batch.inverses.insert(0, inverse); // Inverses go in reverse order
        } else {
            let batch = MutationBatch::single(
                mutation.clone(),
                inverse,
                focus_before,
                project.focus_state(),
            );
            self.push_batch(batch);
        }

        Ok(())
    }

    /// Open a batch; panics if one is already open
    pub fn start_batch(&mut self, focus: FocusState) {
        assert!(
            !self.batch_open,
            "start_batch called while a batch is already open"
        );
        self.batch_open = true;
        self.begin(focus);
    }

    /// Close the buffering scope; the transaction stays pending until commit
    pub fn end_batch(&mut self) {
        self.batch_open = false;
    }

    /// Open a pending transaction unless one exists; true if this call opened it
    pub fn begin(&mut self, focus: FocusState) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(MutationBatch::empty(focus));
        true
    }

    /// Flush pending mutations into one undo entry
    ///
    /// Returns false (and records nothing) if nothing was pending.
    pub fn commit(&mut self, focus: FocusState) -> bool {
        let committed = match self.pending.take() {
            Some(mut batch) if !batch.is_empty() => {
                batch.focus_after = focus.clone();
                debug!(
                    mutations = batch.mutations.len(),
                    description = batch.description.as_deref().unwrap_or(""),
                    "Committed undo entry"
                );
                self.push_batch(batch);
                true
            }
            _ => false,
        };

        if self.batch_open {
            self.pending = Some(MutationBatch::empty(focus));
        }

        committed
    }

    /// Number of mutations in the pending transaction
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, |batch| batch.mutations.len())
    }

    /// Revert pending mutations until only `len` remain
    pub fn rollback_to(&mut self, len: usize, project: &mut Project) -> Result<(), MutationError> {
        if let Some(batch) = &mut self.pending {
            while batch.mutations.len() > len {
                batch.mutations.pop();
                let inverse = batch.inverses.remove(0);
                inverse.apply(project)?;
            }
        }
        Ok(())
    }

    /// Revert and drop the pending transaction, closing any open batch
    pub fn discard(&mut self, project: &mut Project) -> Result<(), MutationError> {
        self.batch_open = false;

        if let Some(batch) = self.pending.take() {
            for inverse in &batch.inverses {
                inverse.apply(project)?;
            }
            project.restore_focus(batch.focus_before);
        }
        Ok(())
    }

    /// Set description for the pending transaction (if any)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.pending {
            batch.description = Some(description.into());
        }
    }

    /// Fold a focus change made right after the latest commit into that entry
    ///
    /// Ignored once the entry is sealed, so later unrelated selection
    /// changes never alter what redo restores.
    pub fn note_focus(&mut self, focus: FocusState) {
        if self.pending.is_some() || !self.focus_open {
            return;
        }
        if let Some(batch) = self.undo_stack.last_mut() {
            batch.focus_after = focus;
        }
    }

    /// Stop folding focus changes into the latest entry
    pub fn seal_focus(&mut self) {
        self.focus_open = false;
    }

    /// Push a batch to the undo stack
    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);
        self.focus_open = true;

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates future
        self.redo_stack.clear();
    }

    /// Undo the most recent batch
    pub fn undo(&mut self, project: &mut Project) -> Result<bool, MutationError> {
        self.focus_open = false;
        if let Some(batch) = self.undo_stack.pop() {
            for inverse in &batch.inverses {
                inverse.apply(project)?;
            }
            project.restore_focus(batch.focus_before.clone());

            self.redo_stack.push(batch);
            Ok(true)
        } else {
            Ok(false) // Nothing to undo
        }
    }

    /// Redo the most recently undone batch
    pub fn redo(&mut self, project: &mut Project) -> Result<bool, MutationError> {
        self.focus_open = false;
        if let Some(batch) = self.redo_stack.pop() {
            for mutation in &batch.mutations {
                mutation.apply(project)?;
            }
            project.restore_focus(batch.focus_after.clone());

            self.undo_stack.push(batch);
            Ok(true)
        } else {
            Ok(false) // Nothing to redo
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_batch_open(&self) -> bool {
        self.batch_open
    }

    pub fn has_pending(&self) -> bool {
        self.pending_len() > 0
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
