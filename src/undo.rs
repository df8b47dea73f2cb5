use crate::{Diagram, Edit, EditError, EditResult, Repository};
use log::debug;
use std::collections::VecDeque;

/// Undo and redo stacks of one diagram
#[derive(Debug, Clone, Default)]
pub struct UndoManager {
    undo_stack: VecDeque<Edit>,
    redo_stack: Vec<Edit>,

    /// Oldest edits are forgotten beyond this depth; `None` keeps everything
    max_depth: Option<usize>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Record an edit that has already been applied
    pub fn post_edit(&mut self, edit: Edit) {
        debug!(edit = edit.description(); "edit posted");
        self.undo_stack.push_back(edit);
        self.redo_stack.clear();

        if let Some(max) = self.max_depth {
            while self.undo_stack.len() > max {
                self.undo_stack.pop_front();
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Revert the most recent edit, returning its description.
    ///
    /// If reverting fails the edit stays on the undo stack.
    pub fn undo(
        &mut self,
        model: &mut Diagram,
        repo: &mut dyn Repository,
    ) -> EditResult<&'static str> {
        let edit = self.undo_stack.pop_back().ok_or(EditError::NothingToUndo)?;
        if let Err(err) = edit.undo(model, repo) {
            self.undo_stack.push_back(edit);
            return Err(err);
        }

        let description = edit.description();
        debug!(edit = description; "edit undone");
        self.redo_stack.push(edit);
        Ok(description)
    }

    /// Re-apply the most recently undone edit
    pub fn redo(
        &mut self,
        model: &mut Diagram,
        repo: &mut dyn Repository,
    ) -> EditResult<&'static str> {
        let edit = self.redo_stack.pop().ok_or(EditError::NothingToRedo)?;
        if let Err(err) = edit.redo(model, repo) {
            self.redo_stack.push(edit);
            return Err(err);
        }

        let description = edit.description();
        debug!(edit = description; "edit redone");
        self.undo_stack.push_back(edit);
        Ok(description)
    }

    /// Label for an "Undo ..." menu entry
    pub fn undo_description(&self) -> Option<&'static str> {
        self.undo_stack.back().map(Edit::description)
    }

    pub fn redo_description(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Edit::description)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
