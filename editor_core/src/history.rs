//! Undo/redo history

use std::collections::VecDeque;

use crate::state::EditorState;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Bounded undo/redo stacks of committed states
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<EditorState>,
    redo_stack: Vec<EditorState>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Records the state that a commit is about to replace
    pub fn record(&mut self, previous: EditorState) {
        self.undo_stack.push_back(previous);
        // New edits invalidate redo
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Steps back; `current` becomes the redo target
    pub fn undo(&mut self, current: &EditorState) -> Option<EditorState> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current.clone());
        Some(previous)
    }

    /// Steps forward; `current` becomes the undo target
    pub fn redo(&mut self, current: &EditorState) -> Option<EditorState> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}
