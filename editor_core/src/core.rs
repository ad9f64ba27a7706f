//! The editor
//!
//! Owns the committed [`EditorState`], its undo history and its listener
//! table. All reads go through [`Editor::read`] and all writes through
//! [`Editor::update`]; `&mut self` on `update` makes transactions serial.

use core_types::TransactionId;
use thiserror::Error;

use crate::builtin;
use crate::command::{Command, CommandKind, CommandPriority};
use crate::history::{History, DEFAULT_HISTORY_DEPTH};
use crate::listener::{ListenerRegistry, Subscription, UpdatePayload, UpdateTag};
use crate::node::ListTag;
use crate::selection::Selection;
use crate::snapshot::DocumentSnapshot;
use crate::state::EditorState;
use crate::transaction::{ReadTxn, UpdateTxn};
use crate::tree::TreeError;

/// Editor error
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Operation requires a range selection")]
    NoRangeSelection,

    #[error("Update aborted: {0}")]
    Aborted(String),

    #[error("Invalid editor content: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;

/// Rich-text editor instance
pub struct Editor {
    state: EditorState,
    history: History,
    listeners: ListenerRegistry,
    // Last announced availability; flips emit CanUndo/CanRedo.
    can_undo: bool,
    can_redo: bool,
}

impl Editor {
    /// Empty document, default history depth
    pub fn new() -> Self {
        Self::with_state(EditorState::new())
    }

    /// Editor over an existing state
    ///
    /// A selection that does not fit the document is dropped.
    pub fn with_state(mut state: EditorState) -> Self {
        if state.normalize_selection().is_err() {
            state.selection = None;
        }
        Self {
            state,
            history: History::new(DEFAULT_HISTORY_DEPTH),
            listeners: ListenerRegistry::new(),
            can_undo: false,
            can_redo: false,
        }
    }

    /// Sets the number of undo steps kept; clears existing history
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history = History::new(depth);
        self.can_undo = false;
        self.can_redo = false;
        self
    }

    /// Parses `editor_content` JSON into a new editor
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let state: EditorState = serde_json::from_str(json)?;
        Ok(Self::with_state(state))
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Runs `f` against the committed state
    pub fn read<R>(&self, f: impl FnOnce(&ReadTxn<'_>) -> R) -> R {
        f(&ReadTxn::new(&self.state))
    }

    /// Runs `f` against a working copy and commits it if `f` succeeds
    ///
    /// On error nothing is committed, recorded or announced. A commit that
    /// changes neither the tree nor the selection is a no-op.
    pub fn update<R>(
        &mut self,
        f: impl FnOnce(&mut UpdateTxn<'_>) -> EditorResult<R>,
    ) -> EditorResult<R> {
        let mut working = self.state.clone();
        let (result, tree_dirty) = {
            let mut txn = UpdateTxn::new(&mut working);
            let result = f(&mut txn)?;
            let dirty = txn.tree_dirty();
            (result, dirty)
        };
        working.normalize_selection()?;

        let tree_changed = tree_dirty && working.tree != self.state.tree;
        let selection_changed = working.selection != self.state.selection;
        if !tree_changed && !selection_changed {
            return Ok(result);
        }

        let previous = std::mem::replace(&mut self.state, working);
        if tree_changed {
            self.history.record(previous);
        }
        self.after_commit(tree_changed, selection_changed, UpdateTag::Edit);
        Ok(result)
    }

    /// Replaces the whole state; history is cleared
    pub fn load_state(&mut self, mut state: EditorState) -> EditorResult<()> {
        state.normalize_selection()?;
        let previous = std::mem::replace(&mut self.state, state);
        self.history.clear();
        let tree_changed = previous.tree != self.state.tree;
        let selection_changed = previous.selection != self.state.selection;
        self.after_commit(tree_changed, selection_changed, UpdateTag::Load);
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) -> EditorResult<()> {
        self.update(|txn| {
            txn.set_selection(selection);
            Ok(())
        })
    }

    pub fn register_update<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&UpdatePayload, &ReadTxn<'_>) + 'static,
    {
        self.listeners.register_update(callback)
    }

    pub fn register_command<F>(
        &self,
        kind: CommandKind,
        priority: CommandPriority,
        callback: F,
    ) -> Subscription
    where
        F: FnMut(&Command, &ReadTxn<'_>) -> bool + 'static,
    {
        self.listeners.register_command(kind, priority, callback)
    }

    /// Offers `command` to listeners, then falls back to the built-in
    /// behaviour
    ///
    /// Returns whether anything handled the command.
    pub fn dispatch_command(&mut self, command: Command) -> EditorResult<bool> {
        if self.listeners.dispatch(&command, &ReadTxn::new(&self.state)) {
            return Ok(true);
        }
        match command {
            Command::FormatText(format) => {
                self.update(|txn| builtin::format_text(txn, format).map_err(Into::into))
            }
            Command::InsertUnorderedList => {
                self.update(|txn| builtin::insert_list(txn, ListTag::Bullet).map_err(Into::into))
            }
            Command::InsertOrderedList => {
                self.update(|txn| builtin::insert_list(txn, ListTag::Number).map_err(Into::into))
            }
            Command::RemoveList => self.update(|txn| builtin::remove_list(txn).map_err(Into::into)),
            Command::ToggleLink(url) => {
                self.update(|txn| builtin::toggle_link(txn, url.as_deref()).map_err(Into::into))
            }
            Command::Undo => Ok(self.undo()),
            Command::Redo => Ok(self.redo()),
            Command::SelectionChange | Command::CanUndo(_) | Command::CanRedo(_) => Ok(false),
        }
    }

    /// Restores the previous state; false when there is none
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.state) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.state) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, state: EditorState) {
        let previous = std::mem::replace(&mut self.state, state);
        let tree_changed = previous.tree != self.state.tree;
        let selection_changed = previous.selection != self.state.selection;
        self.after_commit(tree_changed, selection_changed, UpdateTag::Historic);
    }

    fn after_commit(&mut self, tree_changed: bool, selection_changed: bool, tag: UpdateTag) {
        let payload = UpdatePayload {
            transaction: TransactionId::new(),
            tree_changed,
            selection_changed,
            tag,
        };
        self.listeners
            .notify_update(&payload, &ReadTxn::new(&self.state));

        self.announce_history();

        if selection_changed {
            self.listeners
                .dispatch(&Command::SelectionChange, &ReadTxn::new(&self.state));
        }
    }

    fn announce_history(&mut self) {
        let can_undo = self.history.can_undo();
        if can_undo != self.can_undo {
            self.can_undo = can_undo;
            self.listeners
                .dispatch(&Command::CanUndo(can_undo), &ReadTxn::new(&self.state));
        }
        let can_redo = self.history.can_redo();
        if can_redo != self.can_redo {
            self.can_redo = can_redo;
            self.listeners
                .dispatch(&Command::CanRedo(can_redo), &ReadTxn::new(&self.state));
        }
    }

    /// Deterministic summary of the current state
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::capture(
            &self.state,
            self.history.undo_depth(),
            self.history.redo_depth(),
        )
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
