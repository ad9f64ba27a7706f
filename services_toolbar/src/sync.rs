//! Keeps toolbar state in step with an editor

use std::cell::RefCell;
use std::rc::Rc;

use editor_core::{Command, CommandKind, CommandPriority, Editor, ReadTxn, Subscription};
use services_logger::{LogEntry, SharedLogger};

use crate::state::{project_selection, SyncError, ToolbarState};

const LOG_SOURCE: &str = "toolbar";

/// Observer that owns the toolbar state
///
/// Listens for committed updates, selection changes and undo/redo
/// availability. Dropping it (or calling [`detach`](Self::detach)) removes
/// every listener it registered.
pub struct ToolbarSynchronizer {
    state: Rc<RefCell<ToolbarState>>,
    subscriptions: Vec<Subscription>,
}

impl ToolbarSynchronizer {
    /// Registers on `editor` and derives an initial state
    pub fn attach(editor: &Editor, logger: SharedLogger) -> Self {
        let state = Rc::new(RefCell::new(ToolbarState {
            can_undo: editor.can_undo(),
            can_redo: editor.can_redo(),
            ..ToolbarState::default()
        }));
        editor.read(|view| refresh(&state, view, &logger));

        let mut subscriptions = Vec::with_capacity(4);

        let (s, l) = (Rc::clone(&state), logger.clone());
        subscriptions.push(editor.register_update(move |_, view| refresh(&s, view, &l)));

        let (s, l) = (Rc::clone(&state), logger.clone());
        subscriptions.push(editor.register_command(
            CommandKind::SelectionChange,
            CommandPriority::Low,
            move |_, view| {
                refresh(&s, view, &l);
                false
            },
        ));

        let (s, l) = (Rc::clone(&state), logger.clone());
        subscriptions.push(editor.register_command(
            CommandKind::CanUndo,
            CommandPriority::Low,
            move |command, _| {
                if let Command::CanUndo(available) = command {
                    s.borrow_mut().can_undo = *available;
                    l.log(LogEntry::debug("Undo availability changed")
                        .with_source(LOG_SOURCE)
                        .with_field("can_undo", available));
                }
                false
            },
        ));

        let (s, l) = (Rc::clone(&state), logger);
        subscriptions.push(editor.register_command(
            CommandKind::CanRedo,
            CommandPriority::Low,
            move |command, _| {
                if let Command::CanRedo(available) = command {
                    s.borrow_mut().can_redo = *available;
                    l.log(LogEntry::debug("Redo availability changed")
                        .with_source(LOG_SOURCE)
                        .with_field("can_redo", available));
                }
                false
            },
        ));

        Self {
            state,
            subscriptions,
        }
    }

    /// Current toolbar state
    pub fn state(&self) -> ToolbarState {
        *self.state.borrow()
    }

    /// True while every listener is still registered
    pub fn is_attached(&self) -> bool {
        self.subscriptions.iter().all(Subscription::is_active)
    }

    /// Unregisters from the editor, returning the last state
    pub fn detach(self) -> ToolbarState {
        self.state()
    }
}

fn refresh(state: &RefCell<ToolbarState>, view: &ReadTxn<'_>, logger: &SharedLogger) {
    match project_selection(view) {
        Ok(None) => {}
        Ok(Some(flags)) => {
            let next = state.borrow().with_selection(flags);
            *state.borrow_mut() = next;
            logger.log(
                LogEntry::debug("Toolbar updated")
                    .with_source(LOG_SOURCE)
                    .with_field("bold", next.bold)
                    .with_field("italic", next.italic)
                    .with_field("underline", next.underline)
                    .with_field("strikethrough", next.strikethrough)
                    .with_field("block_type", next.block_type.as_str())
                    .with_field("is_bullet_list", next.is_bullet_list)
                    .with_field("is_numbered_list", next.is_numbered_list)
                    .with_field("is_quote", next.is_quote)
                    .with_field("is_code", next.is_code)
                    .with_field("is_link", next.is_link),
            );
        }
        Err(SyncError::NoTopLevelBlock(node)) => {
            logger.log(
                LogEntry::warn("No top-level element found for anchor node")
                    .with_source(LOG_SOURCE)
                    .with_field("node", node),
            );
        }
        Err(err) => {
            logger.log(
                LogEntry::warn("Toolbar update skipped")
                    .with_source(LOG_SOURCE)
                    .with_field("error", err),
            );
        }
    }
}
