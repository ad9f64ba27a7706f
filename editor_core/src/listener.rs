//! Listener registry and subscription handles
//!
//! Listeners are plain closures. Registering one returns a [`Subscription`];
//! dropping that handle removes the listener, so teardown order is the
//! owner's drop order and nothing outlives its component.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use core_types::{ListenerId, TransactionId};

use crate::command::{Command, CommandKind, CommandPriority};
use crate::transaction::ReadTxn;

/// Why an update listener is being called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTag {
    /// A regular update transaction
    Edit,
    /// Undo or redo restored a state
    Historic,
    /// A state was loaded wholesale
    Load,
}

/// What an update listener receives besides the committed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePayload {
    pub transaction: TransactionId,
    pub tree_changed: bool,
    pub selection_changed: bool,
    pub tag: UpdateTag,
}

type UpdateCallback = dyn FnMut(&UpdatePayload, &ReadTxn<'_>);
type CommandCallback = dyn FnMut(&Command, &ReadTxn<'_>) -> bool;

struct CommandEntry {
    id: ListenerId,
    kind: CommandKind,
    priority: CommandPriority,
    callback: Rc<RefCell<Box<CommandCallback>>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    update: Vec<(ListenerId, Rc<RefCell<Box<UpdateCallback>>>)>,
    command: Vec<CommandEntry>,
}

impl Registry {
    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId::from_raw(self.next_id)
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.update.len() + self.command.len();
        self.update.retain(|(k, _)| *k != id);
        self.command.retain(|e| e.id != id);
        before != self.update.len() + self.command.len()
    }
}

/// Shared listener table of one editor
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_update<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&UpdatePayload, &ReadTxn<'_>) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate_id();
        let callback: Box<UpdateCallback> = Box::new(callback);
        inner.update.push((id, Rc::new(RefCell::new(callback))));
        self.subscription(id)
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
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate_id();
        let callback: Box<CommandCallback> = Box::new(callback);
        inner.command.push(CommandEntry {
            id,
            kind,
            priority,
            callback: Rc::new(RefCell::new(callback)),
        });
        self.subscription(id)
    }

    fn subscription(&self, id: ListenerId) -> Subscription {
        Subscription {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    pub fn unregister(&self, id: ListenerId) -> bool {
        self.inner.borrow_mut().remove(id)
    }

    pub fn update_listener_count(&self) -> usize {
        self.inner.borrow().update.len()
    }

    pub fn command_listener_count(&self, kind: CommandKind) -> usize {
        self.inner
            .borrow()
            .command
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Calls every update listener in registration order
    pub(crate) fn notify_update(&self, payload: &UpdatePayload, view: &ReadTxn<'_>) {
        // Snapshot the table so callbacks may drop subscriptions.
        let callbacks: Vec<_> = self
            .inner
            .borrow()
            .update
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            // A listener that is already running is not re-entered.
            if let Ok(mut cb) = callback.try_borrow_mut() {
                (&mut *cb)(payload, view);
            }
        }
    }

    /// Calls command listeners by descending priority until one returns true
    pub(crate) fn dispatch(&self, command: &Command, view: &ReadTxn<'_>) -> bool {
        let kind = command.kind();
        let mut matching: Vec<_> = self
            .inner
            .borrow()
            .command
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.priority, Rc::clone(&e.callback)))
            .collect();
        // Stable: equal priorities keep registration order.
        matching.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, callback) in matching {
            if let Ok(mut cb) = callback.try_borrow_mut() {
                if (&mut *cb)(command, view) {
                    return true;
                }
            }
        }
        false
    }
}

/// Handle to a registered listener
///
/// The listener is removed when the handle is dropped.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// True while both the editor and the listener are alive
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| {
                let r = r.borrow();
                r.update.iter().any(|(k, _)| *k == self.id)
                    || r.command.iter().any(|e| e.id == self.id)
            })
            .unwrap_or(false)
    }

    /// Explicit form of dropping the handle
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.remove(self.id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EditorState;
    use std::cell::Cell;

    fn view_of(state: &EditorState) -> ReadTxn<'_> {
        ReadTxn::new(state)
    }

    #[test]
    fn test_dispatch_by_priority_and_stop_on_handled() {
        let registry = ListenerRegistry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        let _low = registry.register_command(CommandKind::Undo, CommandPriority::Low, move |_, _| {
            o.borrow_mut().push("low");
            false
        });
        let o = Rc::clone(&order);
        let _high = registry.register_command(CommandKind::Undo, CommandPriority::High, move |_, _| {
            o.borrow_mut().push("high");
            true
        });

        let state = EditorState::new();
        assert!(registry.dispatch(&Command::Undo, &view_of(&state)));
        assert_eq!(*order.borrow(), vec!["high"]);
    }

    #[test]
    fn test_unhandled_dispatch_returns_false() {
        let registry = ListenerRegistry::new();
        let _sub = registry.register_command(
            CommandKind::SelectionChange,
            CommandPriority::Low,
            |_, _| false,
        );
        let state = EditorState::new();
        assert!(!registry.dispatch(&Command::SelectionChange, &view_of(&state)));
        assert!(!registry.dispatch(&Command::Redo, &view_of(&state)));
    }

    #[test]
    fn test_drop_unregisters() {
        let registry = ListenerRegistry::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = registry.register_update(move |_, _| h.set(h.get() + 1));
        assert!(sub.is_active());
        assert_eq!(registry.update_listener_count(), 1);

        let state = EditorState::new();
        let payload = UpdatePayload {
            transaction: TransactionId::new(),
            tree_changed: true,
            selection_changed: false,
            tag: UpdateTag::Edit,
        };
        registry.notify_update(&payload, &view_of(&state));
        assert_eq!(hits.get(), 1);

        sub.unsubscribe();
        assert_eq!(registry.update_listener_count(), 0);
        registry.notify_update(&payload, &view_of(&state));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_registry_is_inert() {
        let registry = ListenerRegistry::new();
        let sub = registry.register_update(|_, _| {});
        drop(registry);
        assert!(!sub.is_active());
        drop(sub);
    }
}
