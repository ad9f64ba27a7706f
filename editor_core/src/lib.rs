//! # Editor Core
//!
//! Embedded rich-text engine: an owned document tree, a selection model,
//! scoped transactions, commands and undo history.
//!
//! ## Philosophy
//!
//! - **Explicit access**: state is read through [`Editor::read`] and changed
//!   through [`Editor::update`], never through globals
//! - **Atomic rewrites**: an update works on a copy and commits only on success
//! - **Owned tree**: nodes live in one arena and link by [`NodeKey`]
//! - **Deterministic teardown**: listeners are removed when their
//!   [`Subscription`] is dropped
//!
//! ## Design
//!
//! - `DocumentTree`: arena with parent/child links and structural primitives
//! - `EditorState`: tree plus selection; the unit of history and persistence
//! - `Editor`: transactions, command dispatch, history, listeners
//! - `DocumentSnapshot`: deterministic summary for comparisons

pub mod builtin;
pub mod command;
pub mod core;
pub mod history;
pub mod listener;
pub mod node;
pub mod selection;
pub mod snapshot;
pub mod state;
pub mod transaction;
pub mod tree;

pub use command::{Command, CommandKind, CommandPriority};
pub use self::core::{Editor, EditorError, EditorResult};
pub use core_types::NodeKey;
pub use history::{History, DEFAULT_HISTORY_DEPTH};
pub use listener::{ListenerRegistry, Subscription, UpdatePayload, UpdateTag};
pub use node::{HeadingTag, ListTag, Node, NodeKind, TextFormat, TextFormatType};
pub use selection::{NodeSelection, Point, PointKind, RangeSelection, Selection};
pub use snapshot::{BlockSnapshot, DocumentSnapshot};
pub use state::{BlockSpec, EditorState};
pub use transaction::{ReadTxn, UpdateTxn};
pub use tree::{DocumentTree, TreeError, TreeResult};
