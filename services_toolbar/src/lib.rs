//! # Toolbar Service
//!
//! The command bar of the rich-text editor.
//!
//! ## Philosophy
//!
//! - **Projection, not bookkeeping**: toolbar state is recomputed from the
//!   committed selection on every relevant event, never patched
//! - **Fire and forget**: actions dispatch into the editor and read nothing
//!   back; the synchronizer reflects the outcome
//! - **Explicit lifetime**: the synchronizer owns its subscriptions and
//!   detaches when dropped
//! - **Host-provided input**: URL prompts go through a trait, so tests can
//!   script them
//!
//! ## Design
//!
//! - `ToolbarState`: flags shown by the toolbar
//! - `ToolbarSynchronizer`: keeps a `ToolbarState` in step with an editor
//! - `CommandDispatcher`: turns toolbar actions into editor commands and
//!   structural rewrites
//! - `ToolbarView`: one-line text rendering

pub mod commands;
pub mod prompt;
pub mod render;
pub mod state;
pub mod sync;

pub use commands::{CommandDispatcher, DispatchOutcome, ToolbarAction, LINK_PROMPT_MESSAGE};
pub use prompt::{LinePrompt, ScriptedPrompt, UrlPrompt};
pub use render::ToolbarView;
pub use state::{project_selection, BlockType, SelectionFlags, SyncError, ToolbarState};
pub use sync::ToolbarSynchronizer;
