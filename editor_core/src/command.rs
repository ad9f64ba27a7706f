//! Editor commands

use crate::node::TextFormatType;

/// A command dispatched into the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle an inline format on the selection
    FormatText(TextFormatType),
    /// Turn touched blocks into a bulleted list
    InsertUnorderedList,
    /// Turn touched blocks into a numbered list
    InsertOrderedList,
    /// Turn touched lists back into paragraphs
    RemoveList,
    /// Apply a link (`Some(url)`) or remove links (`None`)
    ToggleLink(Option<String>),
    Undo,
    Redo,
    /// Selection moved; emitted by the editor after a commit
    SelectionChange,
    /// Undo availability flipped; emitted by the editor
    CanUndo(bool),
    /// Redo availability flipped; emitted by the editor
    CanRedo(bool),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::FormatText(_) => CommandKind::FormatText,
            Command::InsertUnorderedList => CommandKind::InsertUnorderedList,
            Command::InsertOrderedList => CommandKind::InsertOrderedList,
            Command::RemoveList => CommandKind::RemoveList,
            Command::ToggleLink(_) => CommandKind::ToggleLink,
            Command::Undo => CommandKind::Undo,
            Command::Redo => CommandKind::Redo,
            Command::SelectionChange => CommandKind::SelectionChange,
            Command::CanUndo(_) => CommandKind::CanUndo,
            Command::CanRedo(_) => CommandKind::CanRedo,
        }
    }
}

/// Command identifier, used to register listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    FormatText,
    InsertUnorderedList,
    InsertOrderedList,
    RemoveList,
    ToggleLink,
    Undo,
    Redo,
    SelectionChange,
    CanUndo,
    CanRedo,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::FormatText => "FORMAT_TEXT",
            CommandKind::InsertUnorderedList => "INSERT_UNORDERED_LIST",
            CommandKind::InsertOrderedList => "INSERT_ORDERED_LIST",
            CommandKind::RemoveList => "REMOVE_LIST",
            CommandKind::ToggleLink => "TOGGLE_LINK",
            CommandKind::Undo => "UNDO",
            CommandKind::Redo => "REDO",
            CommandKind::SelectionChange => "SELECTION_CHANGE",
            CommandKind::CanUndo => "CAN_UNDO",
            CommandKind::CanRedo => "CAN_REDO",
        }
    }
}

/// Listener priority; higher runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandPriority {
    Editor,
    Low,
    Normal,
    High,
    Critical,
}
