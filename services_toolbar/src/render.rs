//! Toolbar rendering

use crate::state::{BlockType, ToolbarState};

/// Text rendering of the command bar
///
/// Produces one line suitable for a console or test output. Active items
/// are bracketed; disabled undo/redo render as `-`.
#[derive(Debug, Clone, Copy)]
pub struct ToolbarView {
    separator: &'static str,
}

impl ToolbarView {
    pub fn new() -> Self {
        Self { separator: " | " }
    }

    pub fn with_separator(separator: &'static str) -> Self {
        Self { separator }
    }

    /// Render the toolbar state to a string
    pub fn render(&self, state: &ToolbarState) -> String {
        let history = [
            availability("undo", state.can_undo),
            availability("redo", state.can_redo),
        ]
        .join(" ");

        let formats = [
            item("B", state.bold),
            item("I", state.italic),
            item("U", state.underline),
            item("S", state.strikethrough),
        ]
        .join(" ");

        let lists = [
            item("ul", state.is_bullet_list),
            item("ol", state.is_numbered_list),
        ]
        .join(" ");

        let blocks = [
            item("link", state.is_link),
            item("quote", state.is_quote),
            item("code", state.is_code),
        ]
        .join(" ");

        format!(
            "{history}{sep}<{block}>{sep}{formats}{sep}{lists}{sep}{blocks}",
            block = state.block_type.label(),
            sep = self.separator,
        )
    }

    /// Options of the block selector, the current one bracketed
    pub fn render_block_selector(&self, state: &ToolbarState) -> String {
        BlockType::ALL
            .iter()
            .map(|t| item(t.label(), *t == state.block_type))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl Default for ToolbarView {
    fn default() -> Self {
        Self::new()
    }
}

fn item(label: &str, active: bool) -> String {
    if active {
        format!("[{}]", label)
    } else {
        label.to_string()
    }
}

fn availability(label: &str, enabled: bool) -> String {
    if enabled {
        label.to_string()
    } else {
        "-".to_string()
    }
}
