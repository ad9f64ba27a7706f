//! Toolbar state and its projection from the editor selection

use core_types::NodeKey;
use editor_core::{HeadingTag, ListTag, NodeKind, ReadTxn, TextFormat, TextFormatType, TreeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Block type shown in the block selector
///
/// Every block kind other than a paragraph or h1-h3 heading reports
/// `Paragraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Paragraph,
    H1,
    H2,
    H3,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [BlockType::Paragraph, BlockType::H1, BlockType::H2, BlockType::H3];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::H1 => "h1",
            BlockType::H2 => "h2",
            BlockType::H3 => "h3",
        }
    }

    /// Label of the selector option
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "Paragraph",
            BlockType::H1 => "Heading 1",
            BlockType::H2 => "Heading 2",
            BlockType::H3 => "Heading 3",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        BlockType::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn from_kind(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Heading(HeadingTag::H1) => BlockType::H1,
            NodeKind::Heading(HeadingTag::H2) => BlockType::H2,
            NodeKind::Heading(HeadingTag::H3) => BlockType::H3,
            _ => BlockType::Paragraph,
        }
    }

    /// Node kind of a fresh block of this type
    pub fn node_kind(&self) -> NodeKind {
        match self {
            BlockType::Paragraph => NodeKind::Paragraph,
            BlockType::H1 => NodeKind::Heading(HeadingTag::H1),
            BlockType::H2 => NodeKind::Heading(HeadingTag::H2),
            BlockType::H3 => NodeKind::Heading(HeadingTag::H3),
        }
    }
}

/// Everything the toolbar shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub block_type: BlockType,
    pub is_bullet_list: bool,
    pub is_numbered_list: bool,
    pub is_link: bool,
    pub is_quote: bool,
    pub is_code: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl ToolbarState {
    /// Replaces every selection-derived flag, keeping undo/redo availability
    pub fn with_selection(self, flags: SelectionFlags) -> Self {
        Self {
            bold: flags.bold,
            italic: flags.italic,
            underline: flags.underline,
            strikethrough: flags.strikethrough,
            block_type: flags.block_type,
            is_bullet_list: flags.is_bullet_list,
            is_numbered_list: flags.is_numbered_list,
            is_link: flags.is_link,
            is_quote: flags.is_quote,
            is_code: flags.is_code,
            ..self
        }
    }

    /// Whether the toolbar shows `format` as active
    ///
    /// Code is not a toolbar button and always reports false.
    pub fn is_format_active(&self, format: TextFormatType) -> bool {
        match format {
            TextFormatType::Bold => self.bold,
            TextFormatType::Italic => self.italic,
            TextFormatType::Underline => self.underline,
            TextFormatType::Strikethrough => self.strikethrough,
            TextFormatType::Code => false,
        }
    }
}

/// The part of [`ToolbarState`] derived from a range selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub block_type: BlockType,
    pub is_bullet_list: bool,
    pub is_numbered_list: bool,
    pub is_link: bool,
    pub is_quote: bool,
    pub is_code: bool,
}

/// Why a selection could not be projected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("No top-level element found for anchor node {0}")]
    NoTopLevelBlock(NodeKey),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Derives toolbar flags from the committed selection
///
/// Returns `Ok(None)` when there is no range selection. Reads only.
pub fn project_selection(view: &ReadTxn<'_>) -> Result<Option<SelectionFlags>, SyncError> {
    let Some(range) = view.range_selection() else {
        return Ok(None);
    };
    let tree = view.tree();

    let anchor = range.anchor.key;
    let block = tree
        .top_level_element(anchor)
        .map_err(|_| SyncError::NoTopLevelBlock(anchor))?;
    let block_kind = tree.kind(block)?;

    let selected = range.selected_node(tree)?;
    let selected_is_link = tree.kind(selected)?.is_link();
    let parent_is_link = match tree.parent(selected)? {
        Some(parent) => tree.kind(parent)?.is_link(),
        None => false,
    };

    Ok(Some(SelectionFlags {
        bold: range.has_format(tree, TextFormat::BOLD)?,
        italic: range.has_format(tree, TextFormat::ITALIC)?,
        underline: range.has_format(tree, TextFormat::UNDERLINE)?,
        strikethrough: range.has_format(tree, TextFormat::STRIKETHROUGH)?,
        block_type: BlockType::from_kind(block_kind),
        is_bullet_list: block_kind.list_tag() == Some(ListTag::Bullet),
        is_numbered_list: block_kind.list_tag() == Some(ListTag::Number),
        is_link: selected_is_link || parent_is_link,
        is_quote: matches!(block_kind, NodeKind::Quote),
        is_code: matches!(block_kind, NodeKind::Code { .. }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_core::{BlockSpec, Editor, EditorState, NodeSelection, Point, RangeSelection, Selection};

    fn editor(blocks: &[BlockSpec]) -> Editor {
        Editor::with_state(EditorState::from_blocks(blocks))
    }

    fn text_in(editor: &Editor, block: usize) -> NodeKey {
        editor.read(|view| {
            let b = view.block(block).unwrap();
            view.tree().first_text_descendant(b).unwrap()
        })
    }

    fn select(editor: &mut Editor, anchor: Point, focus: Point) {
        editor
            .set_selection(Some(RangeSelection::new(anchor, focus).into()))
            .unwrap();
    }

    #[test]
    fn test_block_type_mapping() {
        assert_eq!(BlockType::from_kind(&NodeKind::Heading(HeadingTag::H2)), BlockType::H2);
        assert_eq!(BlockType::from_kind(&NodeKind::Quote), BlockType::Paragraph);
        assert_eq!(BlockType::from_kind(&NodeKind::List(ListTag::Bullet)), BlockType::Paragraph);
        assert_eq!(BlockType::parse("h3"), Some(BlockType::H3));
        assert_eq!(BlockType::parse("h4"), None);
    }

    #[test]
    fn test_no_selection_projects_nothing() {
        let editor = editor(&[BlockSpec::paragraph("x")]);
        assert_eq!(editor.read(project_selection), Ok(None));
    }

    #[test]
    fn test_node_selection_projects_nothing() {
        let mut editor = editor(&[BlockSpec::paragraph("x")]);
        let block = editor.read(|view| view.block(0).unwrap());
        editor
            .set_selection(Some(Selection::Node(NodeSelection::new(vec![block]))))
            .unwrap();
        assert_eq!(editor.read(project_selection), Ok(None));
    }

    #[test]
    fn test_projects_formats_and_block() {
        let mut editor = editor(&[BlockSpec::runs([
            ("bold", TextFormat::BOLD.with(TextFormat::UNDERLINE)),
        ])]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 0), Point::text(t, 4));

        let flags = editor.read(project_selection).unwrap().unwrap();
        assert!(flags.bold);
        assert!(flags.underline);
        assert!(!flags.italic);
        assert_eq!(flags.block_type, BlockType::Paragraph);
        assert!(!flags.is_link);
    }

    #[test]
    fn test_projects_lists_quotes_and_code() {
        let mut editor = editor(&[
            BlockSpec::list(ListTag::Number, ["item"]),
            BlockSpec::quote("said"),
            BlockSpec::code("let x = 1;"),
        ]);

        for (index, check) in [
            (0, SelectionFlags { is_numbered_list: true, ..Default::default() }),
            (1, SelectionFlags { is_quote: true, ..Default::default() }),
            (2, SelectionFlags { is_code: true, ..Default::default() }),
        ] {
            let t = text_in(&editor, index);
            select(&mut editor, Point::text(t, 1), Point::text(t, 1));
            let flags = editor.read(project_selection).unwrap().unwrap();
            assert_eq!(flags, check);
        }
    }

    #[test]
    fn test_link_detected_through_parent() {
        let mut editor = editor(&[BlockSpec::paragraph("go here")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 3), Point::text(t, 7));
        editor
            .dispatch_command(editor_core::Command::ToggleLink(Some("https://x.test".into())))
            .unwrap();

        let flags = editor.read(project_selection).unwrap().unwrap();
        assert!(flags.is_link);
    }

    #[test]
    fn test_state_serializes_with_lowercase_block_type() {
        let state = ToolbarState {
            bold: true,
            block_type: BlockType::H2,
            is_quote: true,
            can_redo: true,
            ..Default::default()
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["block_type"], "h2");
        assert_eq!(json["bold"], true);

        let back: ToolbarState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);

        for block in BlockType::ALL {
            let name = serde_json::to_string(&block).unwrap();
            assert_eq!(name, format!("\"{}\"", block.as_str()));
        }
        assert!(serde_json::from_str::<BlockType>("\"H1\"").is_err());
    }

    #[test]
    fn test_with_selection_keeps_availability() {
        let state = ToolbarState {
            can_undo: true,
            bold: true,
            ..Default::default()
        };
        let next = state.with_selection(SelectionFlags {
            block_type: BlockType::H1,
            ..Default::default()
        });
        assert!(next.can_undo);
        assert!(!next.bold);
        assert_eq!(next.block_type, BlockType::H1);
    }
}
