//! Scoped accessors over editor state
//!
//! [`ReadTxn`] is the only way to look at committed state and
//! [`UpdateTxn`] the only way to change it. Both are handed out by the
//! editor for the duration of a closure.

use core_types::NodeKey;

use crate::node::{HeadingTag, ListTag, Node, NodeKind, TextFormat};
use crate::selection::{Point, PointKind, RangeSelection, Selection};
use crate::state::EditorState;
use crate::tree::{DocumentTree, TreeError, TreeResult};

/// Read-only view of a committed state
pub struct ReadTxn<'a> {
    state: &'a EditorState,
}

impl<'a> ReadTxn<'a> {
    pub(crate) fn new(state: &'a EditorState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &'a EditorState {
        self.state
    }

    pub fn tree(&self) -> &'a DocumentTree {
        &self.state.tree
    }

    pub fn selection(&self) -> Option<&'a Selection> {
        self.state.selection.as_ref()
    }

    /// The selection, if it is a range selection
    pub fn range_selection(&self) -> Option<&'a RangeSelection> {
        self.selection().and_then(Selection::as_range)
    }

    pub fn node(&self, key: NodeKey) -> TreeResult<&'a Node> {
        self.state.tree.get(key)
    }

    /// Key of the `index`-th top-level block
    pub fn block(&self, index: usize) -> Option<NodeKey> {
        self.state.tree.blocks().get(index).copied()
    }

    pub fn text_content(&self) -> String {
        let tree = &self.state.tree;
        tree.text_content(tree.root()).unwrap_or_default()
    }
}

/// Mutable access to the working copy of an update transaction
pub struct UpdateTxn<'a> {
    state: &'a mut EditorState,
    tree_dirty: bool,
    selection_dirty: bool,
}

impl<'a> UpdateTxn<'a> {
    pub(crate) fn new(state: &'a mut EditorState) -> Self {
        Self {
            state,
            tree_dirty: false,
            selection_dirty: false,
        }
    }

    pub(crate) fn tree_dirty(&self) -> bool {
        self.tree_dirty
    }

    pub(crate) fn selection_dirty(&self) -> bool {
        self.selection_dirty
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.state.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.state.selection.as_ref()
    }

    pub fn range_selection(&self) -> Option<&RangeSelection> {
        self.selection().and_then(Selection::as_range)
    }

    pub fn root(&self) -> NodeKey {
        self.state.tree.root()
    }

    fn tree_mut(&mut self) -> &mut DocumentTree {
        self.tree_dirty = true;
        &mut self.state.tree
    }

    // Node construction

    pub fn create(&mut self, kind: NodeKind) -> NodeKey {
        self.tree_mut().create(kind)
    }

    pub fn create_paragraph(&mut self) -> NodeKey {
        self.create(NodeKind::Paragraph)
    }

    pub fn create_heading(&mut self, tag: HeadingTag) -> NodeKey {
        self.create(NodeKind::Heading(tag))
    }

    pub fn create_quote(&mut self) -> NodeKey {
        self.create(NodeKind::Quote)
    }

    pub fn create_code(&mut self) -> NodeKey {
        self.create(NodeKind::code())
    }

    pub fn create_list(&mut self, tag: ListTag) -> NodeKey {
        self.create(NodeKind::List(tag))
    }

    pub fn create_list_item(&mut self) -> NodeKey {
        self.create(NodeKind::ListItem)
    }

    pub fn create_link(&mut self, url: impl Into<String>) -> NodeKey {
        self.create(NodeKind::link(url))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.create(NodeKind::text(text))
    }

    // Tree mutation

    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> TreeResult<()> {
        self.tree_mut().append(parent, child)
    }

    pub fn insert_after(&mut self, sibling: NodeKey, node: NodeKey) -> TreeResult<()> {
        self.tree_mut().insert_after(sibling, node)
    }

    pub fn insert_before(&mut self, sibling: NodeKey, node: NodeKey) -> TreeResult<()> {
        self.tree_mut().insert_before(sibling, node)
    }

    pub fn insert_at(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> TreeResult<()> {
        self.tree_mut().insert_at(parent, index, child)
    }

    pub fn detach(&mut self, key: NodeKey) -> TreeResult<()> {
        self.tree_mut().detach(key)
    }

    pub fn remove(&mut self, key: NodeKey) -> TreeResult<()> {
        self.tree_mut().remove(key)
    }

    pub fn move_children(&mut self, from: NodeKey, to: NodeKey) -> TreeResult<()> {
        self.tree_mut().move_children(from, to)
    }

    /// Splices `new` into `old`'s slot
    ///
    /// Selection endpoints that referred to `old` itself are moved onto
    /// `new` with their offsets unchanged.
    pub fn replace(&mut self, old: NodeKey, new: NodeKey, include_children: bool) -> TreeResult<()> {
        self.tree_mut().replace(old, new, include_children)?;
        self.remap_selection(old, new);
        Ok(())
    }

    pub fn set_kind(&mut self, key: NodeKey, kind: NodeKind) -> TreeResult<()> {
        self.tree_mut().set_kind(key, kind)
    }

    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> TreeResult<()> {
        self.tree_mut().set_text(key, text)
    }

    pub fn set_format(&mut self, key: NodeKey, format: TextFormat) -> TreeResult<()> {
        self.tree_mut().set_format(key, format)
    }

    pub fn set_link_url(&mut self, key: NodeKey, url: impl Into<String>) -> TreeResult<()> {
        self.tree_mut().set_link_url(key, url)
    }

    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> TreeResult<NodeKey> {
        self.tree_mut().split_text(key, offset)
    }

    pub fn top_level_element(&self, key: NodeKey) -> TreeResult<NodeKey> {
        self.state.tree.top_level_element(key)
    }

    // Selection

    /// Sets the selection
    ///
    /// A caret that lands on a new text point takes that node's format as
    /// its pending format. A pending format set on the caret's current
    /// point is kept.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let selection = selection.map(|s| self.with_caret_format(s));
        if self.state.selection != selection {
            self.state.selection = selection;
            self.selection_dirty = true;
        }
    }

    fn with_caret_format(&self, selection: Selection) -> Selection {
        let mut range = match selection {
            Selection::Range(range) if range.is_collapsed() && range.anchor.kind == PointKind::Text => range,
            other => return other,
        };
        let stays = self
            .range_selection()
            .map(|prev| prev.is_collapsed() && prev.anchor == range.anchor)
            .unwrap_or(false);
        if !stays {
            if let Ok(Some(format)) = self.state.tree.kind(range.anchor.key).map(|k| k.text_format()) {
                range.format = format;
            }
        }
        Selection::Range(range)
    }

    /// Moves selection endpoints that refer to `old` onto `new`
    pub fn remap_selection(&mut self, old: NodeKey, new: NodeKey) {
        let Some(Selection::Range(range)) = self.state.selection.as_ref() else {
            return;
        };
        if range.anchor.key != old && range.focus.key != old {
            return;
        }
        let mut range = range.clone();
        range.remap(old, new);
        self.set_selection(Some(Selection::Range(range)));
    }

    /// Selects inside `key` between two offsets
    pub fn select(&mut self, key: NodeKey, anchor_offset: usize, focus_offset: usize) -> TreeResult<()> {
        let kind = if self.state.tree.kind(key)?.is_text() {
            PointKind::Text
        } else {
            PointKind::Element
        };
        let point = |offset| Point {
            key,
            offset,
            kind,
        };
        let format = self.current_format();
        self.set_selection(Some(Selection::Range(
            RangeSelection::new(point(anchor_offset), point(focus_offset)).with_format(format),
        )));
        Ok(())
    }

    /// Collapses the selection at the start of `key`
    pub fn select_start(&mut self, key: NodeKey) -> TreeResult<()> {
        let point = match self.state.tree.first_text_descendant(key) {
            Some(text) => Point::text(text, 0),
            None => {
                self.state.tree.get(key)?;
                Point::element(key, 0)
            }
        };
        self.collapse_at(point);
        Ok(())
    }

    /// Collapses the selection at the end of `key`
    pub fn select_end(&mut self, key: NodeKey) -> TreeResult<()> {
        let point = match self.state.tree.last_text_descendant(key) {
            Some(text) => Point::text(text, self.state.tree.char_len(text)?),
            None => Point::element(key, self.state.tree.children(key)?.len()),
        };
        self.collapse_at(point);
        Ok(())
    }

    fn collapse_at(&mut self, point: Point) {
        self.set_selection(Some(Selection::Range(RangeSelection::collapsed(point))));
    }

    fn current_format(&self) -> TextFormat {
        self.range_selection()
            .map(|r| r.format)
            .unwrap_or(TextFormat::NONE)
    }

    /// Types `text` at a collapsed range selection
    ///
    /// Text inherits the selection's pending format; a format change splits
    /// the current text node. Returns `Ok(false)` when there is no collapsed
    /// range selection.
    pub fn insert_text(&mut self, text: &str) -> TreeResult<bool> {
        let Some(range) = self.range_selection().cloned() else {
            return Ok(false);
        };
        if !range.is_collapsed() || text.is_empty() {
            return Ok(false);
        }
        let point = range.anchor;
        let inserted = text.chars().count();

        let (target, offset) = match point.kind {
            PointKind::Text => {
                let node = self.state.tree.get(point.key)?;
                let same_format = node.kind().text_format() == Some(range.format);
                if same_format {
                    let mut content = node.text().to_string();
                    let byte = content
                        .char_indices()
                        .nth(point.offset)
                        .map(|(i, _)| i)
                        .unwrap_or(content.len());
                    content.insert_str(byte, text);
                    self.set_text(point.key, content)?;
                    (point.key, point.offset + inserted)
                } else {
                    let len = self.state.tree.char_len(point.key)?;
                    let fresh = self.create(NodeKind::Text {
                        text: text.to_string(),
                        format: range.format,
                    });
                    if point.offset == 0 && len > 0 {
                        self.insert_before(point.key, fresh)?;
                    } else {
                        if point.offset < len {
                            self.split_text(point.key, point.offset)?;
                        }
                        self.insert_after(point.key, fresh)?;
                    }
                    (fresh, inserted)
                }
            }
            PointKind::Element => {
                if !self.state.tree.kind(point.key)?.is_element() {
                    return Err(TreeError::NotAnElement(point.key));
                }
                let fresh = self.create(NodeKind::Text {
                    text: text.to_string(),
                    format: range.format,
                });
                self.insert_at(point.key, point.offset, fresh)?;
                (fresh, inserted)
            }
        };

        self.set_selection(Some(Selection::Range(
            RangeSelection::collapsed(Point::text(target, offset)).with_format(range.format),
        )));
        Ok(true)
    }
}
