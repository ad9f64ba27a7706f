//! Committed editor state and document builders

use core_types::NodeKey;
use serde::{Deserialize, Serialize};

use crate::node::{HeadingTag, ListTag, NodeKind, TextFormat};
use crate::selection::{PointKind, Selection};
use crate::tree::{DocumentTree, TreeError, TreeResult};

/// Document plus selection
///
/// This is the unit that transactions copy, history stores and the project
/// backend persists as `editor_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub(crate) tree: DocumentTree,
    #[serde(default)]
    pub(crate) selection: Option<Selection>,
}

impl EditorState {
    /// Empty document with no selection
    pub fn new() -> Self {
        Self {
            tree: DocumentTree::new(),
            selection: None,
        }
    }

    /// Builds a document from block descriptions
    pub fn from_blocks(blocks: &[BlockSpec]) -> Self {
        let mut tree = DocumentTree::new();
        for block in blocks {
            block.build(&mut tree);
        }
        Self {
            tree,
            selection: None,
        }
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Checks that the selection refers to attached nodes and clamps its
    /// offsets to the nodes' sizes
    pub(crate) fn normalize_selection(&mut self) -> TreeResult<()> {
        let Some(selection) = self.selection.as_mut() else {
            return Ok(());
        };
        for key in selection.keys() {
            if !self.tree.is_attached(key) {
                return Err(TreeError::Detached(key));
            }
        }
        if let Selection::Range(range) = selection {
            for point in [&mut range.anchor, &mut range.focus] {
                let node = self.tree.get(point.key)?;
                point.kind = if node.kind().is_text() {
                    PointKind::Text
                } else {
                    PointKind::Element
                };
                point.offset = point.offset.min(node.size());
            }
        }
        Ok(())
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative description of a top-level block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSpec {
    Paragraph(Vec<(String, TextFormat)>),
    Heading(HeadingTag, String),
    Quote(String),
    Code(String),
    List(ListTag, Vec<String>),
}

impl BlockSpec {
    /// Paragraph holding one unformatted text node
    pub fn paragraph(text: impl Into<String>) -> Self {
        BlockSpec::Paragraph(vec![(text.into(), TextFormat::NONE)])
    }

    /// Paragraph holding one text node per run
    pub fn runs<S: Into<String>>(runs: impl IntoIterator<Item = (S, TextFormat)>) -> Self {
        BlockSpec::Paragraph(runs.into_iter().map(|(t, f)| (t.into(), f)).collect())
    }

    pub fn heading(tag: HeadingTag, text: impl Into<String>) -> Self {
        BlockSpec::Heading(tag, text.into())
    }

    pub fn quote(text: impl Into<String>) -> Self {
        BlockSpec::Quote(text.into())
    }

    pub fn code(text: impl Into<String>) -> Self {
        BlockSpec::Code(text.into())
    }

    pub fn list<S: Into<String>>(tag: ListTag, items: impl IntoIterator<Item = S>) -> Self {
        BlockSpec::List(tag, items.into_iter().map(Into::into).collect())
    }

    fn build(&self, tree: &mut DocumentTree) -> NodeKey {
        let block = match self {
            BlockSpec::Paragraph(runs) => {
                let p = tree.create(NodeKind::Paragraph);
                for (text, format) in runs {
                    let t = tree.create(NodeKind::Text {
                        text: text.clone(),
                        format: *format,
                    });
                    append_new(tree, p, t);
                }
                p
            }
            BlockSpec::Heading(tag, text) => with_text(tree, NodeKind::Heading(*tag), text),
            BlockSpec::Quote(text) => with_text(tree, NodeKind::Quote, text),
            BlockSpec::Code(text) => with_text(tree, NodeKind::code(), text),
            BlockSpec::List(tag, items) => {
                let list = tree.create(NodeKind::List(*tag));
                for item in items {
                    let li = with_text(tree, NodeKind::ListItem, item);
                    append_new(tree, list, li);
                }
                list
            }
        };
        let root = tree.root();
        append_new(tree, root, block);
        block
    }
}

fn with_text(tree: &mut DocumentTree, kind: NodeKind, text: &str) -> NodeKey {
    let element = tree.create(kind);
    if !text.is_empty() {
        let t = tree.create(NodeKind::text(text));
        append_new(tree, element, t);
    }
    element
}

/// Appends a freshly created node; cannot fail for a fresh element parent
fn append_new(tree: &mut DocumentTree, parent: NodeKey, child: NodeKey) {
    if let Err(e) = tree.append(parent, child) {
        debug_assert!(false, "append of fresh node failed: {e}");
    }
}
