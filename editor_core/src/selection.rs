//! Selection model

use core_types::NodeKey;
use serde::{Deserialize, Serialize};

use crate::node::TextFormat;
use crate::tree::{DocumentTree, TreeResult};

/// Whether a point's offset counts chars of a text node or children of an
/// element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    Text,
    Element,
}

/// A position in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
    pub kind: PointKind,
}

impl Point {
    pub fn text(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Text,
        }
    }

    pub fn element(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Element,
        }
    }

    /// Compares two points in document order
    pub fn is_before(&self, other: &Point, tree: &DocumentTree) -> TreeResult<bool> {
        if self.key == other.key {
            return Ok(self.offset < other.offset);
        }
        tree.is_before(self.key, other.key)
    }
}

/// A contiguous selection between an anchor and a focus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    /// Format applied to text typed at a collapsed selection
    #[serde(default)]
    pub format: TextFormat,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::NONE,
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// True when the focus precedes the anchor
    pub fn is_backward(&self, tree: &DocumentTree) -> TreeResult<bool> {
        if self.is_collapsed() {
            return Ok(false);
        }
        self.focus.is_before(&self.anchor, tree)
    }

    /// (start, end) in document order
    pub fn ordered(&self, tree: &DocumentTree) -> TreeResult<(Point, Point)> {
        if self.is_backward(tree)? {
            Ok((self.focus, self.anchor))
        } else {
            Ok((self.anchor, self.focus))
        }
    }

    /// Node that stands for the whole selection
    ///
    /// The anchor node when both ends share a node; otherwise the focus node
    /// for a backward selection and the anchor node for a forward one.
    pub fn selected_node(&self, tree: &DocumentTree) -> TreeResult<NodeKey> {
        if self.anchor.key == self.focus.key {
            return Ok(self.anchor.key);
        }
        if self.is_backward(tree)? {
            Ok(self.focus.key)
        } else {
            Ok(self.anchor.key)
        }
    }

    /// Every node touched by the selection, in document order
    ///
    /// Includes the elements between the two ends as well as the leaves.
    /// An element endpoint contributes its whole subtree.
    pub fn nodes(&self, tree: &DocumentTree) -> TreeResult<Vec<NodeKey>> {
        let (start, end) = self.ordered(tree)?;
        let order = tree.preorder(tree.root())?;
        let position = |key: NodeKey| order.iter().position(|k| *k == key);

        let (Some(first), Some(last)) = (position(start.key), position(end.key)) else {
            return Ok(Vec::new());
        };
        let mut last = last;
        if end.kind == PointKind::Element {
            last += tree.preorder(end.key)?.len() - 1;
        }

        Ok(order[first..=last.min(order.len() - 1)].to_vec())
    }

    /// Text nodes carrying at least one selected character
    pub fn selected_text_nodes(&self, tree: &DocumentTree) -> TreeResult<Vec<NodeKey>> {
        let (start, end) = self.ordered(tree)?;
        let mut out = Vec::new();
        for key in self.nodes(tree)? {
            if !tree.kind(key)?.is_text() {
                continue;
            }
            let len = tree.char_len(key)?;
            if key == start.key && start.kind == PointKind::Text && start.offset >= len && len > 0 {
                continue;
            }
            if key == end.key && end.kind == PointKind::Text && end.offset == 0 && key != start.key {
                continue;
            }
            out.push(key);
        }
        Ok(out)
    }

    /// Whether the selection carries `format`
    ///
    /// A collapsed selection reports its pending format. A ranged one
    /// reports the format only if every selected text node has it.
    pub fn has_format(&self, tree: &DocumentTree, format: TextFormat) -> TreeResult<bool> {
        if self.is_collapsed() {
            return Ok(self.format.contains(format));
        }
        let texts = self.selected_text_nodes(tree)?;
        if texts.is_empty() {
            return Ok(self.format.contains(format));
        }
        for key in texts {
            let has = tree
                .kind(key)?
                .text_format()
                .map(|f| f.contains(format))
                .unwrap_or(false);
            if !has {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Rewrites every endpoint that refers to `old` so it refers to `new`
    pub fn remap(&mut self, old: NodeKey, new: NodeKey) {
        for point in [&mut self.anchor, &mut self.focus] {
            if point.key == old {
                point.key = new;
            }
        }
    }
}

/// A set of discrete nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelection {
    pub keys: Vec<NodeKey>,
}

impl NodeSelection {
    pub fn new(keys: Vec<NodeKey>) -> Self {
        Self { keys }
    }
}

/// The editor's selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Range(RangeSelection),
    Node(NodeSelection),
}

impl Selection {
    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Node(_) => None,
        }
    }

    pub fn as_range_mut(&mut self) -> Option<&mut RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Node(_) => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Selection::Range(_))
    }

    /// Keys this selection depends on
    pub fn keys(&self) -> Vec<NodeKey> {
        match self {
            Selection::Range(range) => vec![range.anchor.key, range.focus.key],
            Selection::Node(nodes) => nodes.keys.clone(),
        }
    }
}

impl From<RangeSelection> for Selection {
    fn from(range: RangeSelection) -> Self {
        Selection::Range(range)
    }
}
