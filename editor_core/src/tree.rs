//! Arena-backed document tree
//!
//! Every node lives in one map owned by the tree and refers to its parent
//! and children by [`NodeKey`]. Moving a node is a matter of rewriting two
//! link lists; nothing is ever shared or reference counted.

use std::collections::{BTreeMap, BTreeSet};

use core_types::NodeKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{Node, NodeKind, TextFormat};

/// Tree operation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Node is not an element: {0}")]
    NotAnElement(NodeKey),

    #[error("Node is not a text node: {0}")]
    NotText(NodeKey),

    #[error("Node is not attached to the document: {0}")]
    Detached(NodeKey),

    #[error("No top-level element found for {0}")]
    NoTopLevelElement(NodeKey),

    #[error("The root node cannot be moved or removed")]
    CannotMoveRoot,

    #[error("Moving {node} under {parent} would create a cycle")]
    WouldCreateCycle { node: NodeKey, parent: NodeKey },

    #[error("Offset {offset} out of range for {key}")]
    OffsetOutOfRange { key: NodeKey, offset: usize },

    #[error("Malformed document: {0}")]
    Malformed(String),
}

pub type TreeResult<T> = Result<T, TreeError>;

/// The document arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TreeRepr", try_from = "TreeRepr")]
pub struct DocumentTree {
    nodes: BTreeMap<NodeKey, Node>,
    next_key: NodeKey,
}

#[derive(Serialize, Deserialize)]
struct TreeRepr {
    next_key: NodeKey,
    nodes: Vec<Node>,
}

impl From<DocumentTree> for TreeRepr {
    fn from(tree: DocumentTree) -> Self {
        TreeRepr {
            next_key: tree.next_key,
            nodes: tree.nodes.into_values().collect(),
        }
    }
}

impl TryFrom<TreeRepr> for DocumentTree {
    type Error = TreeError;

    fn try_from(repr: TreeRepr) -> Result<Self, Self::Error> {
        let mut nodes = BTreeMap::new();
        for node in repr.nodes {
            if node.key >= repr.next_key {
                return Err(TreeError::Malformed(format!(
                    "{} is not below next key {}",
                    node.key, repr.next_key
                )));
            }
            if nodes.insert(node.key, node).is_some() {
                return Err(TreeError::Malformed("duplicate node key".to_string()));
            }
        }

        match nodes.get(&NodeKey::ROOT) {
            Some(root) if root.kind == NodeKind::Root && root.parent.is_none() => {}
            _ => return Err(TreeError::Malformed("missing root".to_string())),
        }

        for node in nodes.values() {
            if node.kind.is_text() && !node.children.is_empty() {
                return Err(TreeError::Malformed(format!("{} is text with children", node.key)));
            }
            for child in &node.children {
                match nodes.get(child) {
                    Some(c) if c.parent == Some(node.key) => {}
                    _ => {
                        return Err(TreeError::Malformed(format!(
                            "{} lists {} as a child that does not point back",
                            node.key, child
                        )))
                    }
                }
            }
            if let Some(parent) = node.parent {
                let listed = nodes
                    .get(&parent)
                    .map(|p| p.children.contains(&node.key))
                    .unwrap_or(false);
                if !listed {
                    return Err(TreeError::Malformed(format!(
                        "{} claims parent {} which does not list it",
                        node.key, parent
                    )));
                }
            }
        }

        // Every parent chain must end within as many steps as there are nodes.
        let limit = nodes.len();
        for node in nodes.values() {
            let mut listed = BTreeSet::new();
            if let Some(child) = node.children.iter().find(|c| !listed.insert(**c)) {
                return Err(TreeError::Malformed(format!(
                    "{} lists {} more than once",
                    node.key, child
                )));
            }
            let mut current = node.parent;
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if steps > limit {
                    return Err(TreeError::Malformed(format!("{} is part of a parent cycle", node.key)));
                }
                current = nodes.get(&parent).and_then(|p| p.parent);
            }
        }

        Ok(DocumentTree {
            nodes,
            next_key: repr.next_key,
        })
    }
}

impl DocumentTree {
    /// Creates a tree holding only the root
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeKey::ROOT, Node::new(NodeKey::ROOT, NodeKind::Root));
        Self {
            nodes,
            next_key: NodeKey::ROOT.next(),
        }
    }

    pub fn root(&self) -> NodeKey {
        NodeKey::ROOT
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[&NodeKey::ROOT].children.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn get(&self, key: NodeKey) -> TreeResult<&Node> {
        self.nodes.get(&key).ok_or(TreeError::NodeNotFound(key))
    }

    fn get_mut(&mut self, key: NodeKey) -> TreeResult<&mut Node> {
        self.nodes.get_mut(&key).ok_or(TreeError::NodeNotFound(key))
    }

    pub fn kind(&self, key: NodeKey) -> TreeResult<&NodeKind> {
        self.get(key).map(|n| &n.kind)
    }

    pub fn parent(&self, key: NodeKey) -> TreeResult<Option<NodeKey>> {
        self.get(key).map(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> TreeResult<&[NodeKey]> {
        self.get(key).map(|n| n.children.as_slice())
    }

    /// Top-level blocks, in document order
    pub fn blocks(&self) -> &[NodeKey] {
        &self.nodes[&NodeKey::ROOT].children
    }

    /// Allocates a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeKey {
        let key = self.next_key;
        self.next_key = key.next();
        self.nodes.insert(key, Node::new(key, kind));
        key
    }

    /// Replaces a node's kind in place, keeping its links
    pub fn set_kind(&mut self, key: NodeKey, kind: NodeKind) -> TreeResult<()> {
        if key == NodeKey::ROOT {
            return Err(TreeError::CannotMoveRoot);
        }
        let node = self.get_mut(key)?;
        if kind.is_text() && !node.children.is_empty() {
            return Err(TreeError::NotAnElement(key));
        }
        node.kind = kind;
        Ok(())
    }

    pub fn set_text(&mut self, key: NodeKey, new_text: impl Into<String>) -> TreeResult<()> {
        match &mut self.get_mut(key)?.kind {
            NodeKind::Text { text, .. } => {
                *text = new_text.into();
                Ok(())
            }
            _ => Err(TreeError::NotText(key)),
        }
    }

    pub fn set_format(&mut self, key: NodeKey, new_format: TextFormat) -> TreeResult<()> {
        match &mut self.get_mut(key)?.kind {
            NodeKind::Text { format, .. } => {
                *format = new_format;
                Ok(())
            }
            _ => Err(TreeError::NotText(key)),
        }
    }

    pub fn set_link_url(&mut self, key: NodeKey, new_url: impl Into<String>) -> TreeResult<()> {
        match &mut self.get_mut(key)?.kind {
            NodeKind::Link { url } => {
                *url = new_url.into();
                Ok(())
            }
            _ => Err(TreeError::NotAnElement(key)),
        }
    }

    pub fn index_in_parent(&self, key: NodeKey) -> TreeResult<Option<usize>> {
        let Some(parent) = self.parent(key)? else {
            return Ok(None);
        };
        Ok(self.children(parent)?.iter().position(|k| *k == key))
    }

    /// True if `ancestor` is `key` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(&k).and_then(|n| n.parent);
        }
        false
    }

    pub fn is_attached(&self, key: NodeKey) -> bool {
        self.contains(key) && self.is_ancestor(NodeKey::ROOT, key)
    }

    fn ensure_element(&self, key: NodeKey) -> TreeResult<()> {
        if self.kind(key)?.is_element() {
            Ok(())
        } else {
            Err(TreeError::NotAnElement(key))
        }
    }

    fn ensure_movable(&self, node: NodeKey, new_parent: NodeKey) -> TreeResult<()> {
        self.get(node)?;
        self.get(new_parent)?;
        if node == NodeKey::ROOT {
            return Err(TreeError::CannotMoveRoot);
        }
        if self.is_ancestor(node, new_parent) {
            return Err(TreeError::WouldCreateCycle {
                node,
                parent: new_parent,
            });
        }
        Ok(())
    }

    /// Unlinks a node from its parent; the subtree stays in the arena
    pub fn detach(&mut self, key: NodeKey) -> TreeResult<()> {
        if key == NodeKey::ROOT {
            return Err(TreeError::CannotMoveRoot);
        }
        let parent = self.get(key)?.parent;
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|k| *k != key);
        }
        self.get_mut(key)?.parent = None;
        Ok(())
    }

    /// Inserts `child` at `index` under `parent` (clamped to the end)
    pub fn insert_at(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> TreeResult<()> {
        self.ensure_element(parent)?;
        self.ensure_movable(child, parent)?;
        self.detach(child)?;

        let siblings = &mut self.get_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> TreeResult<()> {
        self.insert_at(parent, usize::MAX, child)
    }

    pub fn insert_after(&mut self, sibling: NodeKey, node: NodeKey) -> TreeResult<()> {
        self.insert_beside(sibling, node, 1)
    }

    pub fn insert_before(&mut self, sibling: NodeKey, node: NodeKey) -> TreeResult<()> {
        self.insert_beside(sibling, node, 0)
    }

    fn insert_beside(&mut self, sibling: NodeKey, node: NodeKey, shift: usize) -> TreeResult<()> {
        if sibling == node {
            return Err(TreeError::WouldCreateCycle {
                node,
                parent: sibling,
            });
        }
        let parent = self.parent(sibling)?.ok_or(TreeError::Detached(sibling))?;
        self.ensure_movable(node, parent)?;
        self.detach(node)?;
        let index = self
            .index_in_parent(sibling)?
            .ok_or(TreeError::Detached(sibling))?;
        self.insert_at(parent, index + shift, node)
    }

    /// Moves every child of `from` to the end of `to`, preserving order
    pub fn move_children(&mut self, from: NodeKey, to: NodeKey) -> TreeResult<()> {
        self.ensure_element(to)?;
        let children = self.children(from)?.to_vec();
        for child in children {
            self.append(to, child)?;
        }
        Ok(())
    }

    /// Detaches a node and drops its whole subtree from the arena
    pub fn remove(&mut self, key: NodeKey) -> TreeResult<()> {
        self.detach(key)?;
        for k in self.preorder(key)? {
            self.nodes.remove(&k);
        }
        Ok(())
    }

    /// Puts `new` into `old`'s slot and drops `old`
    ///
    /// With `include_children` the children of `old` move under `new` first,
    /// in order; otherwise they are dropped together with `old`.
    pub fn replace(&mut self, old: NodeKey, new: NodeKey, include_children: bool) -> TreeResult<()> {
        if old == NodeKey::ROOT || new == NodeKey::ROOT {
            return Err(TreeError::CannotMoveRoot);
        }
        if old == new || self.is_ancestor(new, old) {
            return Err(TreeError::WouldCreateCycle {
                node: new,
                parent: old,
            });
        }
        let parent = self.parent(old)?.ok_or(TreeError::Detached(old))?;
        self.get(new)?;
        self.detach(new)?;

        if include_children {
            self.move_children(old, new)?;
        }

        let index = self
            .index_in_parent(old)?
            .ok_or(TreeError::Detached(old))?;
        self.get_mut(parent)?.children[index] = new;
        self.get_mut(new)?.parent = Some(parent);
        self.get_mut(old)?.parent = None;

        for k in self.preorder(old)? {
            self.nodes.remove(&k);
        }
        Ok(())
    }

    /// Nearest ancestor-or-self whose parent is the root
    pub fn top_level_element(&self, key: NodeKey) -> TreeResult<NodeKey> {
        self.get(key)?;
        let mut current = key;
        loop {
            match self.parent(current)? {
                Some(parent) if parent == NodeKey::ROOT => return Ok(current),
                Some(parent) => current = parent,
                None => return Err(TreeError::NoTopLevelElement(key)),
            }
        }
    }

    /// Nearest ancestor-or-self for which `pred` holds
    pub fn find_ancestor(
        &self,
        key: NodeKey,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.nodes.get(&k)?;
            if pred(&node.kind) {
                return Some(k);
            }
            current = node.parent;
        }
        None
    }

    /// `key` and all its descendants, parents before children
    pub fn preorder(&self, key: NodeKey) -> TreeResult<Vec<NodeKey>> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let node = self.get(k)?;
            out.push(k);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Child indices leading from the root to `key`
    pub fn path(&self, key: NodeKey) -> TreeResult<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = key;
        while current != NodeKey::ROOT {
            let index = self
                .index_in_parent(current)?
                .ok_or(TreeError::Detached(key))?;
            path.push(index);
            current = self.parent(current)?.ok_or(TreeError::Detached(key))?;
        }
        path.reverse();
        Ok(path)
    }

    /// Document order; an ancestor comes before its descendants
    pub fn is_before(&self, a: NodeKey, b: NodeKey) -> TreeResult<bool> {
        Ok(self.path(a)? < self.path(b)?)
    }

    pub fn char_len(&self, key: NodeKey) -> TreeResult<usize> {
        match &self.get(key)?.kind {
            NodeKind::Text { text, .. } => Ok(text.chars().count()),
            _ => Err(TreeError::NotText(key)),
        }
    }

    /// Splits a text node at a char offset
    ///
    /// The node keeps the text before `offset`; a new sibling with the same
    /// format receives the rest and its key is returned.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> TreeResult<NodeKey> {
        let (text, format) = match &self.get(key)?.kind {
            NodeKind::Text { text, format } => (text.clone(), *format),
            _ => return Err(TreeError::NotText(key)),
        };
        let (left, right) = split_at_char(&text, offset).ok_or(TreeError::OffsetOutOfRange { key, offset })?;

        let right_key = self.create(NodeKind::Text {
            text: right.to_string(),
            format,
        });
        self.set_text(key, left.to_string())?;
        self.insert_after(key, right_key)?;
        Ok(right_key)
    }

    /// Concatenated text of a subtree; blocks under the root and items under
    /// a list are separated by newlines
    pub fn text_content(&self, key: NodeKey) -> TreeResult<String> {
        let node = self.get(key)?;
        match &node.kind {
            NodeKind::Text { text, .. } => Ok(text.clone()),
            NodeKind::Root | NodeKind::List(_) => {
                let parts = node
                    .children
                    .iter()
                    .map(|c| self.text_content(*c))
                    .collect::<TreeResult<Vec<_>>>()?;
                Ok(parts.join("\n"))
            }
            _ => node
                .children
                .iter()
                .map(|c| self.text_content(*c))
                .collect::<TreeResult<String>>(),
        }
    }

    pub fn first_text_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        self.preorder(key)
            .ok()?
            .into_iter()
            .find(|k| self.nodes[k].kind.is_text())
    }

    pub fn last_text_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        self.preorder(key)
            .ok()?
            .into_iter()
            .rev()
            .find(|k| self.nodes[k].kind.is_text())
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits at a char offset; `None` when the offset is past the end
pub(crate) fn split_at_char(text: &str, offset: usize) -> Option<(&str, &str)> {
    if offset == 0 {
        return Some(("", text));
    }
    match text.char_indices().nth(offset) {
        Some((byte, _)) => Some(text.split_at(byte)),
        None if text.chars().count() == offset => Some((text, "")),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HeadingTag;

    fn paragraph(tree: &mut DocumentTree, texts: &[&str]) -> (NodeKey, Vec<NodeKey>) {
        let p = tree.create(NodeKind::Paragraph);
        let mut keys = Vec::new();
        for t in texts {
            let k = tree.create(NodeKind::text(*t));
            tree.append(p, k).unwrap();
            keys.push(k);
        }
        tree.append(tree.root(), p).unwrap();
        (p, keys)
    }

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = DocumentTree::new();
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.kind(tree.root()).unwrap(), &NodeKind::Root);
    }

    #[test]
    fn test_append_and_top_level() {
        let mut tree = DocumentTree::new();
        let (p, texts) = paragraph(&mut tree, &["Hello", " world"]);

        assert_eq!(tree.children(p).unwrap(), texts.as_slice());
        assert_eq!(tree.top_level_element(texts[1]).unwrap(), p);
        assert_eq!(tree.top_level_element(p).unwrap(), p);
        assert_eq!(tree.text_content(tree.root()).unwrap(), "Hello world");
    }

    #[test]
    fn test_top_level_of_detached_node_fails() {
        let mut tree = DocumentTree::new();
        let orphan = tree.create(NodeKind::text("x"));
        assert_eq!(
            tree.top_level_element(orphan),
            Err(TreeError::NoTopLevelElement(orphan))
        );
        assert_eq!(
            tree.top_level_element(tree.root()),
            Err(TreeError::NoTopLevelElement(tree.root()))
        );
    }

    #[test]
    fn test_replace_with_children_keeps_order() {
        let mut tree = DocumentTree::new();
        let (p, texts) = paragraph(&mut tree, &["a", "b", "c"]);
        let h = tree.create(NodeKind::Heading(HeadingTag::H1));

        tree.replace(p, h, true).unwrap();

        assert!(!tree.contains(p));
        assert_eq!(tree.blocks(), &[h]);
        assert_eq!(tree.children(h).unwrap(), texts.as_slice());
        for t in &texts {
            assert_eq!(tree.parent(*t).unwrap(), Some(h));
        }
    }

    #[test]
    fn test_replace_without_children_drops_them() {
        let mut tree = DocumentTree::new();
        let (p, texts) = paragraph(&mut tree, &["gone"]);
        let code = tree.create(NodeKind::code());

        tree.replace(p, code, false).unwrap();

        assert!(!tree.contains(texts[0]));
        assert!(tree.children(code).unwrap().is_empty());
    }

    #[test]
    fn test_insert_after_and_before() {
        let mut tree = DocumentTree::new();
        let (p1, _) = paragraph(&mut tree, &["one"]);
        let p2 = tree.create(NodeKind::Paragraph);
        let p0 = tree.create(NodeKind::Paragraph);

        tree.insert_after(p1, p2).unwrap();
        tree.insert_before(p1, p0).unwrap();

        assert_eq!(tree.blocks(), &[p0, p1, p2]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DocumentTree::new();
        let (p, texts) = paragraph(&mut tree, &["x"]);
        let link = tree.create(NodeKind::link("https://a"));
        tree.append(p, link).unwrap();

        assert_eq!(
            tree.append(link, p),
            Err(TreeError::WouldCreateCycle { node: p, parent: link })
        );
        assert_eq!(tree.append(texts[0], link), Err(TreeError::NotAnElement(texts[0])));
        assert_eq!(tree.detach(tree.root()), Err(TreeError::CannotMoveRoot));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = DocumentTree::new();
        let (p, texts) = paragraph(&mut tree, &["a", "b"]);
        tree.remove(p).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(texts[1]));
    }

    #[test]
    fn test_document_order() {
        let mut tree = DocumentTree::new();
        let (p1, t1) = paragraph(&mut tree, &["a", "b"]);
        let (_, t2) = paragraph(&mut tree, &["c"]);

        assert!(tree.is_before(t1[0], t1[1]).unwrap());
        assert!(tree.is_before(t1[1], t2[0]).unwrap());
        assert!(!tree.is_before(t2[0], t1[0]).unwrap());
        assert!(tree.is_before(p1, t1[0]).unwrap());
    }

    #[test]
    fn test_split_text_by_chars() {
        let mut tree = DocumentTree::new();
        let (p, texts) = paragraph(&mut tree, &["héllo"]);
        tree.set_format(texts[0], TextFormat::BOLD).unwrap();

        let right = tree.split_text(texts[0], 2).unwrap();

        assert_eq!(tree.get(texts[0]).unwrap().text(), "hé");
        assert_eq!(tree.get(right).unwrap().text(), "llo");
        assert_eq!(tree.kind(right).unwrap().text_format(), Some(TextFormat::BOLD));
        assert_eq!(tree.children(p).unwrap(), &[texts[0], right]);
        assert_eq!(
            tree.split_text(right, 9),
            Err(TreeError::OffsetOutOfRange { key: right, offset: 9 })
        );
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let mut tree = DocumentTree::new();
        paragraph(&mut tree, &["persist me"]);

        let json = serde_json::to_string(&tree).unwrap();
        let back: DocumentTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);

        let broken = r#"{"next_key":3,"nodes":[{"key":0,"kind":"Root","parent":null,"children":[1]}]}"#;
        assert!(serde_json::from_str::<DocumentTree>(broken).is_err());
    }

    #[test]
    fn test_json_rejects_cycles_and_repeated_children() {
        let self_parent = r#"{"next_key":2,"nodes":[
            {"key":0,"kind":"Root","parent":null,"children":[]},
            {"key":1,"kind":"Paragraph","parent":1,"children":[1]}]}"#;
        let loop_of_two = r#"{"next_key":3,"nodes":[
            {"key":0,"kind":"Root","parent":null,"children":[]},
            {"key":1,"kind":"Paragraph","parent":2,"children":[2]},
            {"key":2,"kind":"Quote","parent":1,"children":[1]}]}"#;
        let repeated = r#"{"next_key":2,"nodes":[
            {"key":0,"kind":"Root","parent":null,"children":[1,1]},
            {"key":1,"kind":"Paragraph","parent":0,"children":[]}]}"#;

        for json in [self_parent, loop_of_two, repeated] {
            let err = serde_json::from_str::<DocumentTree>(json).unwrap_err();
            assert!(err.to_string().contains("Malformed document"), "{}", err);
        }
    }
}
