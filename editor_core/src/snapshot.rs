//! Document snapshot for deterministic comparisons

use serde::{Deserialize, Serialize};

use crate::selection::Selection;
use crate::state::EditorState;

/// One top-level block as seen from outside the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    /// Block type tag (`paragraph`, `h1`, `list`, ...)
    pub kind: String,
    pub text: String,
}

/// Complete document summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub blocks: Vec<BlockSnapshot>,
    pub selection: Option<Selection>,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

impl DocumentSnapshot {
    pub(crate) fn capture(state: &EditorState, undo_depth: usize, redo_depth: usize) -> Self {
        let tree = state.tree();
        let blocks = tree
            .blocks()
            .iter()
            .filter_map(|key| {
                let kind = tree.kind(*key).ok()?.type_name().to_string();
                let text = tree.text_content(*key).ok()?;
                Some(BlockSnapshot { kind, text })
            })
            .collect();
        Self {
            blocks,
            selection: state.selection().cloned(),
            undo_depth,
            redo_depth,
        }
    }

    /// Block type tags in document order
    pub fn kinds(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.kind.as_str()).collect()
    }

    /// Compute a deterministic hash of the snapshot state
    #[cfg(test)]
    pub fn hash(&self) -> u64 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for block in &self.blocks {
            hasher.update(block.kind.as_bytes());
            hasher.update(b":");
            hasher.update(block.text.as_bytes());
            hasher.update(b"\n");
        }
        if let Some(selection) = &self.selection {
            for key in selection.keys() {
                hasher.update(key.as_raw().to_le_bytes());
            }
        }
        hasher.update(self.undo_depth.to_le_bytes());
        hasher.update(self.redo_depth.to_le_bytes());

        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Editor;
    use crate::node::{HeadingTag, ListTag};
    use crate::state::{BlockSpec, EditorState};

    fn sample() -> Editor {
        Editor::with_state(EditorState::from_blocks(&[
            BlockSpec::heading(HeadingTag::H3, "Intro"),
            BlockSpec::list(ListTag::Number, ["one", "two"]),
        ]))
    }

    #[test]
    fn test_snapshot_blocks() {
        let snapshot = sample().snapshot();
        assert_eq!(snapshot.kinds(), vec!["h3", "list"]);
        assert_eq!(snapshot.blocks[1].text, "one\ntwo");
        assert_eq!(snapshot.undo_depth, 0);
    }

    #[test]
    fn test_snapshot_hash_deterministic() {
        let a = sample().snapshot();
        let b = sample().snapshot();
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());

        let mut c = a.clone();
        c.blocks[0].text.push('!');
        assert_ne!(a.hash(), c.hash());
    }
}
