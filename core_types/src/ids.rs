//! Unique identifiers for editor and project entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Key of a node inside a document arena
///
/// Keys are allocated by the arena and never reused within one document,
/// so a stale key fails lookup instead of aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey(u64);

impl NodeKey {
    /// Key of the document root in every arena
    pub const ROOT: NodeKey = NodeKey(0);

    /// Creates a node key from its raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Returns the key following this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Identifier of a listener registered with an editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener:{}", self.0)
    }
}

/// Backend identifier of a project
///
/// The backend owns allocation; the client only round-trips the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(i64);

impl ProjectId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// Identifier of a committed editor update transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random transaction ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_key_next() {
        let key = NodeKey::ROOT;
        assert_eq!(key.next().as_raw(), 1);
        assert!(key < key.next());
    }

    #[test]
    fn test_node_key_display() {
        assert_eq!(format!("{}", NodeKey::from_raw(7)), "node:7");
    }

    #[test]
    fn test_project_id_is_transparent_in_json() {
        let id = ProjectId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ProjectId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_project_id_from_str() {
        assert_eq!(" 12 ".parse::<ProjectId>().unwrap(), ProjectId::new(12));
        assert!("abc".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_transaction_id_creation() {
        let id1 = TransactionId::new();
        let id2 = TransactionId::new();
        assert_ne!(id1, id2);
        assert!(format!("{}", id1).starts_with("Txn("));
    }
}
