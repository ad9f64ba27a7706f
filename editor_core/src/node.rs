//! Document node types

use core_types::NodeKey;
use serde::{Deserialize, Serialize};

/// Heading level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingTag {
    H1,
    H2,
    H3,
}

impl HeadingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingTag::H1 => "h1",
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(HeadingTag::H1),
            "h2" => Some(HeadingTag::H2),
            "h3" => Some(HeadingTag::H3),
            _ => None,
        }
    }
}

/// List flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListTag {
    /// Unordered (`ul`)
    Bullet,
    /// Ordered (`ol`)
    Number,
}

impl ListTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListTag::Bullet => "ul",
            ListTag::Number => "ol",
        }
    }
}

/// Set of inline text formats, stored as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFormat {
    bits: u8,
}

impl TextFormat {
    pub const NONE: Self = Self { bits: 0 };
    pub const BOLD: Self = Self { bits: 1 << 0 };
    pub const ITALIC: Self = Self { bits: 1 << 1 };
    pub const UNDERLINE: Self = Self { bits: 1 << 2 };
    pub const STRIKETHROUGH: Self = Self { bits: 1 << 3 };
    pub const CODE: Self = Self { bits: 1 << 4 };

    pub fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn contains(&self, other: TextFormat) -> bool {
        (self.bits & other.bits) == other.bits
    }

    pub fn with(mut self, other: TextFormat) -> Self {
        self.bits |= other.bits;
        self
    }

    pub fn without(mut self, other: TextFormat) -> Self {
        self.bits &= !other.bits;
        self
    }

    pub fn toggle(mut self, other: TextFormat) -> Self {
        self.bits ^= other.bits;
        self
    }
}

/// A single inline format, as carried by format commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextFormatType {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl TextFormatType {
    pub const ALL: [TextFormatType; 5] = [
        TextFormatType::Bold,
        TextFormatType::Italic,
        TextFormatType::Underline,
        TextFormatType::Strikethrough,
        TextFormatType::Code,
    ];

    pub fn flag(&self) -> TextFormat {
        match self {
            TextFormatType::Bold => TextFormat::BOLD,
            TextFormatType::Italic => TextFormat::ITALIC,
            TextFormatType::Underline => TextFormat::UNDERLINE,
            TextFormatType::Strikethrough => TextFormat::STRIKETHROUGH,
            TextFormatType::Code => TextFormat::CODE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextFormatType::Bold => "bold",
            TextFormatType::Italic => "italic",
            TextFormatType::Underline => "underline",
            TextFormatType::Strikethrough => "strikethrough",
            TextFormatType::Code => "code",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading(HeadingTag),
    Quote,
    Code { language: Option<String> },
    List(ListTag),
    ListItem,
    Link { url: String },
    Text { text: String, format: TextFormat },
}

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text {
            text: text.into(),
            format: TextFormat::NONE,
        }
    }

    pub fn code() -> Self {
        NodeKind::Code { language: None }
    }

    pub fn link(url: impl Into<String>) -> Self {
        NodeKind::Link { url: url.into() }
    }

    /// Type tag, as reported to observers
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading(tag) => tag.as_str(),
            NodeKind::Quote => "quote",
            NodeKind::Code { .. } => "code",
            NodeKind::List(_) => "list",
            NodeKind::ListItem => "listitem",
            NodeKind::Link { .. } => "link",
            NodeKind::Text { .. } => "text",
        }
    }

    /// True for every kind that may hold children
    pub fn is_element(&self) -> bool {
        !self.is_text()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    pub fn is_link(&self) -> bool {
        matches!(self, NodeKind::Link { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::List(_))
    }

    pub fn list_tag(&self) -> Option<ListTag> {
        match self {
            NodeKind::List(tag) => Some(*tag),
            _ => None,
        }
    }

    pub fn text_format(&self) -> Option<TextFormat> {
        match self {
            NodeKind::Text { format, .. } => Some(*format),
            _ => None,
        }
    }
}

/// A node in the document arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) key: NodeKey,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    #[serde(default)]
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    pub(crate) fn new(key: NodeKey, kind: NodeKind) -> Self {
        Self {
            key,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Text of a text node; empty for elements
    pub fn text(&self) -> &str {
        match &self.kind {
            NodeKind::Text { text, .. } => text,
            _ => "",
        }
    }

    /// Length in chars (text nodes) or children (elements)
    pub fn size(&self) -> usize {
        match &self.kind {
            NodeKind::Text { text, .. } => text.chars().count(),
            _ => self.children.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_format_toggle() {
        let format = TextFormat::NONE.toggle(TextFormat::BOLD);
        assert!(format.contains(TextFormat::BOLD));
        assert!(!format.contains(TextFormat::ITALIC));

        let format = format.with(TextFormat::ITALIC).toggle(TextFormat::BOLD);
        assert_eq!(format, TextFormat::ITALIC);
        assert!(format.without(TextFormat::ITALIC).is_empty());
    }

    #[test]
    fn test_format_type_parse() {
        assert_eq!(TextFormatType::parse("strikethrough"), Some(TextFormatType::Strikethrough));
        assert_eq!(TextFormatType::parse("blink"), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(NodeKind::Heading(HeadingTag::H2).type_name(), "h2");
        assert_eq!(NodeKind::code().type_name(), "code");
        assert_eq!(NodeKind::List(ListTag::Number).list_tag(), Some(ListTag::Number));
        assert!(NodeKind::text("x").is_text());
        assert!(NodeKind::Quote.is_element());
    }

    #[test]
    fn test_node_size_counts_chars() {
        let node = Node::new(NodeKey::from_raw(1), NodeKind::text("héllo"));
        assert_eq!(node.size(), 5);
        assert_eq!(node.text(), "héllo");
    }
}
