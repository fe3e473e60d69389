//! The AST node record and its sibling-list tree operations.
//!
//! A fixed-layout node: a 128-byte, 128-byte-aligned `struct` with the same
//! 64-byte "hot" prefix ordering a pointer-addressed design would use, but
//! addressed by [`NodeId`] into an arena-owned `Vec<Node>` instead of by
//! pointer, so a `Node` carries no lifetime and the tree is trivially
//! `Copy`-movable. See `NodeArena` for the owning side.

use crate::ast::context::NodeContext;
use crate::ast::node_types::{DataType, NodeFlags, NodeType, SemanticFlags};

/// Index of a node within its owning [`crate::ast::arena::NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A view into arena-owned UTF-8 text: `(offset, len)` into the arena's
/// single text buffer. Resolved to `&str` via
/// [`crate::ast::arena::NodeArena::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRef {
    pub offset: u32,
    pub len: u32,
}

impl TextRef {
    pub const EMPTY: TextRef = TextRef { offset: 0, len: 0 };

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// One AST node. Plain data, no lifetime, `Copy`: tree links are
/// `Option<NodeId>` rather than pointers, and all three text fields are
/// [`TextRef`]s into the arena's text buffer.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub node_type: NodeType,
    pub flags: NodeFlags,
    pub child_count: u16,
    pub node_id: u32,
    pub source_start: u32,
    pub source_end: u32,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub primary_text: TextRef,
    pub data_type: DataType,
    pub precedence: u8,
    pub semantic_flags: SemanticFlags,
    pub hash_cache: u32,
    pub schema_name: TextRef,
    pub catalog_name: TextRef,
    pub context: NodeContext,
}

impl Node {
    /// A freshly zeroed node of the given type and id: no links, no text,
    /// no flags. Callers fill in whatever the production needs.
    pub fn new(node_type: NodeType, node_id: u32) -> Self {
        Self {
            node_type,
            flags: NodeFlags::NONE,
            child_count: 0,
            node_id,
            source_start: 0,
            source_end: 0,
            parent: None,
            first_child: None,
            next_sibling: None,
            primary_text: TextRef::EMPTY,
            data_type: DataType::Unknown,
            precedence: 0,
            semantic_flags: SemanticFlags::default(),
            hash_cache: 0,
            schema_name: TextRef::EMPTY,
            catalog_name: TextRef::EMPTY,
            context: NodeContext::default(),
        }
    }

    pub fn qualified_name_parts(&self) -> (Option<TextRef>, Option<TextRef>, TextRef) {
        let catalog = (!self.catalog_name.is_empty()).then_some(self.catalog_name);
        let schema = (!self.schema_name.is_empty() && !self.flags.contains(NodeFlags::HAS_ALIAS))
            .then_some(self.schema_name);
        (catalog, schema, self.primary_text)
    }
}
