//! The AST node model: a fixed-shape node record held in a sibling-list
//! tree, addressed by index into an arena-owned [`arena::NodeArena`] rather
//! than by pointer.

pub mod arena;
pub mod context;
pub mod node;
pub mod node_types;

pub use arena::NodeArena;
pub use context::{AnalysisContext, DebugContext, NodeContext, ParserMode};
pub use node::{Node, NodeId, TextRef};
pub use node_types::{BinaryOp, DataType, JoinType, NodeFlags, NodeType, NullsOrder, SemanticFlags, SetOp, SortOrder, UnaryOp};
