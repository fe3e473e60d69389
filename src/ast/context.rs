//! The node's modal `context` payload.
//!
//! The original packs this as a 32-byte union selected once, for the whole
//! parse, by the mode the parser was constructed with. We model the same
//! choice as a two-variant enum rather than a real union: evaluating SQL
//! (filling in constant values, selectivity, cost) is explicitly out of
//! scope here, so `AnalysisContext`'s fields stay at their zero defaults
//! unless a later semantic-analysis pass populates them. In `Debug` mode,
//! `Parser::new_node` stamps each node's `DebugContext::depth` with the
//! parser's current recursion depth at construction time; `subtree_hash`
//! and `visit_count` are left for a future tree-walking pass to fill in.

/// Which payload every node in a parse carries, fixed at
/// [`crate::parser::Parser`] construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserMode {
    #[default]
    Production,
    Debug,
}

/// Slots a later optimizer/analyzer would populate. Left at defaults here;
/// evaluating expressions and estimating selectivity/cost is out of scope
/// for a front-end parser.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalysisContext {
    pub constant_value: i64,
    pub selectivity: f32,
    pub cost: f32,
    pub is_nullable: bool,
}

/// Diagnostics useful while developing the parser itself: tree depth at
/// construction time, a structural hash, and how many times a pass has
/// visited the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugContext {
    pub depth: u16,
    pub subtree_hash: u64,
    pub visit_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeContext {
    Analysis(AnalysisContext),
    Debug(DebugContext),
}

impl Default for NodeContext {
    fn default() -> Self {
        NodeContext::Analysis(AnalysisContext::default())
    }
}

impl NodeContext {
    pub fn for_mode(mode: ParserMode) -> Self {
        match mode {
            ParserMode::Production => NodeContext::Analysis(AnalysisContext::default()),
            ParserMode::Debug => NodeContext::Debug(DebugContext::default()),
        }
    }

    pub fn as_debug_mut(&mut self) -> Option<&mut DebugContext> {
        match self {
            NodeContext::Debug(d) => Some(d),
            NodeContext::Analysis(_) => None,
        }
    }
}
