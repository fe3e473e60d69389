//! Hand-written recursive-descent SQL parser.
//!
//! `Parser` owns exactly one [`NodeArena`] and one [`TokenCursor`]; parsing
//! is a pure, single-threaded transformation from a token stream to a tree
//! rooted at the statement's node. There is no shared or global parser
//! state: running two parses concurrently just means constructing two
//! `Parser`s.

mod ddl;
mod dml;
mod expression;
mod select;

use crate::ast::{NodeArena, NodeId, NodeType, ParserMode};
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::token::{lexer, Keyword, Token, TokenCursor, TokenKind};

/// Tuning knobs that don't change the grammar, only its limits.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Recursion bound for statement/expression entries. The sole
    /// defense against stack-exhausting input.
    pub max_depth: u32,
    /// When set, `==`, `===`, and `!==` are rejected with `StrictOperator`
    /// instead of silently ending the expression.
    pub strict_mode: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            strict_mode: false,
        }
    }
}

/// Small enum biasing identifier-vs-column resolution and clause
/// termination; pushed on entry to each clause, popped on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseContext {
    SelectList,
    FromClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    JoinCondition,
    CaseExpression,
    FunctionArg,
    Subquery,
}

impl ParseContext {
    /// The upper-byte tag `SemanticFlags::set_context_tag` stamps onto
    /// `Identifier`/`ColumnRef` nodes built while this context is on top of
    /// the stack. `0` (no context pushed) is reserved for "none".
    pub(crate) fn tag(self) -> u8 {
        match self {
            ParseContext::SelectList => 1,
            ParseContext::FromClause => 2,
            ParseContext::WhereClause => 3,
            ParseContext::GroupByClause => 4,
            ParseContext::HavingClause => 5,
            ParseContext::OrderByClause => 6,
            ParseContext::JoinCondition => 7,
            ParseContext::CaseExpression => 8,
            ParseContext::FunctionArg => 9,
            ParseContext::Subquery => 10,
        }
    }
}

pub struct Parser {
    pub(crate) arena: NodeArena,
    pub(crate) cursor: TokenCursor,
    pub(crate) depth: u32,
    pub(crate) max_depth: u32,
    pub(crate) paren_depth: u32,
    pub(crate) context_stack: Vec<ParseContext>,
    pub(crate) strict_mode: bool,
    /// Byte offset just past the most recently consumed token. Closes off
    /// `source_end` for whichever node `guarded_spanned` is finishing.
    pub(crate) last_token_end: u32,
    mode: ParserMode,
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_mode(ParserMode::Production)
    }

    pub fn with_mode(mode: ParserMode) -> Self {
        Self::with_config(mode, ParserConfig::default())
    }

    pub fn with_config(mode: ParserMode, config: ParserConfig) -> Self {
        Self {
            arena: NodeArena::new(mode),
            cursor: TokenCursor::new(vec![Token::eof(1, 1)]),
            depth: 0,
            max_depth: config.max_depth,
            paren_depth: 0,
            context_stack: Vec::new(),
            strict_mode: config.strict_mode,
            last_token_end: 0,
            mode,
            config,
        }
    }

    /// Parses exactly one statement, optionally followed by `;`. Tokenizes
    /// `sql` internally with the crate's built-in lexer.
    pub fn parse(&mut self, sql: &str) -> Result<NodeId> {
        let tokens = lexer::tokenize(sql)?;
        self.parse_tokens(tokens)
    }

    /// Parses a pre-tokenized stream, as the production configuration (an
    /// external tokenizer feeding this parser) would.
    pub fn parse_tokens(&mut self, tokens: Vec<Token>) -> Result<NodeId> {
        if tokens.len() <= 1 {
            return Err(self.error_at(ParseErrorKind::EmptyInput, 1, 1));
        }
        self.cursor = TokenCursor::new(tokens);
        self.depth = 0;
        self.paren_depth = 0;
        self.context_stack.clear();
        self.last_token_end = self.current().byte_start;

        let root = self.parse_statement()?;
        self.propagate_spans(root);

        if self.current().is_delimiter(";") {
            self.advance();
        }
        Ok(root)
    }

    /// Clears the arena for reuse. Any `NodeId` obtained from a previous
    /// parse is no longer valid once this returns.
    pub fn reset(&mut self) {
        self.arena.reset();
        self.cursor = TokenCursor::new(vec![Token::eof(1, 1)]);
        self.depth = 0;
        self.paren_depth = 0;
        self.context_stack.clear();
        self.last_token_end = 0;
    }

    pub fn get_memory_used(&self) -> usize {
        self.arena.memory_used()
    }

    pub fn get_node_count(&self) -> usize {
        self.arena.node_count()
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Structural post-conditions independent of any particular statement:
    /// SELECT clause dependents need FROM, every JOIN needs a table child,
    /// non-CROSS joins need a condition.
    pub fn validate_ast(&self, root: NodeId) -> Result<()> {
        self.validate_node(root)
    }

    fn validate_node(&self, id: NodeId) -> Result<()> {
        let node = self.arena.node(id);
        if node.node_type == NodeType::SelectStmt {
            let has_from = self.arena.find_child(id, NodeType::FromClause).is_some();
            for dependent in [
                NodeType::WhereClause,
                NodeType::GroupByClause,
                NodeType::HavingClause,
                NodeType::OrderByClause,
            ] {
                if self.arena.find_child(id, dependent).is_some() && !has_from {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken(format!(
                            "{dependent:?} without FROM"
                        )),
                        0,
                        0,
                    ));
                }
            }
        }
        if node.node_type.is_join() {
            let has_table = self
                .arena
                .children(id)
                .any(|c| self.arena.node(c).node_type.is_reference() || self.arena.node(c).node_type == NodeType::Subquery);
            if !has_table {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken("JOIN without a table".into()),
                    0,
                    0,
                ));
            }
            if node.node_type != NodeType::CrossJoin {
                let has_condition = self.arena.find_child(id, NodeType::WhereClause).is_some()
                    || self.arena.find_child(id, NodeType::UsingClause).is_some()
                    || self.arena.children(id).count() >= 2;
                if !has_condition {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedConstruct("JOIN missing ON or USING".into()),
                        0,
                        0,
                    ));
                }
            }
        }
        for child in self.arena.children(id) {
            self.validate_node(child)?;
        }
        Ok(())
    }

    /// Skips tokens until a semicolon or a statement-introducing keyword.
    /// Not invoked automatically; multi-statement recovery is the caller's
    /// decision.
    pub fn synchronize(&mut self) {
        while !self.at_end() {
            if self.current().is_delimiter(";") {
                self.advance();
                return;
            }
            if matches!(
                self.current().keyword,
                Some(
                    Keyword::Select
                        | Keyword::Insert
                        | Keyword::Update
                        | Keyword::Delete
                        | Keyword::Create
                        | Keyword::Alter
                        | Keyword::Drop
                        | Keyword::With
                )
            ) {
                return;
            }
            self.advance();
        }
    }

    // --- statement dispatch ---

    fn parse_statement(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<NodeId> {
        let tok = self.current().clone();
        tracing::trace!(keyword = ?tok.keyword, text = %tok.text, "dispatching statement");
        match tok.keyword {
            Some(Keyword::Select) => self.parse_select_entry(),
            Some(Keyword::Values) => self.parse_values_stmt(),
            Some(Keyword::With) => self.parse_with_entry(),
            Some(Keyword::Insert) => self.parse_insert(),
            Some(Keyword::Update) => self.parse_update(),
            Some(Keyword::Delete) => self.parse_delete(),
            Some(Keyword::Create) => self.parse_create(),
            Some(Keyword::Drop) => self.parse_drop(),
            Some(Keyword::Alter) => self.parse_alter(),
            Some(Keyword::Truncate) => self.parse_truncate(),
            Some(Keyword::Begin) | Some(Keyword::Start) | Some(Keyword::Commit)
            | Some(Keyword::Rollback) | Some(Keyword::Savepoint) | Some(Keyword::Release) => {
                self.parse_transaction_stmt()
            }
            Some(Keyword::Explain) => self.parse_explain(),
            Some(Keyword::Set) | Some(Keyword::Vacuum) | Some(Keyword::Analyze)
            | Some(Keyword::Attach) | Some(Keyword::Detach) | Some(Keyword::Reindex)
            | Some(Keyword::Pragma) => self.parse_utility_stmt(),
            _ => Err(self.unexpected(&format!("unrecognized leading keyword near '{}'", tok.text))),
        }
    }

    fn parse_explain(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Explain)?;
        let node = self.new_node(NodeType::ExplainStmt);
        let inner = self.parse_statement_inner()?;
        self.add_child(node, inner);
        Ok(node)
    }

    fn parse_transaction_stmt(&mut self) -> Result<NodeId> {
        let kw = self.current().keyword.unwrap();
        let node_type = match kw {
            Keyword::Begin | Keyword::Start => NodeType::BeginStmt,
            Keyword::Commit => NodeType::CommitStmt,
            Keyword::Rollback => NodeType::RollbackStmt,
            Keyword::Savepoint => NodeType::SavepointStmt,
            Keyword::Release => NodeType::ReleaseSavepointStmt,
            _ => unreachable!(),
        };
        self.advance();
        let node = self.new_node(node_type);
        if matches!(kw, Keyword::Begin | Keyword::Start) {
            if self.current().is(Keyword::Transaction) {
                self.advance();
            }
        } else if matches!(kw, Keyword::Savepoint | Keyword::Release) {
            if kw == Keyword::Release && self.current().is(Keyword::Savepoint) {
                self.advance();
            }
            if self.current().kind == TokenKind::Identifier {
                let text = self.intern_current();
                self.set_primary_text(node, text);
                self.advance();
            }
        }
        Ok(node)
    }

    fn parse_utility_stmt(&mut self) -> Result<NodeId> {
        let kw = self.current().keyword.unwrap();
        let node_type = match kw {
            Keyword::Set => NodeType::SetStmt,
            Keyword::Vacuum => NodeType::VacuumStmt,
            Keyword::Analyze => NodeType::AnalyzeStmt,
            Keyword::Attach => NodeType::AttachStmt,
            Keyword::Detach => NodeType::DetachStmt,
            Keyword::Reindex => NodeType::ReindexStmt,
            Keyword::Pragma => NodeType::PragmaStmt,
            _ => unreachable!(),
        };
        let node = self.new_node(node_type);
        // Utility statement bodies beyond the introducing keyword are not
        // interpreted further by this front end; skip to the statement end.
        self.advance();
        while !self.at_end() && !self.current().is_delimiter(";") {
            self.advance();
        }
        Ok(node)
    }

    fn parse_values_stmt(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Values)?;
        let node = self.new_node(NodeType::ValuesStmt);
        loop {
            let row = self.parse_values_row()?;
            self.add_child(node, row);
            if self.current().is_delimiter(",") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(node)
    }

    pub(crate) fn parse_values_row(&mut self) -> Result<NodeId> {
        self.expect_delimiter("(")?;
        let row = self.new_node(NodeType::ValuesClause);
        if !self.current().is_delimiter(")") {
            loop {
                let expr = self.parse_expression(0)?;
                self.add_child(row, expr);
                if self.current().is_delimiter(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_delimiter(")")?;
        Ok(row)
    }

    // --- low-level token helpers shared by the sub-modules ---

    pub(crate) fn current(&self) -> &Token {
        self.cursor.current()
    }

    pub(crate) fn peek(&self) -> &Token {
        self.cursor.peek()
    }

    pub(crate) fn advance(&mut self) -> &Token {
        self.last_token_end = self.current().byte_end;
        self.cursor.advance()
    }

    pub(crate) fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> Result<()> {
        if self.current().is(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {kw:?}")))
        }
    }

    pub(crate) fn expect_delimiter(&mut self, d: &str) -> Result<()> {
        if self.current().is_delimiter(d) {
            if d == "(" {
                self.paren_depth += 1;
            } else if d == ")" {
                self.paren_depth = self.paren_depth.saturating_sub(1);
            }
            self.advance();
            Ok(())
        } else {
            Err(self.unterminated(&format!("expected '{d}'")))
        }
    }

    pub(crate) fn eat_delimiter(&mut self, d: &str) -> bool {
        if self.current().is_delimiter(d) {
            if d == "(" {
                self.paren_depth += 1;
            } else if d == ")" {
                self.paren_depth = self.paren_depth.saturating_sub(1);
            }
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.current().is(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn intern_current(&mut self) -> crate::ast::TextRef {
        let text = self.current().text.clone();
        self.arena.intern(&text)
    }

    pub(crate) fn intern(&mut self, s: &str) -> crate::ast::TextRef {
        self.arena.intern(s)
    }

    /// Allocates a node and opens its span at the current token. Structural
    /// parents widen theirs to cover their children in
    /// [`Parser::parse_tokens`]'s closing pass; statement/expression roots
    /// get a precise close from [`Parser::guarded_spanned`].
    pub(crate) fn new_node(&mut self, node_type: NodeType) -> NodeId {
        let start = self.current().byte_start;
        let id = self.arena.alloc(node_type);
        let node = self.arena.node_mut(id);
        node.source_start = start;
        node.source_end = start;
        if let Some(debug) = node.context.as_debug_mut() {
            debug.depth = self.depth.min(u16::MAX as u32) as u16;
        }
        id
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.arena.add_child(parent, child);
    }

    pub(crate) fn set_primary_text(&mut self, node: NodeId, text: crate::ast::TextRef) {
        self.arena.node_mut(node).primary_text = text;
    }

    /// Stamps the upper byte of `semantic_flags` with the enclosing
    /// `context_stack` entry's tag, per the "Identifier / ColumnRef" row of
    /// the semantic-flags table. `0` (untagged) when no context is pushed.
    pub(crate) fn tag_with_enclosing_context(&mut self, node: NodeId) {
        let tag = self.context_stack.last().map(|c| c.tag()).unwrap_or(0);
        let mut flags = self.arena.node(node).semantic_flags;
        flags.set_context_tag(tag);
        self.arena.node_mut(node).semantic_flags = flags;
    }

    /// A single bare identifier token (e.g. a column name in a `USING (...)`
    /// or CTE column list), wrapped as its own `Identifier` node.
    pub(crate) fn parse_identifier_simple(&mut self) -> Result<NodeId> {
        if self.current().kind != TokenKind::Identifier {
            return Err(self.unexpected("expected an identifier"));
        }
        let text = self.intern_current();
        let node = self.new_node(NodeType::Identifier);
        self.advance();
        self.arena.node_mut(node).source_end = self.last_token_end;
        self.set_primary_text(node, text);
        self.tag_with_enclosing_context(node);
        Ok(node)
    }

    /// Inserts `child` at the front of `parent`'s sibling chain rather than
    /// the end, for the one case (WITH clause) where source order puts a
    /// child conceptually "before" everything else already attached.
    pub(crate) fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        let old_first = self.arena.node(parent).first_child;
        self.arena.node_mut(child).parent = Some(parent);
        self.arena.node_mut(child).next_sibling = old_first;
        self.arena.node_mut(parent).first_child = Some(child);
        self.arena.node_mut(parent).child_count += 1;
    }

    pub(crate) fn unexpected(&self, message: &str) -> ParseError {
        let tok = self.current();
        ParseError::new(ParseErrorKind::UnexpectedToken(message.to_string()), tok.line, tok.column)
    }

    pub(crate) fn unterminated(&self, message: &str) -> ParseError {
        let tok = self.current();
        ParseError::new(ParseErrorKind::UnterminatedConstruct(message.to_string()), tok.line, tok.column)
    }

    pub(crate) fn error_at(&self, kind: ParseErrorKind, line: u32, column: u32) -> ParseError {
        ParseError::new(kind, line, column)
    }

    /// Wraps a statement/expression production with the depth guard: bumps
    /// `depth` on entry, fails with `DepthExceeded` past `max_depth`, and
    /// decrements on every exit path including errors.
    pub(crate) fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.depth -= 1;
            let tok = self.current();
            tracing::warn!(max_depth = self.max_depth, line = tok.line, column = tok.column, "recursion depth exceeded");
            return Err(ParseError::new(ParseErrorKind::DepthExceeded(self.max_depth), tok.line, tok.column));
        }
        let result = f(self);
        if self.depth == 1 {
            if let Err(ref e) = result {
                tracing::warn!(kind = %e.kind, line = e.line, column = e.column, "parse failed");
            }
        }
        self.depth -= 1;
        result
    }

    /// Like [`Parser::guarded`], but for the statement/expression
    /// productions whose returned [`NodeId`] is the node the caller will
    /// treat as covering the whole construct: records the byte offset
    /// before `f` runs and, on success, stamps the returned node's
    /// `source_start`/`source_end` to the exact span `f` consumed.
    pub(crate) fn guarded_spanned(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<NodeId>,
    ) -> Result<NodeId> {
        let start = self.current().byte_start;
        let result = self.guarded(f);
        if let Ok(id) = result {
            let node = self.arena.node_mut(id);
            node.source_start = start;
            node.source_end = self.last_token_end.max(start);
        }
        result
    }

    /// Widens every node's span to cover its children's, post-order. Closes
    /// the gap [`Parser::new_node`] leaves open for clause/structural nodes
    /// that never pass through [`Parser::guarded_spanned`] directly: those
    /// open at their own first token and are never told where their last
    /// child ended. Never shrinks a span `guarded_spanned` already set
    /// precisely.
    pub(crate) fn propagate_spans(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.arena.children(id).collect();
        for child in &children {
            self.propagate_spans(*child);
        }
        let mut start = self.arena.node(id).source_start;
        let mut end = self.arena.node(id).source_end;
        for child in &children {
            let c = self.arena.node(*child);
            start = start.min(c.source_start);
            end = end.max(c.source_end);
        }
        let node = self.arena.node_mut(id);
        node.source_start = start;
        node.source_end = end;
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_fails() {
        let mut p = Parser::new();
        let err = p.parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyInput);
    }

    #[test]
    fn unrecognized_leading_keyword_fails() {
        let mut p = Parser::new();
        assert!(p.parse("FLOOP users").is_err());
    }

    #[test]
    fn trailing_semicolon_is_consumed() {
        let mut p = Parser::new();
        let root = p.parse("SELECT 1;").unwrap();
        assert_eq!(p.arena().node(root).node_type, NodeType::SelectStmt);
    }

    #[test]
    fn reset_invalidates_previous_parse_state() {
        let mut p = Parser::new();
        p.parse("SELECT 1 FROM t").unwrap();
        assert!(p.get_node_count() > 0);
        p.reset();
        assert_eq!(p.get_node_count(), 0);
        assert_eq!(p.get_memory_used(), 0);
    }

    #[test]
    fn source_spans_cover_the_whole_statement_and_nest_correctly() {
        let sql = "SELECT a FROM t WHERE a > 1";
        let mut p = Parser::new();
        let root = p.parse(sql).unwrap();
        let root_node = p.arena().node(root);
        assert_eq!(root_node.source_start, 0);
        assert_eq!(root_node.source_end as usize, sql.len());

        let where_clause = p.arena().find_child(root, NodeType::WhereClause).unwrap();
        let w = p.arena().node(where_clause);
        assert_eq!(&sql[w.source_start as usize..w.source_end as usize], "WHERE a > 1");

        let predicate = p.arena().children(where_clause).next().unwrap();
        let pred = p.arena().node(predicate);
        assert!(pred.source_start > w.source_start);
        assert!(pred.source_end <= w.source_end);
    }

    #[test]
    fn debug_mode_stamps_node_construction_depth() {
        let mut p = Parser::with_mode(ParserMode::Debug);
        let root = p.parse("SELECT a FROM t WHERE a > 1").unwrap();
        let where_clause = p.arena().find_child(root, NodeType::WhereClause).unwrap();
        let predicate = p.arena().children(where_clause).next().unwrap();

        let root_depth = match p.arena().node(root).context {
            crate::ast::NodeContext::Debug(d) => d.depth,
            crate::ast::NodeContext::Analysis(_) => panic!("expected Debug context"),
        };
        let predicate_depth = match p.arena().node(predicate).context {
            crate::ast::NodeContext::Debug(d) => d.depth,
            crate::ast::NodeContext::Analysis(_) => panic!("expected Debug context"),
        };
        assert!(predicate_depth > root_depth, "nested node should be stamped with a deeper recursion depth");
    }

    #[test]
    fn depth_bomb_fails_gracefully() {
        let mut p = Parser::new();
        let mut sql = String::from("SELECT ");
        for _ in 0..1001 {
            sql.push('(');
        }
        sql.push('1');
        for _ in 0..1001 {
            sql.push(')');
        }
        let err = p.parse(&sql).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DepthExceeded(1000));
    }
}
