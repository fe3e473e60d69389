//! SELECT statements, set operations, FROM/JOIN chains, and CTEs.

use crate::ast::{NodeFlags, NodeId, NodeType, SemanticFlags};
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::parser::{ParseContext, Parser};
use crate::token::{Keyword, TokenKind};

impl Parser {
    /// Entry point for anything that can start a SELECT-shaped tree: a
    /// single statement, or a left-associative chain of UNION/INTERSECT/
    /// EXCEPT over several of them.
    pub(crate) fn parse_select_entry(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_select_entry_inner())
    }

    fn parse_select_entry_inner(&mut self) -> Result<NodeId> {
        let mut left = self.parse_select_stmt()?;
        loop {
            let node_type = match self.current().keyword {
                Some(Keyword::Union) => NodeType::UnionStmt,
                Some(Keyword::Intersect) => NodeType::IntersectStmt,
                Some(Keyword::Except) => NodeType::ExceptStmt,
                _ => break,
            };
            self.advance();
            let node = self.new_node(node_type);
            if self.eat_keyword(Keyword::All) {
                let mut flags = self.arena.node(node).flags;
                flags.set(NodeFlags::ALL);
                self.arena.node_mut(node).flags = flags;
            }
            let right = self.parse_select_stmt()?;
            self.add_child(node, left);
            self.add_child(node, right);
            left = node;
        }
        Ok(left)
    }

    /// `WITH [RECURSIVE] cte (, cte)* <statement>`. The CTE clause is
    /// attached as the first child of the statement it introduces, not
    /// returned as its own root.
    pub(crate) fn parse_with_entry(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_with_entry_inner())
    }

    fn parse_with_entry_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::With)?;
        let recursive = self.eat_keyword(Keyword::Recursive);
        let with_node = self.new_node(NodeType::CTEClause);
        if recursive {
            let mut flags = self.arena.node(with_node).semantic_flags;
            flags.set(SemanticFlags::RECURSIVE);
            self.arena.node_mut(with_node).semantic_flags = flags;
        }
        loop {
            let cte = self.parse_cte_definition()?;
            self.add_child(with_node, cte);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }

        let stmt = match self.current().keyword {
            Some(Keyword::Select) | Some(Keyword::Values) => self.parse_select_entry()?,
            Some(Keyword::Insert) => self.parse_insert()?,
            Some(Keyword::Update) => self.parse_update()?,
            Some(Keyword::Delete) => self.parse_delete()?,
            _ => return Err(self.unexpected("expected a statement after the WITH clause")),
        };
        self.prepend_child(stmt, with_node);
        Ok(stmt)
    }

    fn parse_cte_definition(&mut self) -> Result<NodeId> {
        if self.current().kind != TokenKind::Identifier {
            return Err(self.unexpected("expected a CTE name"));
        }
        let name = self.intern_current();
        self.advance();
        let node = self.new_node(NodeType::CTEDefinition);
        self.set_primary_text(node, name);

        if self.eat_delimiter("(") {
            let cols = self.new_node(NodeType::ColumnList);
            loop {
                let col = self.parse_identifier_simple()?;
                self.add_child(cols, col);
                if self.eat_delimiter(",") {
                    continue;
                }
                break;
            }
            self.expect_delimiter(")")?;
            self.add_child(node, cols);
        }

        self.expect_keyword(Keyword::As)?;
        self.expect_delimiter("(")?;
        let body = if self.current().is(Keyword::With) {
            self.parse_with_entry()?
        } else {
            self.parse_select_entry()?
        };
        self.expect_delimiter(")")?;
        self.add_child(node, body);
        Ok(node)
    }

    /// One SELECT or VALUES statement, with its own clauses but no set-op
    /// wrapping; that's `parse_select_entry`'s job.
    pub(crate) fn parse_select_stmt(&mut self) -> Result<NodeId> {
        if self.current().is(Keyword::Values) {
            return self.parse_values_stmt();
        }

        self.expect_keyword(Keyword::Select)?;
        let node = self.new_node(NodeType::SelectStmt);
        if self.eat_keyword(Keyword::Distinct) {
            let mut flags = self.arena.node(node).flags;
            flags.set(NodeFlags::DISTINCT);
            self.arena.node_mut(node).flags = flags;
        } else if self.eat_keyword(Keyword::All) {
            let mut flags = self.arena.node(node).flags;
            flags.set(NodeFlags::ALL);
            self.arena.node_mut(node).flags = flags;
        }

        let select_list = self.parse_select_list()?;
        self.add_child(node, select_list);

        if self.current().is(Keyword::From) {
            let from = self.parse_from_clause()?;
            self.add_child(node, from);
        }
        if self.current().is(Keyword::Where) {
            let where_clause = self.parse_where_clause()?;
            self.add_child(node, where_clause);
        }
        if self.current().is(Keyword::Group) {
            let group = self.parse_group_by_clause()?;
            self.add_child(node, group);
        }
        if self.current().is(Keyword::Having) {
            let having = self.parse_having_clause()?;
            self.add_child(node, having);
        }
        if self.current().is(Keyword::Order) {
            let order = self.parse_order_by_clause()?;
            self.add_child(node, order);
        }
        if self.current().is(Keyword::Limit) {
            let limit = self.parse_limit_clause()?;
            self.add_child(node, limit);
        }
        Ok(node)
    }

    fn parse_select_list(&mut self) -> Result<NodeId> {
        if self.is_select_list_terminator() {
            let tok = self.current();
            return Err(ParseError::new(ParseErrorKind::MissingSelectList, tok.line, tok.column));
        }
        let node = self.new_node(NodeType::SelectList);
        self.context_stack.push(ParseContext::SelectList);
        loop {
            let item = self.parse_select_item()?;
            self.add_child(node, item);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.context_stack.pop();
        Ok(node)
    }

    fn is_select_list_terminator(&self) -> bool {
        self.at_end()
            || self.current().is_delimiter(";")
            || matches!(self.current().keyword, Some(kw) if kw.is_clause_terminator())
    }

    fn parse_select_item(&mut self) -> Result<NodeId> {
        if self.current().is_operator("*") {
            let node = self.new_node(NodeType::Star);
            self.advance();
            self.arena.node_mut(node).source_end = self.last_token_end;
            return Ok(node);
        }
        let expr = self.parse_expression(0)?;
        self.parse_optional_alias(expr)?;
        Ok(expr)
    }

    /// Handles `[AS] alias`, storing the alias text in `schema_name` (the
    /// node's own schema qualifier, if any, no longer matters once it has an
    /// alias; see `Node::qualified_name_parts`) and setting `HAS_ALIAS`.
    pub(crate) fn parse_optional_alias(&mut self, node: NodeId) -> Result<()> {
        let took_as = self.eat_keyword(Keyword::As);
        if !took_as && self.current().kind != TokenKind::Identifier {
            return Ok(());
        }
        if self.current().kind != TokenKind::Identifier {
            return Err(self.unexpected("expected an alias"));
        }
        let alias = self.intern_current();
        self.advance();
        self.arena.node_mut(node).schema_name = alias;
        let mut flags = self.arena.node(node).flags;
        flags.set(NodeFlags::HAS_ALIAS);
        self.arena.node_mut(node).flags = flags;
        Ok(())
    }

    pub(crate) fn parse_from_clause(&mut self) -> Result<NodeId> {
        let start = self.current().byte_start;
        self.expect_keyword(Keyword::From)?;
        let node = self.new_node(NodeType::FromClause);
        self.arena.node_mut(node).source_start = start;
        self.context_stack.push(ParseContext::FromClause);
        loop {
            let item = self.parse_from_item()?;
            self.add_child(node, item);
            while let Some(join) = self.try_parse_join()? {
                self.add_child(node, join);
            }
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.context_stack.pop();
        Ok(node)
    }

    fn parse_from_item(&mut self) -> Result<NodeId> {
        if self.eat_delimiter("(") {
            let stmt = self.parse_select_entry()?;
            self.expect_delimiter(")")?;
            let node = self.new_node(NodeType::Subquery);
            self.add_child(node, stmt);
            self.parse_optional_alias(node)?;
            return Ok(node);
        }
        self.parse_table_ref()
    }

    pub(crate) fn parse_table_ref(&mut self) -> Result<NodeId> {
        if self.current().kind != TokenKind::Identifier && self.current().kind != TokenKind::Keyword {
            return Err(self.unexpected("expected a table reference"));
        }
        let mut parts = vec![self.current().text.clone()];
        self.advance();
        while self.eat_delimiter(".") {
            parts.push(self.current().text.clone());
            self.advance();
        }

        let node = self.new_node(NodeType::TableRef);
        match parts.len() {
            1 => {
                let name = self.intern(&parts[0]);
                self.set_primary_text(node, name);
            }
            2 => {
                let schema = self.intern(&parts[0]);
                let name = self.intern(&parts[1]);
                self.arena.node_mut(node).schema_name = schema;
                self.set_primary_text(node, name);
            }
            _ => {
                let catalog = self.intern(&parts[0]);
                let schema = self.intern(&parts[1]);
                let name = self.intern(&parts[2]);
                self.arena.node_mut(node).catalog_name = catalog;
                self.arena.node_mut(node).schema_name = schema;
                self.set_primary_text(node, name);
            }
        }
        self.parse_optional_alias(node)?;
        Ok(node)
    }

    fn try_parse_join(&mut self) -> Result<Option<NodeId>> {
        let node_type = match self.current().keyword {
            Some(Keyword::Join) => NodeType::InnerJoin,
            Some(Keyword::Inner) => {
                self.advance();
                NodeType::InnerJoin
            }
            Some(Keyword::Left) => {
                self.advance();
                self.eat_keyword(Keyword::Outer);
                NodeType::LeftJoin
            }
            Some(Keyword::Right) => {
                self.advance();
                self.eat_keyword(Keyword::Outer);
                NodeType::RightJoin
            }
            Some(Keyword::Full) => {
                self.advance();
                self.eat_keyword(Keyword::Outer);
                NodeType::FullJoin
            }
            Some(Keyword::Cross) => {
                self.advance();
                NodeType::CrossJoin
            }
            _ => return Ok(None),
        };
        self.expect_keyword(Keyword::Join)?;
        let lateral = self.eat_keyword(Keyword::Lateral);
        let final_type = if lateral && node_type == NodeType::InnerJoin {
            NodeType::LateralJoin
        } else {
            node_type
        };

        let node = self.new_node(final_type);
        let kind_text = self.intern(join_keyword_text(final_type));
        self.set_primary_text(node, kind_text);
        if lateral {
            let mut flags = self.arena.node(node).flags;
            flags.set(NodeFlags::IS_LATERAL);
            self.arena.node_mut(node).flags = flags;
        }

        let table = self.parse_from_item()?;
        self.add_child(node, table);

        if final_type != NodeType::CrossJoin {
            if self.eat_keyword(Keyword::On) {
                self.context_stack.push(ParseContext::JoinCondition);
                let cond = self.parse_expression(0)?;
                self.context_stack.pop();
                self.add_child(node, cond);
            } else if self.eat_keyword(Keyword::Using) {
                self.expect_delimiter("(")?;
                let using_node = self.new_node(NodeType::UsingClause);
                loop {
                    let col = self.parse_identifier_simple()?;
                    self.add_child(using_node, col);
                    if self.eat_delimiter(",") {
                        continue;
                    }
                    break;
                }
                self.expect_delimiter(")")?;
                self.add_child(node, using_node);
            }
        }
        Ok(Some(node))
    }

    pub(crate) fn parse_where_clause(&mut self) -> Result<NodeId> {
        let start = self.current().byte_start;
        self.expect_keyword(Keyword::Where)?;
        let node = self.new_node(NodeType::WhereClause);
        self.arena.node_mut(node).source_start = start;
        self.context_stack.push(ParseContext::WhereClause);
        let expr = self.parse_expression(0)?;
        self.context_stack.pop();
        self.add_child(node, expr);
        Ok(node)
    }

    fn parse_group_by_clause(&mut self) -> Result<NodeId> {
        let start = self.current().byte_start;
        self.expect_keyword(Keyword::Group)?;
        self.expect_keyword(Keyword::By)?;
        let node = self.new_node(NodeType::GroupByClause);
        self.arena.node_mut(node).source_start = start;
        self.context_stack.push(ParseContext::GroupByClause);
        loop {
            let item = self.parse_group_by_item()?;
            self.add_child(node, item);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.context_stack.pop();
        Ok(node)
    }

    fn parse_group_by_item(&mut self) -> Result<NodeId> {
        if self.eat_keyword(Keyword::Grouping) {
            self.expect_keyword(Keyword::Sets)?;
            return self.parse_grouping_element("GROUPING SETS");
        }
        if self.current().is(Keyword::Cube) {
            self.advance();
            return self.parse_grouping_element("CUBE");
        }
        if self.current().is(Keyword::Rollup) {
            self.advance();
            return self.parse_grouping_element("ROLLUP");
        }
        self.parse_expression(0)
    }

    fn parse_grouping_element(&mut self, kind: &str) -> Result<NodeId> {
        let node = self.new_node(NodeType::GroupingElement);
        let text = self.intern(kind);
        self.set_primary_text(node, text);
        self.expect_delimiter("(")?;
        if !self.current().is_delimiter(")") {
            loop {
                let item = self.parse_expression(0)?;
                self.add_child(node, item);
                if self.eat_delimiter(",") {
                    continue;
                }
                break;
            }
        }
        self.expect_delimiter(")")?;
        Ok(node)
    }

    fn parse_having_clause(&mut self) -> Result<NodeId> {
        let start = self.current().byte_start;
        self.expect_keyword(Keyword::Having)?;
        let node = self.new_node(NodeType::HavingClause);
        self.arena.node_mut(node).source_start = start;
        self.context_stack.push(ParseContext::HavingClause);
        let expr = self.parse_expression(0)?;
        self.context_stack.pop();
        self.add_child(node, expr);
        Ok(node)
    }

    fn parse_order_by_clause(&mut self) -> Result<NodeId> {
        let start = self.current().byte_start;
        self.expect_keyword(Keyword::Order)?;
        self.expect_keyword(Keyword::By)?;
        let node = self.new_node(NodeType::OrderByClause);
        self.arena.node_mut(node).source_start = start;
        self.context_stack.push(ParseContext::OrderByClause);
        loop {
            let item = self.parse_order_by_item()?;
            self.add_child(node, item);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.context_stack.pop();
        Ok(node)
    }

    fn parse_limit_clause(&mut self) -> Result<NodeId> {
        let start = self.current().byte_start;
        self.expect_keyword(Keyword::Limit)?;
        let node = self.new_node(NodeType::LimitClause);
        self.arena.node_mut(node).source_start = start;
        let n = self.parse_primary_expression()?;
        self.add_child(node, n);
        if self.eat_keyword(Keyword::Offset) {
            let m = self.parse_primary_expression()?;
            self.add_child(node, m);
        }
        Ok(node)
    }
}

fn join_keyword_text(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::InnerJoin => "INNER JOIN",
        NodeType::LeftJoin => "LEFT JOIN",
        NodeType::RightJoin => "RIGHT JOIN",
        NodeType::FullJoin => "FULL JOIN",
        NodeType::CrossJoin => "CROSS JOIN",
        NodeType::LateralJoin => "JOIN LATERAL",
        _ => "JOIN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser as P;

    #[test]
    fn select_star_from_users() {
        let mut p = P::new();
        let root = p.parse("SELECT * FROM users").unwrap();
        assert_eq!(p.arena().node(root).node_type, NodeType::SelectStmt);
        let list = p.arena().find_child(root, NodeType::SelectList).unwrap();
        let star = p.arena().children(list).next().unwrap();
        assert_eq!(p.arena().node(star).node_type, NodeType::Star);
        let from = p.arena().find_child(root, NodeType::FromClause).unwrap();
        let table = p.arena().children(from).next().unwrap();
        assert_eq!(p.arena().node(table).node_type, NodeType::TableRef);
        assert_eq!(p.arena().text(p.arena().node(table).primary_text), "users");
    }

    #[test]
    fn empty_select_list_is_missing_select_list_error() {
        let mut p = P::new();
        let err = p.parse("SELECT FROM t").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingSelectList);
    }

    #[test]
    fn union_all_wraps_two_selects() {
        let mut p = P::new();
        let root = p.parse("SELECT id FROM t1 UNION ALL SELECT id FROM t2").unwrap();
        let n = p.arena().node(root);
        assert_eq!(n.node_type, NodeType::UnionStmt);
        assert!(n.flags.contains(NodeFlags::ALL));
        assert_eq!(p.arena().children(root).count(), 2);
    }

    #[test]
    fn inner_join_with_on_condition_validates() {
        let mut p = P::new();
        let root = p.parse("SELECT a.id FROM a JOIN b ON a.id = b.id").unwrap();
        p.validate_ast(root).unwrap();
        let from = p.arena().find_child(root, NodeType::FromClause).unwrap();
        let join = p.arena().children(from).nth(1).unwrap();
        assert_eq!(p.arena().node(join).node_type, NodeType::InnerJoin);
        assert_eq!(p.arena().children(join).count(), 2);
    }

    #[test]
    fn cross_join_needs_no_condition() {
        let mut p = P::new();
        let root = p.parse("SELECT * FROM a CROSS JOIN b").unwrap();
        p.validate_ast(root).unwrap();
    }

    #[test]
    fn with_recursive_attaches_cte_as_first_child() {
        let mut p = P::new();
        let root = p
            .parse("WITH RECURSIVE h AS (SELECT 1 UNION ALL SELECT n+1 FROM h WHERE n<10) SELECT * FROM h")
            .unwrap();
        assert_eq!(p.arena().node(root).node_type, NodeType::SelectStmt);
        let first = p.arena().children(root).next().unwrap();
        let cte_node = p.arena().node(first);
        assert_eq!(cte_node.node_type, NodeType::CTEClause);
        assert!(cte_node.semantic_flags.contains(SemanticFlags::RECURSIVE));
        let cte_def = p.arena().children(first).next().unwrap();
        assert_eq!(p.arena().node(cte_def).node_type, NodeType::CTEDefinition);
    }

    #[test]
    fn order_by_stores_desc_and_nulls_in_semantic_flags() {
        let mut p = P::new();
        let root = p.parse("SELECT id FROM t ORDER BY id DESC NULLS LAST").unwrap();
        let order = p.arena().find_child(root, NodeType::OrderByClause).unwrap();
        let item = p.arena().children(order).next().unwrap();
        let flags = p.arena().node(item).semantic_flags;
        assert!(flags.contains(SemanticFlags::DESC));
        assert!(flags.contains(SemanticFlags::NULLS_EXPLICIT));
        assert!(!flags.contains(SemanticFlags::NULLS_FIRST));
    }

    #[test]
    fn group_by_rollup_produces_grouping_element() {
        let mut p = P::new();
        let root = p.parse("SELECT a, b FROM t GROUP BY ROLLUP (a, b)").unwrap();
        let group = p.arena().find_child(root, NodeType::GroupByClause).unwrap();
        let item = p.arena().children(group).next().unwrap();
        assert_eq!(p.arena().node(item).node_type, NodeType::GroupingElement);
        assert_eq!(p.arena().text(p.arena().node(item).primary_text), "ROLLUP");
        assert_eq!(p.arena().children(item).count(), 2);
    }

    #[test]
    fn limit_with_offset_has_two_literal_children() {
        let mut p = P::new();
        let root = p.parse("SELECT id FROM t LIMIT 10 OFFSET 5").unwrap();
        let limit = p.arena().find_child(root, NodeType::LimitClause).unwrap();
        assert_eq!(p.arena().children(limit).count(), 2);
    }
}
