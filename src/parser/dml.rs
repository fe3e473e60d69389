//! INSERT, UPDATE, DELETE, and ON CONFLICT.

use crate::ast::{NodeId, NodeType};
use crate::error::Result;
use crate::parser::Parser;
use crate::token::{Keyword, TokenKind};

/// `semantic_flags` bit on a SET-assignment `BinaryExpr`: marks it as an
/// assignment rather than an ordinary comparison/arithmetic node.
const ASSIGNMENT: u16 = 0x0400;
/// ON CONFLICT action bits.
const CONFLICT_DO_NOTHING: u16 = 0x01;
const CONFLICT_DO_UPDATE: u16 = 0x02;

impl Parser {
    pub(crate) fn parse_insert(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_insert_inner())
    }

    fn parse_insert_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let node = self.new_node(NodeType::InsertStmt);
        let table = self.parse_table_ref()?;
        self.add_child(node, table);

        if self.current().is_delimiter("(") && self.looks_like_column_list() {
            self.expect_delimiter("(")?;
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

        if self.eat_keyword(Keyword::Default) {
            self.expect_keyword(Keyword::Values)?;
            let marker = self.new_node(NodeType::ValuesStmt);
            self.add_child(node, marker);
        } else if self.current().is(Keyword::Values) {
            let values = self.parse_values_stmt()?;
            self.add_child(node, values);
        } else if self.current().is(Keyword::Select) || self.current().is(Keyword::With) {
            let select = if self.current().is(Keyword::With) {
                self.parse_with_entry()?
            } else {
                self.parse_select_entry()?
            };
            self.add_child(node, select);
        } else {
            return Err(self.unexpected("expected VALUES, SELECT, or DEFAULT VALUES"));
        }

        if self.current().is(Keyword::On) {
            let conflict = self.parse_on_conflict()?;
            self.add_child(node, conflict);
        }
        if self.eat_keyword(Keyword::Returning) {
            let returning = self.parse_returning_clause()?;
            self.add_child(node, returning);
        }
        Ok(node)
    }

    /// One token of lookahead past the `(` already current: an identifier
    /// immediately followed by `,` or `)` means this parenthesis opens a
    /// column list, not the first VALUES row. Implemented with
    /// `set_position` bounded backtracking rather than true multi-token
    /// lookahead.
    fn looks_like_column_list(&mut self) -> bool {
        let saved = self.cursor.position();
        self.advance();
        let is_list =
            self.current().kind == TokenKind::Identifier && (self.peek().is_delimiter(",") || self.peek().is_delimiter(")"));
        self.cursor.set_position(saved);
        is_list
    }

    fn parse_on_conflict(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::On)?;
        self.expect_keyword(Keyword::Conflict)?;
        let node = self.new_node(NodeType::OnConflictClause);

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

        self.expect_keyword(Keyword::Do)?;
        if self.eat_keyword(Keyword::Nothing) {
            let mut flags = self.arena.node(node).semantic_flags;
            flags.set(CONFLICT_DO_NOTHING);
            self.arena.node_mut(node).semantic_flags = flags;
        } else {
            self.expect_keyword(Keyword::Update)?;
            self.expect_keyword(Keyword::Set)?;
            let mut flags = self.arena.node(node).semantic_flags;
            flags.set(CONFLICT_DO_UPDATE);
            self.arena.node_mut(node).semantic_flags = flags;
            loop {
                let assign = self.parse_assignment()?;
                self.add_child(node, assign);
                if self.eat_delimiter(",") {
                    continue;
                }
                break;
            }
        }
        Ok(node)
    }

    pub(crate) fn parse_update(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_update_inner())
    }

    fn parse_update_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Update)?;
        let node = self.new_node(NodeType::UpdateStmt);
        let table = self.parse_table_ref()?;
        self.add_child(node, table);

        self.expect_keyword(Keyword::Set)?;
        loop {
            let assign = self.parse_assignment()?;
            self.add_child(node, assign);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }

        if self.current().is(Keyword::From) {
            let from = self.parse_from_clause()?;
            self.add_child(node, from);
        }
        if self.current().is(Keyword::Where) {
            let where_clause = self.parse_where_clause()?;
            self.add_child(node, where_clause);
        }
        if self.eat_keyword(Keyword::Returning) {
            let returning = self.parse_returning_clause()?;
            self.add_child(node, returning);
        }
        Ok(node)
    }

    /// `col = expr`, represented as a `BinaryExpr`-shaped node:
    /// `primary_text = col`, child 0 = value expression, `ASSIGNMENT` bit set.
    fn parse_assignment(&mut self) -> Result<NodeId> {
        if self.current().kind != TokenKind::Identifier {
            return Err(self.unexpected("expected a column name in assignment"));
        }
        let col = self.intern_current();
        self.advance();
        if !self.current().is_operator("=") {
            return Err(self.unexpected("expected '=' in assignment"));
        }
        self.advance();
        let value = self.parse_expression(0)?;
        let node = self.new_node(NodeType::BinaryExpr);
        self.set_primary_text(node, col);
        let mut flags = self.arena.node(node).semantic_flags;
        flags.set(ASSIGNMENT);
        self.arena.node_mut(node).semantic_flags = flags;
        self.add_child(node, value);
        Ok(node)
    }

    pub(crate) fn parse_delete(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_delete_inner())
    }

    fn parse_delete_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let node = self.new_node(NodeType::DeleteStmt);
        let table = self.parse_table_ref()?;
        self.add_child(node, table);

        if self.eat_keyword(Keyword::Using) {
            let using_node = self.new_node(NodeType::UsingClause);
            loop {
                let table_ref = self.parse_table_ref()?;
                self.add_child(using_node, table_ref);
                if self.eat_delimiter(",") {
                    continue;
                }
                break;
            }
            self.add_child(node, using_node);
        }
        if self.current().is(Keyword::Where) {
            let where_clause = self.parse_where_clause()?;
            self.add_child(node, where_clause);
        }
        if self.eat_keyword(Keyword::Returning) {
            let returning = self.parse_returning_clause()?;
            self.add_child(node, returning);
        }
        Ok(node)
    }

    fn parse_returning_clause(&mut self) -> Result<NodeId> {
        let node = self.new_node(NodeType::ReturningClause);
        if self.current().is_operator("*") {
            let star = self.new_node(NodeType::Star);
            self.advance();
            self.arena.node_mut(star).source_end = self.last_token_end;
            self.add_child(node, star);
        } else {
            loop {
                let expr = self.parse_expression(0)?;
                self.parse_optional_alias(expr)?;
                self.add_child(node, expr);
                if self.eat_delimiter(",") {
                    continue;
                }
                break;
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use crate::parser::Parser as P;

    #[test]
    fn insert_with_column_list_and_values_row() {
        let mut p = P::new();
        let root = p.parse("INSERT INTO t (a, b) VALUES (1, 2)").unwrap();
        assert_eq!(p.arena().node(root).node_type, NodeType::InsertStmt);
        let cols = p.arena().find_child(root, NodeType::ColumnList).unwrap();
        assert_eq!(p.arena().children(cols).count(), 2);
        let values = p.arena().find_child(root, NodeType::ValuesStmt).unwrap();
        let row = p.arena().children(values).next().unwrap();
        assert_eq!(p.arena().children(row).count(), 2);
    }

    #[test]
    fn insert_without_into_is_unexpected_token() {
        let mut p = P::new();
        let err = p.parse("INSERT VALUES (1)").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn insert_select_has_no_values_stmt_child() {
        let mut p = P::new();
        let root = p.parse("INSERT INTO t SELECT * FROM s").unwrap();
        assert!(p.arena().find_child(root, NodeType::ValuesStmt).is_none());
        assert!(p.arena().find_child(root, NodeType::SelectStmt).is_some());
    }

    #[test]
    fn on_conflict_do_nothing_sets_flag() {
        let mut p = P::new();
        let root = p.parse("INSERT INTO t (a) VALUES (1) ON CONFLICT (a) DO NOTHING").unwrap();
        let conflict = p.arena().find_child(root, NodeType::OnConflictClause).unwrap();
        assert!(p.arena().node(conflict).semantic_flags.contains(CONFLICT_DO_NOTHING));
    }

    #[test]
    fn update_assignment_is_binary_expr_shaped() {
        let mut p = P::new();
        let root = p.parse("UPDATE t SET a = 1, b = 2 WHERE id = 3").unwrap();
        assert_eq!(p.arena().node(root).node_type, NodeType::UpdateStmt);
        let assigns: Vec<_> = p
            .arena()
            .children(root)
            .filter(|&id| p.arena().node(id).semantic_flags.contains(ASSIGNMENT))
            .collect();
        assert_eq!(assigns.len(), 2);
        assert_eq!(p.arena().text(p.arena().node(assigns[0]).primary_text), "a");
    }

    #[test]
    fn delete_with_using_and_where() {
        let mut p = P::new();
        let root = p.parse("DELETE FROM t USING s WHERE t.id = s.id").unwrap();
        assert_eq!(p.arena().node(root).node_type, NodeType::DeleteStmt);
        assert!(p.arena().find_child(root, NodeType::UsingClause).is_some());
        assert!(p.arena().find_child(root, NodeType::WhereClause).is_some());
    }
}
