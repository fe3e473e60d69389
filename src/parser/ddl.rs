//! CREATE TABLE/INDEX/VIEW/TRIGGER/SCHEMA, ALTER TABLE, DROP, and TRUNCATE
//!.

use crate::ast::{NodeId, NodeType, SemanticFlags};
use crate::error::Result;
use crate::parser::Parser;
use crate::token::{Keyword, TokenKind};

/// `DropStmt`/`CreateIndexStmt` object-kind subtag, packed into the low two
/// bits of `OBJECT_KIND_MASK`. TRIGGER/SCHEMA leave the subtag unset; DROP
/// only needs to distinguish the three droppable storage objects.
const OBJ_TABLE: u16 = 0x10;
const OBJ_INDEX: u16 = 0x20;
const OBJ_VIEW: u16 = 0x30;

/// CREATE/ALTER TRIGGER event bits, individually addressable within
/// `TRIGGER_EVENT_MASK` (0x0700).
const TRIGGER_ON_INSERT: u16 = 0x0100;
const TRIGGER_ON_UPDATE: u16 = 0x0200;
const TRIGGER_ON_DELETE: u16 = 0x0400;

impl Parser {
    pub(crate) fn parse_create(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_create_inner())
    }

    fn parse_create_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Create)?;
        let mut temporary = false;
        let mut or_replace = false;
        let mut unique = false;
        loop {
            if self.eat_keyword(Keyword::Temp) || self.eat_keyword(Keyword::Temporary) {
                temporary = true;
            } else if self.eat_keyword(Keyword::Or) {
                self.expect_keyword(Keyword::Replace)?;
                or_replace = true;
            } else if self.eat_keyword(Keyword::Unique) {
                unique = true;
            } else {
                break;
            }
        }

        match self.current().keyword {
            Some(Keyword::Table) => self.parse_create_table(temporary),
            Some(Keyword::Index) => self.parse_create_index(unique),
            Some(Keyword::View) => self.parse_create_view(or_replace),
            Some(Keyword::Trigger) => self.parse_create_trigger(),
            Some(Keyword::Schema) => self.parse_create_schema(),
            _ => Err(self.unexpected("expected TABLE, INDEX, VIEW, TRIGGER, or SCHEMA after CREATE")),
        }
    }

    fn parse_create_table(&mut self, temporary: bool) -> Result<NodeId> {
        self.expect_keyword(Keyword::Table)?;
        let node = self.new_node(NodeType::CreateTableStmt);
        if temporary {
            self.set_semantic_flag(node, SemanticFlags::TEMPORARY_RESTRICT);
        }
        if self.eat_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            self.set_semantic_flag(node, SemanticFlags::IF_EXISTS);
        }
        self.parse_object_name_into(node)?;

        self.expect_delimiter("(")?;
        loop {
            let element = self.parse_table_element()?;
            self.add_child(node, element);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.expect_delimiter(")")?;

        // Trailing table options (storage engine, WITHOUT ROWID, ...) aren't
        // interpreted by this front end; skip to the statement end.
        while !self.at_end() && !self.current().is_delimiter(";") {
            self.advance();
        }
        Ok(node)
    }

    fn parse_table_element(&mut self) -> Result<NodeId> {
        if matches!(
            self.current().keyword,
            Some(Keyword::Constraint | Keyword::Primary | Keyword::Foreign | Keyword::Unique | Keyword::Check)
        ) {
            self.parse_table_constraint()
        } else {
            self.parse_column_definition()
        }
    }

    fn parse_column_definition(&mut self) -> Result<NodeId> {
        if self.current().kind != TokenKind::Identifier {
            return Err(self.unexpected("expected a column name"));
        }
        let name = self.intern_current();
        self.advance();
        let node = self.new_node(NodeType::ColumnDefinition);
        self.set_primary_text(node, name);

        let data_type = self.parse_data_type()?;
        self.add_child(node, data_type);

        loop {
            match self.current().keyword {
                Some(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    self.add_named_column_constraint(node, "NOT NULL");
                }
                Some(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    self.add_named_column_constraint(node, "PRIMARY KEY");
                }
                Some(Keyword::Unique) => {
                    self.advance();
                    self.add_named_column_constraint(node, "UNIQUE");
                }
                Some(Keyword::Check) => {
                    self.advance();
                    self.expect_delimiter("(")?;
                    let expr = self.parse_expression(0)?;
                    self.expect_delimiter(")")?;
                    let constraint = self.new_node(NodeType::CheckConstraint);
                    self.add_child(constraint, expr);
                    self.add_child(node, constraint);
                }
                Some(Keyword::Default) => {
                    self.advance();
                    let expr = self.parse_expression(0)?;
                    let constraint = self.new_node(NodeType::DefaultClause);
                    self.add_child(constraint, expr);
                    self.add_child(node, constraint);
                }
                Some(Keyword::References) => {
                    self.advance();
                    let constraint = self.new_node(NodeType::ColumnConstraint);
                    let text = self.intern("REFERENCES");
                    self.set_primary_text(constraint, text);
                    self.parse_object_name_into(constraint)?;
                    if self.eat_delimiter("(") {
                        let cols = self.parse_column_list_until_paren()?;
                        self.add_child(constraint, cols);
                    }
                    self.add_child(node, constraint);
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn add_named_column_constraint(&mut self, column: NodeId, text: &str) {
        let constraint = self.new_node(NodeType::ColumnConstraint);
        let name = self.intern(text);
        self.set_primary_text(constraint, name);
        self.add_child(column, constraint);
    }

    /// `[CONSTRAINT name] { PRIMARY KEY (...) | FOREIGN KEY (...) REFERENCES
    /// t(...) | UNIQUE (...) | CHECK (expr) }`. A given `CONSTRAINT name` is
    /// kept in `primary_text` except on a foreign key, where that slot
    /// instead holds the referenced table's own name.
    fn parse_table_constraint(&mut self) -> Result<NodeId> {
        let mut given_name = None;
        if self.eat_keyword(Keyword::Constraint) {
            if self.current().kind != TokenKind::Identifier {
                return Err(self.unexpected("expected a constraint name"));
            }
            given_name = Some(self.intern_current());
            self.advance();
        }

        let node = match self.current().keyword {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let n = self.new_node(NodeType::PrimaryKeyConstraint);
                self.expect_delimiter("(")?;
                let cols = self.parse_column_list_until_paren()?;
                self.add_child(n, cols);
                n
            }
            Some(Keyword::Unique) => {
                self.advance();
                let n = self.new_node(NodeType::UniqueConstraint);
                self.expect_delimiter("(")?;
                let cols = self.parse_column_list_until_paren()?;
                self.add_child(n, cols);
                n
            }
            Some(Keyword::Check) => {
                self.advance();
                let n = self.new_node(NodeType::CheckConstraint);
                self.expect_delimiter("(")?;
                let expr = self.parse_expression(0)?;
                self.expect_delimiter(")")?;
                self.add_child(n, expr);
                n
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let n = self.new_node(NodeType::ForeignKeyConstraint);
                self.expect_delimiter("(")?;
                let cols = self.parse_column_list_until_paren()?;
                self.add_child(n, cols);
                self.expect_keyword(Keyword::References)?;
                self.parse_object_name_into(n)?;
                if self.eat_delimiter("(") {
                    let ref_cols = self.parse_column_list_until_paren()?;
                    self.add_child(n, ref_cols);
                }
                return Ok(n);
            }
            _ => return Err(self.unexpected("expected PRIMARY KEY, FOREIGN KEY, UNIQUE, or CHECK")),
        };
        if let Some(name) = given_name {
            self.set_primary_text(node, name);
        }
        Ok(node)
    }

    fn parse_create_index(&mut self, unique: bool) -> Result<NodeId> {
        self.expect_keyword(Keyword::Index)?;
        let node = self.new_node(NodeType::CreateIndexStmt);
        if unique {
            self.set_semantic_flag(node, SemanticFlags::UNIQUE);
        }
        if self.eat_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            self.set_semantic_flag(node, SemanticFlags::IF_EXISTS);
        }
        self.parse_object_name_into(node)?;
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_table_ref()?;
        self.add_child(node, table);

        self.expect_delimiter("(")?;
        loop {
            let col = self.parse_indexed_column()?;
            self.add_child(node, col);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.expect_delimiter(")")?;

        if self.current().is(Keyword::Where) {
            let predicate = self.parse_where_clause()?;
            self.add_child(node, predicate);
        }
        Ok(node)
    }

    fn parse_indexed_column(&mut self) -> Result<NodeId> {
        let expr = if self.eat_delimiter("(") {
            let e = self.parse_expression(0)?;
            self.expect_delimiter(")")?;
            e
        } else {
            self.parse_identifier_simple()?
        };
        let node = self.new_node(NodeType::IndexColumn);
        self.add_child(node, expr);
        if self.eat_keyword(Keyword::Desc) {
            self.set_semantic_flag(node, SemanticFlags::DESC);
        } else {
            self.eat_keyword(Keyword::Asc);
        }
        Ok(node)
    }

    fn parse_create_view(&mut self, or_replace: bool) -> Result<NodeId> {
        self.expect_keyword(Keyword::View)?;
        let node = self.new_node(NodeType::CreateViewStmt);
        if or_replace {
            self.set_semantic_flag(node, SemanticFlags::OR_REPLACE_CASCADE);
        }
        self.parse_object_name_into(node)?;
        if self.eat_delimiter("(") {
            let cols = self.parse_column_list_until_paren()?;
            self.add_child(node, cols);
        }
        self.expect_keyword(Keyword::As)?;
        let body = if self.current().is(Keyword::With) {
            self.parse_with_entry()?
        } else {
            self.parse_select_entry()?
        };
        self.add_child(node, body);
        Ok(node)
    }

    /// `BEFORE|AFTER|INSTEAD OF {INSERT|UPDATE [OF cols]|DELETE} ON table
    /// [FOR [EACH] ROW|STATEMENT] [WHEN (expr)] {BEGIN stmt*; END | stmt}`.
    /// The timing keyword text lives in `schema_name` since a trigger's own
    /// name is never meaningfully schema-qualified in this grammar.
    fn parse_create_trigger(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Trigger)?;
        let node = self.new_node(NodeType::CreateTriggerStmt);
        self.parse_object_name_into(node)?;

        let timing = if self.eat_keyword(Keyword::Before) {
            "BEFORE"
        } else if self.eat_keyword(Keyword::After) {
            "AFTER"
        } else if self.eat_keyword(Keyword::Instead) {
            self.expect_keyword(Keyword::Of)?;
            "INSTEAD OF"
        } else {
            return Err(self.unexpected("expected BEFORE, AFTER, or INSTEAD OF"));
        };
        let timing_text = self.intern(timing);
        self.arena.node_mut(node).schema_name = timing_text;

        match self.current().keyword {
            Some(Keyword::Insert) => {
                self.advance();
                self.set_semantic_flag(node, TRIGGER_ON_INSERT);
            }
            Some(Keyword::Delete) => {
                self.advance();
                self.set_semantic_flag(node, TRIGGER_ON_DELETE);
            }
            Some(Keyword::Update) => {
                self.advance();
                self.set_semantic_flag(node, TRIGGER_ON_UPDATE);
                if self.eat_keyword(Keyword::Of) {
                    let cols = self.parse_column_list_no_parens()?;
                    self.add_child(node, cols);
                }
            }
            _ => return Err(self.unexpected("expected INSERT, UPDATE, or DELETE")),
        }

        self.expect_keyword(Keyword::On)?;
        let table = self.parse_table_ref()?;
        self.add_child(node, table);

        if self.eat_keyword(Keyword::For) {
            self.eat_keyword(Keyword::Each);
            if self.eat_keyword(Keyword::Row) {
                self.set_semantic_flag(node, SemanticFlags::TRIGGER_ROW);
            } else {
                self.expect_keyword(Keyword::Statement)?;
                self.set_semantic_flag(node, SemanticFlags::TRIGGER_STATEMENT);
            }
        }

        if self.eat_keyword(Keyword::When) {
            self.expect_delimiter("(")?;
            let cond = self.parse_expression(0)?;
            self.expect_delimiter(")")?;
            self.add_child(node, cond);
        }

        if self.eat_keyword(Keyword::Begin) {
            loop {
                if self.at_end() {
                    return Err(self.unterminated("missing END for trigger body"));
                }
                if self.current().is(Keyword::End) {
                    break;
                }
                let stmt = self.parse_statement_inner()?;
                self.add_child(node, stmt);
                self.eat_delimiter(";");
            }
            self.expect_keyword(Keyword::End)?;
        } else {
            let stmt = self.parse_statement_inner()?;
            self.add_child(node, stmt);
        }
        Ok(node)
    }

    fn parse_create_schema(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Schema)?;
        let node = self.new_node(NodeType::CreateSchemaStmt);
        if self.eat_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            self.set_semantic_flag(node, SemanticFlags::IF_EXISTS);
        }
        self.parse_object_name_into(node)?;
        if self.eat_keyword(Keyword::Authorization) {
            if self.current().kind != TokenKind::Identifier {
                return Err(self.unexpected("expected an owner name after AUTHORIZATION"));
            }
            let owner = self.intern_current();
            self.advance();
            self.arena.node_mut(node).catalog_name = owner;
        }
        Ok(node)
    }

    pub(crate) fn parse_drop(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_drop_inner())
    }

    fn parse_drop_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Drop)?;
        let node = self.new_node(NodeType::DropStmt);
        let kind_bits = match self.current().keyword {
            Some(Keyword::Table) => {
                self.advance();
                OBJ_TABLE
            }
            Some(Keyword::Index) => {
                self.advance();
                OBJ_INDEX
            }
            Some(Keyword::View) => {
                self.advance();
                OBJ_VIEW
            }
            Some(Keyword::Trigger) | Some(Keyword::Schema) => {
                self.advance();
                0
            }
            _ => return Err(self.unexpected("expected TABLE, INDEX, VIEW, TRIGGER, or SCHEMA after DROP")),
        };
        if kind_bits != 0 {
            self.set_semantic_flag(node, kind_bits);
        }
        if self.eat_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            self.set_semantic_flag(node, SemanticFlags::IF_EXISTS);
        }
        self.parse_object_name_into(node)?;
        if self.eat_keyword(Keyword::Cascade) {
            self.set_semantic_flag(node, SemanticFlags::OR_REPLACE_CASCADE);
        } else if self.eat_keyword(Keyword::Restrict) {
            self.set_semantic_flag(node, SemanticFlags::TEMPORARY_RESTRICT);
        }
        Ok(node)
    }

    pub(crate) fn parse_truncate(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_truncate_inner())
    }

    fn parse_truncate_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Truncate)?;
        self.eat_keyword(Keyword::Table);
        let node = self.new_node(NodeType::TruncateStmt);
        let table = self.parse_table_ref()?;
        self.add_child(node, table);
        if self.eat_keyword(Keyword::Cascade) {
            self.set_semantic_flag(node, SemanticFlags::OR_REPLACE_CASCADE);
        } else if self.eat_keyword(Keyword::Restrict) {
            self.set_semantic_flag(node, SemanticFlags::TEMPORARY_RESTRICT);
        }
        Ok(node)
    }

    pub(crate) fn parse_alter(&mut self) -> Result<NodeId> {
        self.guarded_spanned(|p| p.parse_alter_inner())
    }

    fn parse_alter_inner(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Alter)?;
        match self.current().keyword {
            Some(Keyword::Table) => self.parse_alter_table(),
            Some(Keyword::Schema) => self.parse_alter_generic(NodeType::AlterSchemaStmt, Keyword::Schema),
            Some(Keyword::Index) => self.parse_alter_generic(NodeType::AlterIndexStmt, Keyword::Index),
            Some(Keyword::View) => self.parse_alter_generic(NodeType::AlterViewStmt, Keyword::View),
            _ => Err(self.unexpected("expected TABLE, INDEX, VIEW, or SCHEMA after ALTER")),
        }
    }

    /// ALTER SCHEMA/INDEX/VIEW bodies beyond the object name aren't given a
    /// detailed grammar (only ALTER TABLE is); the object is named and the
    /// remainder of the statement is skipped, mirroring `parse_utility_stmt`'s
    /// treatment of statement kinds this front end doesn't interpret
    /// further.
    fn parse_alter_generic(&mut self, node_type: NodeType, kw: Keyword) -> Result<NodeId> {
        self.expect_keyword(kw)?;
        let node = self.new_node(node_type);
        self.parse_object_name_into(node)?;
        while !self.at_end() && !self.current().is_delimiter(";") {
            self.advance();
        }
        Ok(node)
    }

    fn parse_alter_table(&mut self) -> Result<NodeId> {
        self.expect_keyword(Keyword::Table)?;
        let node = self.new_node(NodeType::AlterTableStmt);
        self.parse_object_name_into(node)?;
        let action = self.parse_alter_table_action()?;
        self.add_child(node, action);
        Ok(node)
    }

    /// One `AlterTableAction` child whose `primary_text` is the action verb:
    /// ADD/DROP/RENAME, or for ALTER COLUMN, the specific sub-form
    /// (SET DEFAULT/DROP DEFAULT/TYPE). ALTER COLUMN's target column name is
    /// kept in `schema_name` since `primary_text` already carries the verb.
    fn parse_alter_table_action(&mut self) -> Result<NodeId> {
        match self.current().keyword {
            Some(Keyword::Add) => {
                self.advance();
                self.eat_keyword(Keyword::Column);
                let node = self.new_node(NodeType::AlterTableAction);
                let verb = self.intern("ADD");
                self.set_primary_text(node, verb);
                let col = self.parse_column_definition()?;
                self.add_child(node, col);
                Ok(node)
            }
            Some(Keyword::Drop) => {
                self.advance();
                self.eat_keyword(Keyword::Column);
                let node = self.new_node(NodeType::AlterTableAction);
                let verb = self.intern("DROP");
                self.set_primary_text(node, verb);
                let name_node = self.parse_identifier_simple()?;
                self.add_child(node, name_node);
                if self.eat_keyword(Keyword::Cascade) {
                    self.set_semantic_flag(node, SemanticFlags::OR_REPLACE_CASCADE);
                } else if self.eat_keyword(Keyword::Restrict) {
                    self.set_semantic_flag(node, SemanticFlags::TEMPORARY_RESTRICT);
                }
                Ok(node)
            }
            Some(Keyword::Alter) => {
                self.advance();
                self.eat_keyword(Keyword::Column);
                if self.current().kind != TokenKind::Identifier {
                    return Err(self.unexpected("expected a column name"));
                }
                let col_name = self.intern_current();
                self.advance();
                let node = self.new_node(NodeType::AlterTableAction);
                self.arena.node_mut(node).schema_name = col_name;

                if self.eat_keyword(Keyword::Set) {
                    self.expect_keyword(Keyword::Default)?;
                    let verb = self.intern("SET DEFAULT");
                    self.set_primary_text(node, verb);
                    let expr = self.parse_expression(0)?;
                    self.add_child(node, expr);
                } else if self.eat_keyword(Keyword::Drop) {
                    self.expect_keyword(Keyword::Default)?;
                    let verb = self.intern("DROP DEFAULT");
                    self.set_primary_text(node, verb);
                } else if self.eat_keyword(Keyword::Type) {
                    let verb = self.intern("TYPE");
                    self.set_primary_text(node, verb);
                    let dt = self.parse_data_type()?;
                    self.add_child(node, dt);
                } else {
                    return Err(self.unexpected("expected SET DEFAULT, DROP DEFAULT, or TYPE"));
                }
                Ok(node)
            }
            Some(Keyword::Rename) => {
                self.advance();
                self.eat_keyword(Keyword::To);
                let node = self.new_node(NodeType::AlterTableAction);
                let verb = self.intern("RENAME");
                self.set_primary_text(node, verb);
                let new_name = self.parse_identifier_simple()?;
                self.add_child(node, new_name);
                Ok(node)
            }
            _ => Err(self.unexpected("expected ADD, DROP, ALTER, or RENAME")),
        }
    }

    /// `[catalog.][schema.]name`, written directly onto an already-allocated
    /// node rather than a separate `TableRef` child; used for every DDL
    /// object name (table, index, view, trigger, schema).
    fn parse_object_name_into(&mut self, node: NodeId) -> Result<()> {
        if self.current().kind != TokenKind::Identifier && self.current().kind != TokenKind::Keyword {
            return Err(self.unexpected("expected a name"));
        }
        let mut parts = vec![self.current().text.clone()];
        self.advance();
        while self.eat_delimiter(".") {
            parts.push(self.current().text.clone());
            self.advance();
        }
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
        Ok(())
    }

    fn parse_column_list_until_paren(&mut self) -> Result<NodeId> {
        let node = self.new_node(NodeType::ColumnList);
        loop {
            let col = self.parse_identifier_simple()?;
            self.add_child(node, col);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        self.expect_delimiter(")")?;
        Ok(node)
    }

    fn parse_column_list_no_parens(&mut self) -> Result<NodeId> {
        let node = self.new_node(NodeType::ColumnList);
        loop {
            let col = self.parse_identifier_simple()?;
            self.add_child(node, col);
            if self.eat_delimiter(",") {
                continue;
            }
            break;
        }
        Ok(node)
    }

    fn set_semantic_flag(&mut self, node: NodeId, mask: u16) {
        let mut flags = self.arena.node(node).semantic_flags;
        flags.set(mask);
        self.arena.node_mut(node).semantic_flags = flags;
    }
}
