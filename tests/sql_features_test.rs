//! Feature-by-feature integration coverage: one test group per grammar area
//! (DDL, DML, SELECT, expressions), exercised through the public `Parser`
//! API rather than the crate's internal unit tests.

use sql_front::ast::{NodeFlags, NodeType, SemanticFlags};
use sql_front::Parser;

fn parse(sql: &str) -> (Parser, sql_front::ast::NodeId) {
    let mut p = Parser::new();
    let root = p.parse(sql).expect("statement should parse");
    (p, root)
}

#[test]
fn create_table_round_trips_through_validate_ast() {
    let (p, root) = parse(
        "CREATE TABLE employees (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            manager_id INTEGER REFERENCES employees(id),
            CHECK (id <> manager_id)
        )",
    );
    assert_eq!(p.arena().node(root).node_type, NodeType::CreateTableStmt);
    p.validate_ast(root).unwrap();
}

#[test]
fn create_index_unique_with_predicate() {
    let (p, root) = parse("CREATE UNIQUE INDEX idx_active_email ON users (lower(email)) WHERE active");
    assert_eq!(p.arena().node(root).node_type, NodeType::CreateIndexStmt);
    assert!(p.arena().node(root).semantic_flags.contains(SemanticFlags::UNIQUE));
}

#[test]
fn create_view_wraps_select() {
    let (p, root) = parse("CREATE VIEW recent_orders AS SELECT * FROM orders WHERE created_at > '2026-01-01'");
    assert_eq!(p.arena().node(root).node_type, NodeType::CreateViewStmt);
    assert!(p.arena().find_child(root, NodeType::SelectStmt).is_some());
}

#[test]
fn alter_table_drop_column_cascade() {
    let (p, root) = parse("ALTER TABLE employees DROP COLUMN manager_id CASCADE");
    let action = p.arena().find_child(root, NodeType::AlterTableAction).unwrap();
    assert_eq!(p.arena().text(p.arena().node(action).primary_text), "DROP");
    assert!(p.arena().node(action).semantic_flags.contains(SemanticFlags::OR_REPLACE_CASCADE));
}

#[test]
fn drop_index_if_exists() {
    let (p, root) = parse("DROP INDEX IF EXISTS idx_active_email");
    let node = p.arena().node(root);
    assert_eq!(node.node_type, NodeType::DropStmt);
    assert!(node.semantic_flags.contains(SemanticFlags::IF_EXISTS));
}

#[test]
fn insert_on_conflict_do_update() {
    let (p, root) = parse(
        "INSERT INTO users (id, email) VALUES (1, 'a@example.com')
         ON CONFLICT (id) DO UPDATE SET email = excluded.email",
    );
    assert_eq!(p.arena().node(root).node_type, NodeType::InsertStmt);
    let conflict = p.arena().find_child(root, NodeType::OnConflictClause).unwrap();
    assert!(p.arena().children(conflict).count() >= 2);
}

#[test]
fn update_returning_clause() {
    let (p, root) = parse("UPDATE accounts SET balance = balance - 10 WHERE id = 1 RETURNING balance");
    assert!(p.arena().find_child(root, NodeType::ReturningClause).is_some());
}

#[test]
fn delete_with_subquery_predicate() {
    let (p, root) = parse("DELETE FROM sessions WHERE user_id IN (SELECT id FROM banned_users)");
    assert_eq!(p.arena().node(root).node_type, NodeType::DeleteStmt);
    let where_clause = p.arena().find_child(root, NodeType::WhereClause).unwrap();
    let in_expr = p.arena().children(where_clause).next().unwrap();
    assert_eq!(p.arena().node(in_expr).node_type, NodeType::InExpr);
}

#[test]
fn window_function_with_frame_clause() {
    let (p, root) = parse(
        "SELECT x, SUM(y) OVER (PARTITION BY z ORDER BY w ROWS BETWEEN 3 PRECEDING AND CURRENT ROW) FROM t",
    );
    let list = p.arena().find_child(root, NodeType::SelectList).unwrap();
    let sum_call = p.arena().children(list).nth(1).unwrap();
    assert!(p.arena().node(sum_call).semantic_flags.contains(SemanticFlags::IS_WINDOW_FUNCTION));
    let spec = p.arena().find_child(sum_call, NodeType::WindowSpec).unwrap();
    assert!(p.arena().find_child(spec, NodeType::PartitionByClause).is_some());
    let frame = p.arena().find_child(spec, NodeType::FrameClause).unwrap();
    assert_eq!(p.arena().children(frame).count(), 2);
}

#[test]
fn cte_with_multiple_definitions() {
    let (p, root) = parse(
        "WITH recent AS (SELECT id FROM orders WHERE created_at > '2026-01-01'),
              big_spenders AS (SELECT customer_id FROM orders WHERE total > 1000)
         SELECT * FROM recent JOIN big_spenders ON recent.id = big_spenders.customer_id",
    );
    let cte = p.arena().children(root).next().unwrap();
    assert_eq!(p.arena().node(cte).node_type, NodeType::CTEClause);
    assert_eq!(p.arena().children(cte).count(), 2);
}

#[test]
fn extract_and_interval_literal() {
    let (p, root) = parse("SELECT EXTRACT(YEAR FROM order_date), INTERVAL '3' DAY FROM orders");
    let list = p.arena().find_child(root, NodeType::SelectList).unwrap();
    let mut items = p.arena().children(list);
    let extract = items.next().unwrap();
    assert_eq!(p.arena().node(extract).node_type, NodeType::ExtractExpr);
    assert_eq!(p.arena().text(p.arena().node(extract).primary_text), "YEAR");
    let interval = items.next().unwrap();
    assert_eq!(p.arena().node(interval).node_type, NodeType::IntervalLiteral);
}

#[test]
fn group_by_grouping_sets() {
    let (p, root) = parse("SELECT a, b, count(*) FROM t GROUP BY GROUPING SETS ((a), (b), ())");
    let group = p.arena().find_child(root, NodeType::GroupByClause).unwrap();
    let element = p.arena().children(group).next().unwrap();
    assert_eq!(p.arena().node(element).node_type, NodeType::GroupingElement);
}

#[test]
fn explain_wraps_inner_statement() {
    let (p, root) = parse("EXPLAIN SELECT * FROM t");
    assert_eq!(p.arena().node(root).node_type, NodeType::ExplainStmt);
    let inner = p.arena().children(root).next().unwrap();
    assert_eq!(p.arena().node(inner).node_type, NodeType::SelectStmt);
}

#[test]
fn create_trigger_instead_of_on_view() {
    let (p, root) = parse(
        "CREATE TRIGGER fill_view INSTEAD OF INSERT ON recent_orders
         FOR EACH ROW INSERT INTO orders (id) VALUES (1)",
    );
    assert_eq!(p.arena().node(root).node_type, NodeType::CreateTriggerStmt);
    assert_eq!(p.arena().text(p.arena().node(root).schema_name), "INSTEAD OF");
}

#[test]
fn distinct_select_sets_node_flag() {
    let (p, root) = parse("SELECT DISTINCT department FROM employees");
    assert!(p.arena().node(root).flags.contains(NodeFlags::DISTINCT));
}
